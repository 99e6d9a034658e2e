use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::AudioDevice;

/// WAV recording device
///
/// Writes 16-bit PCM samples pushed through a `FrameFeed` into
/// `<output_dir>/<output_name>`. Samples pushed while no capture is active
/// are dropped.
pub struct WavFileDevice {
    output_dir: PathBuf,
    spec: WavSpec,
    active: Arc<Mutex<Option<ActiveCapture>>>,
}

/// Producer side of a `WavFileDevice`
#[derive(Clone)]
pub struct FrameFeed {
    active: Arc<Mutex<Option<ActiveCapture>>>,
}

struct ActiveCapture {
    path: PathBuf,
    writer: WavWriter<BufWriter<File>>,
    sample_count: usize,
}

impl ActiveCapture {
    fn finish(self) -> Result<(PathBuf, usize)> {
        self.writer
            .finalize()
            .with_context(|| format!("Failed to finalize {}", self.path.display()))?;
        Ok((self.path, self.sample_count))
    }
}

impl WavFileDevice {
    pub fn new(output_dir: impl Into<PathBuf>, sample_rate: u32, channels: u16) -> Self {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        Self {
            output_dir: output_dir.into(),
            spec,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle for pushing captured audio into this device
    pub fn feed(&self) -> FrameFeed {
        FrameFeed {
            active: Arc::clone(&self.active),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.active.lock().is_some()
    }

    fn open(&self, output_name: &str) -> Result<ActiveCapture> {
        fs::create_dir_all(&self.output_dir).context("Failed to create recordings directory")?;

        let path = self.output_dir.join(output_name);
        let writer = WavWriter::create(&path, self.spec)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        Ok(ActiveCapture {
            path,
            writer,
            sample_count: 0,
        })
    }
}

impl AudioDevice for WavFileDevice {
    fn start(&mut self, output_name: &str) -> bool {
        let mut active = self.active.lock();

        // Clean up any existing capture first
        if let Some(previous) = active.take() {
            warn!("Already recording, finishing previous capture");
            if let Err(e) = previous.finish() {
                warn!("Failed to finish previous capture: {:#}", e);
            }
        }

        match self.open(output_name) {
            Ok(capture) => {
                info!("Recording started: {}", capture.path.display());
                *active = Some(capture);
                true
            }
            Err(e) => {
                warn!("Failed to start recording: {:#}", e);
                false
            }
        }
    }

    fn stop(&mut self) -> Option<PathBuf> {
        let Some(capture) = self.active.lock().take() else {
            warn!("Not recording, nothing to stop");
            return None;
        };

        let (path, sample_count) = match capture.finish() {
            Ok(done) => done,
            Err(e) => {
                warn!("Failed to stop recording: {:#}", e);
                return None;
            }
        };

        if !path.exists() {
            warn!("Recording file not found: {}", path.display());
            return None;
        }

        if sample_count == 0 {
            warn!("Recording is empty, removing {}", path.display());
            if let Err(e) = fs::remove_file(&path) {
                debug!("Failed to remove empty recording: {}", e);
            }
            return None;
        }

        info!(
            "Recording saved: {} ({} samples)",
            path.display(),
            sample_count
        );
        Some(path)
    }

    fn release(&mut self) {
        if let Some(capture) = self.active.lock().take() {
            debug!("Finishing capture in release()");
            if let Err(e) = capture.finish() {
                warn!("Failed to finish capture during release: {:#}", e);
            }
        }
        debug!("WAV device released");
    }

    fn discard(&mut self, output: &Path) {
        match fs::remove_file(output) {
            Ok(()) => debug!("Discarded recording {}", output.display()),
            Err(e) => warn!("Failed to discard {}: {}", output.display(), e),
        }
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}

impl FrameFeed {
    /// Append interleaved samples to the active capture
    ///
    /// Returns the number of samples written (0 when nothing is recording).
    pub fn write_samples(&self, samples: &[i16]) -> Result<usize> {
        let mut active = self.active.lock();
        let Some(capture) = active.as_mut() else {
            return Ok(0);
        };

        for &sample in samples {
            capture
                .writer
                .write_sample(sample)
                .context("Failed to write sample")?;
            capture.sample_count += 1;
        }

        Ok(samples.len())
    }

    /// Append little-endian 16-bit PCM bytes to the active capture
    pub fn write_pcm_bytes(&self, bytes: &[u8]) -> Result<usize> {
        if bytes.len() % 2 != 0 {
            anyhow::bail!("PCM payload has odd length {}", bytes.len());
        }

        let samples: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        self.write_samples(&samples)
    }
}
