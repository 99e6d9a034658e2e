// Shared fixtures for integration tests
#![allow(dead_code)]

use micro_tasks::device::AudioDevice;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters observed by a `FakeDevice`
#[derive(Debug, Clone, Default)]
pub struct DeviceProbe {
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
    pub discards: Arc<AtomicUsize>,
}

impl DeviceProbe {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn discards(&self) -> usize {
        self.discards.load(Ordering::SeqCst)
    }
}

/// In-memory device that records calls instead of touching hardware
pub struct FakeDevice {
    probe: DeviceProbe,
    fail_start: bool,
    output: Option<PathBuf>,
}

impl FakeDevice {
    pub fn new() -> (Self, DeviceProbe) {
        let probe = DeviceProbe::default();
        let device = Self {
            probe: probe.clone(),
            fail_start: false,
            output: None,
        };
        (device, probe)
    }

    /// Device whose `start` always fails
    pub fn failing() -> (Self, DeviceProbe) {
        let (mut device, probe) = Self::new();
        device.fail_start = true;
        (device, probe)
    }
}

impl AudioDevice for FakeDevice {
    fn start(&mut self, output_name: &str) -> bool {
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return false;
        }
        self.output = Some(PathBuf::from("/fake").join(output_name));
        true
    }

    fn stop(&mut self) -> Option<PathBuf> {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        self.output.take()
    }

    fn release(&mut self) {
        self.probe.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn discard(&mut self, _output: &Path) {
        self.probe.discards.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "fake"
    }
}
