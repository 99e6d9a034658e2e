//! Ambient noise gate
//!
//! Samples the ambient level on a fixed cadence, averages the run and checks
//! it against a threshold. A passing reading is required before any task may
//! start.

mod source;

pub use source::{NoiseSource, ScriptedNoiseSource, SimulatedNoiseSource};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

/// Samples per run
pub const SAMPLE_COUNT: usize = 30;

/// Delay between samples
pub const SAMPLE_CADENCE: Duration = Duration::from_millis(100);

/// Average level (dB) below which the environment is quiet enough
pub const NOISE_THRESHOLD_DB: f32 = 40.0;

/// Result of one sampling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseReading {
    pub samples: Vec<f32>,
    pub average: f32,
    pub passed: bool,
}

impl NoiseReading {
    pub fn from_samples(samples: Vec<f32>, threshold_db: f32) -> Self {
        let average = if samples.is_empty() {
            0.0
        } else {
            samples.iter().sum::<f32>() / samples.len() as f32
        };

        Self {
            passed: average < threshold_db,
            samples,
            average,
        }
    }

    pub fn message(&self) -> &'static str {
        if self.passed {
            "Good to proceed"
        } else {
            "Please move to a quieter place"
        }
    }
}

/// Noise gate over a pluggable sample source
pub struct NoiseGate<S> {
    source: S,
    sample_count: usize,
    cadence: Duration,
    threshold_db: f32,
}

impl<S: NoiseSource> NoiseGate<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            sample_count: SAMPLE_COUNT,
            cadence: SAMPLE_CADENCE,
            threshold_db: NOISE_THRESHOLD_DB,
        }
    }

    /// Run a fresh sampling pass
    ///
    /// Takes `&mut self`, so a run cannot be restarted while in flight.
    pub async fn run(&mut self) -> NoiseReading {
        info!(
            "Noise check started: {} samples every {}ms",
            self.sample_count,
            self.cadence.as_millis()
        );

        let mut ticker = time::interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut samples = Vec::with_capacity(self.sample_count);
        for _ in 0..self.sample_count {
            ticker.tick().await;
            let db = self.source.sample_db();
            debug!("Noise sample {}: {:.1} dB", samples.len() + 1, db);
            samples.push(db);
        }

        let reading = NoiseReading::from_samples(samples, self.threshold_db);
        info!(
            "Noise check finished: average {:.1} dB, passed={}",
            reading.average, reading.passed
        );

        reading
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_average_and_verdict() {
        let reading = NoiseReading::from_samples(vec![30.0, 50.0], NOISE_THRESHOLD_DB);
        assert_eq!(reading.average, 40.0);
        assert!(!reading.passed, "threshold itself does not pass");
        assert_eq!(reading.message(), "Please move to a quieter place");
    }

    #[test]
    fn test_reading_empty_samples() {
        let reading = NoiseReading::from_samples(Vec::new(), NOISE_THRESHOLD_DB);
        assert_eq!(reading.average, 0.0);
        assert!(reading.passed);
    }
}
