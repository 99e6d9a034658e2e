use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::device::{FrameFeed, PromptPermissionGate};
use crate::noise::{NoiseGate, NoiseReading, NoiseSource};
use crate::sample::SampleSource;
use crate::session::SessionHandle;
use crate::task::{TaskPayload, TaskStore, TaskType};

/// WAV settings for recordings made through the API
#[derive(Debug, Clone)]
pub struct RecordingSettings {
    pub output_dir: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

/// A mounted task screen
#[derive(Clone)]
pub struct TaskSession {
    pub task_type: TaskType,
    pub handle: SessionHandle,
    pub permissions: Arc<PromptPermissionGate>,
    pub feed: FrameFeed,
    pub payload: TaskPayload,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Mounted task screens (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, TaskSession>>>,

    /// Submitted tasks
    pub store: TaskStore,

    /// Where fetched-payload tasks get their item
    pub samples: Arc<dyn SampleSource>,

    pub recording: RecordingSettings,

    /// Noise gate shared by all clients; held for the length of a run
    pub noise_gate: Arc<Mutex<NoiseGate<Box<dyn NoiseSource>>>>,

    /// Most recent noise check
    pub last_noise_reading: Arc<Mutex<Option<NoiseReading>>>,
}

impl AppState {
    pub fn new(
        store: TaskStore,
        samples: Arc<dyn SampleSource>,
        recording: RecordingSettings,
        noise_source: Box<dyn NoiseSource>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            store,
            samples,
            recording,
            noise_gate: Arc::new(Mutex::new(NoiseGate::new(noise_source))),
            last_noise_reading: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether the most recent noise check passed
    pub async fn noise_gate_passed(&self) -> bool {
        self.last_noise_reading
            .lock()
            .await
            .as_ref()
            .is_some_and(|reading| reading.passed)
    }

    pub async fn session(&self, session_id: &str) -> Option<TaskSession> {
        self.sessions.read().await.get(session_id).cloned()
    }
}
