pub mod config;
pub mod device;
pub mod http;
pub mod noise;
pub mod sample;
pub mod session;
pub mod task;

pub use config::Config;
pub use device::{
    AudioDevice, FixedPermissionGate, FrameFeed, PermissionGate, PromptPermissionGate,
    WavFileDevice,
};
pub use http::{create_router, AppState, RecordingSettings};
pub use noise::{NoiseGate, NoiseReading, NoiseSource, ScriptedNoiseSource, SimulatedNoiseSource};
pub use sample::{sample_or_default, HttpSampleSource, SampleItem, SampleSource};
pub use session::{
    RecordingSessionController, SessionError, SessionHandle, SessionLimits, SessionOutcome,
    SessionState,
};
pub use task::{assemble, AssemblyError, Task, TaskPayload, TaskStore, TaskType};
