use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::config::SessionLimits;

/// Terminal classification of a finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionOutcome {
    Valid {
        duration_secs: u32,
        audio_ref: Option<PathBuf>,
    },
    TooShort,
    TooLong,
    Cancelled,
    DeviceStartFailed,
    PermissionDenied,
}

impl SessionOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Recorded duration; 0 for every outcome except `Valid`
    pub fn duration_secs(&self) -> u32 {
        match self {
            Self::Valid { duration_secs, .. } => *duration_secs,
            _ => 0,
        }
    }

    pub fn audio_ref(&self) -> Option<&PathBuf> {
        match self {
            Self::Valid { audio_ref, .. } => audio_ref.as_ref(),
            _ => None,
        }
    }

    /// User-facing message
    pub fn message(&self) -> String {
        match self {
            Self::Valid { duration_secs, .. } => {
                format!("Recording complete: {}s", duration_secs)
            }
            Self::TooShort => "Recording too short (min 10 s).".to_string(),
            Self::TooLong => "Recording too long (max 20 s).".to_string(),
            Self::Cancelled => "Recording cancelled".to_string(),
            Self::DeviceStartFailed => "Failed to start recording".to_string(),
            Self::PermissionDenied => "Microphone permission denied.".to_string(),
        }
    }
}

/// Recording session state
///
/// ```text
/// Idle → AwaitingPermission → Recording → Stopped
///   └────────────────────────────↗          │
///   ↖────────────── reset ──────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingPermission,
    Recording { elapsed_secs: u32 },
    Stopped { outcome: SessionOutcome },
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }

    pub fn elapsed_secs(&self) -> u32 {
        match self {
            Self::Recording { elapsed_secs } => *elapsed_secs,
            Self::Stopped { outcome } => outcome.duration_secs(),
            _ => 0,
        }
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        match self {
            Self::Stopped { outcome } => Some(outcome),
            _ => None,
        }
    }
}

/// External inputs to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Press-and-hold began; `permission_granted` is the synchronous gate check
    PressStart { permission_granted: bool },
    /// Answer to the permission request issued under `epoch`
    PermissionDecision { granted: bool, epoch: u64 },
    TimerTick,
    PressRelease,
    PressCancel,
    /// AudioDevice.start returned false
    DeviceStartFailed,
    /// Record again
    Reset,
    /// Screen unmounted
    Dispose,
}

/// Side effects requested by a transition, executed in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestPermission { epoch: u64 },
    StartDevice,
    StartTimer,
    CancelTimer,
    /// Stop the device; keep the output only for a valid recording
    StopDevice { keep_output: bool },
    /// Delete a kept recording that will never be submitted
    DiscardOutput { path: PathBuf },
    ReleaseDevice,
}

/// The session transition function
///
/// `epoch` is the generation of the current permission request; decisions
/// carrying any other epoch are stale and ignored. Events with no entry in
/// the table leave the state unchanged.
pub fn transition(
    state: &SessionState,
    event: &SessionEvent,
    limits: &SessionLimits,
    epoch: u64,
) -> (SessionState, Vec<Effect>) {
    use SessionEvent as E;
    use SessionState as S;

    let start_recording = || {
        (
            S::Recording { elapsed_secs: 0 },
            vec![Effect::StartDevice, Effect::StartTimer],
        )
    };
    let stop = |outcome: SessionOutcome| {
        let keep_output = outcome.is_valid();
        (
            S::Stopped { outcome },
            vec![Effect::CancelTimer, Effect::StopDevice { keep_output }],
        )
    };

    match (state, event) {
        (S::Idle, E::PressStart { permission_granted: true }) => start_recording(),
        (S::Idle, E::PressStart { permission_granted: false }) => (
            S::AwaitingPermission,
            vec![Effect::RequestPermission { epoch }],
        ),

        (S::AwaitingPermission, E::PermissionDecision { granted, epoch: decided })
            if *decided == epoch =>
        {
            if *granted {
                start_recording()
            } else {
                (
                    S::Stopped {
                        outcome: SessionOutcome::PermissionDenied,
                    },
                    Vec::new(),
                )
            }
        }

        (S::Recording { elapsed_secs }, E::TimerTick) => {
            if *elapsed_secs < limits.max_duration_secs {
                (
                    S::Recording {
                        elapsed_secs: elapsed_secs + 1,
                    },
                    Vec::new(),
                )
            } else {
                stop(SessionOutcome::TooLong)
            }
        }

        (S::Recording { elapsed_secs }, E::PressRelease) => {
            if *elapsed_secs < limits.min_duration_secs {
                stop(SessionOutcome::TooShort)
            } else {
                stop(SessionOutcome::Valid {
                    duration_secs: *elapsed_secs,
                    audio_ref: None,
                })
            }
        }

        (S::Recording { .. }, E::PressCancel) => stop(SessionOutcome::Cancelled),

        (_, E::DeviceStartFailed) => (
            S::Stopped {
                outcome: SessionOutcome::DeviceStartFailed,
            },
            vec![Effect::CancelTimer],
        ),

        // Record again: the previous take is dropped
        (S::Stopped { outcome }, E::Reset) => {
            let effects = match outcome.audio_ref() {
                Some(path) => vec![Effect::DiscardOutput { path: path.clone() }],
                None => Vec::new(),
            };
            (S::Idle, effects)
        }

        // Release happens on every dispose, whatever the state
        (current, E::Dispose) => {
            let mut effects = Vec::new();
            if current.is_recording() {
                effects.push(Effect::CancelTimer);
                effects.push(Effect::StopDevice { keep_output: false });
            }
            effects.push(Effect::ReleaseDevice);
            (S::Idle, effects)
        }

        (current, _) => (current.clone(), Vec::new()),
    }
}

/// Mutable session record owned by one controller
#[derive(Debug, Clone)]
pub struct RecordingSession {
    state: SessionState,
    epoch: u64,
    limits: SessionLimits,
}

impl RecordingSession {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            state: SessionState::Idle,
            epoch: 0,
            limits,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }

    /// Apply one event and return the effects to execute
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        // A press from Idle, a reset and a dispose each open a new generation
        let opens_generation = match event {
            SessionEvent::PressStart { .. } => self.state.is_idle(),
            SessionEvent::Reset => self.state.is_stopped(),
            SessionEvent::Dispose => true,
            _ => false,
        };
        if opens_generation {
            self.epoch += 1;
        }

        let (next, effects) = transition(&self.state, &event, &self.limits, self.epoch);
        self.state = next;
        effects
    }

    /// Fill in the output path of a just-finished valid recording
    pub fn attach_audio(&mut self, path: Option<PathBuf>) {
        if let SessionState::Stopped {
            outcome: SessionOutcome::Valid { audio_ref, .. },
        } = &mut self.state
        {
            *audio_ref = path;
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new(SessionLimits::default())
    }
}
