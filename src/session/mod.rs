//! Press-and-hold recording sessions
//!
//! This module provides the recording session controller that turns raw
//! press/release/cancel/timer events plus a permission decision into a
//! classified `SessionOutcome`:
//! - `state`: the session record and its pure transition function
//! - `controller`: the async control loop that executes transition effects
//!   against the audio device, the permission gate and the duration timer
//! - `config`: the duration window

mod config;
mod controller;
mod state;

pub use config::{SessionLimits, MAX_DURATION_SECS, MIN_DURATION_SECS, TICK_INTERVAL};
pub use controller::{RecordingSessionController, SessionError, SessionHandle};
pub use state::{transition, Effect, RecordingSession, SessionEvent, SessionOutcome, SessionState};
