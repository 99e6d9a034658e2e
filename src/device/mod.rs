//! Capabilities consumed by the recording session controller
//!
//! - `AudioDevice`: start/stop/release of a single microphone capture
//! - `PermissionGate`: synchronous "granted?" check plus an asynchronous request
//!
//! The controller owns exactly one `AudioDevice` for its lifetime and is the
//! only caller of it.

pub mod permission;
pub mod wav;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use permission::{FixedPermissionGate, PromptPermissionGate};
pub use wav::{FrameFeed, WavFileDevice};

/// Microphone recording device
///
/// Implementations:
/// - `WavFileDevice`: 16-bit PCM WAV files fed through a `FrameFeed`
pub trait AudioDevice: Send {
    /// Start recording into the named output
    ///
    /// Returns false if the capture could not be started.
    fn start(&mut self, output_name: &str) -> bool;

    /// Stop the active capture
    ///
    /// Returns the output path, or None if the output is missing or empty.
    fn stop(&mut self) -> Option<PathBuf>;

    /// Release the device. Idempotent; failures are swallowed.
    fn release(&mut self);

    /// Throw away an output the session will not keep
    fn discard(&mut self, _output: &Path) {}

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Microphone permission capability
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Whether microphone access is currently granted
    fn has_permission(&self) -> bool;

    /// Ask for microphone access. Resolves exactly once per call.
    async fn request(&self) -> bool;
}
