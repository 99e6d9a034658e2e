//! HTTP API for task screens
//!
//! This module provides a REST API around the recording session controller:
//! - POST /noise/check - Run the ambient noise gate
//! - GET /samples/next - Item to read or describe
//! - POST /tasks/:task_type/sessions - Mount a task screen
//! - POST /sessions/:id/{press,release,cancel,reset} - Recording gestures
//! - POST /sessions/:id/permission - Microphone permission answer
//! - POST /sessions/:id/audio - PCM for the active recording
//! - POST /sessions/:id/submit - Assemble and store the task
//! - DELETE /sessions/:id - Unmount (releases the device)
//! - GET /tasks, GET /tasks/summary - Submitted tasks
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, RecordingSettings, TaskSession};
