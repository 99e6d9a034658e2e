//! Micro-task records
//!
//! - `model`: `Task`, `TaskType` and the per-type `TaskPayload`
//! - `assembler`: turns a session outcome plus payload into a `Task`
//! - `store`: append-only in-memory collection of submitted tasks

mod assembler;
mod model;
mod store;

pub use assembler::{assemble, AssemblyError};
pub use model::{RecordingRequirement, Task, TaskPayload, TaskType};
pub use store::{TaskStore, TaskSummary};
