use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::model::{RecordingRequirement, Task, TaskPayload, TaskType};
use crate::session::{SessionLimits, SessionOutcome};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("{task_type} needs a valid recording: {reason}")]
    IncompleteSession { task_type: TaskType, reason: String },

    #[error("{task_type} payload is missing {field}")]
    MissingPayload {
        task_type: TaskType,
        field: &'static str,
    },
}

/// Build a task from a session outcome and its payload
///
/// `outcome` is None when no session reached a terminal state. A `Valid`
/// outcome outside the duration window counts as no recording. Only `id`
/// and `timestamp` vary between calls with identical inputs.
pub fn assemble(
    task_type: TaskType,
    outcome: Option<&SessionOutcome>,
    payload: &TaskPayload,
) -> Result<Task, AssemblyError> {
    let limits = SessionLimits::default();
    let recording = outcome.filter(|outcome| {
        outcome.is_valid() && limits.accepts(outcome.duration_secs())
    });

    if recording.is_none() {
        let substitute_ok = match task_type.recording_requirement() {
            RecordingRequirement::Required => false,
            RecordingRequirement::TextSubstituteAllowed => payload.description().is_some(),
        };

        if !substitute_ok {
            let reason = match outcome {
                Some(outcome) if outcome.is_valid() => format!(
                    "duration {}s outside {}-{}s",
                    outcome.duration_secs(),
                    limits.min_duration_secs,
                    limits.max_duration_secs
                ),
                Some(outcome) => outcome.message(),
                None => "no recording".to_string(),
            };
            warn!("Refusing to assemble {}: {}", task_type, reason);
            return Err(AssemblyError::IncompleteSession { task_type, reason });
        }
    }

    let mut task = Task {
        id: format!("task_{}", Uuid::new_v4()),
        task_type,
        timestamp: Utc::now(),
        duration_sec: recording.map_or(0, SessionOutcome::duration_secs),
        text: None,
        image_ref: None,
        image_path: None,
        audio_ref: recording.and_then(|outcome| outcome.audio_ref().cloned()),
    };

    match task_type {
        TaskType::TextReading => {
            let text = payload.text.clone().ok_or(AssemblyError::MissingPayload {
                task_type,
                field: "text",
            })?;
            task.text = Some(text);
        }
        TaskType::ImageDescription => {
            task.image_ref = payload.image_ref.clone();
        }
        TaskType::PhotoCapture => {
            let image_path = payload.image_path.clone().ok_or(AssemblyError::MissingPayload {
                task_type,
                field: "image_path",
            })?;
            task.image_path = Some(image_path);
            task.text = payload.description().map(str::to_string);
        }
    }

    info!(
        "Assembled {} {} ({}s, audio={})",
        task.task_type,
        task.id,
        task.duration_sec,
        task.audio_ref.is_some()
    );

    Ok(task)
}
