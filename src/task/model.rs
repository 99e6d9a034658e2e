use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of micro-task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Read a passage aloud
    TextReading,
    /// Describe an image aloud
    ImageDescription,
    /// Capture a photo and describe it
    PhotoCapture,
}

/// Whether a task needs a valid recording to be submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingRequirement {
    Required,
    /// A non-empty text description may stand in for the recording
    TextSubstituteAllowed,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextReading => "text_reading",
            Self::ImageDescription => "image_description",
            Self::PhotoCapture => "photo_capture",
        }
    }

    pub fn recording_requirement(&self) -> RecordingRequirement {
        match self {
            Self::TextReading | Self::ImageDescription => RecordingRequirement::Required,
            Self::PhotoCapture => RecordingRequirement::TextSubstituteAllowed,
        }
    }

    /// Whether the payload comes from the sample item fetch
    pub fn uses_sample_item(&self) -> bool {
        matches!(self, Self::TextReading | Self::ImageDescription)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted micro-task. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub task_type: TaskType,
    pub timestamp: DateTime<Utc>,

    /// 0 when no recording is attached, otherwise within the session limits
    pub duration_sec: u32,

    /// Passage read aloud, or the typed description of a photo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Reference to the image that was described
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,

    /// Path of the captured photo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,

    /// Path of the recording
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<PathBuf>,
}

/// Task-type-specific content combined with a session outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Passage to read (TextReading)
    #[serde(default)]
    pub text: Option<String>,
    /// Image to describe (ImageDescription)
    #[serde(default)]
    pub image_ref: Option<String>,
    /// Captured photo (PhotoCapture)
    #[serde(default)]
    pub image_path: Option<PathBuf>,
    /// Typed description, the recording substitute (PhotoCapture)
    #[serde(default)]
    pub text_description: Option<String>,
}

impl TaskPayload {
    pub fn passage(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn image(image_ref: Option<String>) -> Self {
        Self {
            image_ref,
            ..Self::default()
        }
    }

    pub fn photo(image_path: impl Into<PathBuf>, text_description: Option<String>) -> Self {
        Self {
            image_path: Some(image_path.into()),
            text_description,
            ..Self::default()
        }
    }

    /// Trimmed description, if it has any content
    pub fn description(&self) -> Option<&str> {
        self.text_description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_wire_names() {
        let json = serde_json::to_string(&TaskType::PhotoCapture).unwrap();
        assert_eq!(json, "\"photo_capture\"");

        let parsed: TaskType = serde_json::from_str("\"text_reading\"").unwrap();
        assert_eq!(parsed, TaskType::TextReading);
    }

    #[test]
    fn test_blank_description_is_none() {
        let payload = TaskPayload::photo("/photos/1.jpg", Some("   ".to_string()));
        assert_eq!(payload.description(), None);

        let payload = TaskPayload::photo("/photos/1.jpg", Some(" a red mug ".to_string()));
        assert_eq!(payload.description(), Some("a red mug"));
    }
}
