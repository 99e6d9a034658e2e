use super::state::{AppState, TaskSession};
use crate::device::{PromptPermissionGate, WavFileDevice};
use crate::noise::NoiseReading;
use crate::sample::{sample_or_default, SampleItem};
use crate::session::{RecordingSessionController, SessionError, SessionState};
use crate::task::{assemble, Task, TaskPayload, TaskSummary, TaskType};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Whether the client already holds microphone permission
    #[serde(default)]
    pub microphone_granted: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub task_type: TaskType,
    pub payload: TaskPayload,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub task_type: TaskType,
    #[serde(flatten)]
    pub state: SessionState,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub granted: bool,
}

#[derive(Debug, Serialize)]
pub struct AudioAcceptedResponse {
    pub samples_written: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    /// Captured photo (PhotoCapture)
    pub image_path: Option<PathBuf>,
    /// Typed description (PhotoCapture)
    pub text_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NoiseCheckResponse {
    #[serde(flatten)]
    pub reading: NoiseReading,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn session_not_found(session_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Session {} not found", session_id),
    )
}

fn session_closed(e: SessionError) -> Response {
    error!("{}", e);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn status_of(session_id: &str, session: &TaskSession) -> SessionStatusResponse {
    let state = session.handle.state();
    SessionStatusResponse {
        session_id: session_id.to_string(),
        task_type: session.task_type,
        message: state.outcome().map(|outcome| outcome.message()),
        state,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// POST /noise/check
/// Run one ambient noise check; a pass unlocks task sessions
pub async fn run_noise_check(State(state): State<AppState>) -> impl IntoResponse {
    let reading = {
        let mut gate = state.noise_gate.lock().await;
        gate.run().await
    };

    *state.last_noise_reading.lock().await = Some(reading.clone());

    let message = reading.message();
    (StatusCode::OK, Json(NoiseCheckResponse { reading, message }))
}

/// GET /samples/next
/// Item to read or describe (falls back to the default item)
pub async fn next_sample(State(state): State<AppState>) -> Json<SampleItem> {
    Json(sample_or_default(state.samples.as_ref()).await)
}

/// POST /tasks/:task_type/sessions
/// Mount a task screen: one recording controller per session
pub async fn create_session(
    State(state): State<AppState>,
    Path(task_type): Path<TaskType>,
    body: Option<Json<CreateSessionRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    if !state.noise_gate_passed().await {
        warn!("Rejecting {} session: noise check not passed", task_type);
        return error_response(
            StatusCode::PRECONDITION_FAILED,
            "Noise check must pass before starting a task",
        );
    }

    let payload = match task_type {
        TaskType::TextReading => sample_or_default(state.samples.as_ref())
            .await
            .passage_payload(),
        TaskType::ImageDescription => sample_or_default(state.samples.as_ref())
            .await
            .image_payload(),
        TaskType::PhotoCapture => TaskPayload::default(),
    };

    let device = WavFileDevice::new(
        &state.recording.output_dir,
        state.recording.sample_rate,
        state.recording.channels,
    );
    let feed = device.feed();
    let permissions = Arc::new(PromptPermissionGate::new(req.microphone_granted));

    let controller =
        RecordingSessionController::new(task_type.as_str(), Box::new(device), permissions.clone());
    let handle = controller.spawn();
    let session_id = handle.session_id().to_string();

    info!("Mounted {} session {}", task_type, session_id);

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(
            session_id.clone(),
            TaskSession {
                task_type,
                handle,
                permissions,
                feed,
                payload: payload.clone(),
            },
        );
    }

    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            task_type,
            payload,
        }),
    )
        .into_response()
}

/// GET /sessions/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.session(&session_id).await {
        Some(session) => (StatusCode::OK, Json(status_of(&session_id, &session))).into_response(),
        None => session_not_found(&session_id),
    }
}

/// Press-and-hold gestures forwarded to the controller
///
/// The response carries the state after the controller applied the gesture.
#[derive(Debug, Clone, Copy)]
enum Gesture {
    Press,
    Release,
    Cancel,
    Reset,
}

async fn forward_gesture(state: AppState, session_id: String, gesture: Gesture) -> Response {
    let Some(session) = state.session(&session_id).await else {
        return session_not_found(&session_id);
    };

    let result = match gesture {
        Gesture::Press => session.handle.press().await,
        Gesture::Release => session.handle.release().await,
        Gesture::Cancel => session.handle.cancel().await,
        Gesture::Reset => session.handle.reset().await,
    };

    match result {
        Ok(applied) => (
            StatusCode::ACCEPTED,
            Json(SessionStatusResponse {
                session_id,
                task_type: session.task_type,
                message: applied.outcome().map(|outcome| outcome.message()),
                state: applied,
            }),
        )
            .into_response(),
        Err(e) => session_closed(e),
    }
}

/// POST /sessions/:session_id/press
pub async fn press(State(state): State<AppState>, Path(session_id): Path<String>) -> Response {
    forward_gesture(state, session_id, Gesture::Press).await
}

/// POST /sessions/:session_id/release
pub async fn release(State(state): State<AppState>, Path(session_id): Path<String>) -> Response {
    forward_gesture(state, session_id, Gesture::Release).await
}

/// POST /sessions/:session_id/cancel
pub async fn cancel(State(state): State<AppState>, Path(session_id): Path<String>) -> Response {
    forward_gesture(state, session_id, Gesture::Cancel).await
}

/// POST /sessions/:session_id/reset
/// Record again
pub async fn reset(State(state): State<AppState>, Path(session_id): Path<String>) -> Response {
    forward_gesture(state, session_id, Gesture::Reset).await
}

/// POST /sessions/:session_id/permission
/// Deliver the user's answer to the microphone prompt
pub async fn resolve_permission(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<PermissionRequest>,
) -> Response {
    let Some(session) = state.session(&session_id).await else {
        return session_not_found(&session_id);
    };

    let delivered = session.permissions.resolve(req.granted);
    info!(
        "Permission for {}: granted={}, delivered={}",
        session_id, req.granted, delivered
    );

    (
        StatusCode::ACCEPTED,
        Json(status_of(&session_id, &session)),
    )
        .into_response()
}

/// POST /sessions/:session_id/audio
/// Raw little-endian 16-bit PCM for the active recording
pub async fn push_audio(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Response {
    let Some(session) = state.session(&session_id).await else {
        return session_not_found(&session_id);
    };

    match session.feed.write_pcm_bytes(&body) {
        Ok(samples_written) => (
            StatusCode::ACCEPTED,
            Json(AudioAcceptedResponse { samples_written }),
        )
            .into_response(),
        Err(e) => {
            warn!("Rejected audio for {}: {:#}", session_id, e);
            error_response(StatusCode::BAD_REQUEST, format!("{:#}", e))
        }
    }
}

/// POST /sessions/:session_id/submit
/// Assemble the task, store it and unmount the session
///
/// The session is taken out of the registry before assembly, so concurrent
/// submits of one session store at most one task. Refused submits put it back.
pub async fn submit(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Option<Json<SubmitRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let Some(session) = state.sessions.write().await.remove(&session_id) else {
        return session_not_found(&session_id);
    };

    let current = session.handle.state();
    if matches!(
        current,
        SessionState::AwaitingPermission | SessionState::Recording { .. }
    ) {
        state.sessions.write().await.insert(session_id.clone(), session);
        return error_response(
            StatusCode::CONFLICT,
            format!("Session {} is still recording", session_id),
        );
    }

    let mut payload = session.payload.clone();
    if req.image_path.is_some() {
        payload.image_path = req.image_path;
    }
    if req.text_description.is_some() {
        payload.text_description = req.text_description;
    }

    let task = match assemble(session.task_type, current.outcome(), &payload) {
        Ok(task) => task,
        Err(e) => {
            state.sessions.write().await.insert(session_id.clone(), session);
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
        }
    };

    state.store.add(task.clone()).await;

    if let Err(e) = session.handle.dispose().await {
        warn!("Dispose after submit failed: {}", e);
    }

    (StatusCode::CREATED, Json(task)).into_response()
}

/// DELETE /sessions/:session_id
/// Unmount the task screen without submitting; the recording is discarded
/// and the device released
pub async fn dispose_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let removed = state.sessions.write().await.remove(&session_id);

    match removed {
        Some(session) => match session.handle.abandon().await {
            Ok(()) => {
                info!("Session {} disposed", session_id);
                StatusCode::NO_CONTENT.into_response()
            }
            Err(e) => session_closed(e),
        },
        None => session_not_found(&session_id),
    }
}

/// GET /tasks
/// Submitted tasks in insertion order
pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    Json(state.store.list().await)
}

/// GET /tasks/summary
/// Task count and total recorded duration
pub async fn task_summary(State(state): State<AppState>) -> Json<TaskSummary> {
    Json(state.store.summary().await)
}
