use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::{SessionLimits, TICK_INTERVAL};
use super::state::{Effect, RecordingSession, SessionEvent, SessionOutcome, SessionState};
use crate::device::{AudioDevice, PermissionGate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("recording session {0} is closed")]
    Closed(String),
}

#[derive(Debug, Clone, Copy)]
enum Gesture {
    Press,
    Release,
    Cancel,
    Reset,
}

#[derive(Debug)]
enum SessionCommand {
    /// `applied` receives the state once the gesture has been handled
    Gesture {
        gesture: Gesture,
        applied: oneshot::Sender<SessionState>,
    },
    Dispose {
        ack: oneshot::Sender<()>,
    },
}

struct PendingPermission {
    epoch: u64,
    decision: oneshot::Receiver<bool>,
    task: JoinHandle<()>,
}

/// Press-and-hold recording controller
///
/// Runs as one task per mounted task screen. Owns the audio device from
/// construction until dispose; the device is released exactly once, on
/// dispose, when every handle is dropped, or when the controller itself is
/// dropped.
pub struct RecordingSessionController {
    session_id: String,
    output_prefix: String,
    session: RecordingSession,
    device: Option<Box<dyn AudioDevice>>,
    permissions: Arc<dyn PermissionGate>,
    timer: Option<Interval>,
    pending_permission: Option<PendingPermission>,
    state_tx: watch::Sender<SessionState>,
}

impl RecordingSessionController {
    /// Create a controller; recordings are named `<output_prefix>_audio_<id>.wav`
    pub fn new(
        output_prefix: impl Into<String>,
        device: Box<dyn AudioDevice>,
        permissions: Arc<dyn PermissionGate>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);

        Self {
            session_id: Uuid::new_v4().to_string(),
            output_prefix: output_prefix.into(),
            session: RecordingSession::default(),
            device: Some(device),
            permissions,
            timer: None,
            pending_permission: None,
            state_tx,
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.session = RecordingSession::new(limits);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Start the control loop and return a handle to drive it
    pub fn spawn(self) -> SessionHandle {
        let (commands_tx, commands_rx) = mpsc::channel(32);
        let handle = SessionHandle {
            session_id: self.session_id.clone(),
            commands: commands_tx,
            state: self.state_tx.subscribe(),
        };

        tokio::spawn(self.run(commands_rx));

        handle
    }

    async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        info!("Recording session controller started: {}", self.session_id);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Dispose { ack }) => {
                        self.dispatch(SessionEvent::Dispose);
                        let _ = ack.send(());
                        break;
                    }
                    Some(SessionCommand::Gesture { gesture, applied }) => {
                        self.handle_gesture(gesture);
                        let _ = applied.send(self.session.state().clone());
                    }
                    None => {
                        debug!("All handles dropped, disposing session {}", self.session_id);
                        self.dispatch(SessionEvent::Dispose);
                        break;
                    }
                },
                _ = next_tick(&mut self.timer) => self.dispatch(SessionEvent::TimerTick),
                (epoch, granted) = next_decision(&mut self.pending_permission) => {
                    self.pending_permission = None;
                    info!("Permission decision for {}: granted={}", self.session_id, granted);
                    self.dispatch(SessionEvent::PermissionDecision { granted, epoch });
                }
            }
        }

        info!("Recording session controller stopped: {}", self.session_id);
    }

    fn handle_gesture(&mut self, gesture: Gesture) {
        let event = match gesture {
            Gesture::Press => SessionEvent::PressStart {
                permission_granted: self.permissions.has_permission(),
            },
            Gesture::Release => SessionEvent::PressRelease,
            Gesture::Cancel => SessionEvent::PressCancel,
            Gesture::Reset => SessionEvent::Reset,
        };

        self.dispatch(event);
    }

    /// Apply an event, execute its effects, and publish the resulting state
    ///
    /// A failing effect feeds its follow-up event back in and skips the rest
    /// of the batch.
    fn dispatch(&mut self, event: SessionEvent) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let before = self.session.state().clone();
            let effects = self.session.apply(event.clone());
            debug!(
                "Session {}: {:?} --{:?}--> {:?}",
                self.session_id,
                before,
                event,
                self.session.state()
            );

            for effect in effects {
                if let Some(follow_up) = self.execute(effect) {
                    queue.push_back(follow_up);
                    break;
                }
            }

            if !before.is_stopped() {
                if let Some(outcome) = self.session.state().outcome() {
                    log_outcome(&self.session_id, outcome);
                }
            }
        }

        self.state_tx.send_replace(self.session.state().clone());
    }

    fn execute(&mut self, effect: Effect) -> Option<SessionEvent> {
        match effect {
            Effect::RequestPermission { epoch } => {
                self.request_permission(epoch);
                None
            }
            Effect::StartDevice => {
                let output_name =
                    format!("{}_audio_{}.wav", self.output_prefix, Uuid::new_v4().simple());

                let started = match self.device.as_mut() {
                    Some(device) => device.start(&output_name),
                    None => {
                        warn!("Audio device already released");
                        false
                    }
                };

                if started {
                    info!("Recording {} started: {}", self.session_id, output_name);
                    None
                } else {
                    error!("Failed to start recording for {}", self.session_id);
                    Some(SessionEvent::DeviceStartFailed)
                }
            }
            Effect::StartTimer => {
                self.timer = Some(time::interval_at(
                    Instant::now() + TICK_INTERVAL,
                    TICK_INTERVAL,
                ));
                None
            }
            Effect::CancelTimer => {
                self.timer = None;
                None
            }
            Effect::StopDevice { keep_output } => {
                let Some(device) = self.device.as_mut() else {
                    return None;
                };

                let output = device.stop();
                if keep_output {
                    self.session.attach_audio(output);
                } else if let Some(path) = output {
                    device.discard(&path);
                }
                None
            }
            Effect::DiscardOutput { path } => {
                if let Some(device) = self.device.as_mut() {
                    device.discard(&path);
                }
                None
            }
            Effect::ReleaseDevice => {
                self.release_device();
                None
            }
        }
    }

    fn request_permission(&mut self, epoch: u64) {
        if let Some(previous) = self.pending_permission.take() {
            previous.task.abort();
        }

        info!("Requesting microphone permission for {}", self.session_id);

        let (tx, rx) = oneshot::channel();
        let gate = Arc::clone(&self.permissions);
        let task = tokio::spawn(async move {
            let granted = gate.request().await;
            let _ = tx.send(granted);
        });

        self.pending_permission = Some(PendingPermission {
            epoch,
            decision: rx,
            task,
        });
    }

    fn release_device(&mut self) {
        self.timer = None;

        if let Some(pending) = self.pending_permission.take() {
            pending.task.abort();
        }

        if let Some(mut device) = self.device.take() {
            info!(
                "Releasing audio device {} for {}",
                device.name(),
                self.session_id
            );
            device.release();
        }
    }
}

impl Drop for RecordingSessionController {
    fn drop(&mut self) {
        if self.device.is_some() {
            warn!("Session {} dropped without dispose", self.session_id);
            self.release_device();
        }
    }
}

fn log_outcome(session_id: &str, outcome: &SessionOutcome) {
    if outcome.is_valid() {
        info!("Session {}: {}", session_id, outcome.message());
    } else {
        warn!("Session {}: {}", session_id, outcome.message());
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_decision(pending: &mut Option<PendingPermission>) -> (u64, bool) {
    match pending {
        Some(pending) => {
            // Sender dropped without answering: treat as denied
            let granted = (&mut pending.decision).await.unwrap_or(false);
            (pending.epoch, granted)
        }
        None => std::future::pending().await,
    }
}

/// Cloneable handle to a running controller
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    commands: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Begin press-and-hold
    ///
    /// Gestures return the state after the controller has applied them.
    pub async fn press(&self) -> Result<SessionState, SessionError> {
        self.gesture(Gesture::Press).await
    }

    pub async fn release(&self) -> Result<SessionState, SessionError> {
        self.gesture(Gesture::Release).await
    }

    pub async fn cancel(&self) -> Result<SessionState, SessionError> {
        self.gesture(Gesture::Cancel).await
    }

    /// Re-arm a stopped session for another attempt
    ///
    /// A valid recording from the previous attempt is discarded.
    pub async fn reset(&self) -> Result<SessionState, SessionError> {
        self.gesture(Gesture::Reset).await
    }

    /// Unmount: release the device and stop the controller
    ///
    /// Returns once the device has been released. A capture still running
    /// is stopped and discarded; a finished valid recording is kept.
    /// Use `abandon` to drop that as well.
    pub async fn dispose(&self) -> Result<(), SessionError> {
        let (ack, done) = oneshot::channel();
        self.send(SessionCommand::Dispose { ack }).await?;
        done.await.map_err(|_| self.closed())
    }

    /// Unmount without submitting: discard any kept recording, then dispose
    pub async fn abandon(&self) -> Result<(), SessionError> {
        self.reset().await?;
        self.dispose().await
    }

    /// Latest published state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Wait until the session reaches a state matching `predicate`
    pub async fn wait_for<F>(&self, predicate: F) -> Result<SessionState, SessionError>
    where
        F: Fn(&SessionState) -> bool,
    {
        let mut state = self.state.clone();
        loop {
            let current = state.borrow_and_update().clone();
            if predicate(&current) {
                return Ok(current);
            }
            state.changed().await.map_err(|_| self.closed())?;
        }
    }

    /// Wait for the session to stop and return its outcome
    pub async fn wait_for_outcome(&self) -> Result<SessionOutcome, SessionError> {
        let stopped = self.wait_for(SessionState::is_stopped).await?;
        stopped.outcome().cloned().ok_or_else(|| self.closed())
    }

    async fn gesture(&self, gesture: Gesture) -> Result<SessionState, SessionError> {
        let (applied, state) = oneshot::channel();
        self.send(SessionCommand::Gesture { gesture, applied }).await?;
        state.await.map_err(|_| self.closed())
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| self.closed())
    }

    fn closed(&self) -> SessionError {
        SessionError::Closed(self.session_id.clone())
    }
}
