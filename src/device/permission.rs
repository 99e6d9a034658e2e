use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::PermissionGate;

/// Permission gate with a fixed answer
#[derive(Debug, Clone, Copy)]
pub struct FixedPermissionGate {
    granted: bool,
}

impl FixedPermissionGate {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }

    pub fn granted() -> Self {
        Self::new(true)
    }

    pub fn denied() -> Self {
        Self::new(false)
    }
}

#[async_trait]
impl PermissionGate for FixedPermissionGate {
    fn has_permission(&self) -> bool {
        self.granted
    }

    async fn request(&self) -> bool {
        self.granted
    }
}

/// Permission gate answered from outside (a user prompt on the client)
///
/// `request()` parks until `resolve()` is called. Every resolution also
/// updates the remembered grant, so a grant that arrives before the request
/// is picked up by the next `has_permission()` check.
#[derive(Debug, Default)]
pub struct PromptPermissionGate {
    granted: AtomicBool,
    pending: Mutex<Option<oneshot::Sender<bool>>>,
}

impl PromptPermissionGate {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            pending: Mutex::new(None),
        }
    }

    /// Deliver the user's decision
    ///
    /// Returns true if a request was waiting for it.
    pub fn resolve(&self, granted: bool) -> bool {
        self.granted.store(granted, Ordering::SeqCst);
        info!("Microphone permission resolved: granted={}", granted);

        match self.pending.lock().take() {
            Some(tx) => tx.send(granted).is_ok(),
            None => false,
        }
    }

    /// Whether a request is currently waiting for a decision
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

#[async_trait]
impl PermissionGate for PromptPermissionGate {
    fn has_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    async fn request(&self) -> bool {
        let (tx, rx) = oneshot::channel();

        // A newer request supersedes an unanswered one
        if self.pending.lock().replace(tx).is_some() {
            debug!("Superseding unanswered permission request");
        }

        // Dropped sender means nobody will answer: treat as denied
        rx.await.unwrap_or(false)
    }
}
