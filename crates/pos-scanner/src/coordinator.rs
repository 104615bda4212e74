//! Scan coordinator: the public entry point of the scanning subsystem.
//!
//! The coordinator owns at most one live session. Starting a scan cancels
//! and awaits the teardown of any previous session before the camera is
//! requested again, so two sessions never hold a stream at the same time.

use crate::camera::{CameraBackend, CameraSessionManager};
use crate::decoder::FrameDecoder;
use crate::error::ScanErrorKind;
use crate::session::{ScanConfig, ScanOutcome, ScanSession, ScanSnapshot, ScanStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct ActiveScan {
    session_id: Uuid,
    cancel: CancellationToken,
    task: JoinHandle<ScanStatus>,
}

impl ActiveScan {
    /// Cancel and wait until the session has released its resources.
    ///
    /// Returns `true` if the session was still running.
    async fn stop(self) -> bool {
        let was_running = !self.task.is_finished();
        self.cancel.cancel();
        match self.task.await {
            Ok(status) => {
                tracing::debug!("Scan session {} stopped as {:?}", self.session_id, status);
            }
            Err(e) => {
                tracing::error!("Scan session {} task failed: {}", self.session_id, e);
            }
        }
        was_running
    }
}

/// Subscription to one scan session.
#[derive(Debug)]
pub struct ScanHandle {
    session_id: Uuid,
    outcome: oneshot::Receiver<ScanOutcome>,
    snapshots: watch::Receiver<ScanSnapshot>,
}

impl ScanHandle {
    /// Identifier of the session.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Progress updates for the session.
    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<ScanSnapshot> {
        self.snapshots.clone()
    }

    /// Wait for the terminal outcome.
    ///
    /// The camera has already been released when this resolves.
    pub async fn outcome(self) -> ScanOutcome {
        self.outcome.await.unwrap_or_else(|_| {
            tracing::error!("Scan session {} ended without an outcome", self.session_id);
            ScanOutcome::error(ScanErrorKind::Other)
        })
    }

    /// Invoke `callback` with the outcome once it is available.
    pub fn on_outcome<F>(self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(ScanOutcome) + Send + 'static,
    {
        tokio::spawn(async move { callback(self.outcome().await) })
    }
}

/// Orchestrates camera acquisition, decoding and timeouts for scan sessions.
pub struct ScanCoordinator {
    cameras: Arc<CameraSessionManager>,
    decoder: Arc<dyn FrameDecoder>,
    active: Mutex<Option<ActiveScan>>,
    latest: std::sync::Mutex<watch::Receiver<ScanSnapshot>>,
    generation: AtomicU64,
}

impl ScanCoordinator {
    /// Create a coordinator over a camera backend and a frame decoder.
    #[must_use]
    pub fn new(camera: Arc<dyn CameraBackend>, decoder: Arc<dyn FrameDecoder>) -> Self {
        let (_, idle) = watch::channel(ScanSnapshot::default());
        Self {
            cameras: Arc::new(CameraSessionManager::new(camera)),
            decoder,
            active: Mutex::new(None),
            latest: std::sync::Mutex::new(idle),
            generation: AtomicU64::new(0),
        }
    }

    /// Start a new scan session.
    ///
    /// Any session still running is cancelled first and its camera released
    /// before the new session requests one.
    pub async fn start_scan(&self, config: ScanConfig) -> ScanHandle {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            if previous.stop().await {
                tracing::info!("Previous scan session superseded by a new request");
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let session = ScanSession::new(generation, config, outcome_tx);
        let session_id = session.id();
        let snapshots = session.subscribe();
        self.set_latest(snapshots.clone());

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let cameras = Arc::clone(&self.cameras);
        let decoder = Arc::clone(&self.decoder);
        let task =
            tokio::spawn(async move { session.run(&cameras, decoder.as_ref(), token).await });

        *active = Some(ActiveScan {
            session_id,
            cancel,
            task,
        });

        ScanHandle {
            session_id,
            outcome: outcome_rx,
            snapshots,
        }
    }

    /// Cancel the current session, waiting for its teardown.
    ///
    /// Returns `false` if there was no running session (cancelling a
    /// finished session is a no-op).
    pub async fn cancel_scan(&self) -> bool {
        let previous = self.active.lock().await.take();
        match previous {
            Some(previous) => previous.stop().await,
            None => false,
        }
    }

    /// State of the most recent session.
    #[must_use]
    pub fn status(&self) -> ScanStatus {
        self.snapshot().status
    }

    /// Latest snapshot of the most recent session.
    #[must_use]
    pub fn snapshot(&self) -> ScanSnapshot {
        match self.latest.lock() {
            Ok(latest) => latest.borrow().clone(),
            Err(poisoned) => poisoned.into_inner().borrow().clone(),
        }
    }

    fn set_latest(&self, snapshots: watch::Receiver<ScanSnapshot>) {
        match self.latest.lock() {
            Ok(mut latest) => *latest = snapshots,
            Err(poisoned) => *poisoned.into_inner() = snapshots,
        }
    }
}

impl Drop for ScanCoordinator {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.cancel.cancel();
        }
    }
}
