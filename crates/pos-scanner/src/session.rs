//! One scan session: camera acquisition, decode loop and teardown.
//!
//! A session walks `Idle → Requesting → Streaming` and ends in exactly one
//! of `Completed`, `Failed`, `TimedOut` or `Cancelled`. Whatever the exit,
//! the decoder is detached and the camera released before the outcome is
//! sent, and nothing is sent twice.

use crate::camera::{CameraSession, CameraSessionManager};
use crate::decoder::{DecodeAttempt, DecoderSession, FrameDecoder, FrameEvent, FrameSink};
use crate::device::DeviceProfile;
use crate::error::ScanErrorKind;
use crate::payload::DecodedPayload;
use chrono::{DateTime, Utc};
use pos_core::{ProductCode, ScannerConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Shown while the decoder keeps failing on frames it can see.
pub const STRUGGLE_HINT: &str =
    "Barcode is hard to read. Align it inside the frame and try again in a brighter place.";

/// Lifecycle state of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// No session has been requested
    #[default]
    Idle,
    /// Waiting for the camera (possibly on a permission prompt)
    Requesting,
    /// Camera live, decoder running, timer armed
    Streaming,
    /// A valid code was read
    Completed,
    /// The camera could not be acquired
    Failed,
    /// Nothing valid was read in time
    TimedOut,
    /// Stopped by the user or superseded by a new scan
    Cancelled,
}

impl ScanStatus {
    /// Terminal states are absorbing.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::TimedOut | Self::Cancelled
        )
    }
}

/// Terminal result of a scan session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// A validated, normalized product code
    Success {
        /// The code
        code: ProductCode,
    },
    /// The session failed; `message` is safe to show the user
    Error {
        /// Classification
        kind: ScanErrorKind,
        /// Human-readable explanation
        message: String,
    },
    /// The session was cancelled
    Cancelled,
}

impl ScanOutcome {
    /// Error outcome carrying the standard message for `kind`.
    #[must_use]
    pub fn error(kind: ScanErrorKind) -> Self {
        Self::Error {
            kind,
            message: kind.message().to_string(),
        }
    }

    /// Terminal status this outcome corresponds to.
    #[must_use]
    pub fn status(&self) -> ScanStatus {
        match self {
            Self::Success { .. } => ScanStatus::Completed,
            Self::Error {
                kind: ScanErrorKind::Timeout,
                ..
            } => ScanStatus::TimedOut,
            Self::Error { .. } => ScanStatus::Failed,
            Self::Cancelled => ScanStatus::Cancelled,
        }
    }

    /// The code, for successful outcomes.
    #[must_use]
    pub fn code(&self) -> Option<&ProductCode> {
        match self {
            Self::Success { code } => Some(code),
            _ => None,
        }
    }
}

/// Per-session scan settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// How long a streaming session may run before timing out
    pub timeout: Duration,
    /// Device class, which selects camera constraints
    pub device_profile: DeviceProfile,
    /// Optional cap on decode attempts; reaching it times the session out
    pub max_attempts: Option<u32>,
    /// Decode failures start producing a hint after this many attempts
    pub hint_after_attempts: u32,
    /// ...and then every this many attempts
    pub hint_every_attempts: u32,
}

impl ScanConfig {
    /// Settings with the given timeout (`timeoutMs`) and device profile.
    #[must_use]
    pub fn new(timeout: Duration, device_profile: DeviceProfile) -> Self {
        let defaults = ScannerConfig::default();
        Self {
            timeout,
            device_profile,
            max_attempts: defaults.max_attempts,
            hint_after_attempts: defaults.hint_after_attempts,
            hint_every_attempts: defaults.hint_every_attempts,
        }
    }

    /// Same as [`ScanConfig::new`] with the timeout given in milliseconds.
    #[must_use]
    pub fn from_timeout_ms(timeout_ms: u64, device_profile: DeviceProfile) -> Self {
        Self::new(Duration::from_millis(timeout_ms), device_profile)
    }

    /// Resolve settings for a device from the application configuration.
    #[must_use]
    pub fn from_scanner_config(config: &ScannerConfig, device_profile: DeviceProfile) -> Self {
        Self {
            timeout: config.timeout(device_profile.is_mobile()),
            device_profile,
            max_attempts: config.max_attempts,
            hint_after_attempts: config.hint_after_attempts,
            hint_every_attempts: config.hint_every_attempts.max(1),
        }
    }

    /// Set the decode attempt cap.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the struggle hint thresholds.
    #[must_use]
    pub fn with_hint_thresholds(mut self, after: u32, every: u32) -> Self {
        self.hint_after_attempts = after;
        self.hint_every_attempts = every.max(1);
        self
    }
}

/// Observable progress of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanSnapshot {
    /// Session this snapshot belongs to
    pub session_id: Option<Uuid>,
    /// Current state
    pub status: ScanStatus,
    /// Decode attempts processed so far
    pub attempts: u32,
    /// Elapsed share of the timeout, 0-100
    pub progress_percent: u8,
    /// Non-terminal guidance for the user
    pub hint: Option<String>,
}

pub(crate) struct ScanSession {
    id: Uuid,
    generation: u64,
    started_at: DateTime<Utc>,
    config: ScanConfig,
    status: ScanStatus,
    attempt_count: u32,
    outcome_emitted: bool,
    streaming_since: Option<Instant>,
    hint: Option<String>,
    camera: Option<CameraSession>,
    decoder: Option<DecoderSession>,
    outcome_tx: Option<oneshot::Sender<ScanOutcome>>,
    snapshot_tx: watch::Sender<ScanSnapshot>,
}

impl ScanSession {
    pub(crate) fn new(
        generation: u64,
        config: ScanConfig,
        outcome_tx: oneshot::Sender<ScanOutcome>,
    ) -> Self {
        let id = Uuid::new_v4();
        let (snapshot_tx, _) = watch::channel(ScanSnapshot {
            session_id: Some(id),
            ..ScanSnapshot::default()
        });

        Self {
            id,
            generation,
            started_at: Utc::now(),
            config,
            status: ScanStatus::Idle,
            attempt_count: 0,
            outcome_emitted: false,
            streaming_since: None,
            hint: None,
            camera: None,
            decoder: None,
            outcome_tx: Some(outcome_tx),
            snapshot_tx,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ScanSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Drive the session to its terminal state.
    pub(crate) async fn run(
        mut self,
        cameras: &CameraSessionManager,
        decoder: &dyn FrameDecoder,
        cancel: CancellationToken,
    ) -> ScanStatus {
        tracing::debug!(
            "Scan session {} (generation {}) requested on {} at {}",
            self.id,
            self.generation,
            self.config.device_profile,
            self.started_at.to_rfc3339()
        );
        self.outcome_emitted = false;
        self.transition(ScanStatus::Requesting);

        let profile = self.config.device_profile.constraint_profile();
        let acquired = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = cameras.acquire(&profile) => Some(result),
        };

        let camera = match acquired {
            None => return self.finish(ScanOutcome::Cancelled),
            Some(Err(failure)) => {
                tracing::warn!("Scan session {} could not start: {}", self.id, failure);
                return self.finish(ScanOutcome::error(failure.kind));
            }
            Some(Ok(camera)) => camera,
        };
        self.camera = Some(camera);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = FrameSink::new(self.generation, tx);
        let attached = self
            .camera
            .as_ref()
            .and_then(CameraSession::stream)
            .map(|stream| decoder.attach(stream, sink));
        match attached {
            Some(Ok(attachment)) => self.decoder = Some(DecoderSession::new(attachment)),
            Some(Err(e)) => {
                tracing::warn!("Scan session {} decoder attach failed: {}", self.id, e);
                return self.finish(ScanOutcome::error(e.kind()));
            }
            None => return self.finish(ScanOutcome::error(ScanErrorKind::Other)),
        }

        self.streaming_since = Some(Instant::now());
        self.transition(ScanStatus::Streaming);

        let timer = tokio::time::sleep(self.config.timeout);
        tokio::pin!(timer);

        let outcome = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break ScanOutcome::Cancelled,
                () = &mut timer => break ScanOutcome::error(ScanErrorKind::Timeout),
                event = rx.recv() => match event {
                    Some(event) => {
                        if let Some(outcome) = self.on_frame(event) {
                            break outcome;
                        }
                    }
                    None => {
                        tracing::warn!("Scan session {} lost its decoder", self.id);
                        break ScanOutcome::error(ScanErrorKind::Other);
                    }
                },
            }
        };

        // Late frames must fail at the sink from here on.
        rx.close();
        self.finish(outcome)
    }

    /// Handle one decoder event. Returns an outcome when the session should end.
    pub(crate) fn on_frame(&mut self, event: FrameEvent) -> Option<ScanOutcome> {
        if self.outcome_emitted || event.generation != self.generation {
            tracing::trace!(
                "Discarding frame from generation {} in session {}",
                event.generation,
                self.id
            );
            return None;
        }

        self.attempt_count += 1;

        match event.attempt {
            DecodeAttempt::Decoded(raw) => {
                let payload = DecodedPayload::inspect(raw);
                if let Some(code) = payload.normalized {
                    tracing::debug!(
                        "Scan session {} read {} as {} after {} attempt(s)",
                        self.id,
                        payload.raw,
                        code,
                        self.attempt_count
                    );
                    return Some(ScanOutcome::Success { code });
                }
                tracing::debug!(
                    "Ignoring payload {:?} (length {}, digits only: {})",
                    payload.raw,
                    payload.len,
                    payload.digits_only
                );
            }
            DecodeAttempt::NoMatch => {}
            DecodeAttempt::Failed(reason) => {
                tracing::debug!(
                    "Decode error in session {} (attempt {}): {}",
                    self.id,
                    self.attempt_count,
                    reason
                );
                if self.attempt_count > self.config.hint_after_attempts
                    && self.attempt_count % self.config.hint_every_attempts.max(1) == 0
                {
                    self.hint = Some(STRUGGLE_HINT.to_string());
                }
            }
        }

        if self
            .config
            .max_attempts
            .is_some_and(|max| self.attempt_count >= max)
        {
            tracing::debug!(
                "Scan session {} reached {} attempts",
                self.id,
                self.attempt_count
            );
            return Some(ScanOutcome::error(ScanErrorKind::Timeout));
        }

        self.publish();
        None
    }

    /// Tear down, then emit `outcome`. A second call is a no-op.
    fn finish(&mut self, outcome: ScanOutcome) -> ScanStatus {
        if self.outcome_emitted {
            return self.status;
        }
        self.outcome_emitted = true;
        self.teardown();

        let status = outcome.status();
        tracing::info!(
            "Scan session {} ended {:?} after {} attempt(s)",
            self.id,
            status,
            self.attempt_count
        );
        self.transition(status);

        if let Some(tx) = self.outcome_tx.take() {
            // Receiver may have been dropped by a caller that stopped waiting.
            let _ = tx.send(outcome);
        }
        status
    }

    fn teardown(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            decoder.release();
        }
        if let Some(mut camera) = self.camera.take() {
            camera.release();
        }
    }

    fn transition(&mut self, status: ScanStatus) {
        tracing::debug!("Scan session {}: {:?} -> {:?}", self.id, self.status, status);
        self.status = status;
        self.publish();
    }

    fn progress_percent(&self) -> u8 {
        if self.status == ScanStatus::Completed {
            return 100;
        }
        let Some(since) = self.streaming_since else {
            return 0;
        };
        let total = self.config.timeout.as_millis().max(1);
        let elapsed = since.elapsed().as_millis().min(total);
        u8::try_from(elapsed * 100 / total).unwrap_or(100)
    }

    fn publish(&self) {
        let snapshot = ScanSnapshot {
            session_id: Some(self.id),
            status: self.status,
            attempts: self.attempt_count,
            progress_percent: self.progress_percent(),
            hint: self.hint.clone(),
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}
