//! Camera session management.
//!
//! [`CameraSessionManager::acquire`] walks a constraint profile until the
//! platform hands back a stream. The resulting [`CameraSession`] owns that
//! stream and stops its tracks exactly once, either on an explicit
//! [`CameraSession::release`] or when dropped.

use crate::device::{CameraConstraintProfile, MediaConstraints};
use crate::error::{AcquisitionFailure, CameraError, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A live camera stream handed out by the platform.
pub trait MediaStream: Send + Sync {
    /// Platform identifier of the stream.
    fn id(&self) -> &str;

    /// Stop every track in the stream, turning the camera off.
    fn stop_tracks(&mut self);
}

/// Platform media API: opens a camera stream for one constraint set.
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Open a stream matching `constraints`.
    ///
    /// May wait indefinitely while the user answers a permission prompt.
    ///
    /// # Errors
    /// Returns the platform error when no stream can be opened.
    async fn open(&self, constraints: &MediaConstraints) -> Result<Box<dyn MediaStream>>;
}

/// Exclusive ownership of one acquired stream.
pub struct CameraSession {
    stream: Option<Box<dyn MediaStream>>,
    constraints: MediaConstraints,
}

impl CameraSession {
    fn new(stream: Box<dyn MediaStream>, constraints: MediaConstraints) -> Self {
        Self {
            stream: Some(stream),
            constraints,
        }
    }

    /// The stream, until it is released.
    #[must_use]
    pub fn stream(&self) -> Option<&dyn MediaStream> {
        self.stream.as_deref()
    }

    /// The constraint set that produced this stream.
    #[must_use]
    pub fn constraints(&self) -> &MediaConstraints {
        &self.constraints
    }

    /// Whether the stream is still running.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.stream.is_some()
    }

    /// Stop all tracks. Safe to call repeatedly; only the first call stops.
    ///
    /// Returns `true` if this call released the stream.
    pub fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                stream.stop_tracks();
                tracing::debug!("Released camera stream {}", stream.id());
                true
            }
            None => false,
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraSession")
            .field("stream", &self.stream.as_ref().map(|s| s.id().to_string()))
            .field("constraints", &self.constraints.label())
            .finish()
    }
}

/// Negotiates constraints with a [`CameraBackend`].
#[derive(Clone)]
pub struct CameraSessionManager {
    backend: Arc<dyn CameraBackend>,
}

impl CameraSessionManager {
    /// Create a manager over a platform backend.
    #[must_use]
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        Self { backend }
    }

    /// Open the first stream any candidate in `profile` yields.
    ///
    /// Candidates are tried in order. A permission refusal ends the search
    /// at once; every other failure moves on to the next candidate.
    ///
    /// # Errors
    /// Returns the classified last failure when no candidate succeeds.
    pub async fn acquire(
        &self,
        profile: &CameraConstraintProfile,
    ) -> std::result::Result<CameraSession, AcquisitionFailure> {
        let mut last_error = None;
        let mut attempts = 0;

        for constraints in profile.candidates() {
            attempts += 1;
            match self.backend.open(constraints).await {
                Ok(stream) => {
                    tracing::debug!(
                        "Opened camera stream {} with {} (attempt {}/{})",
                        stream.id(),
                        constraints.label(),
                        attempts,
                        profile.len()
                    );
                    return Ok(CameraSession::new(stream, constraints.clone()));
                }
                Err(e) => {
                    tracing::warn!(
                        "Camera open failed with {} (attempt {}/{}): {}",
                        constraints.label(),
                        attempts,
                        profile.len(),
                        e
                    );
                    let stop = !e.kind().allows_fallback();
                    last_error = Some(e);
                    if stop {
                        break;
                    }
                }
            }
        }

        let last = last_error.unwrap_or_else(|| {
            CameraError::new("NotSupportedError", "no camera constraints to try")
        });
        Err(AcquisitionFailure::from_last(last, attempts))
    }
}

impl fmt::Debug for CameraSessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraSessionManager").finish_non_exhaustive()
    }
}
