//! Error classification for the scanning subsystem.
//!
//! Platform camera failures arrive as a named error (the media API's
//! exception name) plus free text. They are mapped through a static table
//! onto the small set of [`ScanErrorKind`]s shown to the user.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// User-facing classification of a failed scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanErrorKind {
    /// The user or platform refused camera access
    PermissionDenied,
    /// No camera is attached
    DeviceNotFound,
    /// The camera exists but another application holds it
    DeviceBusy,
    /// The environment cannot provide a camera stream at all
    Unsupported,
    /// No valid barcode was read in time
    Timeout,
    /// Anything not covered above
    Other,
}

impl ScanErrorKind {
    /// Human-readable message shown instead of the raw platform error.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Camera access was denied. Allow camera access in your browser settings and try again."
            }
            Self::DeviceNotFound => {
                "No camera was found. Check that a camera is connected to this device."
            }
            Self::DeviceBusy => {
                "The camera is being used by another application. Close it and try again."
            }
            Self::Unsupported => {
                "Camera access is not supported here. Check that the page is served over HTTPS."
            }
            Self::Timeout => "Scan timed out. Check the barcode and try again.",
            Self::Other => "A camera error occurred. Try again or enter the code manually.",
        }
    }

    /// Whether trying the next set of constraints could help.
    ///
    /// A refused permission fails the same way for every candidate and
    /// would re-prompt the user on some platforms.
    #[must_use]
    pub fn allows_fallback(self) -> bool {
        self != Self::PermissionDenied
    }
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PermissionDenied => "permission denied",
            Self::DeviceNotFound => "device not found",
            Self::DeviceBusy => "device busy",
            Self::Unsupported => "unsupported",
            Self::Timeout => "timeout",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Platform error names and their classification. Unlisted names are `Other`.
const PLATFORM_ERRORS: &[(&str, ScanErrorKind)] = &[
    ("NotAllowedError", ScanErrorKind::PermissionDenied),
    ("PermissionDeniedError", ScanErrorKind::PermissionDenied),
    ("SecurityError", ScanErrorKind::PermissionDenied),
    ("NotFoundError", ScanErrorKind::DeviceNotFound),
    ("DevicesNotFoundError", ScanErrorKind::DeviceNotFound),
    ("NotReadableError", ScanErrorKind::DeviceBusy),
    ("TrackStartError", ScanErrorKind::DeviceBusy),
    ("AbortError", ScanErrorKind::DeviceBusy),
    ("NotSupportedError", ScanErrorKind::Unsupported),
    ("OverconstrainedError", ScanErrorKind::Unsupported),
    ("ConstraintNotSatisfiedError", ScanErrorKind::Unsupported),
    ("TypeError", ScanErrorKind::Unsupported),
];

/// Classify a platform error name. Total: unknown names map to `Other`.
#[must_use]
pub fn classify_platform_error(name: &str) -> ScanErrorKind {
    PLATFORM_ERRORS
        .iter()
        .find(|(known, _)| *known == name)
        .map_or(ScanErrorKind::Other, |(_, kind)| *kind)
}

/// A single failed attempt to open the camera or attach the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct CameraError {
    /// Platform error name, e.g. `NotAllowedError`
    pub name: String,
    /// Platform error text; logged, never shown to the user
    pub message: String,
}

impl CameraError {
    /// Create a new camera error.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Classification of this error.
    #[must_use]
    pub fn kind(&self) -> ScanErrorKind {
        classify_platform_error(&self.name)
    }
}

/// Every constraint candidate failed (or a non-retriable failure stopped
/// the fallback early).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("camera acquisition failed ({kind}) after {attempts} attempt(s): {last}")]
pub struct AcquisitionFailure {
    /// Classification of `last`
    pub kind: ScanErrorKind,
    /// Number of constraint sets tried
    pub attempts: usize,
    /// The final underlying error
    pub last: CameraError,
}

impl AcquisitionFailure {
    pub(crate) fn from_last(last: CameraError, attempts: usize) -> Self {
        Self {
            kind: last.kind(),
            attempts,
            last,
        }
    }
}

/// Result type alias for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        assert_eq!(
            classify_platform_error("NotAllowedError"),
            ScanErrorKind::PermissionDenied
        );
        assert_eq!(
            classify_platform_error("NotFoundError"),
            ScanErrorKind::DeviceNotFound
        );
        assert_eq!(
            classify_platform_error("NotReadableError"),
            ScanErrorKind::DeviceBusy
        );
        assert_eq!(
            classify_platform_error("NotSupportedError"),
            ScanErrorKind::Unsupported
        );
    }

    #[test]
    fn test_classification_defaults_to_other() {
        for name in ["", "notallowederror", "NetworkError", "Error", "InternalError"] {
            assert_eq!(classify_platform_error(name), ScanErrorKind::Other, "{name:?}");
        }
    }

    #[test]
    fn test_table_never_yields_timeout() {
        assert!(PLATFORM_ERRORS
            .iter()
            .all(|(_, kind)| *kind != ScanErrorKind::Timeout));
    }

    #[test]
    fn test_messages_do_not_leak_platform_text() {
        let err = CameraError::new("NotAllowedError", "Permission denied by system");
        let message = err.kind().message();
        assert!(!message.contains("NotAllowedError"));
        assert!(!message.contains("system"));
    }

    #[test]
    fn test_fallback_policy() {
        assert!(!ScanErrorKind::PermissionDenied.allows_fallback());
        assert!(ScanErrorKind::Unsupported.allows_fallback());
        assert!(ScanErrorKind::DeviceBusy.allows_fallback());
        assert!(ScanErrorKind::DeviceNotFound.allows_fallback());
        assert!(ScanErrorKind::Other.allows_fallback());
    }

    #[test]
    fn test_acquisition_failure_display() {
        let failure = AcquisitionFailure::from_last(CameraError::new("NotFoundError", "none"), 3);
        assert_eq!(failure.kind, ScanErrorKind::DeviceNotFound);
        assert_eq!(
            failure.to_string(),
            "camera acquisition failed (device not found) after 3 attempt(s): NotFoundError: none"
        );
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ScanErrorKind::PermissionDenied).expect("serialize");
        assert_eq!(json, "\"permission_denied\"");
    }
}
