//! POS Scanner - Camera barcode scanning for the POS client.
//!
//! This crate turns a camera and a barcode decoder, both supplied by the
//! host platform, into a scan session that yields exactly one outcome:
//! a normalized JAN/EAN code, a classified error, or a cancellation.
//!
//! # Features
//!
//! - Per-device camera constraint fallback (desktop, mobile, Apple mobile)
//! - EAN-13 / EAN-8 validation with UPC-A to EAN-13 conversion
//! - Configurable scan timeout and optional decode attempt cap
//! - Guaranteed camera and decoder release on every exit path
//! - Table-driven classification of platform camera errors
//!
//! # Example
//!
//! ```rust,ignore
//! use pos_scanner::{DeviceHints, DeviceProfile, ScanConfig, ScanCoordinator, ScanOutcome};
//! use std::sync::Arc;
//!
//! let coordinator = ScanCoordinator::new(Arc::new(camera), Arc::new(decoder));
//! let profile = DeviceProfile::detect(&hints);
//! let handle = coordinator
//!     .start_scan(ScanConfig::from_timeout_ms(15_000, profile))
//!     .await;
//!
//! match handle.outcome().await {
//!     ScanOutcome::Success { code } => println!("scanned {code}"),
//!     ScanOutcome::Error { message, .. } => eprintln!("{message}"),
//!     ScanOutcome::Cancelled => {}
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod camera;
pub mod coordinator;
pub mod decoder;
pub mod device;
pub mod error;
pub mod payload;
pub mod session;

// Re-export commonly used types
pub use camera::{CameraBackend, CameraSession, CameraSessionManager, MediaStream};
pub use coordinator::{ScanCoordinator, ScanHandle};
pub use decoder::{DecodeAttempt, DecoderAttachment, FrameDecoder, FrameEvent, FrameSink};
pub use device::{
    CameraConstraintProfile, DeviceHints, DeviceProfile, DimensionRange, FacingMode,
    MediaConstraints,
};
pub use error::{classify_platform_error, AcquisitionFailure, CameraError, ScanErrorKind};
pub use payload::{normalize_payload, DecodedPayload};
pub use session::{ScanConfig, ScanOutcome, ScanSnapshot, ScanStatus, STRUGGLE_HINT};
