//! Device classification and camera constraint profiles.
//!
//! The device profile is computed once, from explicit hints, when a scan is
//! requested. Each profile maps to an ordered list of constraint sets that
//! the camera session manager tries from most to least demanding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Viewports at or below this width are treated as phones.
pub const MOBILE_MAX_VIEWPORT_WIDTH: u32 = 640;

/// What the host tells us about the device before a scan starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceHints {
    /// Layout viewport width in CSS pixels
    pub viewport_width: u32,
    /// Browser user agent string (may be empty)
    pub user_agent: String,
}

/// Device class used to pick camera constraints and the scan timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceProfile {
    /// Laptop or desktop webcam
    #[default]
    Desktop,
    /// Phone or tablet
    Mobile,
    /// iPhone / iPad / iPod, whose camera stack rejects advanced constraints
    AppleMobile,
}

impl DeviceProfile {
    /// Classify a device from its hints.
    #[must_use]
    pub fn detect(hints: &DeviceHints) -> Self {
        let ua = hints.user_agent.as_str();
        if ["iPhone", "iPad", "iPod"].iter().any(|marker| ua.contains(marker)) {
            return Self::AppleMobile;
        }
        if hints.viewport_width <= MOBILE_MAX_VIEWPORT_WIDTH
            || ua.contains("Android")
            || ua.contains("Mobi")
        {
            return Self::Mobile;
        }
        Self::Desktop
    }

    /// Phones and tablets, Apple or not.
    #[must_use]
    pub fn is_mobile(self) -> bool {
        !matches!(self, Self::Desktop)
    }

    /// Ordered constraint candidates for this device class.
    #[must_use]
    pub fn constraint_profile(self) -> CameraConstraintProfile {
        let candidates = match self {
            Self::Desktop => vec![
                MediaConstraints::environment(1920, 1080)
                    .with_max(2560, 1440)
                    .with_aspect_ratio(16.0 / 9.0)
                    .with_continuous_adjustment(),
                MediaConstraints::environment(1280, 720),
                MediaConstraints::any_camera(),
            ],
            Self::Mobile => vec![
                MediaConstraints::environment(1280, 720)
                    .with_max(1920, 1080)
                    .with_aspect_ratio(16.0 / 9.0)
                    .with_continuous_adjustment(),
                MediaConstraints::environment(640, 480),
                MediaConstraints::any_camera(),
            ],
            Self::AppleMobile => vec![
                MediaConstraints::environment(1280, 720),
                MediaConstraints {
                    facing_mode: Some(FacingMode::Environment),
                    ..MediaConstraints::any_camera()
                },
                MediaConstraints::any_camera(),
            ],
        };
        CameraConstraintProfile::new(candidates)
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::AppleMobile => "apple-mobile",
        };
        f.write_str(name)
    }
}

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera
    Environment,
    /// Selfie camera
    User,
}

/// An ideal dimension with an optional hard maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionRange {
    /// Preferred value in pixels
    pub ideal: u32,
    /// Upper bound in pixels
    pub max: Option<u32>,
}

/// One candidate set of media constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaConstraints {
    /// Requested camera direction; `None` accepts any
    pub facing_mode: Option<FacingMode>,
    /// Frame width
    pub width: Option<DimensionRange>,
    /// Frame height
    pub height: Option<DimensionRange>,
    /// Ideal width / height ratio
    pub aspect_ratio: Option<f64>,
    /// Request continuous autofocus
    pub continuous_focus: bool,
    /// Request continuous exposure adjustment
    pub continuous_exposure: bool,
}

impl MediaConstraints {
    /// No requirements at all: whatever video device the platform offers.
    #[must_use]
    pub fn any_camera() -> Self {
        Self {
            facing_mode: None,
            width: None,
            height: None,
            aspect_ratio: None,
            continuous_focus: false,
            continuous_exposure: false,
        }
    }

    /// Rear camera at an ideal resolution.
    #[must_use]
    pub fn environment(width: u32, height: u32) -> Self {
        Self {
            facing_mode: Some(FacingMode::Environment),
            width: Some(DimensionRange {
                ideal: width,
                max: None,
            }),
            height: Some(DimensionRange {
                ideal: height,
                max: None,
            }),
            ..Self::any_camera()
        }
    }

    /// Add hard maxima to the requested dimensions.
    #[must_use]
    pub fn with_max(mut self, max_width: u32, max_height: u32) -> Self {
        if let Some(width) = self.width.as_mut() {
            width.max = Some(max_width);
        }
        if let Some(height) = self.height.as_mut() {
            height.max = Some(max_height);
        }
        self
    }

    /// Set the ideal aspect ratio.
    #[must_use]
    pub fn with_aspect_ratio(mut self, ratio: f64) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Ask for continuous focus and exposure.
    #[must_use]
    pub fn with_continuous_adjustment(mut self) -> Self {
        self.continuous_focus = true;
        self.continuous_exposure = true;
        self
    }

    /// Short description for logs, e.g. `environment 1280x720`.
    #[must_use]
    pub fn label(&self) -> String {
        let facing = match self.facing_mode {
            Some(FacingMode::Environment) => "environment",
            Some(FacingMode::User) => "user",
            None => "any",
        };
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{facing} {}x{}", w.ideal, h.ideal),
            _ => facing.to_string(),
        }
    }
}

/// Ordered, immutable list of constraint candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConstraintProfile {
    candidates: Arc<[MediaConstraints]>,
}

impl CameraConstraintProfile {
    /// Build a profile from candidates in preference order.
    #[must_use]
    pub fn new(candidates: Vec<MediaConstraints>) -> Self {
        Self {
            candidates: candidates.into(),
        }
    }

    /// Candidates in the order they are tried.
    #[must_use]
    pub fn candidates(&self) -> &[MediaConstraints] {
        &self.candidates
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether there is nothing to try.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
