//! Validation and normalization of raw decoder output.
//!
//! Accepted payloads:
//! - 13 or 8 ASCII digits (EAN-13 / EAN-8): unchanged
//! - 12 ASCII digits (UPC-A): prefixed with `0` to form an EAN-13
//!
//! Anything else is rejected without ending the scan.

use pos_core::ProductCode;

/// A raw decoder result together with the fields derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Text exactly as the decoder reported it
    pub raw: String,
    /// Length in characters
    pub len: usize,
    /// Every character is an ASCII digit (and there is at least one)
    pub digits_only: bool,
    /// The code to emit, if the payload is acceptable
    pub normalized: Option<ProductCode>,
}

impl DecodedPayload {
    /// Derive length, digit flag and normalized code from a raw string.
    #[must_use]
    pub fn inspect(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let len = raw.chars().count();
        let digits_only = !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit());
        let normalized = if digits_only { normalize_digits(&raw, len) } else { None };

        Self {
            raw,
            len,
            digits_only,
            normalized,
        }
    }

    /// Whether the payload yields a code.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.normalized.is_some()
    }
}

fn normalize_digits(digits: &str, len: usize) -> Option<ProductCode> {
    let code = match len {
        8 | 13 => digits.to_string(),
        12 => format!("0{digits}"),
        _ => return None,
    };
    ProductCode::new(code).ok()
}

/// Shorthand for `DecodedPayload::inspect(raw).normalized`.
#[must_use]
pub fn normalize_payload(raw: &str) -> Option<ProductCode> {
    DecodedPayload::inspect(raw).normalized
}
