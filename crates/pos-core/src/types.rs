//! Shared types used across the POS client.
//!
//! Product codes are validated newtypes; the product and purchase structs
//! mirror the JSON exchanged with the product/purchase API.

use crate::error::PosError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A JAN/EAN product code: 8 (EAN-8) or 13 (EAN-13) ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductCode(String);

impl ProductCode {
    /// Create a new `ProductCode` from a string.
    ///
    /// # Errors
    /// Returns error if the code is not exactly 8 or 13 ASCII digits.
    pub fn new(code: impl Into<String>) -> Result<Self, PosError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Build a code from free-form keyboard input.
    ///
    /// Every non-digit character is dropped before validation, so
    /// `"4901-6811-43115"` is accepted as `4901681143115`.
    pub fn from_manual_input(input: &str) -> Result<Self, PosError> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        Self::new(digits)
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is an 8-digit EAN-8 code.
    #[must_use]
    pub fn is_ean8(&self) -> bool {
        self.0.len() == 8
    }

    fn validate(code: &str) -> Result<(), PosError> {
        static CODE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = CODE_REGEX
            .get_or_init(|| Regex::new(r"^(?:[0-9]{8}|[0-9]{13})$").expect("valid regex"));

        if regex.is_match(code) {
            Ok(())
        } else {
            Err(PosError::Validation(format!(
                "invalid product code: must be 8 or 13 digits, got '{code}'"
            )))
        }
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ProductCode {
    type Error = PosError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProductCode> for String {
    fn from(code: ProductCode) -> Self {
        code.0
    }
}

/// A product record as returned by the product lookup endpoint.
///
/// Prices are whole yen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Backend identifier, used to merge purchase list entries
    pub product_id: i64,
    /// Barcode value (not validated: the backend is the source of truth)
    pub product_code: String,
    /// Short display name
    pub product_name: String,
    /// Unit price in yen, tax inclusive
    pub product_price: i64,
    /// Colour variant
    #[serde(default)]
    pub color: String,
    /// Manufacturer item number
    #[serde(default)]
    pub item_code: String,
    /// Full name sent with purchase lines
    #[serde(default)]
    pub full_name: String,
}

/// A purchase list entry: a product and how many units are being bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    /// The product
    #[serde(flatten)]
    pub product: Product,
    /// Number of units, at least 1
    pub quantity: u32,
}

impl PurchaseItem {
    /// Price × quantity for this entry.
    #[must_use]
    pub fn subtotal(&self) -> i64 {
        self.product.product_price * i64::from(self.quantity)
    }
}

/// One unit of a purchased product, as sent to the purchase endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    /// Backend product identifier
    pub product_id: i64,
    /// Barcode value
    pub product_code: String,
    /// Name recorded on the transaction
    pub product_name: String,
    /// Unit price in yen
    pub product_price: i64,
}

/// Body of `POST /api/purchase`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Staff member operating the register
    #[serde(skip_serializing_if = "Option::is_none")]
    pub register_staff_code: Option<String>,
    /// Store identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_code: Option<String>,
    /// Register identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos_id: Option<String>,
    /// One line per unit purchased
    pub items: Vec<PurchaseLine>,
}

/// Response of `POST /api/purchase`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseResponse {
    /// Whether the transaction was recorded
    pub success: bool,
    /// Tax-inclusive total in yen
    #[serde(default)]
    pub total_amount: i64,
    /// Tax-exclusive total in yen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount_ex_tax: Option<i64>,
    /// Consumption tax in yen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<i64>,
    /// Backend transaction identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i64>,
    /// Free-form message from the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
