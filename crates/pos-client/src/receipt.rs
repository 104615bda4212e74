//! Tax breakdown of a completed purchase and yen formatting.

use pos_core::PurchaseResponse;
use serde::{Deserialize, Serialize};

/// Totals shown once a purchase goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSummary {
    /// Tax-inclusive total
    pub total_amount: i64,
    /// Total before tax
    pub total_amount_ex_tax: i64,
    /// Tax portion
    pub tax_amount: i64,
    /// Server-side transaction id, if reported
    pub transaction_id: Option<i64>,
}

impl TaxSummary {
    /// Summary of a successful response; `None` if the purchase failed.
    ///
    /// A missing ex-tax amount or tax amount is derived from the total and
    /// the other one. With neither present the whole total is reported as
    /// ex-tax.
    #[must_use]
    pub fn from_response(response: &PurchaseResponse) -> Option<Self> {
        if !response.success {
            return None;
        }
        let total = response.total_amount;
        let (ex_tax, tax) = match (response.total_amount_ex_tax, response.tax_amount) {
            (Some(ex_tax), Some(tax)) => (ex_tax, tax),
            (Some(ex_tax), None) => (ex_tax, total - ex_tax),
            (None, Some(tax)) => (total - tax, tax),
            (None, None) => (total, 0),
        };
        Some(Self {
            total_amount: total,
            total_amount_ex_tax: ex_tax,
            tax_amount: tax,
            transaction_id: response.transaction_id,
        })
    }
}

/// Format an amount as yen with thousands separators, e.g. `¥1,234`.
#[must_use]
pub fn format_yen(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-¥{grouped}")
    } else {
        format!("¥{grouped}")
    }
}
