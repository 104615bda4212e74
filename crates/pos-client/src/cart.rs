//! The purchase list: products scanned so far and their quantities.

use pos_core::{Product, PurchaseItem, PurchaseLine, PurchaseRequest, TerminalConfig};
use serde::{Deserialize, Serialize};

/// Ordered list of products to purchase.
///
/// Adding a product that is already listed increments its quantity instead
/// of adding a second row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseList {
    items: Vec<PurchaseItem>,
}

impl PurchaseList {
    /// Empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows in insertion order.
    #[must_use]
    pub fn items(&self) -> &[PurchaseItem] {
        &self.items
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of `product`, returning its new quantity.
    pub fn add(&mut self, product: Product) -> u32 {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product.product_id == product.product_id)
        {
            item.quantity += 1;
            return item.quantity;
        }
        self.items.push(PurchaseItem {
            product,
            quantity: 1,
        });
        1
    }

    /// Remove the row at `index`. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<PurchaseItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Drop every row.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of price × quantity over all rows.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.items.iter().map(PurchaseItem::subtotal).sum()
    }

    /// Total number of units.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// One line per unit, as the purchase endpoint expects.
    #[must_use]
    pub fn expand_lines(&self) -> Vec<PurchaseLine> {
        self.items
            .iter()
            .flat_map(|item| {
                let line = PurchaseLine {
                    product_id: item.product.product_id,
                    product_code: item.product.product_code.clone(),
                    product_name: receipt_name(&item.product).to_string(),
                    product_price: item.product.product_price,
                };
                std::iter::repeat(line).take(item.quantity as usize)
            })
            .collect()
    }

    /// Purchase request for this list, stamped with the terminal identity.
    #[must_use]
    pub fn build_request(&self, terminal: &TerminalConfig) -> PurchaseRequest {
        PurchaseRequest {
            register_staff_code: Some(terminal.register_staff_code.clone()),
            store_code: Some(terminal.store_code.clone()),
            pos_id: Some(terminal.pos_id.clone()),
            items: self.expand_lines(),
        }
    }
}

// Transactions record the full product name when the catalogue has one.
fn receipt_name(product: &Product) -> &str {
    if product.full_name.is_empty() {
        &product.product_name
    } else {
        &product.full_name
    }
}
