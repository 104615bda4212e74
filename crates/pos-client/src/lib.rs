//! POS Client - access to the product/purchase API.
//!
//! [`PosApiClient`] implements [`PosBackend`] over HTTP:
//! `GET /api/products/{code}` for lookups and `POST /api/purchase` for
//! transactions. [`PurchaseList`] accumulates scanned products and expands
//! them into the request the purchase endpoint expects.
//!
//! # Example
//!
//! ```rust
//! use pos_client::{format_yen, PurchaseList};
//! use pos_core::Product;
//!
//! let mut list = PurchaseList::new();
//! list.add(Product {
//!     product_id: 1,
//!     product_code: "4901681143115".to_string(),
//!     product_name: "Ballpoint pen".to_string(),
//!     product_price: 1200,
//!     color: String::new(),
//!     item_code: String::new(),
//!     full_name: String::new(),
//! });
//! assert_eq!(format_yen(list.total()), "¥1,200");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod cart;
pub mod client;
pub mod error;
pub mod receipt;

pub use cart::PurchaseList;
pub use client::{PosApiClient, PosBackend};
pub use error::{ClientError, Result};
pub use receipt::{format_yen, TaxSummary};
