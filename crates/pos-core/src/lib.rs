//! POS Core - Foundation crate for the POS scanning client.
//!
//! This crate provides shared types, error handling and configuration
//! management that all other POS crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Product codes and the product/purchase wire types
//!
//! # Example
//!
//! ```rust
//! use pos_core::{AppConfig, ProductCode};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.terminal.store_code, "30");
//!
//! let code = ProductCode::new("4901681143115")?;
//! assert_eq!(code.as_str(), "4901681143115");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, AppConfig, ScannerConfig, TerminalConfig};
pub use error::{ConfigError, ConfigResult, PosError, Result};
pub use types::{
    Product, ProductCode, PurchaseItem, PurchaseLine, PurchaseRequest, PurchaseResponse,
};
