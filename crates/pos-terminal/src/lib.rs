//! POS Terminal - headless register controller.
//!
//! [`PosTerminal`] holds the state a register page renders (input, current
//! product, purchase list, banners, tax breakdown) and implements the
//! page's operations on top of a [`pos_client::PosBackend`] and a
//! [`pos_scanner::ScanCoordinator`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod controller;

pub use controller::{messages, PosTerminal, TerminalView};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the default `info,pos=debug` filter.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,pos=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    tracing::info!("Starting POS terminal v{}", env!("CARGO_PKG_VERSION"));
}
