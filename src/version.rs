//! Driver version information.
//!
//! Taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time. Prefer this constant over
//! repeating `env!("CARGO_PKG_VERSION")`.

/// The driver version string (for example, `0.1.0`).
pub const DRIVER_VERSION: &str = env!("CARGO_PKG_VERSION");
