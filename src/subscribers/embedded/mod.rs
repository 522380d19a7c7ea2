//! # Built-in subscribers
//!
//! - [`LogWriter`]: writes transitions through `tracing` (feature `logging`).

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
