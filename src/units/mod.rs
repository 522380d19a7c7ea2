//! # Managed unit abstractions.
//!
//! This module provides the unit-related types:
//! - [`Unit`] - trait every managed unit satisfies (`start` / `stop`)
//! - [`UnitFn`] - closure-backed unit implementation
//! - [`UnitRef`] - shared handle to a unit (`Arc<dyn Unit>`)
//! - [`UnitId`] - registry key identifying a unit

mod id;
mod unit;
mod unit_fn;

pub use id::UnitId;
pub use unit::{Unit, UnitRef};
pub use unit_fn::UnitFn;
