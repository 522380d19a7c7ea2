//! # Unit identity.
//!
//! [`UnitId`] is the opaque registry key of a managed unit. It is either a
//! registered name (`UnitId::from("db")`) or derived from the unit's concrete
//! type (`UnitId::of::<Database>()`). Cloning is cheap (`Arc<str>`).

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identity of a managed unit, stable for the unit's lifetime.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(Arc<str>);

impl UnitId {
    /// Creates an identity from a registered name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Creates an identity from the concrete type `T`.
    ///
    /// # Example
    /// ```
    /// use watchvisor::UnitId;
    ///
    /// struct Mailer;
    /// assert!(UnitId::of::<Mailer>().as_str().ends_with("Mailer"));
    /// ```
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Arc::from(std::any::type_name::<T>()))
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for UnitId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl Borrow<str> for UnitId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
