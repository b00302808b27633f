//! Identifier management using string interning for efficient storage and comparison
//!
//! This module provides the [`Id`] type with an efficient string-interner based approach.
//! DSL identifiers are case-insensitive, so [`Id::new`] canonicalises its input to
//! lowercase before interning; two spellings of the same identifier intern to the
//! same symbol.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for efficient identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

/// Efficient, case-insensitive identifier type using string interning.
///
/// This type provides efficient storage and comparison of DSL identifiers
/// through string interning. Nested identifiers join parent and child with
/// a `.` separator, matching the hierarchical identifier syntax of the DSL.
///
/// # Examples
///
/// ```
/// use maquette_core::identifier::Id;
///
/// // Identifiers are case-insensitive
/// let a = Id::new("PaymentService");
/// let b = Id::new("paymentservice");
/// assert_eq!(a, b);
///
/// // Create nested identifiers
/// let nested = Id::new("system").create_nested(Id::new("api"));
/// assert_eq!(nested, "system.api");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str, canonicalising to lowercase.
    pub fn new(name: &str) -> Self {
        let mut interner = INTERNER
            .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
            .lock()
            .expect("Failed to acquire interner lock");
        let symbol = interner.get_or_intern(name.to_lowercase());
        Self(symbol)
    }

    /// Creates a nested ID by combining parent ID and child ID with the `.` separator.
    ///
    /// # Examples
    ///
    /// ```
    /// use maquette_core::identifier::Id;
    ///
    /// let parent = Id::new("bank");
    /// let child = Id::new("web");
    /// assert_eq!(parent.create_nested(child), "bank.web");
    /// ```
    pub fn create_nested(&self, child_id: Id) -> Self {
        let mut interner = INTERNER
            .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
            .lock()
            .expect("Failed to acquire interner lock");
        let parent_str = interner
            .resolve(self.0)
            .expect("Parent ID should exist in interner");
        let child_str = interner
            .resolve(child_id.0)
            .expect("Child ID should exist in interner");
        let nested_name = format!("{}.{}", parent_str, child_str);
        let symbol = interner.get_or_intern(&nested_name);
        Self(symbol)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = INTERNER
            .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
            .lock()
            .expect("Failed to acquire interner lock");
        let str_value = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        write!(f, "{}", str_value)
    }
}

impl From<&str> for Id {
    /// Creates an `Id` from a string slice.
    ///
    /// This is a convenience implementation that calls `Id::new`.
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "string"`.
    ///
    /// The other side is lowercased first, so comparison follows the same
    /// case-insensitive rules as construction.
    fn eq(&self, other: &str) -> bool {
        let interner = INTERNER
            .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
            .lock()
            .expect("Failed to acquire interner lock");
        let self_str = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        self_str == other.to_lowercase()
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
