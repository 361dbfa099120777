//! Bind variable identities.

use std::fmt;

/// How a bind variable is addressed in SQL text.
///
/// Positional indices are 1-based (`$1`, `$2`, ...); names are written
/// as `:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindKey {
    Index(usize),
    Name(String),
}

impl BindKey {
    pub fn index(index: usize) -> Self {
        BindKey::Index(index)
    }

    pub fn name(name: impl Into<String>) -> Self {
        BindKey::Name(name.into())
    }
}

impl fmt::Display for BindKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindKey::Index(index) => write!(f, "${}", index),
            BindKey::Name(name) => write!(f, ":{}", name),
        }
    }
}

impl From<usize> for BindKey {
    fn from(index: usize) -> Self {
        BindKey::Index(index)
    }
}

impl From<&str> for BindKey {
    fn from(name: &str) -> Self {
        BindKey::Name(name.to_string())
    }
}

/// Stable position of a bind variable inside its registry.
///
/// Slot ids are only minted by the registry that owns the variable and
/// stay valid for the registry's whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    /// Returns the inner arena index.
    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_key_display() {
        assert_eq!(BindKey::index(3).to_string(), "$3");
        assert_eq!(BindKey::name("user_id").to_string(), ":user_id");
    }

    #[test]
    fn test_bind_key_from() {
        assert_eq!(BindKey::from(1), BindKey::Index(1));
        assert_eq!(BindKey::from("x"), BindKey::Name("x".to_string()));
    }

    #[test]
    fn test_slot_id_display() {
        assert_eq!(SlotId(7).to_string(), "Slot7");
        assert_eq!(SlotId(7).value(), 7);
    }
}
