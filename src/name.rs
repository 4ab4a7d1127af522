//! Qualified names for Runik
//!
//! A `QualifiedName` identifies a type, field or function by its namespace
//! path plus short name. Unresolved references use the same representation:
//! the path is then whatever the source spelled, relative to the use site.

use std::fmt;

use lazy_static::lazy_static;

lazy_static! {
    /// The built-in boolean type
    pub static ref BOOL: QualifiedName = QualifiedName::short("bool");
    /// The built-in integer type
    pub static ref INT: QualifiedName = QualifiedName::short("int");
    /// The built-in string type
    pub static ref STRING: QualifiedName = QualifiedName::short("string");
    /// The built-in void type
    pub static ref VOID: QualifiedName = QualifiedName::short("void");
}

/// A namespace path plus a final short name.
///
/// Equality is by the full sequence, so `a::b::x` and `b::x` are different
/// names even when they resolve to the same declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    namespaces: Vec<String>,
    name: String,
}

impl QualifiedName {
    pub fn new(namespaces: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            namespaces,
            name: name.into(),
        }
    }

    /// A name with an empty namespace path. Unless this is a built-in,
    /// such a name is unqualified.
    pub fn short(name: impl Into<String>) -> Self {
        Self::new(Vec::new(), name)
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unqualified(&self) -> bool {
        self.namespaces.is_empty()
    }

    pub fn is_bool(&self) -> bool {
        self.namespaces.is_empty() && self.name == "bool"
    }

    pub fn is_int(&self) -> bool {
        self.namespaces.is_empty() && self.name == "int"
    }

    pub fn is_string(&self) -> bool {
        self.namespaces.is_empty() && self.name == "string"
    }

    pub fn is_void(&self) -> bool {
        self.namespaces.is_empty() && self.name == "void"
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ns in &self.namespaces {
            write!(f, "{}::", ns)?;
        }
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let name = QualifiedName::new(vec!["a".into(), "b".into()], "x");
        assert_eq!(name.to_string(), "a::b::x");
        assert_eq!(QualifiedName::short("x").to_string(), "x");
    }

    #[test]
    fn test_equality_is_full_sequence() {
        let qualified = QualifiedName::new(vec!["a".into()], "x");
        let short = QualifiedName::short("x");
        assert_ne!(qualified, short);
        assert_eq!(qualified, QualifiedName::new(vec!["a".into()], "x"));
    }

    #[test]
    fn test_builtins() {
        assert!(BOOL.is_bool());
        assert!(INT.is_int());
        assert!(STRING.is_string());
        assert!(VOID.is_void());
        // A namespaced name is never a built-in
        assert!(!QualifiedName::new(vec!["a".into()], "int").is_int());
    }
}
