//! Type definitions owned by a module.

use std::{fmt, sync::Arc};

use crossbeam_skiplist::SkipMap;

use crate::metadata::token::Token;

/// A map that holds the mapping of [`Token`] to parsed [`TypeDef`]
pub type TypeDefMap = SkipMap<Token, TypeDefRc>;
/// A reference-counted pointer to a [`TypeDef`]
pub type TypeDefRc = Arc<TypeDef>;

/// A type defined in a module (`TypeDef` table row).
#[derive(Clone, PartialEq, Eq)]
pub struct TypeDef {
    /// Token of the `TypeDef` row
    pub token: Token,
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Simple type name
    pub name: String,
}

impl TypeDef {
    /// Creates a new type definition.
    pub fn new(token: Token, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeDef {
            token,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The namespace-qualified name, e.g. `System.IO.MemoryStream`.
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDef({}, {})", self.token, self.fullname())
    }
}
