//! Inventory of the types used by a method's local variables.
//!
//! Protector stubs are recognised by the framework classes they need: a resource decrypter
//! has to keep a `MemoryStream`, a `CryptoStream` and a cipher instance in locals. Counting
//! local types is a cheap and stable fingerprint because renaming and control flow obfuscation
//! do not touch the types of framework locals.

use std::collections::HashMap;

use crate::metadata::method::Method;

/// Multiset of local variable type names of one method.
///
/// # Examples
///
/// ```rust
/// use dotscope_reactor::deobfuscation::LocalTypes;
/// use dotscope_reactor::metadata::method::MethodBuilder;
/// use dotscope_reactor::metadata::token::Token;
///
/// let method = MethodBuilder::new(Token::new(0x0600_0001), "M")
///     .locals(["System.Byte[]", "System.Byte[]", "System.IO.MemoryStream"])
///     .body(Vec::new())
///     .build();
///
/// let locals = LocalTypes::new(&method);
/// assert_eq!(locals.count("System.Byte[]"), 2);
/// assert!(locals.all(["System.Byte[]", "System.IO.MemoryStream"]));
/// assert!(!locals.exists("System.String"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocalTypes {
    types: HashMap<String, usize>,
}

impl LocalTypes {
    /// Builds the inventory from the locals of `method`; empty if it has no body.
    #[must_use]
    pub fn new(method: &Method) -> Self {
        let mut types = HashMap::new();
        for local in method.locals() {
            *types.entry(local.type_name).or_insert(0) += 1;
        }
        LocalTypes { types }
    }

    /// Returns `true` if at least one local has type `type_name`.
    #[must_use]
    pub fn exists(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Number of locals of type `type_name`.
    #[must_use]
    pub fn count(&self, type_name: &str) -> usize {
        self.types.get(type_name).copied().unwrap_or(0)
    }

    /// Returns `true` if every name in `type_names` is present.
    pub fn all<I, S>(&self, type_names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        type_names
            .into_iter()
            .all(|name| self.exists(name.as_ref()))
    }

    /// Returns `true` if any name in `type_names` is present.
    pub fn any<I, S>(&self, type_names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        type_names
            .into_iter()
            .any(|name| self.exists(name.as_ref()))
    }

    /// Number of distinct local types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if the method has no locals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
