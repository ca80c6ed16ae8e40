//! The in-memory managed module that resource decrypters operate on.
//!
//! A [`Module`] bundles everything the encrypted resource handling needs from a loaded binary:
//! the assembly identity (for the public key token), type and method definitions, the `#US`
//! heap, and the ordered manifest resource table. All containers use interior mutability so a
//! [`ModuleRc`] can be shared between passes and mutated through `&self`.
//!
//! # Examples
//!
//! ```rust
//! use dotscope_reactor::metadata::{
//!     module::Module,
//!     resources::{ManifestResource, ManifestResourceAttributes},
//!     token::Token,
//! };
//!
//! let module = Module::new("App.exe", None);
//! module.add_resource(ManifestResource::embedded(
//!     Token::new(0x2800_0001),
//!     "App.Payload.bin",
//!     ManifestResourceAttributes::PRIVATE,
//!     vec![0u8; 32],
//! ));
//!
//! let copy = module.reload();
//! assert_eq!(copy.resources().len(), 1);
//! assert!(copy.public_key_token().is_none());
//! ```

use std::sync::Arc;

use crate::{
    metadata::{
        identity::AssemblyIdentity,
        method::{Method, MethodMap, MethodRc},
        resources::{ManifestResource, ManifestResourceRc, Resources},
        token::Token,
        typedef::{TypeDef, TypeDefMap, TypeDefRc},
        userstrings::UserStrings,
    },
    Error, Result,
};

/// A reference-counted pointer to a [`Module`]
pub type ModuleRc = Arc<Module>;

/// A loaded managed module.
pub struct Module {
    name: String,
    assembly: Option<AssemblyIdentity>,
    types: TypeDefMap,
    methods: MethodMap,
    resources: Resources,
    user_strings: UserStrings,
}

impl Module {
    /// Creates an empty module.
    ///
    /// ## Arguments
    /// * 'name'     - The module name, usually the file name
    /// * 'assembly' - Identity of the owning assembly; `None` for netmodules
    pub fn new(name: impl Into<String>, assembly: Option<AssemblyIdentity>) -> ModuleRc {
        Arc::new(Module {
            name: name.into(),
            assembly,
            types: TypeDefMap::new(),
            methods: MethodMap::new(),
            resources: Resources::new(),
            user_strings: UserStrings::new(),
        })
    }

    /// The module name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the owning assembly
    #[must_use]
    pub fn assembly(&self) -> Option<&AssemblyIdentity> {
        self.assembly.as_ref()
    }

    /// Public key token of the owning assembly, if it is strong-named.
    #[must_use]
    pub fn public_key_token(&self) -> Option<[u8; 8]> {
        self.assembly
            .as_ref()
            .and_then(AssemblyIdentity::public_key_token)
    }

    /// Type definitions by token
    #[must_use]
    pub fn types(&self) -> &TypeDefMap {
        &self.types
    }

    /// Method definitions by token
    #[must_use]
    pub fn methods(&self) -> &MethodMap {
        &self.methods
    }

    /// The manifest resource table
    #[must_use]
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// The `#US` heap
    #[must_use]
    pub fn user_strings(&self) -> &UserStrings {
        &self.user_strings
    }

    /// Registers a type definition.
    pub fn add_type(&self, type_def: TypeDef) -> TypeDefRc {
        let type_def = Arc::new(type_def);
        self.types.insert(type_def.token, type_def.clone());
        type_def
    }

    /// Registers a method, replacing any method with the same token.
    pub fn add_method(&self, method: MethodRc) -> MethodRc {
        self.methods.insert(method.token, method.clone());
        method
    }

    /// Appends an entry to the resource table.
    pub fn add_resource(&self, resource: ManifestResource) -> ManifestResourceRc {
        self.resources.push(resource)
    }

    /// Appends a string literal to the `#US` heap.
    pub fn add_user_string(&self, value: &str) -> Token {
        self.user_strings.add(value)
    }

    /// Type definition by token
    #[must_use]
    pub fn type_def(&self, token: Token) -> Option<TypeDefRc> {
        self.types.get(&token).map(|entry| entry.value().clone())
    }

    /// Method definition by token
    #[must_use]
    pub fn method(&self, token: Token) -> Option<MethodRc> {
        self.methods.get(&token).map(|entry| entry.value().clone())
    }

    /// Finds the counterpart of a method that belongs to another copy of this module.
    ///
    /// The method must have the same token and name here.
    ///
    /// # Errors
    /// Returns [`crate::Error::RebindFailure`] if no such method exists.
    pub fn lookup_method(&self, other: &Method) -> Result<MethodRc> {
        self.method(other.token)
            .filter(|method| method.name == other.name)
            .ok_or_else(|| {
                Error::RebindFailure(format!(
                    "method {} ({}) is not defined in {}",
                    other.fullname(),
                    other.token,
                    self.name
                ))
            })
    }

    /// A deep copy of this module, as if the same binary had been loaded again.
    ///
    /// Tokens, names and `#US` tokens are preserved; every type, method and resource is a new
    /// allocation, so identity-based lookups against the original do not match.
    #[must_use]
    pub fn reload(&self) -> ModuleRc {
        let copy = Module::new(self.name.clone(), self.assembly.clone());

        for entry in self.types.iter() {
            copy.add_type(entry.value().as_ref().clone());
        }

        for entry in self.methods.iter() {
            let method = entry.value();
            let owner = method
                .declaring_type
                .as_ref()
                .and_then(|owner| copy.type_def(owner.token));
            copy.add_method(Arc::new(method.duplicate(owner)));
        }

        for resource in self.resources.iter() {
            copy.add_resource(resource.as_ref().clone());
        }

        for (_, value) in self.user_strings.iter() {
            copy.add_user_string(&value);
        }

        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        identity::{AssemblyVersion, Identity},
        method::{MethodBuilder, MethodModifiers},
        resources::ManifestResourceAttributes,
    };

    fn populated() -> ModuleRc {
        let module = Module::new(
            "Sample.dll",
            Some(AssemblyIdentity::new(
                "Sample",
                AssemblyVersion::new(1, 2, 3, 4),
                Some(Identity::Token([1, 2, 3, 4, 5, 6, 7, 8])),
            )),
        );
        let owner = module.add_type(TypeDef::new(Token::new(0x0200_0002), "NS", "Holder"));
        module.add_method(
            MethodBuilder::new(Token::new(0x0600_0001), "Decrypt")
                .flags(MethodModifiers::STATIC)
                .declaring_type(owner)
                .build(),
        );
        module.add_resource(ManifestResource::embedded(
            Token::new(0x2800_0001),
            "NS.data",
            ManifestResourceAttributes::PUBLIC,
            vec![9; 16],
        ));
        module.add_user_string("NS.data");
        module
    }

    #[test]
    fn test_public_key_token() {
        assert_eq!(populated().public_key_token(), Some([1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(Module::new("x.dll", None).public_key_token(), None);
    }

    #[test]
    fn test_lookup_method_across_copies() {
        let module = populated();
        let copy = module.reload();

        let original = module.method(Token::new(0x0600_0001)).unwrap();
        let rebound = copy.lookup_method(&original).unwrap();

        assert!(!Arc::ptr_eq(&original, &rebound));
        assert_eq!(rebound.fullname(), "NS.Holder::Decrypt");
        assert!(Arc::ptr_eq(
            rebound.declaring_type.as_ref().unwrap(),
            &copy.type_def(Token::new(0x0200_0002)).unwrap()
        ));
    }

    #[test]
    fn test_lookup_method_missing() {
        let module = populated();
        let stranger = Method::new(Token::new(0x0600_0001), "Other", MethodModifiers::STATIC);
        assert!(matches!(
            module.lookup_method(&stranger),
            Err(Error::RebindFailure(_))
        ));
    }

    #[test]
    fn test_reload_preserves_tables() {
        let module = populated();
        let copy = module.reload();

        let original = module.resources().find_embedded("NS.data").unwrap();
        let copied = copy.resources().find_embedded("NS.data").unwrap();
        assert_eq!(*original, *copied);
        assert!(copy.resources().position(&original).is_none());

        assert_eq!(
            copy.user_strings().get(Token::new(0x7000_0001)).as_deref(),
            Some("NS.data")
        );
        assert_eq!(copy.name(), "Sample.dll");
    }
}
