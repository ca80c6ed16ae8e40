//! AES encrypted embedded resources.
//!
//! The protector moves an embedded resource's bytes through AES-256-CBC and emits a static
//! decrypter that reads the resource by name, wraps it in a `CryptoStream` over a
//! `RijndaelManaged` (or `AesManaged`) transform and returns the plaintext. Key and IV are
//! built element by element in the decrypter body. For signed assemblies the odd IV bytes are
//! replaced at runtime with the public key token.
//!
//! [`EncryptedResource`] follows a probe-then-initialize lifecycle:
//!
//! 1. [`EncryptedResource::could_be_resource_decrypter`] - cheap structural filter
//! 2. [`EncryptedResource::init`] - simplify, resolve the resource, recover key material
//! 3. [`EncryptedResource::decrypt`] / [`EncryptedResource::encrypt`] - cipher round trip
//! 4. [`EncryptedResource::update_resource`] - write new ciphertext back to the table
//!
//! [`EncryptedResource::from_existing`] rebinds a recovered instance to a freshly loaded copy
//! of the same module without repeating the recovery.

use std::sync::Arc;

use crate::{
    deobfuscation::{
        code_strings,
        obfuscators::reactor::pkt::{patch_iv, uses_public_key_token},
        ArrayFinder, LocalTypes, MethodSimplifier, ReactorConfig,
    },
    metadata::{
        method::{Method, MethodRc},
        module::ModuleRc,
        resources::ManifestResourceRc,
        typedef::TypeDefRc,
    },
    utils::crypto::{aes_cbc_decrypt, aes_cbc_encrypt},
    Error, Result,
};

/// Local variable types every resource decrypter declares.
pub const REQUIRED_LOCAL_TYPES: [&str; 5] = [
    "System.Byte[]",
    "System.IO.BinaryReader",
    "System.IO.MemoryStream",
    "System.Security.Cryptography.CryptoStream",
    "System.Security.Cryptography.ICryptoTransform",
];

/// Interchangeable cipher classes; a decrypter declares a local of at least one of them.
pub const CIPHER_LOCAL_TYPES: [&str; 2] = [
    "System.Security.Cryptography.RijndaelManaged",
    "System.Security.Cryptography.AesManaged",
];

/// AES-256 key length in bytes
pub const KEY_LENGTH: usize = 32;
/// CBC IV length in bytes
pub const IV_LENGTH: usize = 16;

/// Key and IV recovered from a resource decrypter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// AES-256 key
    pub key: [u8; KEY_LENGTH],
    /// CBC initialization vector, after the public key token patch if one applies
    pub iv: [u8; IV_LENGTH],
}

/// One encrypted resource and the method that decrypts it.
///
/// # Examples
///
/// ```rust
/// use dotscope_reactor::deobfuscation::{EncryptedResource, NoopSimplifier};
/// use dotscope_reactor::metadata::{method::Method, module::Module};
///
/// let module = Module::new("App.exe", None);
/// let mut unit = EncryptedResource::new(module);
///
/// // Without a bound method, init has nothing to do.
/// let finder = |_: &Method, _: usize| None::<Vec<u8>>;
/// unit.init(&NoopSimplifier, &finder)?;
/// assert!(!unit.found_resource());
/// assert!(unit.declaring_type().is_none());
/// # Ok::<(), dotscope_reactor::Error>(())
/// ```
pub struct EncryptedResource {
    module: ModuleRc,
    method: Option<MethodRc>,
    resource: Option<ManifestResourceRc>,
    key_material: Option<KeyMaterial>,
    config: ReactorConfig,
}

impl EncryptedResource {
    /// Creates an empty unit bound to `module` with the default configuration.
    #[must_use]
    pub fn new(module: ModuleRc) -> Self {
        Self::with_config(module, ReactorConfig::default())
    }

    /// Creates an empty unit bound to `module`.
    #[must_use]
    pub fn with_config(module: ModuleRc, config: ReactorConfig) -> Self {
        EncryptedResource {
            module,
            method: None,
            resource: None,
            key_material: None,
            config,
        }
    }

    /// Rebinds `other` to `module`, a freshly loaded copy of the module `other` was built on.
    ///
    /// The decrypter method is looked up by token and name, the resource by name among the
    /// embedded resources. Key material and configuration are copied as they are.
    ///
    /// # Errors
    /// Returns [`crate::Error::RebindFailure`] if the method, or a resource `other` had
    /// resolved, does not exist in `module`.
    pub fn from_existing(module: ModuleRc, other: &EncryptedResource) -> Result<Self> {
        let method = other
            .method
            .as_ref()
            .map(|method| module.lookup_method(method))
            .transpose()?;

        let resource = match &other.resource {
            Some(resource) => Some(
                module
                    .resources()
                    .find_embedded(&resource.name)
                    .ok_or_else(|| {
                        Error::RebindFailure(format!(
                            "resource '{}' is not embedded in {}",
                            resource.name,
                            module.name()
                        ))
                    })?,
            ),
            None => None,
        };

        Ok(EncryptedResource {
            module,
            method,
            resource,
            key_material: other.key_material.clone(),
            config: other.config,
        })
    }

    /// The module this unit operates on
    #[must_use]
    pub fn module(&self) -> &ModuleRc {
        &self.module
    }

    /// Type declaring the decrypter method, `None` if no method is bound.
    #[must_use]
    pub fn declaring_type(&self) -> Option<TypeDefRc> {
        self.method
            .as_ref()
            .and_then(|method| method.declaring_type.clone())
    }

    /// The decrypter method
    #[must_use]
    pub fn method(&self) -> Option<&MethodRc> {
        self.method.as_ref()
    }

    /// Binds (or unbinds) the decrypter method.
    pub fn set_method(&mut self, method: Option<MethodRc>) {
        self.method = method;
    }

    /// The encrypted resource, once `init` has resolved it
    #[must_use]
    pub fn resource(&self) -> Option<&ManifestResourceRc> {
        self.resource.as_ref()
    }

    /// Returns `true` if `init` resolved an encrypted resource.
    #[must_use]
    pub fn found_resource(&self) -> bool {
        self.resource.is_some()
    }

    /// Recovered key and IV
    #[must_use]
    pub fn key_material(&self) -> Option<&KeyMaterial> {
        self.key_material.as_ref()
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    /// Structural probe for resource decrypters.
    ///
    /// `method` qualifies if it is static, has a body, declares locals of every type in
    /// [`REQUIRED_LOCAL_TYPES`] and `additional_types`, and declares a local of one of the
    /// [`CIPHER_LOCAL_TYPES`]. With `check_resource`, one of the strings it loads must also
    /// name an embedded resource of the module.
    #[must_use]
    pub fn could_be_resource_decrypter(
        &self,
        method: &Method,
        additional_types: &[&str],
        check_resource: bool,
    ) -> bool {
        if !method.is_static() || !method.has_body() {
            return false;
        }

        let locals = LocalTypes::new(method);
        if !locals.all(REQUIRED_LOCAL_TYPES.iter().chain(additional_types)) {
            return false;
        }
        if !locals.any(CIPHER_LOCAL_TYPES) {
            return false;
        }

        !check_resource || self.find_method_resource(method).is_some()
    }

    fn find_method_resource(&self, method: &Method) -> Option<ManifestResourceRc> {
        let instructions = method.instructions();
        let resources = self.module.resources();

        let found = code_strings(&instructions, self.module.user_strings())
            .find_map(|name| resources.find_embedded(&name));
        found
    }

    /// Resolves the encrypted resource and recovers the key material.
    ///
    /// Does nothing if no method is bound. If none of the method's strings names an embedded
    /// resource the unit is left without a resource and without key material. The resource and
    /// the key material are stored together, only once both arrays have been recovered; a
    /// failed call leaves the unit as it was.
    ///
    /// # Errors
    /// Returns [`crate::Error::KeyRecovery`] if `finder` does not produce a 32-byte key and a
    /// 16-byte IV for a method whose resource was resolved.
    pub fn init(
        &mut self,
        simplifier: &dyn MethodSimplifier,
        finder: &dyn ArrayFinder,
    ) -> Result<()> {
        let Some(method) = self.method.clone() else {
            return Ok(());
        };

        if self.config.simplify_method {
            simplifier.simplify(&method);
            log::debug!("Simplified resource decrypter {}", method.fullname());
        }

        let Some(resource) = self.find_method_resource(&method) else {
            log::debug!("{} loads no embedded resource", method.fullname());
            self.resource = None;
            self.key_material = None;
            return Ok(());
        };
        log::debug!(
            "Resource decrypter {} reads '{}' ({} bytes)",
            method.fullname(),
            resource.name,
            resource.data.len()
        );

        let key = recover_array::<KEY_LENGTH>(finder, &method, "key")?;
        let mut iv = recover_array::<IV_LENGTH>(finder, &method, "IV")?;
        log::debug!("Recovered key and IV of {}", method.fullname());

        if self.config.patch_public_key_token && uses_public_key_token(&method.instructions()) {
            match self.module.public_key_token() {
                Some(token) => {
                    patch_iv(&mut iv, &token);
                    log::debug!("Spliced public key token into IV of {}", method.fullname());
                }
                None => log::warn!(
                    "{} splices the public key token into its IV, but {} is not strong-named",
                    method.fullname(),
                    self.module.name()
                ),
            }
        }

        self.resource = Some(resource);
        self.key_material = Some(KeyMaterial { key, iv });
        Ok(())
    }

    /// Decrypts the resolved resource.
    ///
    /// # Errors
    /// Returns [`crate::Error::CipherPrecondition`] if the resource or the key material is
    /// missing, and [`crate::Error::Crypto`] if the resource is not valid ciphertext.
    pub fn decrypt(&self) -> Result<Vec<u8>> {
        let (Some(resource), Some(material)) = (&self.resource, &self.key_material) else {
            return Err(Error::CipherPrecondition("decrypt"));
        };

        aes_cbc_decrypt(&material.key, &material.iv, &resource.data)
    }

    /// Encrypts `data` with the recovered key material.
    ///
    /// # Errors
    /// Returns [`crate::Error::CipherPrecondition`] if no key material has been recovered.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let Some(material) = &self.key_material else {
            return Err(Error::CipherPrecondition("encrypt"));
        };

        aes_cbc_encrypt(&material.key, &material.iv, data)
    }

    /// Replaces the resolved resource's bytes with `encrypted_data`.
    ///
    /// The table entry is located by identity and swapped for a new embedded entry with the
    /// same token, name and flags. The unit then tracks the new entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::ResourceTableInconsistency`] if no resource is resolved or the
    /// tracked entry is no longer in the module's resource table.
    pub fn update_resource(&mut self, encrypted_data: Vec<u8>) -> Result<()> {
        let Some(current) = &self.resource else {
            return Err(Error::ResourceTableInconsistency(
                "<unresolved>".to_string(),
            ));
        };

        let replacement = Arc::new(current.with_data(encrypted_data));
        if self
            .module
            .resources()
            .replace_entry(current, replacement.clone())
            .is_none()
        {
            return Err(Error::ResourceTableInconsistency(current.name.clone()));
        }

        log::debug!(
            "Replaced resource '{}': {} -> {} bytes",
            current.name,
            current.data.len(),
            replacement.data.len()
        );
        self.resource = Some(replacement);
        Ok(())
    }
}

fn recover_array<const N: usize>(
    finder: &dyn ArrayFinder,
    method: &Method,
    what: &str,
) -> Result<[u8; N]> {
    let Some(data) = finder.find_byte_array(method, N) else {
        return Err(Error::KeyRecovery(format!(
            "no {N}-byte {what} array in {}",
            method.fullname()
        )));
    };

    let len = data.len();
    data.try_into().map_err(|_| {
        Error::KeyRecovery(format!(
            "{what} of {} is {len} bytes, expected {N}",
            method.fullname()
        ))
    })
}
