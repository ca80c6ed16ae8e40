//! Assembly identity and strong-name public key tokens.
//!
//! Resource decrypters emitted by some protectors mix the public key token of the protected
//! assembly into their IV. This module carries the identity data needed to reproduce that:
//! the assembly's name and version plus its strong-name key material.
//!
//! # Key Components
//!
//! - [`Identity`] - A full public key or an already computed 8-byte token
//! - [`AssemblyIdentity`] - Name, version, culture and optional strong name of an assembly
//! - [`AssemblyVersion`] - Four-part version number
//! - [`AssemblyHashAlgorithm`] - Hash algorithm ids used for token derivation
//!
//! # Public Key Token Derivation
//!
//! ECMA-335 II.6.2.1.3 defines the token as the low 8 bytes of the hash of the full public key,
//! in reverse order. For a SHA-1 digest `d[0..20]` this is `d[19], d[18], ..., d[12]`.
//!
//! ```rust
//! use dotscope_reactor::metadata::identity::{AssemblyHashAlgorithm, Identity};
//!
//! let identity = Identity::Token([0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89]);
//! let token = identity.to_token(AssemblyHashAlgorithm::SHA1)?;
//! assert_eq!(token[0], 0xb7);
//! # Ok::<(), dotscope_reactor::Error>(())
//! ```

use std::fmt::{self, Write};

use md5::{Digest, Md5};
use sha1::Sha1;

use crate::{Error, Result};

/// Hash algorithm identifiers as stored in the `Assembly` table (`ALG_ID` values).
#[allow(non_snake_case)]
pub mod AssemblyHashAlgorithm {
    /// No hash algorithm specified
    pub const NONE: u32 = 0x0000;
    /// MD5 hash algorithm
    pub const MD5: u32 = 0x8003;
    /// SHA1 hash algorithm
    pub const SHA1: u32 = 0x8004;
}

/// Strong-name key material of an assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// The full public key blob
    PubKey(Vec<u8>),
    /// A precomputed public key token, in display order
    Token([u8; 8]),
}

impl Identity {
    /// Builds an identity from a raw metadata blob.
    ///
    /// ## Arguments
    /// * 'data'   - The blob contents
    /// * 'is_pub' - `true` if `data` is a full public key, `false` if it is a token
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a token blob is not exactly 8 bytes long.
    pub fn from(data: &[u8], is_pub: bool) -> Result<Self> {
        if is_pub {
            return Ok(Identity::PubKey(data.to_vec()));
        }

        let token: [u8; 8] = data.try_into().map_err(|_| {
            malformed_error!(
                "Public key token must be 8 bytes, blob has {} bytes",
                data.len()
            )
        })?;
        Ok(Identity::Token(token))
    }

    /// Returns the 8-byte public key token of this identity.
    ///
    /// Full public keys are hashed with `algo`; [`AssemblyHashAlgorithm::NONE`] falls back to
    /// SHA-1, which is what the runtime uses for token derivation.
    ///
    /// # Errors
    /// Returns [`crate::Error::Crypto`] for hash algorithms other than MD5 and SHA-1.
    pub fn to_token(&self, algo: u32) -> Result<[u8; 8]> {
        match self {
            Identity::Token(token) => Ok(*token),
            Identity::PubKey(data) => match algo {
                AssemblyHashAlgorithm::MD5 => Ok(token_from_digest(&Md5::digest(data))),
                AssemblyHashAlgorithm::SHA1 | AssemblyHashAlgorithm::NONE => {
                    Ok(token_from_digest(&Sha1::digest(data)))
                }
                _ => Err(Error::Crypto(format!(
                    "unsupported hash algorithm 0x{algo:04X} for public key token"
                ))),
            },
        }
    }
}

fn token_from_digest(digest: &[u8]) -> [u8; 8] {
    let mut token = [0u8; 8];
    for (dst, src) in token.iter_mut().zip(digest.iter().rev()) {
        *dst = *src;
    }
    token
}

/// Four-part assembly version (`major.minor.build.revision`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssemblyVersion {
    /// Major version number
    pub major: u16,
    /// Minor version number
    pub minor: u16,
    /// Build number
    pub build: u16,
    /// Revision number
    pub revision: u16,
}

impl AssemblyVersion {
    /// Creates a new version.
    #[must_use]
    pub fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        AssemblyVersion {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Identity of the assembly a module belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyIdentity {
    /// Simple assembly name
    pub name: String,
    /// Assembly version
    pub version: AssemblyVersion,
    /// Culture, `None` for culture-neutral assemblies
    pub culture: Option<String>,
    /// Strong-name key material, `None` for unsigned assemblies
    pub strong_name: Option<Identity>,
    /// Hash algorithm from the `Assembly` table
    pub hash_algorithm: u32,
}

impl AssemblyIdentity {
    /// Creates a culture-neutral identity hashed with SHA-1.
    pub fn new(
        name: impl Into<String>,
        version: AssemblyVersion,
        strong_name: Option<Identity>,
    ) -> Self {
        AssemblyIdentity {
            name: name.into(),
            version,
            culture: None,
            strong_name,
            hash_algorithm: AssemblyHashAlgorithm::SHA1,
        }
    }

    /// Returns `true` if the assembly carries strong-name key material.
    #[must_use]
    pub fn is_strong_named(&self) -> bool {
        self.public_key_token().is_some()
    }

    /// The 8-byte public key token of the assembly.
    ///
    /// `None` for unsigned assemblies, for an empty public key blob and for hash algorithms
    /// the token cannot be derived with.
    #[must_use]
    pub fn public_key_token(&self) -> Option<[u8; 8]> {
        match &self.strong_name {
            None => None,
            Some(Identity::PubKey(key)) if key.is_empty() => None,
            Some(identity) => identity.to_token(self.hash_algorithm).ok(),
        }
    }

    /// Formats the identity as a .NET display name
    /// (`Name, Version=1.0.0.0, Culture=neutral, PublicKeyToken=...`).
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut result = String::with_capacity(self.name.len() + 80);
        result.push_str(&self.name);

        let _ = write!(result, ", Version={}", self.version);
        let _ = write!(
            result,
            ", Culture={}",
            self.culture.as_deref().unwrap_or("neutral")
        );

        result.push_str(", PublicKeyToken=");
        match self.public_key_token() {
            Some(token) => {
                for byte in token {
                    let _ = write!(result, "{byte:02x}");
                }
            }
            None => result.push_str("null"),
        }

        result
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_token_blob() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];
        let identity = Identity::from(&data, false).unwrap();
        assert_eq!(identity, Identity::Token(data));
    }

    #[test]
    fn test_identity_from_short_token_blob() {
        let result = Identity::from(&[1, 2, 3], false);
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_sha1_token_is_reversed_tail() {
        let key = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        let identity = Identity::PubKey(key.clone());

        let digest = Sha1::digest(&key);
        let expected: Vec<u8> = digest[12..].iter().rev().copied().collect();

        let token = identity.to_token(AssemblyHashAlgorithm::SHA1).unwrap();
        assert_eq!(token.to_vec(), expected);
        assert_eq!(
            identity.to_token(AssemblyHashAlgorithm::NONE).unwrap(),
            token
        );
    }

    #[test]
    fn test_md5_token_is_reversed_tail() {
        let key = vec![0xAA; 32];
        let digest = Md5::digest(&key);
        let expected: Vec<u8> = digest[8..].iter().rev().copied().collect();

        let token = Identity::PubKey(key)
            .to_token(AssemblyHashAlgorithm::MD5)
            .unwrap();
        assert_eq!(token.to_vec(), expected);
    }

    #[test]
    fn test_unsupported_algorithm() {
        let identity = Identity::PubKey(vec![1, 2, 3]);
        assert!(matches!(identity.to_token(0x800C), Err(Error::Crypto(_))));
    }

    #[test]
    fn test_assembly_public_key_token() {
        let unsigned = AssemblyIdentity::new("App", AssemblyVersion::new(1, 0, 0, 0), None);
        assert_eq!(unsigned.public_key_token(), None);
        assert!(!unsigned.is_strong_named());

        let empty_key = AssemblyIdentity::new(
            "App",
            AssemblyVersion::default(),
            Some(Identity::PubKey(Vec::new())),
        );
        assert_eq!(empty_key.public_key_token(), None);

        let token = [0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89];
        let signed = AssemblyIdentity::new(
            "mscorlib",
            AssemblyVersion::new(4, 0, 0, 0),
            Some(Identity::Token(token)),
        );
        assert_eq!(signed.public_key_token(), Some(token));
        assert_eq!(
            signed.display_name(),
            "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089"
        );
    }
}
