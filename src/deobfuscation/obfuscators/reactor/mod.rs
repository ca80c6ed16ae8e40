//! .NET Reactor encrypted resource support.
//!
//! - [`EncryptedResource`] - Recognizes a resource decrypter, recovers its AES key material and
//!   re-encrypts rewritten resource data
//! - [`PublicKeyTokenScanner`] - Detects decrypters that splice the public key token into the IV
//!
//! # Example
//!
//! ```rust
//! use dotscope_reactor::deobfuscation::obfuscators::reactor::uses_public_key_token;
//! use dotscope_reactor::assembly::InstructionAssembler;
//!
//! let mut asm = InstructionAssembler::new();
//! for value in [1, 0, 3, 1, 5, 2, 7, 3, 9, 4, 11, 5, 13, 6, 15, 7] {
//!     asm.ldloc(1)?.ldc_i4(value)?;
//! }
//! assert!(uses_public_key_token(&asm.finish()?));
//! # Ok::<(), dotscope_reactor::Error>(())
//! ```

mod pkt;
mod resource;

pub use pkt::{
    patch_iv, uses_public_key_token, PublicKeyTokenScanner, ScanInput, ScanState,
    PUBLIC_KEY_TOKEN_PATTERN,
};
pub use resource::{
    EncryptedResource, KeyMaterial, CIPHER_LOCAL_TYPES, IV_LENGTH, KEY_LENGTH,
    REQUIRED_LOCAL_TYPES,
};
