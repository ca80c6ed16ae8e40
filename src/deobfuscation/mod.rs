//! Deobfuscation support for protected .NET resources.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  candidate method                                                 │
//! │        │                                                          │
//! │        ▼                                                          │
//! │  could_be_resource_decrypter  (LocalTypes + code_strings)         │
//! │        │ true                                                     │
//! │        ▼                                                          │
//! │  init                                                             │
//! │   ├─ MethodSimplifier::simplify                                   │
//! │   ├─ resolve embedded resource by ldstr name                      │
//! │   ├─ ArrayFinder::find_byte_array (32-byte key, 16-byte IV)       │
//! │   └─ PublicKeyTokenScanner → patch_iv                             │
//! │        │                                                          │
//! │        ▼                                                          │
//! │  decrypt / encrypt  (AES-CBC, PKCS7)                              │
//! │        │                                                          │
//! │        ▼                                                          │
//! │  update_resource  (replace table entry by identity)               │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Components
//!
//! - [`EncryptedResource`] - The encrypted resource unit
//! - [`ReactorConfig`] - Options for key recovery
//! - [`MethodSimplifier`] / [`ArrayFinder`] - Services provided by the surrounding pipeline
//! - [`LocalTypes`] - Local variable type inventory
//! - [`code_strings`] - `ldstr` literals of a method body
//! - [`obfuscators`] - Obfuscator-specific implementations

mod config;
mod localtypes;
pub mod obfuscators;
mod strings;
mod traits;

pub use config::ReactorConfig;
pub use localtypes::LocalTypes;
pub use obfuscators::reactor::EncryptedResource;
pub use strings::code_strings;
pub use traits::{ArrayFinder, MethodSimplifier, NoopSimplifier};
