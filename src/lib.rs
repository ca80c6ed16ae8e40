// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # dotscope-reactor
//!
//! Recovery and re-encryption of .NET Reactor encrypted resources.
//!
//! .NET Reactor can encrypt embedded manifest resources with AES-256-CBC and inject a static
//! decrypter method that reads the resource by name and returns the plaintext stream. This crate
//! locates such decrypters, recovers the key and IV from their bodies (including the variant
//! that splices the assembly's public key token into the IV), decrypts the resource, and writes
//! new ciphertext back into the module's resource table.
//!
//! ## Features
//!
//! - **Structural probing** - Cheap local-variable and string-literal checks reject most methods
//! - **Key recovery** - Pluggable [`deobfuscation::ArrayFinder`] reconstructs key and IV arrays
//! - **Public key token detection** - A small state machine spots the IV splice loop
//! - **Cipher round trip** - AES-128/192/256-CBC with PKCS#7 padding
//! - **Rebinding** - Carry recovered key material over to a freshly reloaded module
//!
//! ## Quick Start
//!
//! ```rust
//! use dotscope_reactor::prelude::*;
//!
//! let module = Module::new("Protected.exe", None);
//! module.add_resource(ManifestResource::embedded(
//!     Token::new(0x2800_0001),
//!     "Payload.bin",
//!     ManifestResourceAttributes::PRIVATE,
//!     Vec::new(),
//! ));
//!
//! let unit = EncryptedResource::new(module.clone());
//! for entry in module.methods().iter() {
//!     if unit.could_be_resource_decrypter(entry.value(), &[], true) {
//!         println!("candidate: {}", entry.value().fullname());
//!     }
//! }
//! # Ok::<(), dotscope_reactor::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`assembly`] - CIL instruction model and a small label-resolving assembler
//! - [`metadata`] - In-memory module model: methods, types, resources, user strings, identity
//! - [`deobfuscation`] - Candidate probing, key recovery and the encrypted resource lifecycle
//! - [`utils`] - Block cipher helpers
//! - [`Error`] / [`Result`] - Error handling
//!
//! ## Logging
//!
//! Progress is reported through the [`log`](https://docs.rs/log) facade at `debug` level; a
//! decrypter that expects a public key token in an unsigned assembly is reported at `warn`.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// ```rust
/// use dotscope_reactor::prelude::*;
///
/// let config = ReactorConfig::default().with_simplify_method(false);
/// assert!(config.patch_public_key_token);
/// ```
pub mod prelude;

/// CIL instruction model and assembler.
///
/// [`assembly::Instruction`] carries an opcode, its operand and its [`assembly::FlowType`];
/// [`assembly::InstructionAssembler`] builds instruction streams with symbolic branch labels.
pub mod assembly;

/// In-memory .NET module metadata.
pub mod metadata;

/// Shared helpers.
pub mod utils;

/// Encrypted resource recovery.
pub mod deobfuscation;

/// `dotscope-reactor` Result type.
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotscope-reactor` Error type.
pub use error::Error;
