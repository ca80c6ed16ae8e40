//! # dotscope-reactor Prelude
//!
//! The types needed to probe a module for resource decrypters, recover their key material and
//! re-encrypt resources, in one import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all operations
pub use crate::Error;

/// The result type used throughout the crate
pub use crate::Result;

// ================================================================================================
// Instructions
// ================================================================================================

/// Decoded instruction model
pub use crate::assembly::{FlowType, Immediate, Instruction, Operand};

/// Builder for instruction streams
pub use crate::assembly::InstructionAssembler;

// ================================================================================================
// Metadata
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Module container and its shared handle
pub use crate::metadata::module::{Module, ModuleRc};

/// Methods and their bodies
pub use crate::metadata::method::{
    LocalVariable, Method, MethodBody, MethodBuilder, MethodModifiers, MethodRc,
};

/// Type definitions
pub use crate::metadata::typedef::{TypeDef, TypeDefRc};

/// Manifest resources
pub use crate::metadata::resources::{
    ManifestResource, ManifestResourceAttributes, ManifestResourceRc, Resources, ResourceSource,
};

/// `#US` heap
pub use crate::metadata::userstrings::UserStrings;

/// Assembly identity and strong names
pub use crate::metadata::identity::{AssemblyIdentity, AssemblyVersion, Identity};

// ================================================================================================
// Deobfuscation
// ================================================================================================

/// Encrypted resource unit and its configuration
pub use crate::deobfuscation::{EncryptedResource, ReactorConfig};

/// Services supplied by the surrounding pipeline
pub use crate::deobfuscation::{ArrayFinder, MethodSimplifier, NoopSimplifier};

/// Method inspection helpers
pub use crate::deobfuscation::{code_strings, LocalTypes};

/// Key material and public key token detection
pub use crate::deobfuscation::obfuscators::reactor::{
    patch_iv, uses_public_key_token, KeyMaterial, PublicKeyTokenScanner,
};
