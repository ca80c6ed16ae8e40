//! In-memory metadata model of a managed module.
//!
//! This is the subset of ECMA-335 metadata that encrypted resource handling touches:
//!
//! - [`token`] - Metadata tokens for table rows and heap entries
//! - [`identity`] - Assembly identity and public key token derivation
//! - [`typedef`] - Type definitions
//! - [`method`] - Methods with their bodies and local variables
//! - [`userstrings`] - The `#US` heap backing `ldstr`
//! - [`resources`] - The ordered manifest resource table
//! - [`module`] - The [`module::Module`] container tying it all together

pub mod identity;
pub mod method;
pub mod module;
pub mod resources;
pub mod token;
pub mod typedef;
pub mod userstrings;
