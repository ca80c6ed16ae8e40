//! Obfuscator-specific handling.
//!
//! # Supported Obfuscators
//!
//! - [`reactor`] - .NET Reactor (AES encrypted embedded resources)

pub mod reactor;
