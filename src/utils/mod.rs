//! Shared low-level helpers.

pub mod crypto;
