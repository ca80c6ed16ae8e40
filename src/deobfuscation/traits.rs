//! Interfaces to the passes that encrypted resource recovery depends on.
//!
//! Recovering key material needs two services that live outside this crate's scope: a
//! simplifier that normalizes obfuscated method bodies in place, and a reconstruction utility
//! that turns array-building instruction sequences back into byte arrays. Both are plain
//! traits with blanket implementations for closures, so callers can pass a full pass object or
//! an ad-hoc function.
//!
//! # Examples
//!
//! ```rust
//! use dotscope_reactor::deobfuscation::{ArrayFinder, MethodSimplifier, NoopSimplifier};
//! use dotscope_reactor::metadata::method::{Method, MethodModifiers};
//! use dotscope_reactor::metadata::token::Token;
//!
//! let method = Method::new(Token::new(0x0600_0001), "M", MethodModifiers::STATIC);
//!
//! let finder = |_: &Method, len: usize| Some(vec![0u8; len]);
//! assert_eq!(finder.find_byte_array(&method, 16).map(|a| a.len()), Some(16));
//!
//! NoopSimplifier.simplify(&method);
//! ```

use crate::metadata::method::Method;

/// Normalizes a method body in place.
///
/// Implementations must be idempotent: running the simplifier twice leaves the body as it was
/// after the first run.
pub trait MethodSimplifier {
    /// Rewrites the body of `method`.
    fn simplify(&self, method: &Method);
}

impl<F> MethodSimplifier for F
where
    F: Fn(&Method),
{
    fn simplify(&self, method: &Method) {
        self(method);
    }
}

/// A simplifier that leaves every body untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSimplifier;

impl MethodSimplifier for NoopSimplifier {
    fn simplify(&self, _method: &Method) {}
}

/// Reconstructs constant byte arrays built by a method's instructions.
pub trait ArrayFinder {
    /// Returns the contents of an array of exactly `expected_len` bytes initialized in
    /// `method`, or `None` if no such array is found.
    ///
    /// When several arrays qualify, implementations return the first one in instruction order.
    fn find_byte_array(&self, method: &Method, expected_len: usize) -> Option<Vec<u8>>;
}

impl<F> ArrayFinder for F
where
    F: Fn(&Method, usize) -> Option<Vec<u8>>,
{
    fn find_byte_array(&self, method: &Method, expected_len: usize) -> Option<Vec<u8>> {
        self(method, expected_len)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::metadata::{method::MethodModifiers, token::Token};

    #[test]
    fn test_closure_simplifier_is_invoked() {
        let calls = Cell::new(0);
        let simplifier = |_: &Method| calls.set(calls.get() + 1);
        let method = Method::new(Token::new(0x0600_0001), "M", MethodModifiers::STATIC);

        simplifier.simplify(&method);
        simplifier.simplify(&method);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_trait_objects() {
        let finder = |_: &Method, len: usize| (len == 32).then(|| vec![1u8; 32]);
        let dyn_finder: &dyn ArrayFinder = &finder;
        let dyn_simplifier: &dyn MethodSimplifier = &NoopSimplifier;
        let method = Method::new(Token::new(0x0600_0002), "N", MethodModifiers::empty());

        dyn_simplifier.simplify(&method);
        assert!(dyn_finder.find_byte_array(&method, 16).is_none());
        assert_eq!(dyn_finder.find_byte_array(&method, 32).unwrap().len(), 32);
    }
}
