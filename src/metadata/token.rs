//! Metadata tokens.
//!
//! A [`Token`] addresses a row of a metadata table or, for `ldstr`, an entry of the `#US`
//! heap. Tokens survive a reload of the same module unchanged, which makes them the key for
//! method lookups across module copies.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A metadata token referencing a table row or a heap entry.
///
/// - The high byte (bits 24-31) selects the table (or `0x70` for the `#US` heap)
/// - The low 24 bits (bits 0-23) hold the row index or heap position
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// Table id of `TypeDef` rows
    pub const TYPEDEF: u8 = 0x02;
    /// Table id of `MethodDef` rows
    pub const METHODDEF: u8 = 0x06;
    /// Table id of `MemberRef` rows
    pub const MEMBERREF: u8 = 0x0A;
    /// Table id of `ManifestResource` rows
    pub const MANIFESTRESOURCE: u8 = 0x28;
    /// Pseudo table id of the `#US` heap
    pub const USERSTRING: u8 = 0x70;

    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Composes a token from a table id and a row (or heap) index.
    ///
    /// Bits of `row` above the low 24 are discarded.
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if this token points into the `#US` heap
    #[must_use]
    pub fn is_user_string(&self) -> bool {
        self.table() == Self::USERSTRING
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_parts() {
        let token = Token::new(0x0600_0012);
        assert_eq!(token.table(), Token::METHODDEF);
        assert_eq!(token.row(), 0x12);
        assert!(!token.is_null());
        assert!(Token::new(0).is_null());
    }

    #[test]
    fn test_from_parts_masks_row() {
        let token = Token::from_parts(Token::USERSTRING, 0x0100_0005);
        assert_eq!(token.value(), 0x7000_0005);
        assert!(token.is_user_string());
        assert!(!Token::from_parts(Token::MANIFESTRESOURCE, 1).is_user_string());
    }

    #[test]
    fn test_token_formatting() {
        let token = Token(0x2800_0001);
        assert_eq!(token.to_string(), "0x28000001");

        let debug_str = format!("{token:?}");
        assert!(debug_str.contains("table: 0x28"));
        assert!(debug_str.contains("row: 1"));
    }

    #[test]
    fn test_token_conversions_and_ordering() {
        let token: Token = 0x0200_0003u32.into();
        let raw: u32 = token.into();
        assert_eq!(raw, 0x0200_0003);
        assert!(Token(0x0200_0003) < Token(0x0600_0001));

        let set: HashSet<Token> = [Token(1), Token(1), Token(2)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
