//! Owned, append-only `#US` heap.
//!
//! String literals referenced by `ldstr` are stored as UTF-16, exactly as they appear in the
//! `#US` stream. Entries are addressed with `0x70`-table tokens whose row is the 1-based
//! position of the entry in the heap.

use widestring::U16String;

use crate::metadata::token::Token;

/// The user string heap of a module.
pub struct UserStrings {
    entries: boxcar::Vec<U16String>,
}

impl Default for UserStrings {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStrings {
    /// Creates an empty heap.
    #[must_use]
    pub fn new() -> Self {
        UserStrings {
            entries: boxcar::Vec::new(),
        }
    }

    /// Appends `value` and returns the token an `ldstr` uses to load it.
    pub fn add(&self, value: &str) -> Token {
        let index = self.entries.push(U16String::from_str(value));
        #[allow(clippy::cast_possible_truncation)]
        let row = (index + 1) as u32;
        Token::from_parts(Token::USERSTRING, row)
    }

    /// Raw UTF-16 code units of the entry behind `token`.
    #[must_use]
    pub fn get_utf16(&self, token: Token) -> Option<&U16String> {
        if !token.is_user_string() || token.row() == 0 {
            return None;
        }
        self.entries.get(token.row() as usize - 1)
    }

    /// The entry behind `token`; unpaired surrogates are replaced with U+FFFD.
    #[must_use]
    pub fn get(&self, token: Token) -> Option<String> {
        self.get_utf16(token).map(|value| value.to_string_lossy())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.count()
    }

    /// Returns true if the heap holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.count() == 0
    }

    /// Iterates over `(token, value)` pairs in heap order.
    pub fn iter(&self) -> impl Iterator<Item = (Token, String)> + '_ {
        self.entries.iter().map(|(index, value)| {
            #[allow(clippy::cast_possible_truncation)]
            let token = Token::from_parts(Token::USERSTRING, (index + 1) as u32);
            (token, value.to_string_lossy())
        })
    }
}

#[cfg(test)]
mod tests {
    use widestring::u16str;

    use super::*;

    #[test]
    fn test_add_and_get() {
        let heap = UserStrings::new();
        let hello = heap.add("Hello, World!");
        let resource = heap.add("a.b.resources");

        assert_eq!(hello, Token::new(0x7000_0001));
        assert_eq!(resource, Token::new(0x7000_0002));
        assert_eq!(heap.get(resource).as_deref(), Some("a.b.resources"));
        assert_eq!(heap.get_utf16(hello).unwrap().as_ustr(), u16str!("Hello, World!"));
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn test_invalid_tokens() {
        let heap = UserStrings::new();
        heap.add("x");

        assert!(heap.get(Token::new(0x7000_0000)).is_none());
        assert!(heap.get(Token::new(0x7000_0002)).is_none());
        assert!(heap.get(Token::new(0x0600_0001)).is_none());
    }

    #[test]
    fn test_iter_in_order() {
        let heap = UserStrings::new();
        heap.add("first");
        heap.add("second");

        let values: Vec<_> = heap.iter().map(|(_, value)| value).collect();
        assert_eq!(values, vec!["first", "second"]);
    }
}
