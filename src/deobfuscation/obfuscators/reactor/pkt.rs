//! Detection of the public-key-token IV splice.
//!
//! Decrypters of signed assemblies copy the 8 public key token bytes into the odd positions of
//! the IV at runtime. The copy loop is unrolled into pairs of constants, `(iv index, token
//! index)`, which appear as the integer sequence
//! `1, 0, 3, 1, 5, 2, 7, 3, 9, 4, 11, 5, 13, 6, 15, 7` in a straight-line run of the method.
//!
//! [`PublicKeyTokenScanner`] is a two-state machine over that stream:
//!
//! | state                 | input                        | next state               |
//! |-----------------------|------------------------------|--------------------------|
//! | `Scanning { cursor }` | [`ScanInput::Break`]         | `Scanning { 0 }`         |
//! | `Scanning { cursor }` | [`ScanInput::Other`]         | unchanged                |
//! | `Scanning { cursor }` | `Constant(v)`, v == T[cursor] | `Scanning { cursor + 1 }` or `Matched` at 16 |
//! | `Scanning { cursor }` | `Constant(v)`, v != T[cursor] | `Scanning { 0 }`         |
//! | `Matched`             | anything                     | `Matched`                |
//!
//! A mismatching constant only resets the cursor; it is not re-tested as the first element
//! of a new match.

use crate::assembly::Instruction;

/// The `(iv index, token index)` constant pairs of the unrolled splice loop.
pub const PUBLIC_KEY_TOKEN_PATTERN: [i32; 16] = [1, 0, 3, 1, 5, 2, 7, 3, 9, 4, 11, 5, 13, 6, 15, 7];

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// `cursor` elements of the pattern have been matched so far
    Scanning {
        /// Index of the next expected pattern element
        cursor: usize,
    },
    /// The full pattern has been seen
    Matched,
}

/// What the scanner sees of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanInput {
    /// The instruction does not unconditionally fall through (branch, call, return, ...)
    Break,
    /// A sequential instruction that is not a 32-bit integer constant load
    Other,
    /// A 32-bit integer constant load
    Constant(i32),
}

impl ScanInput {
    /// Classifies an instruction.
    #[must_use]
    pub fn from_instruction(instruction: &Instruction) -> Self {
        if !instruction.falls_through() {
            return ScanInput::Break;
        }

        match instruction.ldc_i4_value() {
            Some(value) => ScanInput::Constant(value),
            None => ScanInput::Other,
        }
    }
}

impl ScanState {
    fn next(self, input: ScanInput) -> ScanState {
        let ScanState::Scanning { cursor } = self else {
            return ScanState::Matched;
        };

        match input {
            ScanInput::Break => ScanState::Scanning { cursor: 0 },
            ScanInput::Other => self,
            ScanInput::Constant(value) if value == PUBLIC_KEY_TOKEN_PATTERN[cursor] => {
                if cursor + 1 == PUBLIC_KEY_TOKEN_PATTERN.len() {
                    ScanState::Matched
                } else {
                    ScanState::Scanning { cursor: cursor + 1 }
                }
            }
            ScanInput::Constant(_) => ScanState::Scanning { cursor: 0 },
        }
    }
}

/// Incremental matcher for [`PUBLIC_KEY_TOKEN_PATTERN`].
///
/// # Examples
///
/// ```rust
/// use dotscope_reactor::deobfuscation::obfuscators::reactor::{
///     PublicKeyTokenScanner, ScanInput, ScanState, PUBLIC_KEY_TOKEN_PATTERN,
/// };
///
/// let mut scanner = PublicKeyTokenScanner::new();
/// for value in PUBLIC_KEY_TOKEN_PATTERN {
///     scanner.feed(ScanInput::Other);
///     scanner.feed(ScanInput::Constant(value));
/// }
/// assert_eq!(scanner.state(), ScanState::Matched);
/// ```
#[derive(Debug, Clone)]
pub struct PublicKeyTokenScanner {
    state: ScanState,
}

impl Default for PublicKeyTokenScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PublicKeyTokenScanner {
    /// Creates a scanner at cursor 0.
    #[must_use]
    pub fn new() -> Self {
        PublicKeyTokenScanner {
            state: ScanState::Scanning { cursor: 0 },
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Returns `true` once the full pattern has been seen.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.state == ScanState::Matched
    }

    /// Returns to cursor 0, forgetting any match.
    pub fn reset(&mut self) {
        self.state = ScanState::Scanning { cursor: 0 };
    }

    /// Advances the state machine by one input and returns the new state.
    pub fn feed(&mut self, input: ScanInput) -> ScanState {
        self.state = self.state.next(input);
        self.state
    }

    /// Feeds instructions until the pattern matches or the stream ends.
    pub fn scan<'a, I>(&mut self, instructions: I) -> bool
    where
        I: IntoIterator<Item = &'a Instruction>,
    {
        for instruction in instructions {
            if self.feed(ScanInput::from_instruction(instruction)) == ScanState::Matched {
                return true;
            }
        }
        self.is_matched()
    }
}

/// Returns `true` if `instructions` splice the public key token into the IV.
#[must_use]
pub fn uses_public_key_token(instructions: &[Instruction]) -> bool {
    PublicKeyTokenScanner::new().scan(instructions)
}

/// Writes token byte `i` to `iv[2 * i + 1]`; even positions are left untouched.
///
/// # Examples
///
/// ```rust
/// use dotscope_reactor::deobfuscation::obfuscators::reactor::patch_iv;
///
/// let mut iv = [0u8; 16];
/// patch_iv(&mut iv, &[1, 2, 3, 4, 5, 6, 7, 8]);
/// assert_eq!(iv[..4], [0, 1, 0, 2]);
/// ```
pub fn patch_iv(iv: &mut [u8; 16], public_key_token: &[u8; 8]) {
    for (i, byte) in public_key_token.iter().enumerate() {
        iv[i * 2 + 1] = *byte;
    }
}
