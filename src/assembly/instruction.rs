//! CIL instruction representation, operand types, and control-flow classification.
//!
//! The [`Instruction`] struct aggregates everything the resource-decrypter heuristics need to
//! know about a decoded CIL instruction: where it lives, which opcode it is, what operand it
//! carries and how it affects control flow.
//!
//! # Key Components
//!
//! - [`Instruction`] - Complete decoded instruction representation
//! - [`Operand`] - Type-safe operand representation
//! - [`Immediate`] - Immediate value types embedded in the instruction stream
//! - [`FlowType`] - Control flow behavior classification
//!
//! # Usage Examples
//!
//! ```rust
//! use dotscope_reactor::assembly::{InstructionAssembler, FlowType};
//!
//! let mut asm = InstructionAssembler::new();
//! asm.ldc_i4(42)?.ret()?;
//! let instructions = asm.finish()?;
//!
//! assert_eq!(instructions[0].ldc_i4_value(), Some(42));
//! assert_eq!(instructions[1].flow_type, FlowType::Return);
//! # Ok::<(), dotscope_reactor::Error>(())
//! ```

use std::fmt;

use strum::{Display, EnumIter};

use crate::{assembly::opcodes, metadata::token::Token};

/// Represents an immediate value embedded in a CIL instruction.
///
/// # Examples
///
/// ```rust
/// use dotscope_reactor::assembly::Immediate;
///
/// let short_form = Immediate::Int8(-3);
/// let long_form = Immediate::Int32(1_000);
/// assert_ne!(short_form, long_form);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    /// Signed 8-bit immediate value (`ldc.i4.s`, short branches)
    Int8(i8),
    /// Signed 32-bit immediate value (`ldc.i4`)
    Int32(i32),
    /// Signed 64-bit immediate value (`ldc.i8`)
    Int64(i64),
}

impl fmt::UpperHex for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Int8(value) => write!(f, "{value:02X}"),
            Immediate::Int32(value) => write!(f, "{value:08X}"),
            Immediate::Int64(value) => write!(f, "{value:016X}"),
        }
    }
}

/// The operand of an instruction after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand present
    None,
    /// Immediate value (constant embedded in instruction)
    Immediate(Immediate),
    /// Branch target address
    Target(u64),
    /// Metadata token reference (`ldstr`, `call`, `newarr`, `ldtoken`, ...)
    Token(Token),
    /// Local variable index
    Local(u16),
}

/// How an instruction affects control flow.
///
/// Only [`FlowType::Sequential`] instructions fall through to the next instruction
/// unconditionally; every other variant ends a straight-line run as far as the
/// pattern scanners in this crate are concerned. Calls are deliberately not sequential.
///
/// # Examples
///
/// ```rust
/// use dotscope_reactor::assembly::FlowType;
/// use strum::IntoEnumIterator;
///
/// let breaking = FlowType::iter().filter(|flow| *flow != FlowType::Sequential).count();
/// assert_eq!(breaking, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FlowType {
    /// Normal execution continues to next instruction
    Sequential,
    /// Conditional branch to another location
    ConditionalBranch,
    /// Always branches to another location (unconditional jump)
    UnconditionalBranch,
    /// Call to another method
    Call,
    /// Returns from current method
    Return,
    /// Multi-way branch (switch statement)
    Switch,
    /// Exception throwing
    Throw,
    /// End of finally block
    EndFinally,
    /// Leave protected region (try/catch/finally)
    Leave,
}

/// A decoded CIL instruction.
#[derive(Clone, PartialEq)]
pub struct Instruction {
    /// Relative virtual address where this instruction is located
    pub rva: u64,
    /// Offset of this instruction from the start of the method body
    pub offset: u64,
    /// Size of this instruction in bytes
    pub size: u64,
    /// Primary opcode byte
    pub opcode: u8,
    /// Prefix byte (0 if no prefix)
    pub prefix: u8,
    /// Human-readable instruction mnemonic (e.g., "ldc.i4.s", "ldstr", "ret")
    pub mnemonic: &'static str,
    /// How this instruction affects control flow
    pub flow_type: FlowType,
    /// The operand data for this instruction
    pub operand: Operand,
    /// Computed branch targets (if any, as absolute addresses)
    pub branch_targets: Vec<u64>,
}

impl Instruction {
    /// Returns `true` if execution always continues with the next instruction.
    #[must_use]
    pub fn falls_through(&self) -> bool {
        self.flow_type == FlowType::Sequential
    }

    /// Returns the pushed value if this is one of the 32-bit integer constant loads.
    ///
    /// Covers `ldc.i4.m1`, `ldc.i4.0` through `ldc.i4.8`, `ldc.i4.s` and `ldc.i4`.
    /// `ldc.i8` does not load a 32-bit integer constant and yields `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dotscope_reactor::assembly::InstructionAssembler;
    ///
    /// let mut asm = InstructionAssembler::new();
    /// asm.ldc_i4(-1)?.ldc_i4(7)?.ldc_i4(100)?.ldc_i4(70_000)?.nop()?;
    /// let values: Vec<_> = asm.finish()?.iter().map(|i| i.ldc_i4_value()).collect();
    /// assert_eq!(values, vec![Some(-1), Some(7), Some(100), Some(70_000), None]);
    /// # Ok::<(), dotscope_reactor::Error>(())
    /// ```
    #[must_use]
    pub fn ldc_i4_value(&self) -> Option<i32> {
        if self.prefix != 0 {
            return None;
        }

        match self.opcode {
            opcodes::LDC_I4_M1 => Some(-1),
            opcodes::LDC_I4_0..=opcodes::LDC_I4_8 => {
                Some(i32::from(self.opcode - opcodes::LDC_I4_0))
            }
            opcodes::LDC_I4_S => match self.operand {
                Operand::Immediate(Immediate::Int8(value)) => Some(i32::from(value)),
                _ => None,
            },
            opcodes::LDC_I4 => match self.operand {
                Operand::Immediate(Immediate::Int32(value)) => Some(value),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns `true` for `ldstr`.
    #[must_use]
    pub fn is_ldstr(&self) -> bool {
        self.prefix == 0 && self.opcode == opcodes::LDSTR
    }

    /// Extracts the metadata token operand, if any.
    #[must_use]
    pub fn token_operand(&self) -> Option<Token> {
        match self.operand {
            Operand::Token(token) => Some(token),
            _ => None,
        }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X} - ", self.rva)?;

        if self.prefix != 0 {
            write!(f, "{:02X}:", self.prefix)?;
        }

        write!(f, "{:02X} - {:<12}", self.opcode, self.mnemonic)?;

        match &self.operand {
            Operand::None => {}
            Operand::Immediate(imm) => write!(f, " 0x{imm:X}")?,
            Operand::Target(target) => write!(f, " -> 0x{target:08X}")?,
            Operand::Token(token) => write!(f, " token:0x{:08X}", token.value())?,
            Operand::Local(local) => write!(f, " local:{local}")?,
        }

        write!(f, " | {}", self.flow_type)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn instruction(opcode: u8, flow_type: FlowType, operand: Operand) -> Instruction {
        Instruction {
            rva: 0x2050,
            offset: 0,
            size: 1,
            opcode,
            prefix: 0,
            mnemonic: "test",
            flow_type,
            operand,
            branch_targets: Vec::new(),
        }
    }

    #[test]
    fn test_ldc_i4_short_forms() {
        for (opcode, expected) in (opcodes::LDC_I4_0..=opcodes::LDC_I4_8).zip(0..=8) {
            let instr = instruction(opcode, FlowType::Sequential, Operand::None);
            assert_eq!(instr.ldc_i4_value(), Some(expected));
        }

        let m1 = instruction(opcodes::LDC_I4_M1, FlowType::Sequential, Operand::None);
        assert_eq!(m1.ldc_i4_value(), Some(-1));
    }

    #[test]
    fn test_ldc_i4_operand_forms() {
        let short = instruction(
            opcodes::LDC_I4_S,
            FlowType::Sequential,
            Operand::Immediate(Immediate::Int8(-100)),
        );
        assert_eq!(short.ldc_i4_value(), Some(-100));

        let long = instruction(
            opcodes::LDC_I4,
            FlowType::Sequential,
            Operand::Immediate(Immediate::Int32(0x1234_5678)),
        );
        assert_eq!(long.ldc_i4_value(), Some(0x1234_5678));

        let wide = instruction(
            opcodes::LDC_I8,
            FlowType::Sequential,
            Operand::Immediate(Immediate::Int64(5)),
        );
        assert_eq!(wide.ldc_i4_value(), None);
    }

    #[test]
    fn test_prefixed_opcode_is_not_constant() {
        let mut instr = instruction(opcodes::LDC_I4_0, FlowType::Sequential, Operand::None);
        instr.prefix = 0xFE;
        assert_eq!(instr.ldc_i4_value(), None);
    }

    #[test]
    fn test_only_sequential_falls_through() {
        for flow in FlowType::iter() {
            let instr = instruction(opcodes::NOP, flow, Operand::None);
            assert_eq!(instr.falls_through(), flow == FlowType::Sequential);
        }
    }

    #[test]
    fn test_token_operand() {
        let call = instruction(opcodes::CALL, FlowType::Call, Operand::Token(Token::new(0x0A000001)));
        assert_eq!(call.token_operand(), Some(Token::new(0x0A000001)));

        let br = instruction(opcodes::BR, FlowType::UnconditionalBranch, Operand::Target(0));
        assert_eq!(br.token_operand(), None);
        assert!(!br.falls_through());
    }

    #[test]
    fn test_debug_format() {
        let instr = instruction(
            opcodes::LDSTR,
            FlowType::Sequential,
            Operand::Token(Token::new(0x70000001)),
        );
        let text = format!("{instr:?}");
        assert!(text.contains("token:0x70000001"));
        assert!(text.ends_with("Sequential"));
    }
}
