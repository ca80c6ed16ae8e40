//! Fluent construction of in-memory CIL instruction streams.
//!
//! [`InstructionAssembler`] produces decoded [`Instruction`] values directly instead of raw
//! bytecode. Offsets and sizes follow the ECMA-335 encoding of each opcode, so the result looks
//! exactly like the output of a decoder run over the equivalent method body.
//!
//! # Label Resolution
//!
//! ```rust
//! use dotscope_reactor::assembly::{InstructionAssembler, Operand};
//!
//! let mut asm = InstructionAssembler::new();
//! asm.ldc_i4(1)?
//!     .brtrue("done")?
//!     .ldc_i4(2)?
//!     .pop()?
//!     .label("done")?
//!     .ret()?;
//!
//! let instructions = asm.finish()?;
//! assert_eq!(instructions[1].operand, Operand::Target(instructions[4].rva));
//! # Ok::<(), dotscope_reactor::Error>(())
//! ```

use std::collections::HashMap;

use crate::{
    assembly::{
        instruction::{FlowType, Immediate, Instruction, Operand},
        opcodes,
    },
    metadata::token::Token,
    Result,
};

const LDC_I4_SHORT_MNEMONICS: [&str; 9] = [
    "ldc.i4.0", "ldc.i4.1", "ldc.i4.2", "ldc.i4.3", "ldc.i4.4", "ldc.i4.5", "ldc.i4.6",
    "ldc.i4.7", "ldc.i4.8",
];
const LDLOC_SHORT_MNEMONICS: [&str; 4] = ["ldloc.0", "ldloc.1", "ldloc.2", "ldloc.3"];
const STLOC_SHORT_MNEMONICS: [&str; 4] = ["stloc.0", "stloc.1", "stloc.2", "stloc.3"];

/// Builds a list of [`Instruction`]s with automatic offset tracking and label fixups.
///
/// Every emitter returns `Result<&mut Self>` so calls can be chained with `?`. Branches always
/// use the long (4-byte offset) encoding.
pub struct InstructionAssembler {
    base_rva: u64,
    offset: u64,
    instructions: Vec<Instruction>,
    labels: HashMap<String, u64>,
    fixups: Vec<(usize, String)>,
}

impl Default for InstructionAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionAssembler {
    /// Creates an assembler whose first instruction is placed at RVA 0.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rva(0)
    }

    /// Creates an assembler whose first instruction is placed at `base_rva`.
    #[must_use]
    pub fn with_rva(base_rva: u64) -> Self {
        InstructionAssembler {
            base_rva,
            offset: 0,
            instructions: Vec::new(),
            labels: HashMap::new(),
            fixups: Vec::new(),
        }
    }

    /// Number of instructions emitted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` if nothing has been emitted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    fn emit(
        &mut self,
        opcode: u8,
        mnemonic: &'static str,
        size: u64,
        flow_type: FlowType,
        operand: Operand,
    ) -> Result<&mut Self> {
        self.instructions.push(Instruction {
            rva: self.base_rva + self.offset,
            offset: self.offset,
            size,
            opcode,
            prefix: 0,
            mnemonic,
            flow_type,
            operand,
            branch_targets: Vec::new(),
        });
        self.offset += size;
        Ok(self)
    }

    fn emit_branch(
        &mut self,
        opcode: u8,
        mnemonic: &'static str,
        flow_type: FlowType,
        label: &str,
    ) -> Result<&mut Self> {
        self.fixups.push((self.instructions.len(), label.to_string()));
        self.emit(opcode, mnemonic, 5, flow_type, Operand::None)
    }

    fn emit_token(
        &mut self,
        opcode: u8,
        mnemonic: &'static str,
        flow_type: FlowType,
        token: Token,
    ) -> Result<&mut Self> {
        self.emit(opcode, mnemonic, 5, flow_type, Operand::Token(token))
    }

    fn emit_simple(&mut self, opcode: u8, mnemonic: &'static str) -> Result<&mut Self> {
        self.emit(opcode, mnemonic, 1, FlowType::Sequential, Operand::None)
    }

    /// Defines `name` at the position of the next emitted instruction.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the label was already defined.
    pub fn label(&mut self, name: &str) -> Result<&mut Self> {
        if self.labels.contains_key(name) {
            return Err(malformed_error!("Label '{}' is defined twice", name));
        }
        self.labels.insert(name.to_string(), self.offset);
        Ok(self)
    }

    /// Emits `nop`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn nop(&mut self) -> Result<&mut Self> {
        self.emit_simple(opcodes::NOP, "nop")
    }

    /// Emits `ldarg.0`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn ldarg_0(&mut self) -> Result<&mut Self> {
        self.emit_simple(opcodes::LDARG_0, "ldarg.0")
    }

    /// Emits `ldnull`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn ldnull(&mut self) -> Result<&mut Self> {
        self.emit_simple(opcodes::LDNULL, "ldnull")
    }

    /// Emits the most compact 32-bit integer constant load for `value`.
    ///
    /// - `ldc.i4.m1` and `ldc.i4.0`-`ldc.i4.8` for -1..=8 (1 byte)
    /// - `ldc.i4.s` for -128..=127 (2 bytes)
    /// - `ldc.i4` otherwise (5 bytes)
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn ldc_i4(&mut self, value: i32) -> Result<&mut Self> {
        match value {
            -1 => self.emit_simple(opcodes::LDC_I4_M1, "ldc.i4.m1"),
            0..=8 => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let index = value as u8;
                self.emit_simple(
                    opcodes::LDC_I4_0 + index,
                    LDC_I4_SHORT_MNEMONICS[usize::from(index)],
                )
            }
            x if (-128..=127).contains(&x) => {
                #[allow(clippy::cast_possible_truncation)]
                let short = x as i8;
                self.emit(
                    opcodes::LDC_I4_S,
                    "ldc.i4.s",
                    2,
                    FlowType::Sequential,
                    Operand::Immediate(Immediate::Int8(short)),
                )
            }
            x => self.emit(
                opcodes::LDC_I4,
                "ldc.i4",
                5,
                FlowType::Sequential,
                Operand::Immediate(Immediate::Int32(x)),
            ),
        }
    }

    /// Emits `ldc.i8`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn ldc_i8(&mut self, value: i64) -> Result<&mut Self> {
        self.emit(
            opcodes::LDC_I8,
            "ldc.i8",
            9,
            FlowType::Sequential,
            Operand::Immediate(Immediate::Int64(value)),
        )
    }

    /// Emits `ldstr` referencing a `#US` heap token.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn ldstr(&mut self, token: Token) -> Result<&mut Self> {
        self.emit_token(opcodes::LDSTR, "ldstr", FlowType::Sequential, token)
    }

    /// Emits the most compact `ldloc` form for `index`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn ldloc(&mut self, index: u8) -> Result<&mut Self> {
        if index < 4 {
            self.emit(
                opcodes::LDLOC_0 + index,
                LDLOC_SHORT_MNEMONICS[usize::from(index)],
                1,
                FlowType::Sequential,
                Operand::Local(u16::from(index)),
            )
        } else {
            self.emit(
                opcodes::LDLOC_S,
                "ldloc.s",
                2,
                FlowType::Sequential,
                Operand::Local(u16::from(index)),
            )
        }
    }

    /// Emits the most compact `stloc` form for `index`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn stloc(&mut self, index: u8) -> Result<&mut Self> {
        if index < 4 {
            self.emit(
                opcodes::STLOC_0 + index,
                STLOC_SHORT_MNEMONICS[usize::from(index)],
                1,
                FlowType::Sequential,
                Operand::Local(u16::from(index)),
            )
        } else {
            self.emit(
                opcodes::STLOC_S,
                "stloc.s",
                2,
                FlowType::Sequential,
                Operand::Local(u16::from(index)),
            )
        }
    }

    /// Emits `dup`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn dup(&mut self) -> Result<&mut Self> {
        self.emit_simple(opcodes::DUP, "dup")
    }

    /// Emits `pop`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn pop(&mut self) -> Result<&mut Self> {
        self.emit_simple(opcodes::POP, "pop")
    }

    /// Emits `xor`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn xor(&mut self) -> Result<&mut Self> {
        self.emit_simple(opcodes::XOR, "xor")
    }

    /// Emits `conv.u1`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn conv_u1(&mut self) -> Result<&mut Self> {
        self.emit_simple(opcodes::CONV_U1, "conv.u1")
    }

    /// Emits `ldlen`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn ldlen(&mut self) -> Result<&mut Self> {
        self.emit_simple(opcodes::LDLEN, "ldlen")
    }

    /// Emits `ldelem.u1`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn ldelem_u1(&mut self) -> Result<&mut Self> {
        self.emit_simple(opcodes::LDELEM_U1, "ldelem.u1")
    }

    /// Emits `stelem.i1`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn stelem_i1(&mut self) -> Result<&mut Self> {
        self.emit_simple(opcodes::STELEM_I1, "stelem.i1")
    }

    /// Emits `newarr` for the element type `token`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn newarr(&mut self, token: Token) -> Result<&mut Self> {
        self.emit_token(opcodes::NEWARR, "newarr", FlowType::Sequential, token)
    }

    /// Emits `newobj` for the constructor `token`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn newobj(&mut self, token: Token) -> Result<&mut Self> {
        self.emit_token(opcodes::NEWOBJ, "newobj", FlowType::Call, token)
    }

    /// Emits `ldtoken`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn ldtoken(&mut self, token: Token) -> Result<&mut Self> {
        self.emit_token(opcodes::LDTOKEN, "ldtoken", FlowType::Sequential, token)
    }

    /// Emits `call`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn call(&mut self, token: Token) -> Result<&mut Self> {
        self.emit_token(opcodes::CALL, "call", FlowType::Call, token)
    }

    /// Emits `callvirt`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn callvirt(&mut self, token: Token) -> Result<&mut Self> {
        self.emit_token(opcodes::CALLVIRT, "callvirt", FlowType::Call, token)
    }

    /// Emits `br` to `label`.
    ///
    /// # Errors
    /// Never fails here; an unknown label is reported by [`InstructionAssembler::finish`].
    pub fn br(&mut self, label: &str) -> Result<&mut Self> {
        self.emit_branch(opcodes::BR, "br", FlowType::UnconditionalBranch, label)
    }

    /// Emits `brtrue` to `label`.
    ///
    /// # Errors
    /// Never fails here; an unknown label is reported by [`InstructionAssembler::finish`].
    pub fn brtrue(&mut self, label: &str) -> Result<&mut Self> {
        self.emit_branch(opcodes::BRTRUE, "brtrue", FlowType::ConditionalBranch, label)
    }

    /// Emits `brfalse` to `label`.
    ///
    /// # Errors
    /// Never fails here; an unknown label is reported by [`InstructionAssembler::finish`].
    pub fn brfalse(&mut self, label: &str) -> Result<&mut Self> {
        self.emit_branch(opcodes::BRFALSE, "brfalse", FlowType::ConditionalBranch, label)
    }

    /// Emits `leave` to `label`.
    ///
    /// # Errors
    /// Never fails here; an unknown label is reported by [`InstructionAssembler::finish`].
    pub fn leave(&mut self, label: &str) -> Result<&mut Self> {
        self.emit_branch(opcodes::LEAVE, "leave", FlowType::Leave, label)
    }

    /// Emits `endfinally`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn endfinally(&mut self) -> Result<&mut Self> {
        self.emit(opcodes::ENDFINALLY, "endfinally", 1, FlowType::EndFinally, Operand::None)
    }

    /// Emits `throw`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn throw(&mut self) -> Result<&mut Self> {
        self.emit(opcodes::THROW, "throw", 1, FlowType::Throw, Operand::None)
    }

    /// Emits `ret`.
    ///
    /// # Errors
    /// Never fails; the `Result` keeps the emitter chainable.
    pub fn ret(&mut self) -> Result<&mut Self> {
        self.emit(opcodes::RET, "ret", 1, FlowType::Return, Operand::None)
    }

    /// Resolves all branch labels and returns the finished instruction list.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a branch references an undefined label.
    pub fn finish(mut self) -> Result<Vec<Instruction>> {
        for (index, label) in &self.fixups {
            let Some(offset) = self.labels.get(label) else {
                return Err(malformed_error!("Branch to undefined label '{}'", label));
            };

            let target = self.base_rva + offset;
            let instruction = &mut self.instructions[*index];
            instruction.operand = Operand::Target(target);
            instruction.branch_targets = vec![target];
        }

        Ok(self.instructions)
    }
}
