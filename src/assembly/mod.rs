//! CIL instruction model and a fluent in-memory assembler.
//!
//! Method bodies handled by this crate are sequences of already decoded [`Instruction`]s.
//! Each instruction carries its opcode, its operand and a [`FlowType`] describing how it
//! continues execution. The resource decrypter heuristics only inspect that information, so
//! there is no byte-level decoder here; bodies are produced either by a loader outside this
//! crate or by [`InstructionAssembler`].
//!
//! # Key Components
//!
//! - [`Instruction`] - Decoded instruction with address, opcode, operand and flow type
//! - [`Operand`] / [`Immediate`] - Operand representation
//! - [`FlowType`] - Control flow classification
//! - [`InstructionAssembler`] - Fluent builder with label resolution
//! - [`opcodes`] - Opcode byte constants

mod assembler;
mod instruction;
pub mod opcodes;

pub use assembler::InstructionAssembler;
pub use instruction::{FlowType, Immediate, Instruction, Operand};
