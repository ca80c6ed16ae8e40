//! CIL opcode byte constants (ECMA-335) for the instructions this crate inspects or emits.
//!
//! All constants are single-byte opcodes; none of the resource decrypter patterns involve
//! `0xFE`-prefixed instructions.
#![allow(missing_docs)]

// Misc
pub const NOP: u8 = 0x00;

// Argument / local shorthand
pub const LDARG_0: u8 = 0x02;
pub const LDLOC_0: u8 = 0x06;
pub const LDLOC_1: u8 = 0x07;
pub const LDLOC_2: u8 = 0x08;
pub const LDLOC_3: u8 = 0x09;
pub const STLOC_0: u8 = 0x0A;
pub const STLOC_1: u8 = 0x0B;
pub const STLOC_2: u8 = 0x0C;
pub const STLOC_3: u8 = 0x0D;
pub const LDLOC_S: u8 = 0x11;
pub const STLOC_S: u8 = 0x13;

// Null / constant loaders
pub const LDNULL: u8 = 0x14;
pub const LDC_I4_M1: u8 = 0x15;
pub const LDC_I4_0: u8 = 0x16;
pub const LDC_I4_8: u8 = 0x1E;
pub const LDC_I4_S: u8 = 0x1F;
pub const LDC_I4: u8 = 0x20;
pub const LDC_I8: u8 = 0x21;

// Stack manipulation
pub const DUP: u8 = 0x25;
pub const POP: u8 = 0x26;

// Calls and returns
pub const CALL: u8 = 0x28;
pub const RET: u8 = 0x2A;

// Branches (long form)
pub const BR: u8 = 0x38;
pub const BRFALSE: u8 = 0x39;
pub const BRTRUE: u8 = 0x3A;

// Arithmetic / logic
pub const XOR: u8 = 0x61;

// Object model
pub const CALLVIRT: u8 = 0x6F;
pub const LDSTR: u8 = 0x72;
pub const NEWOBJ: u8 = 0x73;
pub const THROW: u8 = 0x7A;

// Arrays
pub const NEWARR: u8 = 0x8D;
pub const LDLEN: u8 = 0x8E;
pub const LDELEM_U1: u8 = 0x91;
pub const STELEM_I1: u8 = 0x9C;

// Conversions and tokens
pub const LDTOKEN: u8 = 0xD0;
pub const CONV_U1: u8 = 0xD2;

// Exception handling
pub const ENDFINALLY: u8 = 0xDC;
pub const LEAVE: u8 = 0xDD;
