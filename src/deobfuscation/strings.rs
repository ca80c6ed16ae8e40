//! String literals loaded by a method body.

use crate::{assembly::Instruction, metadata::userstrings::UserStrings};

/// Lazily yields the string loaded by every `ldstr` in `instructions`, in order.
///
/// Tokens that do not resolve in `heap` are skipped. The iterator borrows its inputs, so the
/// sequence can be restarted by calling the function again.
///
/// # Examples
///
/// ```rust
/// use dotscope_reactor::assembly::InstructionAssembler;
/// use dotscope_reactor::deobfuscation::code_strings;
/// use dotscope_reactor::metadata::userstrings::UserStrings;
///
/// let heap = UserStrings::new();
/// let first = heap.add("first");
/// let second = heap.add("second");
///
/// let mut asm = InstructionAssembler::new();
/// asm.ldstr(second)?.pop()?.ldstr(first)?.ret()?;
/// let instructions = asm.finish()?;
///
/// let strings: Vec<_> = code_strings(&instructions, &heap).collect();
/// assert_eq!(strings, vec!["second", "first"]);
/// # Ok::<(), dotscope_reactor::Error>(())
/// ```
pub fn code_strings<'a>(
    instructions: &'a [Instruction],
    heap: &'a UserStrings,
) -> impl Iterator<Item = String> + 'a {
    instructions
        .iter()
        .filter(|instruction| instruction.is_ldstr())
        .filter_map(Instruction::token_operand)
        .filter_map(move |token| heap.get(token))
}
