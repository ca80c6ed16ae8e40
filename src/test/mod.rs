//! Fixture factories for resource decrypter tests.

use crate::{
    assembly::{opcodes, InstructionAssembler},
    deobfuscation::ArrayFinder,
    metadata::{
        identity::{AssemblyIdentity, AssemblyVersion, Identity},
        method::{Method, MethodBuilder, MethodModifiers, MethodRc},
        module::{Module, ModuleRc},
        token::Token,
        typedef::TypeDef,
    },
    Result,
};

/// Public key token of the signed fixture assembly
pub const FIXTURE_PUBLIC_KEY_TOKEN: [u8; 8] = [0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89];
/// Token of the fixture decrypter method
pub const DECRYPTER_TOKEN: Token = Token(0x0600_0001);

const BYTE_TYPEREF: Token = Token(0x0100_0001);
const GET_EXECUTING_ASSEMBLY: Token = Token(0x0A00_0001);
const GET_MANIFEST_RESOURCE_STREAM: Token = Token(0x0A00_0002);
const BINARY_READER_CTOR: Token = Token(0x0A00_0003);
const GET_NAME: Token = Token(0x0A00_0004);
const GET_PUBLIC_KEY_TOKEN: Token = Token(0x0A00_0005);
const RIJNDAEL_CTOR: Token = Token(0x0A00_0006);
const CREATE_DECRYPTOR: Token = Token(0x0A00_0007);
const CRYPTO_STREAM_CTOR: Token = Token(0x0A00_0008);

/// Local variable types declared by the fixture decrypter
pub fn decrypter_locals() -> Vec<&'static str> {
    vec![
        "System.Byte[]",
        "System.Byte[]",
        "System.Byte[]",
        "System.IO.BinaryReader",
        "System.IO.MemoryStream",
        "System.Security.Cryptography.CryptoStream",
        "System.Security.Cryptography.ICryptoTransform",
        "System.Security.Cryptography.RijndaelManaged",
        "System.IO.Stream",
    ]
}

/// A module whose assembly is signed with [`FIXTURE_PUBLIC_KEY_TOKEN`]
pub fn signed_module() -> ModuleRc {
    Module::new(
        "Protected.exe",
        Some(AssemblyIdentity::new(
            "Protected",
            AssemblyVersion::new(1, 0, 0, 0),
            Some(Identity::Token(FIXTURE_PUBLIC_KEY_TOKEN)),
        )),
    )
}

fn emit_byte_array(asm: &mut InstructionAssembler, data: &[u8], local: u8) -> Result<()> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let len = data.len() as i32;
    asm.ldc_i4(len)?.newarr(BYTE_TYPEREF)?;
    for (index, value) in (0i32..).zip(data) {
        asm.dup()?
            .ldc_i4(index)?
            .ldc_i4(i32::from(*value))?
            .stelem_i1()?;
    }
    asm.stloc(local)?;
    Ok(())
}

fn decrypter_body(
    name: Token,
    key: &[u8],
    iv: &[u8],
    splices_token: bool,
) -> Result<Vec<crate::assembly::Instruction>> {
    let mut asm = InstructionAssembler::with_rva(0x2050);
    asm.call(GET_EXECUTING_ASSEMBLY)?
        .ldstr(name)?
        .callvirt(GET_MANIFEST_RESOURCE_STREAM)?
        .newobj(BINARY_READER_CTOR)?
        .stloc(3)?;

    emit_byte_array(&mut asm, key, 0)?;
    emit_byte_array(&mut asm, iv, 1)?;

    if splices_token {
        asm.call(GET_EXECUTING_ASSEMBLY)?
            .callvirt(GET_NAME)?
            .callvirt(GET_PUBLIC_KEY_TOKEN)?
            .stloc(2)?
            .ldloc(2)?
            .ldlen()?
            .brfalse("no_token")?;
        for i in 0..8 {
            asm.ldloc(1)?
                .ldc_i4(i * 2 + 1)?
                .ldloc(2)?
                .ldc_i4(i)?
                .ldelem_u1()?
                .stelem_i1()?;
        }
        asm.label("no_token")?;
    }

    asm.newobj(RIJNDAEL_CTOR)?
        .ldloc(0)?
        .ldloc(1)?
        .callvirt(CREATE_DECRYPTOR)?
        .stloc(6)?
        .ldloc(4)?
        .ldloc(6)?
        .ldc_i4(0)?
        .newobj(CRYPTO_STREAM_CTOR)?
        .stloc(5)?
        .ldloc(5)?
        .ret()?;

    asm.finish()
}

/// Builds and registers a resource decrypter for `resource_name` in `module`.
///
/// The key and IV are assembled element by element, the way [`ElementArrayFinder`] expects.
/// With `splices_token` the body copies the public key token into the odd IV bytes.
pub fn decrypter_method(
    module: &ModuleRc,
    resource_name: &str,
    key: [u8; 32],
    iv: [u8; 16],
    splices_token: bool,
) -> MethodRc {
    let name = module.add_user_string(resource_name);
    let owner = module.add_type(TypeDef::new(Token::new(0x0200_0002), "", "\u{2}"));
    let body = decrypter_body(name, &key, &iv, splices_token).unwrap();

    module.add_method(
        MethodBuilder::new(DECRYPTER_TOKEN, "\u{3}")
            .flags(MethodModifiers::STATIC | MethodModifiers::HIDE_BY_SIG)
            .declaring_type(owner)
            .locals(decrypter_locals())
            .body(body)
            .build(),
    )
}

/// Reconstructs arrays built as `ldc.i4 N; newarr; (dup; ldc.i4 i; ldc.i4 v; stelem.i1)*`.
pub struct ElementArrayFinder;

impl ArrayFinder for ElementArrayFinder {
    fn find_byte_array(&self, method: &Method, expected_len: usize) -> Option<Vec<u8>> {
        let instructions = method.instructions();
        let start = instructions.windows(2).position(|pair| {
            pair[0].ldc_i4_value() == i32::try_from(expected_len).ok()
                && pair[1].opcode == opcodes::NEWARR
        })?;

        let mut data = vec![0u8; expected_len];
        for group in instructions[start + 2..].chunks_exact(4) {
            if group[0].opcode != opcodes::DUP || group[3].opcode != opcodes::STELEM_I1 {
                break;
            }
            let index = usize::try_from(group[1].ldc_i4_value()?).ok()?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let value = group[2].ldc_i4_value()? as u8;
            *data.get_mut(index)? = value;
        }
        Some(data)
    }
}
