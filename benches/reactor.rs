#![allow(unused)]
extern crate dotscope_reactor;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use dotscope_reactor::{
    assembly::{Instruction, InstructionAssembler},
    deobfuscation::obfuscators::reactor::uses_public_key_token,
    metadata::token::Token,
    utils::crypto::{aes_cbc_decrypt, aes_cbc_encrypt},
};
use std::hint::black_box;

/// Builds a long straight-line body with the token splice at the very end.
fn splice_body(padding: usize) -> Vec<Instruction> {
    let mut asm = InstructionAssembler::new();
    for i in 0..padding {
        asm.ldloc(0).unwrap().ldc_i4((i % 97) as i32).unwrap().pop().unwrap();
        if i % 16 == 0 {
            asm.call(Token::new(0x0A00_0001)).unwrap();
        }
    }
    for i in 0..8 {
        asm.ldloc(1)
            .unwrap()
            .ldc_i4(2 * i + 1)
            .unwrap()
            .ldloc(2)
            .unwrap()
            .ldc_i4(i)
            .unwrap()
            .ldelem_u1()
            .unwrap()
            .stelem_i1()
            .unwrap();
    }
    asm.ret().unwrap();
    asm.finish().unwrap()
}

/// Benchmark the public key token scanner over a method body
fn bench_scanner(c: &mut Criterion) {
    let body = splice_body(4096);

    let mut group = c.benchmark_group("public_key_token_scanner");
    group.throughput(Throughput::Elements(body.len() as u64));
    group.bench_function("uses_public_key_token", |b| {
        b.iter(|| black_box(uses_public_key_token(black_box(&body))));
    });
    group.finish();
}

/// Benchmark AES-256-CBC over a typical resource size
fn bench_cipher(c: &mut Criterion) {
    let key = [0x42u8; 32];
    let iv = [0x24u8; 16];
    let plaintext = vec![0xA5u8; 64 * 1024];
    let ciphertext = aes_cbc_encrypt(&key, &iv, &plaintext).unwrap();

    let mut group = c.benchmark_group("resource_cipher");
    group.throughput(Throughput::Bytes(plaintext.len() as u64));
    group.bench_function("encrypt", |b| {
        b.iter(|| black_box(aes_cbc_encrypt(&key, &iv, black_box(&plaintext)).unwrap()));
    });
    group.bench_function("decrypt", |b| {
        b.iter(|| black_box(aes_cbc_decrypt(&key, &iv, black_box(&ciphertext)).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_scanner, bench_cipher);
criterion_main!(benches);
