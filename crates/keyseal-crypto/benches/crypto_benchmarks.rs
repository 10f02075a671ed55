//! Cryptographic performance benchmarks
//!
//! Benchmarks for the hybrid encryption path:
//! - Keyset generation
//! - Encryption/decryption at several payload sizes
//! - Keyset encoding and decoding
//!
//! Run with: cargo bench -p keyseal-crypto

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use keyseal_crypto::{
    generate_keyset, HybridDecryptor, HybridEncryptor, KemPrimitive, KeysetCodec,
    X25519HkdfSha256Kem,
};

const PAYLOAD_SIZES: [usize; 3] = [256, 4096, 65536];

// ============================================================================
// Key Generation Benchmarks
// ============================================================================

fn bench_key_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_generation");

    group.bench_function("x25519_keypair", |b| {
        let kem = X25519HkdfSha256Kem::new();
        b.iter(|| kem.generate_key_pair())
    });

    group.bench_function("keyset_3_keys", |b| {
        b.iter(|| generate_keyset(black_box(3)).unwrap())
    });

    group.finish();
}

// ============================================================================
// Hybrid Encryption Benchmarks
// ============================================================================

fn bench_encryption(c: &mut Criterion) {
    let mut group = c.benchmark_group("hybrid_encrypt");

    let keyset = generate_keyset(1).unwrap();
    let encryptor = HybridEncryptor::new(keyset.public_keyset()).unwrap();

    for size in PAYLOAD_SIZES {
        let plaintext = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &plaintext, |b, pt| {
            b.iter(|| encryptor.encrypt(black_box(pt), b"bench").unwrap())
        });
    }

    group.finish();
}

fn bench_decryption(c: &mut Criterion) {
    let mut group = c.benchmark_group("hybrid_decrypt");

    let keyset = Arc::new(generate_keyset(1).unwrap());
    let encryptor = HybridEncryptor::new(keyset.clone()).unwrap();
    let decryptor = HybridDecryptor::new(keyset).unwrap();

    for size in PAYLOAD_SIZES {
        let ciphertext = encryptor.encrypt(&vec![0u8; size], b"bench").unwrap();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &ciphertext, |b, ct| {
            b.iter(|| decryptor.decrypt(black_box(ct), b"bench").unwrap())
        });
    }

    // Rejection should cost about the same as a successful decrypt
    let mut tampered = encryptor.encrypt(&[0u8; 256], b"bench").unwrap();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;
    group.bench_function("reject_tampered", |b| {
        b.iter(|| decryptor.decrypt(black_box(&tampered), b"bench").is_err())
    });

    group.finish();
}

// ============================================================================
// Keyset Codec Benchmarks
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyset_codec");

    let keyset = generate_keyset(8).unwrap();
    for (name, codec) in [("binary", KeysetCodec::binary()), ("json", KeysetCodec::json())] {
        let encoded = codec.serialize(&keyset).unwrap();

        group.bench_function(format!("serialize_{}", name), |b| {
            b.iter(|| codec.serialize(black_box(&keyset)).unwrap())
        });
        group.bench_function(format!("load_{}", name), |b| {
            b.iter(|| codec.load(black_box(&encoded)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_key_generation,
    bench_encryption,
    bench_decryption,
    bench_codec,
);

criterion_main!(benches);
