use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::OsRng;
use sra_psi::{random_prime, BloomFilter, Party, PsiConfig, RecordCodec, SraKey};

fn records(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("{prefix}-{i}@example.com")).collect()
}

fn agreed_pair(config: &PsiConfig) -> (Party, Party) {
    let mut server = Party::initiator(config.clone()).expect("Server init failed");
    let mut client = Party::responder(config.clone()).expect("Client init failed");
    let prime = server.generate_prime().expect("Prime generation failed").clone();
    client.install_prime(prime).expect("Prime install failed");
    (server, client)
}

fn bench_key_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_generation");

    for bits in [128u64, 256, 512].iter() {
        let prime = random_prime(&mut OsRng, *bits).expect("Prime generation failed");
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("p={}", bits)),
            bits,
            |b, _| {
                b.iter(|| {
                    SraKey::generate(black_box(&prime), 32, 1024, &mut OsRng)
                        .expect("Key generation failed")
                });
            },
        );
    }

    group.finish();
}

fn bench_encryption(c: &mut Criterion) {
    let mut group = c.benchmark_group("encryption");
    let config = PsiConfig::default();

    for size in [16usize, 64, 256].iter() {
        let data = records("user", 0..*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter_batched(
                || agreed_pair(&config).0,
                |mut server| server.load_data(black_box(&data)).expect("Encryption failed"),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("bloom_filter");

    for size in [1_000usize, 10_000, 100_000].iter() {
        let items: Vec<Vec<u8>> = (0..*size)
            .map(|i| format!("{:x}", i * 7919).into_bytes())
            .collect();

        group.bench_with_input(BenchmarkId::new("insert", size), size, |b, &size| {
            b.iter(|| {
                let mut filter = BloomFilter::new(size, 0.0001).expect("Filter sizing failed");
                filter.add_all(black_box(&items));
                filter
            });
        });

        let mut filter = BloomFilter::new(*size, 0.0001).expect("Filter sizing failed");
        filter.add_all(&items);
        group.bench_with_input(BenchmarkId::new("test_multiple", size), size, |b, _| {
            b.iter(|| filter.test_multiple(black_box(&items)));
        });
    }

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let codec = RecordCodec::new(25).expect("Codec failed");
    let record = "curabitur.dictum@protonmail.edu";

    c.bench_function("codec_roundtrip", |b| {
        b.iter(|| {
            let words = codec.encode_str(black_box(record));
            codec.decode_str(&words).expect("Decoding failed")
        });
    });
}

fn bench_full_intersection(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersection");
    group.sample_size(10);
    let config = PsiConfig::default();

    for size in [16usize, 64, 256].iter() {
        let server_data = records("user", 0..*size);
        let client_data = records("user", *size / 2..*size + *size / 2);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            size,
            |b, _| {
                b.iter(|| {
                    let (mut server, mut client) = agreed_pair(&config);
                    let server_set = server.load_data(&server_data).expect("Server encryption failed");
                    let client_set = client.load_data(&client_data).expect("Client encryption failed");
                    let cross = client.encrypt_external(&server_set).expect("Cross-encryption failed");
                    server.prepare_intersection(&cross).expect("Filter construction failed");
                    let common = server.intersect(&client_set).expect("Intersection failed");
                    client.parse_intersection(&common).expect("Parsing failed")
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_key_generation,
    bench_encryption,
    bench_filter,
    bench_codec,
    bench_full_intersection
);
criterion_main!(benches);
