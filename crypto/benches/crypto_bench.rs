use criterion::{black_box, criterion_group, criterion_main, Criterion};

use saltpow_crypto::{sha1, PrefixHasher};

const AUTHDATA: &[u8] = b"cQokBByiRKwFNFhsXUvtTuEwRPwXdFjBeLjelxqPXoQHhIZaXMucoBSBpKFRkDFR";

fn sha1_one_shot_bench(c: &mut Criterion) {
    let mut data = AUTHDATA.to_vec();
    data.extend_from_slice(b"0123456789abcdefghij");

    c.bench_function("sha1_one_shot_84B", |b| b.iter(|| sha1(black_box(&data))));
}

fn sha1_cached_prefix_bench(c: &mut Criterion) {
    let hasher = PrefixHasher::new(AUTHDATA);
    let suffix = b"0123456789abcdefghij";

    c.bench_function("sha1_cached_prefix_84B", |b| {
        b.iter(|| hasher.digest(black_box(suffix)))
    });
}

criterion_group!(benches, sha1_one_shot_bench, sha1_cached_prefix_bench);
criterion_main!(benches);
