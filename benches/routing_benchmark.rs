use criterion::{black_box, criterion_group, criterion_main, Criterion};

use switchyard::uri::{is_static_uri, match_path, url_decode, url_encode};

fn bench_match_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_path");

    group.bench_function("literal", |b| {
        b.iter(|| match_path(black_box("/api/v1/users/profile"), black_box("/api/v1/users/profile")))
    });

    group.bench_function("params", |b| {
        b.iter(|| match_path(black_box("/users/:id/posts/:post"), black_box("/users/42/posts/99")))
    });

    group.bench_function("wildcard", |b| {
        b.iter(|| match_path(black_box("/assets/*"), black_box("/assets/css/vendor/reset.css")))
    });

    group.bench_function("miss", |b| {
        b.iter(|| match_path(black_box("/users/:id/posts"), black_box("/users/42/comments")))
    });

    group.finish();
}

fn bench_static_classifier(c: &mut Criterion) {
    c.bench_function("is_static_uri hit", |b| {
        b.iter(|| is_static_uri(black_box("/assets/app.bundle.js?v=20240811")))
    });
    c.bench_function("is_static_uri miss", |b| {
        b.iter(|| is_static_uri(black_box("/api/v1/users/profile")))
    });
}

fn bench_percent_coding(c: &mut Criterion) {
    c.bench_function("url_encode", |b| {
        b.iter(|| url_encode(black_box("path segment with spaces & symbols ☃")))
    });
    c.bench_function("url_decode", |b| {
        b.iter(|| url_decode(black_box("path%20segment%20with%20spaces%20%26%20symbols")))
    });
}

criterion_group!(
    benches,
    bench_match_path,
    bench_static_classifier,
    bench_percent_coding
);
criterion_main!(benches);
