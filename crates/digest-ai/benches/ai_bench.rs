use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use digest_ai::{DEFAULT_MAX_DIFF_CHARS, build_prompt};

fn sample_diff(lines: usize) -> String {
    let mut diff = String::from("diff --git a/src/lib.rs b/src/lib.rs\nindex 1111111..2222222 100644\n--- a/src/lib.rs\n+++ b/src/lib.rs\n");
    for i in 0..lines {
        diff.push_str(&format!("+    let value_{i} = compute({i});\n"));
    }
    diff
}

fn prompt_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("prompt");

    for lines in [10usize, 1_000, 10_000] {
        let diff = sample_diff(lines);
        group.bench_with_input(BenchmarkId::new("build_prompt", lines), &diff, |b, diff| {
            b.iter(|| build_prompt(diff, DEFAULT_MAX_DIFF_CHARS))
        });
    }

    group.finish();
}

criterion_group!(benches, prompt_benchmarks);
criterion_main!(benches);
