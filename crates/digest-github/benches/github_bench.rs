use criterion::{Criterion, criterion_group, criterion_main};
use digest_github::commit::parse_commit_list;
use digest_github::{RepoUrl, sort_newest_first};

/// A commit listing the size of one GitHub page
fn sample_listing() -> String {
    let commits: Vec<String> = (0..30)
        .map(|i| {
            format!(
                r#"{{"sha":"{:040x}","commit":{{"message":"Commit {i}\n\nBody text","author":{{"name":"Author {i}","date":"2026-01-{:02}T12:00:00Z"}}}},"author":{{"avatar_url":"https://avatars.example/{i}"}}}}"#,
                i,
                (i * 7) % 28 + 1
            )
        })
        .collect();
    format!("[{}]", commits.join(","))
}

fn github_benchmarks(c: &mut Criterion) {
    let listing = sample_listing();

    let mut group = c.benchmark_group("github");

    group.bench_function("parse_commit_list_30", |b| {
        b.iter(|| parse_commit_list(&listing).expect("parse failed"))
    });

    group.bench_function("parse_and_sort_30", |b| {
        b.iter(|| {
            let mut commits = parse_commit_list(&listing).expect("parse failed");
            sort_newest_first(&mut commits);
            commits.truncate(10);
            commits
        })
    });

    group.bench_function("repo_url_parse", |b| {
        b.iter(|| RepoUrl::parse("https://github.com/acme/widgets/").expect("parse failed"))
    });

    group.finish();
}

criterion_group!(benches, github_benchmarks);
criterion_main!(benches);
