#![no_main]

use digest_github::RepoUrl;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data)
        && let Ok(repo) = RepoUrl::parse(input)
    {
        assert!(!repo.owner.is_empty());
        assert!(!repo.repo.is_empty());
        let _ = repo.diff_url("0000000");
    }
});
