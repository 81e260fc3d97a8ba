#![no_main]

use digest_github::commit::parse_commit_list;
use digest_github::sort_newest_first;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data)
        && let Ok(mut commits) = parse_commit_list(body)
    {
        sort_newest_first(&mut commits);
        for pair in commits.windows(2) {
            if let (Some(a), Some(b)) = (pair[0].date, pair[1].date) {
                assert!(a >= b);
            }
        }
    }
});
