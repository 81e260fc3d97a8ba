#![no_main]

use digest_ai::build_prompt;
use digest_ai::prompt::truncate_diff;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, u16)| {
    let (diff, max) = input;
    let max = usize::from(max);
    let (kept, _) = truncate_diff(&diff, max);
    assert!(kept.chars().count() <= max);
    let _ = build_prompt(&diff, max);
});
