#![no_main]

use libfuzzer_sys::fuzz_target;
use repo_digest::handlers::{CreateProjectInput, parse_input};

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = parse_input::<CreateProjectInput>(value);
    }
});
