//! Prompt construction for diff summarization

/// Default upper bound on diff characters sent to the model
pub const DEFAULT_MAX_DIFF_CHARS: usize = 20_000;

/// Marker appended when a diff is cut short
pub const TRUNCATION_MARKER: &str = "\n[diff truncated]\n";

const PREAMBLE: &str = "\
You are an expert programmer summarizing a git diff.

Reminders about the git diff format:
For every file there are a few metadata lines, for example:
```
diff --git a/lib/index.js b/lib/index.js
index aadf691..bfef603 100644
--- a/lib/index.js
+++ b/lib/index.js
```
This means that `lib/index.js` was modified in this commit.
A line starting with `+` was added.
A line starting with `-` was deleted.
A line starting with neither `+` nor `-` is context and is not part of the change.

Example summary comments:
```
* Raised the amount of returned recordings from `10` to `100` [packages/server/recordings_api.ts], [packages/server/constants.ts]
* Fixed a typo in the github action name [.github/workflows/gpt-commit-summarizer.yml]
* Moved the `octokit` initialization to a separate file [src/octokit.ts], [src/index.ts]
* Lowered numeric tolerance for test files
```
Most commits have fewer comments than this list.
Mention file names in brackets when there are only one or two of them.
Do not include parts of the example in your summary.

Please summarise the following diff file:

";

/// Cut `diff` to at most `max_chars` characters
///
/// Returns the kept prefix and whether anything was dropped.
#[must_use]
pub fn truncate_diff(diff: &str, max_chars: usize) -> (&str, bool) {
    match diff.char_indices().nth(max_chars) {
        Some((idx, _)) => (&diff[..idx], true),
        None => (diff, false),
    }
}

/// Build the summarization prompt for a diff
#[must_use]
pub fn build_prompt(diff: &str, max_chars: usize) -> String {
    let (kept, truncated) = truncate_diff(diff, max_chars);
    let mut prompt = String::with_capacity(PREAMBLE.len() + kept.len() + TRUNCATION_MARKER.len());
    prompt.push_str(PREAMBLE);
    prompt.push_str(kept);
    if truncated {
        prompt.push_str(TRUNCATION_MARKER);
    }
    prompt
}
