//! Unified line diffs between two section bodies.

use similar::TextDiff;

/// The `---` label used when a section has no earlier revision to diff from.
pub const ORIGINAL_LABEL: &str = "original";

const CONTEXT_LINES: usize = 3;

/// Produce a unified diff of `old` → `new`, line by line.
///
/// Returns an empty string when the two texts have the same lines. The
/// output has no trailing newline.
pub fn unified_diff(old: &str, new: &str, old_label: &str, new_label: &str) -> String {
  // Terminate every line so a missing final newline never shows up as a change.
  let old = terminated_lines(old);
  let new = terminated_lines(new);

  let diff = TextDiff::from_lines(old.as_str(), new.as_str());
  let mut text = diff
    .unified_diff()
    .context_radius(CONTEXT_LINES)
    .missing_newline_hint(false)
    .header(old_label, new_label)
    .to_string();

  text.truncate(text.trim_end_matches('\n').len());
  text
}

fn terminated_lines(s: &str) -> String {
  s.lines().fold(String::with_capacity(s.len() + 1), |mut acc, line| {
    acc.push_str(line);
    acc.push('\n');
    acc
  })
}
