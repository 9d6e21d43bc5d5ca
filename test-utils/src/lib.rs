//! Assertion helpers shared by the workspace test suites.

/// Asserts two strings are equal after trimming surrounding
/// whitespace, panicking with a line-by-line diff when they differ.
///
/// `what` names the value under comparison in the panic message (e.g.
/// "parsed term", "rewritten term").
#[track_caller]
pub fn assert_text_eq(actual: &str, expected: &str, what: &str) {
    let actual = actual.trim();
    let expected = expected.trim();
    if actual == expected {
        return;
    }

    let mut report = String::new();
    report.push_str("--- expected\n+++ actual\n");
    let expected_lines: Vec<_> = expected.lines().collect();
    let actual_lines: Vec<_> = actual.lines().collect();
    for i in 0..expected_lines.len().max(actual_lines.len()) {
        match (expected_lines.get(i), actual_lines.get(i)) {
            (Some(want), Some(got)) if want == got => {
                report.push_str(&format!("  {want}\n"));
            }
            (want, got) => {
                if let Some(want) = want {
                    report.push_str(&format!("- {want}\n"));
                }
                if let Some(got) = got {
                    report.push_str(&format!("+ {got}\n"));
                }
            }
        }
    }
    if expected_lines.len() != actual_lines.len() {
        report.push_str(&format!(
            "(expected {} line(s), got {})\n",
            expected_lines.len(),
            actual_lines.len()
        ));
    }

    panic!("{what} mismatch:\n{report}");
}
