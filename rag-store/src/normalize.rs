//! Text normalization for extracted document text.
//!
//! PDF extraction tends to emit ragged line endings and long runs of blank
//! lines (page furniture, column breaks). These helpers tidy that up before
//! chunking so chunk budgets are spent on content.

/// Normalize extracted text with minimal layout disruption.
///
/// - Drops NUL and other control characters except `\n` and `\t`.
/// - Trims trailing whitespace on each line.
/// - Collapses multiple blank lines into a single one.
/// - Trims leading/trailing blank lines of the whole text.
pub fn normalize_extracted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut blank_run = 0usize;

    for line in s.lines() {
        let line: String = line
            .chars()
            .filter(|c| !c.is_control() || *c == '\t')
            .collect();
        let line = line.trim_end();

        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }

        out.push_str(line);
        out.push('\n');
    }

    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_blank_runs_and_trailing_space() {
        let raw = "\n\nTitle   \n\n\n\nBody line\t \nnext\u{0}line\n\n";
        assert_eq!(normalize_extracted(raw), "Title\n\nBody line\nnextline");
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(normalize_extracted(" \n\t\n \u{c}\n"), "");
    }
}
