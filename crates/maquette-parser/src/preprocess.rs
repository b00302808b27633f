//! Source preprocessor.
//!
//! Turns raw source text into logical lines: strips per-line byte order
//! marks, joins backslash-continued lines and records the 1-based physical
//! line number each logical line started on. Comment handling and `${name}`
//! substitution happen later, during statement dispatch.

/// One logical line of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DslLine {
    /// 1-based physical line number of the first raw line this logical
    /// line was built from.
    pub(crate) number: usize,
    pub(crate) text: String,
}

const BOM: char = '\u{feff}';
const CONTINUATION: char = '\\';

fn strip_bom(line: &str) -> &str {
    line.strip_prefix(BOM).unwrap_or(line)
}

/// Whether a line is a single-line comment. Comment lines never join with
/// their successor, even when they end in a backslash.
pub(crate) fn is_single_line_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with('#')
}

/// Split `source` into logical lines.
///
/// A trailing backslash joins the next raw line onto the current one. The
/// continuation's leading whitespace is stripped; the first line keeps its
/// indentation, which matters for includes.
pub(crate) fn preprocess(source: &str) -> Vec<DslLine> {
    let mut lines = Vec::new();
    let mut raw = source.lines().enumerate();

    while let Some((index, line)) = raw.next() {
        let number = index + 1;
        let mut text = strip_bom(line).to_owned();

        if !is_single_line_comment(&text) {
            loop {
                let Some(rest) = text.trim_end().strip_suffix(CONTINUATION) else {
                    break;
                };
                match raw.next() {
                    Some((_, next)) => {
                        text = format!("{rest}{}", strip_bom(next).trim_start());
                    }
                    None => {
                        text = rest.to_owned();
                        break;
                    }
                }
            }
        }

        lines.push(DslLine { number, text });
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        preprocess(source).into_iter().map(|l| l.text).collect()
    }

    #[test]
    fn numbers_lines_from_one() {
        let lines = preprocess("a\nb\nc");
        assert_eq!(
            lines.iter().map(|l| l.number).collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[test]
    fn joins_continued_lines() {
        assert_eq!(texts("a \\\n   b"), ["a b"]);
    }

    #[test]
    fn join_keeps_first_line_indentation() {
        assert_eq!(texts("    a \\\n        b"), ["    a b"]);
    }

    #[test]
    fn join_without_spacing_concatenates_directly() {
        assert_eq!(texts("a\\\nb"), ["ab"]);
    }

    #[test]
    fn chained_continuations_share_the_first_line_number() {
        let lines = preprocess("a \\\nb \\\nc\nd");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "a b c");
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[1].text, "d");
        assert_eq!(lines[1].number, 4);
    }

    #[test]
    fn trailing_whitespace_after_the_marker_still_joins() {
        assert_eq!(texts("a \\  \nb"), ["a b"]);
    }

    #[test]
    fn comment_lines_do_not_join() {
        let lines = preprocess("// note \\\nperson a");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "// note \\");
        assert_eq!(lines[1].text, "person a");
    }

    #[test]
    fn hash_comment_lines_do_not_join() {
        assert_eq!(texts("  # note \\\nperson a"), ["  # note \\", "person a"]);
    }

    #[test]
    fn marker_on_the_last_line_is_dropped() {
        assert_eq!(texts("a \\"), ["a "]);
    }

    #[test]
    fn strips_byte_order_marks_per_line() {
        assert_eq!(texts("\u{feff}a\n\u{feff}b"), ["a", "b"]);
        assert_eq!(texts("a \\\n\u{feff}b"), ["a b"]);
    }

    #[test]
    fn handles_crlf_endings() {
        let lines = preprocess("a\r\nb \\\r\nc\r\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "a");
        assert_eq!(lines[1].text, "b c");
    }

    #[test]
    fn empty_lines_are_kept() {
        let lines = preprocess("a\n\nb");
        assert_eq!(lines[1].text, "");
        assert_eq!(lines[2].number, 3);
    }
}
