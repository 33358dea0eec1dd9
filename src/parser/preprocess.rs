//! Preprocessor. Pure `&str -> String` normalization, no I/O.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

pub fn preprocess(text: &str, max_lines: usize) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let stripped: String = normalized
        .chars()
        .filter(|c| !ZERO_WIDTH.contains(c) && *c != '\0')
        .collect();

    let trimmed_lines: Vec<&str> = stripped.lines().map(|l| l.trim_end()).collect();
    let rejoined = trimmed_lines.join("\n");

    let collapsed = RE_BLANK_RUN.replace_all(&rejoined, "\n\n").to_string();

    let truncated: String = collapsed
        .lines()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join("\n");

    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_crlf() {
        assert_eq!(preprocess("a\r\nb\r\n", 1000), "a\nb");
    }

    #[test]
    fn strips_zero_width_chars() {
        let input = "Hello\u{200B} World";
        assert_eq!(preprocess(input, 1000), "Hello World");
    }

    #[test]
    fn collapses_blank_line_runs() {
        let input = "a\n\n\n\n\nb";
        assert_eq!(preprocess(input, 1000), "a\n\nb");
    }

    #[test]
    fn truncates_to_max_lines() {
        let input = "a\nb\nc\nd";
        assert_eq!(preprocess(input, 2), "a\nb");
    }

    #[test]
    fn trims_trailing_whitespace() {
        let input = "a   \nb\t\t";
        assert_eq!(preprocess(input, 1000), "a\nb");
    }
}
