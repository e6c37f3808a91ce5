//! Content normalization ahead of chunking and prompting.

use once_cell::sync::Lazy;
use regex::Regex;

static BRACKET_ANNOTATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"【.*?】").expect("bracket annotation pattern should compile"));

static BOLD_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*").expect("bold marker pattern should compile"));

/// Normalize a raw document and prepend a subject tag line derived from
/// the filename.
///
/// The body is cleaned by collapsing runs of spaces and tabs, capping
/// consecutive blank lines at one (two newlines), and stripping 【...】
/// annotations and ** bold markers. Empty input yields the tag line with
/// an empty body.
pub fn preprocess(content: &str, file_name: &str) -> String {
    let body = clean_formatting(&normalize_whitespace(content));
    format!("[{}]\n{}", subject_tag(file_name), body)
}

/// Pick a coarse subject tag from filename keywords.
///
/// Matches both Latin and CJK subject names; anything unrecognized is
/// plain "learning content".
pub fn subject_tag(file_name: &str) -> &'static str {
    let name = file_name.to_lowercase();
    if name.contains("math") || name.contains("数学") {
        "math concepts"
    } else if name.contains("english") || name.contains("英语") {
        "english vocabulary"
    } else if name.contains("history") || name.contains("历史") {
        "history events"
    } else {
        "learning content"
    }
}

/// Collapse space/tab runs to a single space and 3+ newlines to exactly
/// two, preserving paragraph breaks.
fn normalize_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_space = false;
    let mut newline_count = 0;

    for c in text.chars() {
        if c == '\n' {
            newline_count += 1;
            prev_was_space = false;

            if newline_count <= 2 {
                result.push('\n');
            }
        } else if c == ' ' || c == '\t' || c == '\r' {
            newline_count = 0;
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            newline_count = 0;
            prev_was_space = false;
            result.push(c);
        }
    }

    result
}

/// Strip markup noise: bracketed annotations and bold markers.
fn clean_formatting(text: &str) -> String {
    let text = BRACKET_ANNOTATIONS.replace_all(text, "");
    let text = BOLD_MARKERS.replace_all(&text, "");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_spaces_and_tabs() {
        let result = preprocess("one  two\t\tthree", "notes.txt");
        assert_eq!(result, "[learning content]\none two three");
    }

    #[test]
    fn test_caps_blank_lines() {
        let result = preprocess("first\n\n\n\nsecond", "notes.txt");
        assert_eq!(result, "[learning content]\nfirst\n\nsecond");
    }

    #[test]
    fn test_preserves_single_paragraph_break() {
        let result = preprocess("first\n\nsecond", "notes.txt");
        assert_eq!(result, "[learning content]\nfirst\n\nsecond");
    }

    #[test]
    fn test_strips_bracket_annotations_and_bold() {
        let result = preprocess("a 【note】 **bold** b", "notes.txt");
        assert_eq!(result, "[learning content]\na  bold b");
    }

    #[test]
    fn test_subject_tag_selection() {
        assert_eq!(subject_tag("Math_Homework.txt"), "math concepts");
        assert_eq!(subject_tag("高中数学.txt"), "math concepts");
        assert_eq!(subject_tag("english_unit3.md"), "english vocabulary");
        assert_eq!(subject_tag("World History.txt"), "history events");
        assert_eq!(subject_tag("biology.txt"), "learning content");
    }

    #[test]
    fn test_empty_input_yields_tag_line() {
        assert_eq!(preprocess("", "notes.txt"), "[learning content]\n");
    }
}
