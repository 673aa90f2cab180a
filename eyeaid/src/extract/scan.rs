//! Bounded scan for the first balanced JSON object in free text.

/// Returns the first outer balanced `{...}` region of `text`.
///
/// Braces inside JSON string literals are ignored, including escaped quotes.
/// A `{` that never closes is skipped and the scan restarts at the next one,
/// so stray braces in prose do not hide a later object. Returns `None` if no
/// region balances.
pub fn find_balanced_object(text: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(found) = text[from..].find('{') {
        let start = from + found;
        if let Some(end) = closing_brace(text, start) {
            return Some(&text[start..end]);
        }
        from = start + 1;
    }
    None
}

/// Byte offset just past the `}` that closes the `{` at `start`.
fn closing_brace(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_brace() {
        assert_eq!(find_balanced_object("nothing here"), None);
    }

    #[test]
    fn test_simple_object() {
        assert_eq!(find_balanced_object("a {\"k\":1} b"), Some("{\"k\":1}"));
    }

    #[test]
    fn test_nested_object() {
        let text = r#"x {"a":{"b":[{"c":1}]}} y {"z":2}"#;
        assert_eq!(find_balanced_object(text), Some(r#"{"a":{"b":[{"c":1}]}}"#));
    }

    #[test]
    fn test_braces_in_strings() {
        let text = r#"{"note":"use } and { freely","q":"say \"}\""} tail"#;
        assert_eq!(
            find_balanced_object(text),
            Some(r#"{"note":"use } and { freely","q":"say \"}\""}"#)
        );
    }

    #[test]
    fn test_unclosed_object() {
        assert_eq!(find_balanced_object("{\"a\": {\"b\": 1}"), Some("{\"b\": 1}"));
        assert_eq!(find_balanced_object("{\"a\": 1"), None);
    }

    #[test]
    fn test_stray_brace_before_object() {
        let text = r#"Using the { schema you gave: {"triage_level":"low"} done"#;
        assert_eq!(find_balanced_object(text), Some(r#"{"triage_level":"low"}"#));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "résumé → {\"ok\":\"é\"} fin";
        assert_eq!(find_balanced_object(text), Some("{\"ok\":\"é\"}"));
    }
}
