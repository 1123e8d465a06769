use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const NEWLINE_MARKER: &str = " ⏎ ";
const ELLIPSIS: &str = "…";

/// Single-line preview of `text` that fits in `max_width` terminal columns.
pub fn preview(text: &str, max_width: usize) -> String {
    let flattened = text
        .trim()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join(NEWLINE_MARKER)
        .replace('\t', " ");

    if flattened.width() <= max_width {
        return flattened;
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - ELLIPSIS.width();
    let mut out = String::new();
    let mut used = 0;
    for c in flattened.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(preview("hello", 10), "hello");
    }

    #[test]
    fn test_truncates_with_ellipsis() {
        assert_eq!(preview("hello world", 6), "hello…");
        assert_eq!(preview("hello world", 6).width(), 6);
    }

    #[test]
    fn test_newlines_are_flattened() {
        assert_eq!(preview("one\ntwo", 20), "one ⏎ two");
    }

    #[test]
    fn test_wide_characters() {
        // Each CJK character is two columns wide.
        let p = preview("日本語テキスト", 7);
        assert!(p.width() <= 7);
        assert!(p.ends_with('…'));
        assert_eq!(p, "日本語…");
    }

    #[test]
    fn test_zero_width() {
        assert_eq!(preview("abc", 0), "");
    }
}
