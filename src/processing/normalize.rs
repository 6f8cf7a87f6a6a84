//! Cleanup pass applied to OCR output before chunking.

/// Normalize raw extracted text into a single summarizable line.
///
/// The steps are deterministic and order-sensitive: runs of newlines collapse
/// to one newline, newlines become spaces, every character outside the allowed
/// set (letters, digits, whitespace, and `. , ! ? ' " -`) is stripped, and the
/// result is trimmed. Collapsing happens before the character filter so page
/// breaks never fuse words together.
pub fn clean_extracted_text(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut previous_was_newline = false;
    for ch in text.chars() {
        if ch == '\n' {
            if !previous_was_newline {
                collapsed.push(' ');
            }
            previous_was_newline = true;
        } else {
            previous_was_newline = false;
            collapsed.push(ch);
        }
    }

    let filtered: String = collapsed
        .chars()
        .filter(|ch| {
            ch.is_ascii_alphanumeric()
                || ch.is_whitespace()
                || matches!(ch, '.' | ',' | '!' | '?' | '\'' | '"' | '-')
        })
        .collect();

    filtered.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_newline_runs_into_single_space() {
        assert_eq!(
            clean_extracted_text("first page\n\n\nsecond page"),
            "first page second page"
        );
        assert_eq!(clean_extracted_text("a\nb\nc"), "a b c");
    }

    #[test]
    fn strips_characters_outside_allowed_set() {
        assert_eq!(
            clean_extracted_text("Profit: $1,200 (up 5%) — huge!"),
            "Profit 1,200 up 5  huge!"
        );
        assert_eq!(clean_extracted_text("quote \"kept\", dash-kept?"), "quote \"kept\", dash-kept?");
    }

    #[test]
    fn trims_leading_and_trailing_whitespace() {
        assert_eq!(clean_extracted_text("  padded text  "), "padded text");
        assert_eq!(clean_extracted_text("\n\n\n"), "");
        assert_eq!(clean_extracted_text(""), "");
    }

    #[test]
    fn collapse_runs_before_filtering() {
        // The newline run becomes one space, not several.
        assert_eq!(clean_extracted_text("one\n\n\n\ntwo"), "one two");
    }
}
