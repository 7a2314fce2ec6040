//! Source normalization used for whitespace- and comment-insensitive fingerprints.

use crate::declaration::{comment_end, is_word_byte, string_end};

/// Normalizes source text so that purely cosmetic edits hash identically.
///
/// Comments are removed, whitespace runs are collapsed, and whitespace is
/// dropped entirely unless it separates two word characters. String
/// literals are copied verbatim, so any edit to a literal, identifier,
/// number, or operator still changes the output.
pub fn minify(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut pending_space = false;
    let mut pos = 0;

    while pos < bytes.len() {
        if let Some(end) = comment_end(bytes, pos) {
            pending_space = true;
            pos = end;
            continue;
        }
        let b = bytes[pos];
        if b.is_ascii_whitespace() {
            pending_space = true;
            pos += 1;
            continue;
        }
        if pending_space && out.last().is_some_and(|&last| is_word_byte(last)) && is_word_byte(b)
        {
            out.push(b' ');
        }
        pending_space = false;
        if let Some(end) = string_end(bytes, pos) {
            out.extend_from_slice(&bytes[pos..end]);
            pos = end;
        } else {
            out.push(b);
            pos += 1;
        }
    }

    // Only whole ASCII-delimited ranges are dropped, so the output stays UTF-8.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_between_words() {
        assert_eq!(minify("contract   A\n\n{ }"), "contract A{}");
    }

    #[test]
    fn strips_comments() {
        let text = "// header\ncontract A { /* note */ uint x; // trailing\n}";
        assert_eq!(minify(text), "contract A{uint x;}");
    }

    #[test]
    fn comment_between_words_keeps_separator() {
        assert_eq!(minify("uint/* c */x;"), "uint x;");
    }

    #[test]
    fn preserves_string_literals() {
        let text = "string s = \"a  //  b\";";
        assert_eq!(minify(text), "string s=\"a  //  b\";");
    }

    #[test]
    fn cosmetic_edits_are_equal() {
        let a = "contract A {\n    uint x = 1;\n}\n";
        let b = "contract A{ uint x=1; } // reformatted";
        assert_eq!(minify(a), minify(b));
    }

    #[test]
    fn token_edits_differ() {
        assert_ne!(minify("uint x = 1;"), minify("uint x = 2;"));
        assert_ne!(minify("a + b"), minify("a - b"));
    }

    #[test]
    fn non_ascii_text_survives() {
        assert_eq!(minify("string s = \"héllo\"; // café"), "string s=\"héllo\";");
    }
}
