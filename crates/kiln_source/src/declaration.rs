//! Lightweight scanning of top-level unit declarations.
//!
//! This is not a parser. It tokenizes just enough of a contract source
//! (identifiers and punctuation, skipping comments and string literals) to
//! locate `contract`, `interface`, and `library` declarations at file scope,
//! their byte ranges, and the base names listed after `is`.

use std::fmt;
use std::ops::Range;

/// The kind of a declared unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// A `contract` declaration.
    Contract,
    /// An `abstract contract` declaration.
    AbstractContract,
    /// An `interface` declaration.
    Interface,
    /// A `library` declaration.
    Library,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitKind::Contract => "contract",
            UnitKind::AbstractContract => "abstract contract",
            UnitKind::Interface => "interface",
            UnitKind::Library => "library",
        };
        f.write_str(s)
    }
}

/// A unit declaration found at file scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// The declared unit name.
    pub name: String,
    /// The declaration kind.
    pub kind: UnitKind,
    /// Names listed in the `is` clause, in source order.
    pub bases: Vec<String>,
    /// Byte range from the leading keyword through the closing brace.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok<'a> {
    Ident(&'a str),
    Punct(u8),
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    tok: Tok<'a>,
    start: usize,
    end: usize,
}

/// Returns the end offset of a comment starting at `pos`, if there is one.
pub(crate) fn comment_end(bytes: &[u8], pos: usize) -> Option<usize> {
    if bytes.get(pos) != Some(&b'/') {
        return None;
    }
    match bytes.get(pos + 1) {
        Some(b'/') => {
            let rest = &bytes[pos..];
            Some(
                rest.iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |i| pos + i),
            )
        }
        Some(b'*') => {
            let body = &bytes[pos + 2..];
            Some(
                body.windows(2)
                    .position(|w| w == b"*/")
                    .map_or(bytes.len(), |i| pos + 2 + i + 2),
            )
        }
        _ => None,
    }
}

/// Returns the end offset of a string literal starting at `pos`, if there is one.
pub(crate) fn string_end(bytes: &[u8], pos: usize) -> Option<usize> {
    let quote = *bytes.get(pos)?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    Some(bytes.len())
}

pub(crate) fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if let Some(end) = comment_end(bytes, pos) {
            pos = end;
            continue;
        }
        if let Some(end) = string_end(bytes, pos) {
            // A literal is opaque here; one token keeps words on either side apart.
            tokens.push(Token {
                tok: Tok::Punct(b'"'),
                start: pos,
                end,
            });
            pos = end;
            continue;
        }
        let b = bytes[pos];
        if b.is_ascii_whitespace() {
            pos += 1;
        } else if is_word_byte(b) {
            let start = pos;
            while pos < bytes.len() && is_word_byte(bytes[pos]) {
                pos += 1;
            }
            tokens.push(Token {
                tok: Tok::Ident(&text[start..pos]),
                start,
                end: pos,
            });
        } else {
            tokens.push(Token {
                tok: Tok::Punct(b),
                start: pos,
                end: pos + 1,
            });
            pos += if b.is_ascii() { 1 } else { utf8_len(b) };
        }
    }
    tokens
}

fn utf8_len(lead: u8) -> usize {
    match lead {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

/// Finds every unit declared at file scope, in source order.
pub fn find_declarations(text: &str) -> Vec<Declaration> {
    let tokens = tokenize(text);
    let mut decls = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i].tok {
            Tok::Punct(b'{') => depth += 1,
            Tok::Punct(b'}') => depth = depth.saturating_sub(1),
            Tok::Ident(word) if depth == 0 => {
                if let Some((decl, next)) = declaration_at(&tokens, i, word, text.len()) {
                    decls.push(decl);
                    i = next;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    decls
}

/// Parses a declaration whose keyword is `tokens[i]`, returning it with the
/// index of the first token after its closing brace.
fn declaration_at(
    tokens: &[Token<'_>],
    i: usize,
    keyword: &str,
    text_len: usize,
) -> Option<(Declaration, usize)> {
    let abstract_prefix = i > 0 && matches!(tokens[i - 1].tok, Tok::Ident("abstract"));
    let kind = match keyword {
        "contract" if abstract_prefix => UnitKind::AbstractContract,
        "contract" => UnitKind::Contract,
        "interface" => UnitKind::Interface,
        "library" => UnitKind::Library,
        _ => return None,
    };
    let name = match tokens.get(i + 1)?.tok {
        Tok::Ident(name) => name.to_string(),
        Tok::Punct(_) => return None,
    };
    let start = if abstract_prefix {
        tokens[i - 1].start
    } else {
        tokens[i].start
    };

    // Header: `is A, B(1, 2), C` up to the opening brace.
    let mut bases = Vec::new();
    let mut parens = 0usize;
    let mut expect_base = false;
    let mut j = i + 2;
    while j < tokens.len() {
        match tokens[j].tok {
            Tok::Punct(b'{') if parens == 0 => break,
            Tok::Punct(b'(') => parens += 1,
            Tok::Punct(b')') => parens = parens.saturating_sub(1),
            Tok::Punct(b',') if parens == 0 => expect_base = true,
            Tok::Ident("is") if parens == 0 && bases.is_empty() => expect_base = true,
            Tok::Ident(base) if parens == 0 && expect_base => {
                bases.push(base.to_string());
                expect_base = false;
            }
            _ => {}
        }
        j += 1;
    }

    // Body: matching closing brace, or end of text if unbalanced.
    let mut depth = 0usize;
    let mut end = text_len;
    let mut next = tokens.len();
    while j < tokens.len() {
        match tokens[j].tok {
            Tok::Punct(b'{') => depth += 1,
            Tok::Punct(b'}') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = tokens[j].end;
                    next = j + 1;
                    break;
                }
            }
            _ => {}
        }
        j += 1;
    }

    Some((
        Declaration {
            name,
            kind,
            bases,
            span: start..end,
        },
        next,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<String> {
        find_declarations(text).into_iter().map(|d| d.name).collect()
    }

    #[test]
    fn single_contract() {
        let text = "pragma solidity ^0.8.0;\ncontract A {}\n";
        let decls = find_declarations(text);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "A");
        assert_eq!(decls[0].kind, UnitKind::Contract);
        assert_eq!(&text[decls[0].span.clone()], "contract A {}");
    }

    #[test]
    fn multiple_units_in_one_file() {
        let text = "interface I { function f() external; }\nlibrary L {}\ncontract C is I {}";
        assert_eq!(names(text), vec!["I", "L", "C"]);
    }

    #[test]
    fn abstract_contract_span_includes_keyword() {
        let text = "abstract contract Base { function f() public virtual; }";
        let decls = find_declarations(text);
        assert_eq!(decls[0].kind, UnitKind::AbstractContract);
        assert_eq!(decls[0].span.start, 0);
    }

    #[test]
    fn bases_are_collected() {
        let text = "contract C is A, B(1, 2), D { }";
        let decls = find_declarations(text);
        assert_eq!(decls[0].bases, vec!["A", "B", "D"]);
    }

    #[test]
    fn nested_braces_do_not_end_unit() {
        let text = "contract A { function f() public { if (true) { } } }\ncontract B {}";
        let decls = find_declarations(text);
        assert_eq!(decls.len(), 2);
        assert!(text[decls[0].span.clone()].ends_with("} } }"));
    }

    #[test]
    fn keywords_in_comments_and_strings_are_ignored() {
        let text = r#"
// contract Fake {}
/* library Hidden {} */
contract Real { string s = "contract Nope {}"; }
"#;
        assert_eq!(names(text), vec!["Real"]);
    }

    #[test]
    fn braces_in_strings_do_not_unbalance() {
        let text = "contract A { string s = \"}}}\"; }\ncontract B {}";
        assert_eq!(names(text), vec!["A", "B"]);
    }

    #[test]
    fn unterminated_body_runs_to_end() {
        let text = "contract A { function f() public {";
        let decls = find_declarations(text);
        assert_eq!(decls[0].span, 0..text.len());
    }

    #[test]
    fn file_level_structs_are_skipped() {
        let text = "struct S { uint x; }\ncontract A {}";
        assert_eq!(names(text), vec!["A"]);
    }

    #[test]
    fn kind_display() {
        assert_eq!(UnitKind::AbstractContract.to_string(), "abstract contract");
        assert_eq!(UnitKind::Library.to_string(), "library");
    }
}
