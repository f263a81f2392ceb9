//! Sub-line highlighting over tag/entity-tokenized rich text
//!
//! Lines may already carry markup from an upstream highlighter, so a
//! highlight span must never open or close inside an HTML tag or entity
//! reference. The line is tokenized first; tags have zero logical width
//! and entities count as one character, so the oracle's character offsets
//! land on visible text only.

use crate::op::CharRange;

/// Opening tag wrapped around updated text.
pub const UPDATE_SPAN_OPEN: &str = r#"<span style="background-color: var(--diff-update-deep)">"#;
const UPDATE_SPAN_CLOSE: &str = "</span>";

/// One lexical unit of a rich-text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<` through the next `>`, inclusive. Zero logical width.
    Tag,
    /// `&` through the next `;`, inclusive. One logical character.
    Entity,
    /// Plain text between tags and entities.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    /// Logical character width as the oracle counts it.
    pub fn width(&self) -> usize {
        match self.kind {
            TokenKind::Tag => 0,
            TokenKind::Entity => 1,
            TokenKind::Text => self.text.chars().count(),
        }
    }
}

/// Scan a line into tag/entity/text tokens.
///
/// An unterminated tag or entity at end of line is flushed as-is, so
/// concatenating the tokens always reconstructs the input exactly.
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut kind = TokenKind::Text;
    let mut buf = String::new();

    for ch in line.chars() {
        match kind {
            TokenKind::Text => match ch {
                '<' => {
                    flush(&mut tokens, &mut buf, kind);
                    buf.push(ch);
                    kind = TokenKind::Tag;
                }
                '&' => {
                    flush(&mut tokens, &mut buf, kind);
                    buf.push(ch);
                    kind = TokenKind::Entity;
                }
                _ => buf.push(ch),
            },
            TokenKind::Tag => {
                buf.push(ch);
                if ch == '>' {
                    flush(&mut tokens, &mut buf, kind);
                    kind = TokenKind::Text;
                }
            }
            TokenKind::Entity => {
                buf.push(ch);
                if ch == ';' {
                    flush(&mut tokens, &mut buf, kind);
                    kind = TokenKind::Text;
                }
            }
        }
    }
    flush(&mut tokens, &mut buf, kind);

    tokens
}

fn flush(tokens: &mut Vec<Token>, buf: &mut String, kind: TokenKind) {
    if !buf.is_empty() {
        tokens.push(Token {
            kind,
            text: std::mem::take(buf),
        });
    }
}

/// One piece of a line after update ranges are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub marked: bool,
}

/// Split a line into marked and unmarked segments per the given ranges.
///
/// Ranges are inclusive character offsets over the line's logical text;
/// empty ranges mean the change is entirely on the other side and are
/// skipped. Tags are passed through unmarked and never split; an entity is
/// marked whole or not at all. Adjacent segments with the same marking are
/// merged.
pub fn mark_ranges(line: &str, ranges: &[CharRange]) -> Vec<Segment> {
    let spans: Vec<(usize, usize)> = ranges.iter().filter_map(|r| r.bounds()).collect();
    let mut segments: Vec<Segment> = Vec::new();
    let mut next = 0; // first range not yet consumed
    let mut offset = 0; // logical characters seen so far

    for token in tokenize(line) {
        match token.kind {
            TokenKind::Tag => push_segment(&mut segments, token.text, false),
            TokenKind::Entity => {
                while next < spans.len() && spans[next].1 < offset {
                    next += 1;
                }
                let marked = next < spans.len() && spans[next].0 <= offset;
                push_segment(&mut segments, token.text, marked);
                offset += 1;
            }
            TokenKind::Text => {
                let chars: Vec<char> = token.text.chars().collect();
                let mut pos = 0;
                while pos < chars.len() {
                    while next < spans.len() && spans[next].1 < offset + pos {
                        next += 1;
                    }
                    let Some(&(start, end)) = spans.get(next) else {
                        push_segment(&mut segments, chars[pos..].iter().collect(), false);
                        break;
                    };
                    if start > offset + pos {
                        let cut = (start - offset).min(chars.len());
                        push_segment(&mut segments, chars[pos..cut].iter().collect(), false);
                        pos = cut;
                    } else {
                        let cut = (end + 1 - offset).min(chars.len());
                        push_segment(&mut segments, chars[pos..cut].iter().collect(), true);
                        pos = cut;
                    }
                }
                offset += chars.len();
            }
        }
    }

    segments
}

fn push_segment(segments: &mut Vec<Segment>, text: String, marked: bool) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = segments.last_mut() {
        if last.marked == marked {
            last.text.push_str(&text);
            return;
        }
    }
    segments.push(Segment { text, marked });
}

/// Wrap the updated sub-ranges of a rich-text line in highlight spans.
pub fn apply_update_ranges(line: &str, ranges: &[CharRange]) -> String {
    let mut out = String::new();
    for segment in mark_ranges(line, ranges) {
        if segment.marked {
            out.push_str(UPDATE_SPAN_OPEN);
            out.push_str(&segment.text);
            out.push_str(UPDATE_SPAN_CLOSE);
        } else {
            out.push_str(&segment.text);
        }
    }
    out
}
