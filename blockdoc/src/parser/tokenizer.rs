use std::ops::Range;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

/// One event in the flattened markup stream. Spans are byte ranges into the
/// source: a `StartTag` span covers `<name ...>`, a `Text` span the raw
/// (undecoded) text run.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StartTag {
        /// Lowercased element name.
        name: String,
        attrs: Vec<Attr>,
        /// True only for an explicit `/>`; void elements are detected by
        /// name via [`is_void`].
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    /// Character data with entities decoded.
    Text(String),
    Comment,
    Doctype,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    /// Lowercased attribute name.
    pub name: String,
    /// Entity-decoded value; empty for bare attributes.
    pub value: String,
}

/// Elements that never take content or an end tag.
pub fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose content is raw text, never markup.
fn is_raw_text(name: &str) -> bool {
    matches!(name, "script" | "style")
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Tokenize markup into `(Token, byte range)` events.
///
/// This never fails: anything that does not parse as a tag degrades to
/// text, matching how a browser's fragment parser treats a stray `<`.
pub fn tokenize(source: &str) -> Vec<(Token, Range<usize>)> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut pos = 0;
    let mut text_start = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }

        // Try to read a tag at `pos`. On failure the '<' stays in the text.
        let Some((token, tag_end)) = read_tag(source, pos) else {
            pos += 1;
            continue;
        };

        flush_text(source, text_start..pos, &mut tokens);

        // Raw-text elements swallow everything up to their close tag.
        if let Token::StartTag {
            name, self_closing, ..
        } = &token
        {
            if is_raw_text(name) && !self_closing {
                let name = name.clone();
                tokens.push((token, pos..tag_end));
                let (content_end, after_close) = find_raw_text_end(source, tag_end, &name);
                if content_end > tag_end {
                    tokens.push((
                        Token::Text(source[tag_end..content_end].to_string()),
                        tag_end..content_end,
                    ));
                }
                tokens.push((Token::EndTag { name }, content_end..after_close));
                pos = after_close;
                text_start = pos;
                continue;
            }
        }

        tokens.push((token, pos..tag_end));
        pos = tag_end;
        text_start = pos;
    }

    flush_text(source, text_start..bytes.len(), &mut tokens);
    tokens
}

fn flush_text(source: &str, range: Range<usize>, tokens: &mut Vec<(Token, Range<usize>)>) {
    if range.is_empty() {
        return;
    }
    let decoded = decode_entities(&source[range.clone()]);
    tokens.push((Token::Text(decoded), range));
}

/// Parse one tag starting at `start` (which must point at '<').
/// Returns the token and the byte offset just past the closing '>'.
fn read_tag(source: &str, start: usize) -> Option<(Token, usize)> {
    let rest = &source[start..];

    if let Some(after) = rest.strip_prefix("<!--") {
        let close = after.find("-->")?;
        return Some((Token::Comment, start + 4 + close + 3));
    }
    if rest.starts_with("<!") {
        let close = rest.find('>')?;
        return Some((Token::Doctype, start + close + 1));
    }
    if let Some(after) = rest.strip_prefix("</") {
        let close = after.find('>')?;
        let name = after[..close].trim().to_ascii_lowercase();
        if !is_tag_name(&name) {
            return None;
        }
        return Some((Token::EndTag { name }, start + 2 + close + 1));
    }

    // Start tag: '<' must be followed by an ASCII letter.
    let after = rest.strip_prefix('<')?;
    if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut cursor = TagCursor {
        bytes: after.as_bytes(),
        pos: 0,
    };
    let name = cursor.read_name();
    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        cursor.skip_whitespace();
        match cursor.peek()? {
            b'>' => {
                cursor.pos += 1;
                break;
            }
            b'/' => {
                cursor.pos += 1;
                cursor.skip_whitespace();
                if cursor.peek()? == b'>' {
                    cursor.pos += 1;
                    self_closing = true;
                    break;
                }
            }
            _ => {
                let attr = cursor.read_attr()?;
                attrs.push(attr);
            }
        }
    }

    Some((
        Token::StartTag {
            name,
            attrs,
            self_closing,
        },
        start + 1 + cursor.pos,
    ))
}

struct TagCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl TagCursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.bytes[start..self.pos]).to_ascii_lowercase()
    }

    fn read_attr(&mut self) -> Option<Attr> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| !b.is_ascii_whitespace() && b != b'=' && b != b'>' && b != b'/')
        {
            self.pos += 1;
        }
        if self.pos == start {
            // Not a name character; skip it so the loop makes progress.
            self.pos += 1;
            return Some(Attr {
                name: String::new(),
                value: String::new(),
            });
        }
        let name = String::from_utf8_lossy(&self.bytes[start..self.pos]).to_ascii_lowercase();

        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            return Some(Attr {
                name,
                value: String::new(),
            });
        }
        self.pos += 1;
        self.skip_whitespace();

        let value = match self.peek()? {
            quote @ (b'"' | b'\'') => {
                self.pos += 1;
                let value_start = self.pos;
                while self.peek().is_some_and(|b| b != quote) {
                    self.pos += 1;
                }
                let raw = &self.bytes[value_start..self.pos];
                self.pos += 1; // closing quote; at EOF peek() above returned None already
                String::from_utf8_lossy(raw).into_owned()
            }
            _ => {
                let value_start = self.pos;
                while self
                    .peek()
                    .is_some_and(|b| !b.is_ascii_whitespace() && b != b'>')
                {
                    self.pos += 1;
                }
                String::from_utf8_lossy(&self.bytes[value_start..self.pos]).into_owned()
            }
        };

        Some(Attr {
            name,
            value: decode_entities(&value),
        })
    }
}

fn is_tag_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Find the end of a raw-text element's content. Returns (content end,
/// offset past the close tag). With no close tag, both run to EOF.
fn find_raw_text_end(source: &str, from: usize, name: &str) -> (usize, usize) {
    let lower = source[from..].to_ascii_lowercase();
    let needle = format!("</{name}");
    let Some(rel) = lower.find(&needle) else {
        return (source.len(), source.len());
    };
    let content_end = from + rel;
    let after = match source[content_end..].find('>') {
        Some(gt) => content_end + gt + 1,
        None => source.len(),
    };
    (content_end, after)
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Decode the named entities the editor emits plus numeric references.
/// Unrecognized entities pass through untouched.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let window = &rest.as_bytes()[..rest.len().min(32)];
        let Some(semi) = window.iter().position(|&b| b == b';') else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };

        let entity = &rest[1..semi];
        match decode_one_entity(entity) {
            Some(decoded) => {
                out.push(decoded);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_one_entity(entity: &str) -> Option<char> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix(['x', 'X']) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        return char::from_u32(code);
    }
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        "hellip" => Some('\u{2026}'),
        "copy" => Some('\u{a9}'),
        _ => None,
    }
}
