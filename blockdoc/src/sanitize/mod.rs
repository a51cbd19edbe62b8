//! Inline-markup sanitizer, applied where untrusted content enters the
//! block model (import/paste). Stored `content` strings have always passed
//! through here, which is what lets the render path trust them.

use pulldown_cmark_escape::{escape_href, escape_html};

use crate::parser::tokenizer::{self, Attr, Token};

/// Inline tags that survive sanitization. Everything else loses its markup;
/// see [`strips_subtree`] for the elements that lose their content too.
fn is_allowed(name: &str) -> bool {
    matches!(
        name,
        "a" | "b" | "strong" | "i" | "em" | "u" | "s" | "code" | "mark" | "sub" | "sup"
    )
}

/// Elements whose entire subtree is discarded, not just the tags.
fn strips_subtree(name: &str) -> bool {
    matches!(
        name,
        "script"
            | "style"
            | "iframe"
            | "object"
            | "embed"
            | "svg"
            | "math"
            | "form"
            | "textarea"
            | "select"
            | "button"
            | "head"
            | "title"
    )
}

/// Filter a fragment of inline markup down to the allowlist.
///
/// Kept tags are re-emitted lowercase with only their safe attributes, and
/// are balanced on output even if the input was not. Disallowed tags are
/// dropped while their text content survives. Text is entity-decoded and
/// re-escaped, so the function is idempotent: `sanitize_inline(x)` is a
/// fixed point of itself.
pub fn sanitize_inline(source: &str) -> String {
    let tokens = tokenizer::tokenize(source);
    let mut out = String::with_capacity(source.len());
    // Open allowed tags, innermost last.
    let mut open: Vec<String> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let (ref token, _) = tokens[i];
        match token {
            Token::Text(text) => {
                let _ = escape_html(&mut out, text);
                i += 1;
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                if strips_subtree(name) {
                    i += 1;
                    if !self_closing && !tokenizer::is_void(name) {
                        skip_subtree(&tokens, &mut i, name);
                    }
                } else if name == "br" {
                    out.push_str("<br>");
                    i += 1;
                } else if name == "a" {
                    // Without a usable destination, keep the text, not the
                    // link.
                    if let Some(href) = safe_href(attrs) {
                        out.push_str("<a href=\"");
                        let _ = escape_href(&mut out, &href);
                        out.push_str("\">");
                        open.push("a".to_string());
                    }
                    i += 1;
                } else if is_allowed(name) {
                    out.push('<');
                    out.push_str(name);
                    out.push('>');
                    open.push(name.clone());
                    i += 1;
                } else {
                    // Markup dropped, children kept.
                    i += 1;
                }
            }
            Token::EndTag { name } => {
                if is_allowed(name) {
                    if let Some(depth) = open.iter().rposition(|n| n == name) {
                        while open.len() > depth {
                            let closed = open.pop().unwrap();
                            out.push_str("</");
                            out.push_str(&closed);
                            out.push('>');
                        }
                    }
                }
                i += 1;
            }
            Token::Comment | Token::Doctype => {
                i += 1;
            }
        }
    }

    while let Some(closed) = open.pop() {
        out.push_str("</");
        out.push_str(&closed);
        out.push('>');
    }

    out
}

/// Advance past the subtree of the element opened just before `*i`,
/// tolerating nesting of the same element name.
fn skip_subtree(tokens: &[(Token, std::ops::Range<usize>)], i: &mut usize, name: &str) {
    let mut depth = 1u32;
    while *i < tokens.len() {
        match &tokens[*i].0 {
            Token::StartTag {
                name: n,
                self_closing: false,
                ..
            } if n == name => depth += 1,
            Token::EndTag { name: n } if n == name => {
                depth -= 1;
                if depth == 0 {
                    *i += 1;
                    return;
                }
            }
            _ => {}
        }
        *i += 1;
    }
}

/// The anchor's href, if it points somewhere sound: http(s), mailto, or a
/// relative path. Control characters are stripped before the scheme check
/// so `java\tscript:` does not slip through.
fn safe_href(attrs: &[Attr]) -> Option<String> {
    let raw = attrs.iter().find(|a| a.name == "href")?.value.trim();
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    if cleaned.is_empty() {
        return None;
    }

    let prefix = cleaned.split(['/', '?', '#']).next().unwrap_or("");
    match prefix.split_once(':') {
        None => Some(cleaned),
        Some((scheme, _)) => {
            let scheme = scheme.to_ascii_lowercase();
            if matches!(scheme.as_str(), "http" | "https" | "mailto") {
                Some(cleaned)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_allowed_inline_markup() {
        assert_eq!(
            sanitize_inline("Hello <b>world</b> and <em>more</em>"),
            "Hello <b>world</b> and <em>more</em>"
        );
    }

    #[test]
    fn drops_disallowed_tags_but_keeps_text() {
        assert_eq!(sanitize_inline("<span class=\"x\">kept</span>"), "kept");
        assert_eq!(sanitize_inline("<div><p>inner</p></div>"), "inner");
    }

    #[test]
    fn strips_script_subtrees_entirely() {
        assert_eq!(sanitize_inline("a<script>alert(1)</script>b"), "ab");
        assert_eq!(sanitize_inline("x<style>p{}</style>y"), "xy");
    }

    #[test]
    fn drops_event_handlers_and_unsafe_hrefs() {
        assert_eq!(
            sanitize_inline("<b onclick=\"steal()\">x</b>"),
            "<b>x</b>"
        );
        assert_eq!(
            sanitize_inline("<a href=\"javascript:alert(1)\">x</a>"),
            "x"
        );
        assert_eq!(
            sanitize_inline("<a href=\"JAVAscript:alert(1)\">x</a>"),
            "x"
        );
    }

    #[test]
    fn keeps_sound_links() {
        assert_eq!(
            sanitize_inline("<a href=\"https://example.com/p\">x</a>"),
            "<a href=\"https://example.com/p\">x</a>"
        );
        assert_eq!(
            sanitize_inline("<a href=\"/posts/3\">x</a>"),
            "<a href=\"/posts/3\">x</a>"
        );
    }

    #[test]
    fn balances_unclosed_tags() {
        assert_eq!(sanitize_inline("<b>bold"), "<b>bold</b>");
        assert_eq!(sanitize_inline("<b><i>x</b>"), "<b><i>x</i></b>");
    }

    #[test]
    fn escapes_literal_angle_brackets() {
        assert_eq!(sanitize_inline("1 < 2"), "1 &lt; 2");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "plain",
            "a <b>b</b> &amp; <a href=\"https://e.com?a=1&amp;b=2\">c</a>",
            "1 &lt; 2 and <span>drop</span>",
            "line<br>break",
        ];
        for input in inputs {
            let once = sanitize_inline(input);
            assert_eq!(sanitize_inline(&once), once, "input: {input}");
        }
    }
}
