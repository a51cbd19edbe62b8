use std::ops::Range;

use crate::block::embed::EmbedService;
use crate::block::{Block, FileData, ListStyle, TableCell, default_language};
use crate::parser::ParserOptions;
use crate::parser::error::ParseDiagnostic;
use crate::parser::tokenizer::{self, Attr, Token, is_void};
use crate::sanitize::sanitize_inline;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Map editable-region HTML onto a block sequence.
pub(crate) fn import_blocks(
    source: &str,
    file_id: usize,
    options: &ParserOptions,
) -> (Vec<Block>, Vec<ParseDiagnostic>) {
    let tokens = tokenizer::tokenize(source);
    let mut state = ImportState {
        source,
        file_id,
        options,
        tokens: &tokens,
        i: 0,
        blocks: Vec::new(),
        diagnostics: Vec::new(),
    };
    state.process_nodes(tokens.len());
    (state.blocks, state.diagnostics)
}

// ---------------------------------------------------------------------------
// Tag dispatch
// ---------------------------------------------------------------------------

/// Typed dispatch over element names, so every recognized tag is handled
/// in one exhaustive match instead of a stringly switch.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TagKind {
    Paragraph,
    Heading(u8),
    Blockquote,
    Pre,
    List(ListStyle),
    Image,
    Figure,
    Table,
    Rule,
    Iframe,
    /// Non-content elements whose subtree is discarded.
    Excluded,
    /// Inline formatting; swept into a paragraph run.
    Inline,
    /// Anything else: recurse into children.
    Wrapper,
}

impl TagKind {
    fn classify(name: &str) -> TagKind {
        match name {
            "p" => TagKind::Paragraph,
            "h1" => TagKind::Heading(1),
            "h2" => TagKind::Heading(2),
            "h3" => TagKind::Heading(3),
            "h4" => TagKind::Heading(4),
            "h5" => TagKind::Heading(5),
            "h6" => TagKind::Heading(6),
            "blockquote" => TagKind::Blockquote,
            "pre" => TagKind::Pre,
            "ol" => TagKind::List(ListStyle::Ordered),
            "ul" => TagKind::List(ListStyle::Unordered),
            "img" => TagKind::Image,
            "figure" => TagKind::Figure,
            "table" => TagKind::Table,
            "hr" => TagKind::Rule,
            "iframe" => TagKind::Iframe,
            "script" | "style" | "head" | "meta" | "link" | "title" | "template"
            | "noscript" | "base" => TagKind::Excluded,
            "a" | "b" | "strong" | "i" | "em" | "u" | "s" | "code" | "mark" | "sub"
            | "sup" | "br" | "span" | "small" | "abbr" | "time" | "cite" | "q" | "kbd"
            | "var" | "samp" | "del" | "ins" => TagKind::Inline,
            _ => TagKind::Wrapper,
        }
    }
}

// ---------------------------------------------------------------------------
// Import state
// ---------------------------------------------------------------------------

/// Byte and token extents of one consumed element.
struct ElementSpan {
    /// `<tag ...>` through `</tag>`, inclusive.
    outer: Range<usize>,
    /// Content between the tags.
    inner: Range<usize>,
    /// Token indices of the content.
    toks: Range<usize>,
}

struct ImportState<'a> {
    source: &'a str,
    file_id: usize,
    options: &'a ParserOptions,
    tokens: &'a [(Token, Range<usize>)],
    i: usize,
    blocks: Vec<Block>,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<'a> ImportState<'a> {
    /// Process tokens up to `end` as a sequence of block-level nodes.
    fn process_nodes(&mut self, end: usize) {
        while self.i < end {
            let (token, range) = &self.tokens[self.i];
            match token {
                Token::Text(text) => {
                    if text.trim().is_empty() {
                        self.i += 1;
                    } else {
                        self.collect_inline_run(end);
                    }
                }
                Token::StartTag { name, attrs, .. } => {
                    // Marker classes take precedence over generic dispatch.
                    if has_class(attrs, "media-embed") {
                        self.handle_media_embed();
                        continue;
                    }
                    if has_class(attrs, "file-attachment") {
                        self.handle_file_attachment();
                        continue;
                    }
                    if name == "blockquote" && has_class(attrs, "twitter-tweet") {
                        self.handle_twitter_quote();
                        continue;
                    }

                    match TagKind::classify(name) {
                        TagKind::Paragraph => self.handle_paragraph(),
                        TagKind::Heading(level) => self.handle_heading(level),
                        TagKind::Blockquote => self.handle_blockquote(),
                        TagKind::Pre => self.handle_pre(),
                        TagKind::List(style) => self.handle_list(style),
                        TagKind::Image => self.handle_image(),
                        TagKind::Figure => self.handle_figure(),
                        TagKind::Table => self.handle_table(),
                        TagKind::Rule => {
                            self.blocks.push(Block::Delimiter);
                            self.consume_element();
                        }
                        TagKind::Iframe => self.handle_iframe(),
                        TagKind::Excluded => {
                            if matches!(name.as_str(), "script" | "style") {
                                self.warn(
                                    format!("discarded {name} element"),
                                    range.clone(),
                                );
                            }
                            self.consume_element();
                        }
                        TagKind::Inline => self.collect_inline_run(end),
                        TagKind::Wrapper => self.handle_wrapper(),
                    }
                }
                // Stray close tags and non-content markers.
                Token::EndTag { .. } | Token::Comment | Token::Doctype => {
                    self.i += 1;
                }
            }
        }
    }

    // -- node handlers ------------------------------------------------------

    fn handle_paragraph(&mut self) {
        let span = self.consume_element();
        self.push_paragraph_from(span.inner);
    }

    fn handle_heading(&mut self, level: u8) {
        let span = self.consume_element();
        let content = self.inline_content(span.inner);
        if !content.is_empty() {
            self.blocks.push(Block::Header { level, content });
        }
    }

    fn handle_blockquote(&mut self) {
        let span = self.consume_element();
        let content = self.inline_content(span.inner);
        if !content.is_empty() {
            self.blocks.push(Block::Quote { content });
        }
    }

    /// `<pre>`, optionally wrapping `<code class="language-x">`.
    /// Content is the decoded text, stored plain — render escapes it.
    fn handle_pre(&mut self) {
        let span = self.consume_element();
        let mut language = None;

        for (token, _) in &self.tokens[span.toks.clone()] {
            if let Token::StartTag { name, attrs, .. } = token {
                if name == "code" {
                    language = attrs
                        .iter()
                        .filter(|a| a.name == "class")
                        .flat_map(|a| a.value.split_ascii_whitespace())
                        .find_map(|c| c.strip_prefix("language-"))
                        .map(str::to_string);
                    break;
                }
            }
        }

        let content = text_within(self.tokens, span.toks);
        if content.trim().is_empty() {
            return;
        }
        self.blocks.push(Block::Code {
            content,
            language: language.unwrap_or_else(default_language),
        });
    }

    fn handle_list(&mut self, style: ListStyle) {
        let span = self.consume_element();
        let mut items = Vec::new();
        let mut j = span.toks.start;

        while j < span.toks.end {
            match &self.tokens[j].0 {
                Token::StartTag { name, .. } if name == "li" => {
                    let item = consume_element_at(self.tokens, &mut j, span.toks.end);
                    let content = self.inline_content(item.inner);
                    if !content.is_empty() {
                        items.push(content);
                    }
                }
                _ => j += 1,
            }
        }

        if !items.is_empty() {
            self.blocks.push(Block::List { style, items });
        }
    }

    fn handle_image(&mut self) {
        let (attrs, range) = self.start_tag_attrs();
        let span_for_warning = range.clone();
        self.consume_element();
        match self.image_from_attrs(&attrs, None) {
            Some(block) => self.blocks.push(block),
            None => self.warn("image without a src attribute, skipped", span_for_warning),
        }
    }

    /// `<figure>` pairs media with an optional `<figcaption>`.
    fn handle_figure(&mut self) {
        let span = self.consume_element();
        let mut caption = None;
        let mut img_attrs = None;
        let mut iframe: Option<(Vec<Attr>, Range<usize>)> = None;
        let mut j = span.toks.start;

        while j < span.toks.end {
            match &self.tokens[j].0 {
                Token::StartTag { name, attrs, .. } if name == "img" && img_attrs.is_none() => {
                    img_attrs = Some(attrs.clone());
                    j += 1;
                }
                Token::StartTag { name, attrs, .. } if name == "iframe" && iframe.is_none() => {
                    let attrs = attrs.clone();
                    let el = consume_element_at(self.tokens, &mut j, span.toks.end);
                    iframe = Some((attrs, el.outer));
                }
                Token::StartTag { name, .. } if name == "figcaption" => {
                    let el = consume_element_at(self.tokens, &mut j, span.toks.end);
                    let text = self.inline_content(el.inner);
                    if !text.is_empty() {
                        caption = Some(text);
                    }
                }
                _ => j += 1,
            }
        }

        if let Some(attrs) = img_attrs {
            match self.image_from_attrs(&attrs, caption) {
                Some(block) => self.blocks.push(block),
                None => self.warn("figure image without a src attribute, skipped", span.outer),
            }
        } else if let Some((attrs, outer)) = iframe {
            if let Some(block) = self.embed_from_iframe(&attrs, outer.clone(), caption) {
                self.blocks.push(block);
            }
        } else if let Some(text) = non_empty(self.inline_content(span.inner)) {
            self.blocks.push(Block::Paragraph { content: text });
        }
    }

    fn handle_table(&mut self) {
        let span = self.consume_element();
        let mut rows: Vec<Vec<TableCell>> = Vec::new();
        let mut j = span.toks.start;

        // thead/tbody wrappers are transparent: scan for tr directly.
        while j < span.toks.end {
            match &self.tokens[j].0 {
                Token::StartTag { name, .. } if name == "tr" => {
                    let row_span =
                        consume_element_at(self.tokens, &mut j, span.toks.end);
                    let mut cells = Vec::new();
                    let mut k = row_span.toks.start;
                    while k < row_span.toks.end {
                        match &self.tokens[k].0 {
                            Token::StartTag { name, .. } if name == "th" || name == "td" => {
                                let is_header = name == "th";
                                let cell = consume_element_at(
                                    self.tokens,
                                    &mut k,
                                    row_span.toks.end,
                                );
                                cells.push(TableCell {
                                    content: self.inline_content(cell.inner),
                                    is_header,
                                });
                            }
                            _ => k += 1,
                        }
                    }
                    if !cells.is_empty() {
                        rows.push(cells);
                    }
                }
                _ => j += 1,
            }
        }

        if !rows.is_empty() {
            self.blocks.push(Block::Table { rows });
        }
    }

    fn handle_iframe(&mut self) {
        let (attrs, _) = self.start_tag_attrs();
        let span = self.consume_element();
        if let Some(block) = self.embed_from_iframe(&attrs, span.outer, None) {
            self.blocks.push(block);
        }
    }

    /// `div.media-embed` marker: `data-service`, `data-id`, `data-src`,
    /// with an inner iframe (and optional figcaption) as fallback.
    fn handle_media_embed(&mut self) {
        let (attrs, range) = self.start_tag_attrs();
        let span = self.consume_element();

        let mut service = attr(&attrs, "data-service")
            .map(EmbedService::from_name)
            .unwrap_or(EmbedService::Unknown);
        let mut id = attr(&attrs, "data-id").and_then(|v| non_empty(v.to_string()));
        let mut source = attr(&attrs, "data-src").unwrap_or_default().to_string();

        // Fall back to the captured player markup (an iframe, or the
        // blockquote form a tweet pastes as) for anything the marker omits.
        let mut inner_iframe: Option<Vec<Attr>> = None;
        let mut inner_markup: Option<Range<usize>> = None;
        let mut caption = None;
        let mut j = span.toks.start;
        while j < span.toks.end {
            match &self.tokens[j].0 {
                Token::StartTag { name, attrs, .. } if name == "iframe" && inner_iframe.is_none() => {
                    let attrs = attrs.clone();
                    let el = consume_element_at(self.tokens, &mut j, span.toks.end);
                    inner_markup.get_or_insert(el.outer);
                    inner_iframe = Some(attrs);
                }
                Token::StartTag { name, .. } if name == "blockquote" => {
                    let el = consume_element_at(self.tokens, &mut j, span.toks.end);
                    inner_markup.get_or_insert(el.outer);
                }
                Token::StartTag { name, .. } if name == "figcaption" => {
                    let el = consume_element_at(self.tokens, &mut j, span.toks.end);
                    caption = non_empty(self.inline_content(el.inner));
                }
                _ => j += 1,
            }
        }

        if let Some(iframe_attrs) = &inner_iframe {
            let src = attr(iframe_attrs, "src").unwrap_or_default();
            if source.is_empty() {
                source = src.to_string();
            }
            if service == EmbedService::Unknown {
                service = EmbedService::from_url(src);
            }
            if id.is_none() {
                id = service.extract_id(src);
            }
        }
        if id.is_none() {
            id = service.extract_id(&source);
        }

        // Captured markup is only needed when no player can be rebuilt.
        let reconstructs = id
            .as_deref()
            .is_some_and(|id| service.embed_url(id).is_some());
        let html = if reconstructs {
            None
        } else {
            inner_markup.map(|r| self.source[r].to_string())
        };

        if id.is_none() && html.is_none() && source.is_empty() {
            self.warn("media-embed marker carries no id, src, or markup; skipped", range);
            return;
        }

        self.blocks.push(Block::Embed {
            service,
            id,
            source,
            html,
            caption,
        });
    }

    /// `div.file-attachment` marker: `data-url`, `data-name`, `data-mime`,
    /// `data-size`. Inner markup is presentation only and is discarded.
    fn handle_file_attachment(&mut self) {
        let (attrs, range) = self.start_tag_attrs();
        self.consume_element();

        let Some(url) = attr(&attrs, "data-url").and_then(|v| non_empty(v.to_string())) else {
            self.warn("file-attachment marker without data-url, skipped", range);
            return;
        };
        let name = attr(&attrs, "data-name")
            .and_then(|v| non_empty(v.to_string()))
            .or_else(|| {
                url.rsplit('/')
                    .next()
                    .and_then(|s| non_empty(s.to_string()))
            })
            .unwrap_or_else(|| "file".to_string());
        let mime = attr(&attrs, "data-mime").unwrap_or_default().to_string();
        let size = attr(&attrs, "data-size")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        self.blocks.push(Block::File {
            data: FileData {
                url,
                name,
                mime,
                size,
            },
        });
    }

    /// `blockquote.twitter-tweet` is the pasted form of a tweet embed: the
    /// id comes from the status link, the whole blockquote is the fallback.
    fn handle_twitter_quote(&mut self) {
        let span = self.consume_element();
        let mut source = String::new();
        let mut id = None;

        for (token, _) in &self.tokens[span.toks.clone()] {
            if let Token::StartTag { name, attrs, .. } = token {
                if name == "a" {
                    if let Some(href) = attr(attrs, "href") {
                        if let Some(found) = EmbedService::Twitter.extract_id(href) {
                            source = href.to_string();
                            id = Some(found);
                            break;
                        }
                    }
                }
            }
        }

        self.blocks.push(Block::Embed {
            service: EmbedService::Twitter,
            id,
            source,
            html: Some(self.source[span.outer.clone()].to_string()),
            caption: None,
        });
    }

    /// Default case: recurse through unrecognized wrappers. An element with
    /// no element children but non-whitespace text becomes a paragraph of
    /// its inner inline content.
    fn handle_wrapper(&mut self) {
        let span = self.consume_element();
        let has_element_children = self.tokens[span.toks.clone()]
            .iter()
            .any(|(t, _)| matches!(t, Token::StartTag { .. }));

        if has_element_children {
            let resume = self.i;
            self.i = span.toks.start;
            self.process_nodes(span.toks.end);
            self.i = resume;
        } else {
            self.push_paragraph_from(span.inner);
        }
    }

    /// Sweep a run of text and inline elements into one paragraph, up to
    /// the next block-level tag.
    fn collect_inline_run(&mut self, end: usize) {
        let run_start = self.tokens[self.i].1.start;
        let mut run_end = run_start;

        while self.i < end {
            match &self.tokens[self.i].0 {
                Token::Text(_) => {
                    run_end = self.tokens[self.i].1.end;
                    self.i += 1;
                }
                Token::StartTag { name, .. } if TagKind::classify(name) == TagKind::Inline => {
                    let el = self.consume_element();
                    run_end = el.outer.end;
                }
                // A stray inline close tag stays part of the run.
                Token::EndTag { name } if TagKind::classify(name) == TagKind::Inline => {
                    run_end = self.tokens[self.i].1.end;
                    self.i += 1;
                }
                Token::Comment => {
                    self.i += 1;
                }
                _ => break,
            }
        }

        self.push_paragraph_from(run_start..run_end);
    }

    // -- shared pieces ------------------------------------------------------

    /// Sanitized inline content of a byte range.
    fn inline_content(&self, range: Range<usize>) -> String {
        sanitize_inline(&self.source[range]).trim().to_string()
    }

    fn push_paragraph_from(&mut self, range: Range<usize>) {
        let content = self.inline_content(range);
        if !content.is_empty() {
            self.blocks.push(Block::Paragraph { content });
        }
    }

    fn image_from_attrs(&self, attrs: &[Attr], caption: Option<String>) -> Option<Block> {
        let url = attr(attrs, "src").and_then(|v| non_empty(v.to_string()))?;
        Some(Block::Image {
            url,
            alt: attr(attrs, "alt").unwrap_or_default().to_string(),
            caption,
            width: attr(attrs, "width").and_then(|v| v.parse().ok()),
            height: attr(attrs, "height").and_then(|v| v.parse().ok()),
        })
    }

    fn embed_from_iframe(
        &mut self,
        attrs: &[Attr],
        outer: Range<usize>,
        caption: Option<String>,
    ) -> Option<Block> {
        let Some(src) = attr(attrs, "src").and_then(|v| non_empty(v.to_string())) else {
            self.warn("iframe without a src attribute, skipped", outer);
            return None;
        };

        let service = EmbedService::from_url(&src);
        if service == EmbedService::Unknown && !self.host_is_allowed(&src) {
            self.warn(
                format!("unrecognized embed host in '{src}', skipped"),
                outer,
            );
            return None;
        }

        let id = service.extract_id(&src);
        let html = if id.is_none() {
            Some(self.source[outer].to_string())
        } else {
            None
        };

        Some(Block::Embed {
            service,
            id,
            source: src,
            html,
            caption,
        })
    }

    fn host_is_allowed(&self, url: &str) -> bool {
        let url = url.to_ascii_lowercase();
        self.options.extra_embed_hosts.iter().any(|host| {
            let host = host.trim_start_matches("www.");
            url.contains(&format!("//{host}/"))
                || url.contains(&format!("//www.{host}/"))
                || url.contains(&format!(".{host}/"))
        })
    }

    /// Clone the attrs of the start tag at the cursor (which must be one).
    fn start_tag_attrs(&self) -> (Vec<Attr>, Range<usize>) {
        match &self.tokens[self.i] {
            (Token::StartTag { attrs, .. }, range) => (attrs.clone(), range.clone()),
            (_, range) => (Vec::new(), range.clone()),
        }
    }

    /// Consume the element whose start tag is at the cursor.
    fn consume_element(&mut self) -> ElementSpan {
        consume_element_at(self.tokens, &mut self.i, self.tokens.len())
    }

    fn warn(&mut self, message: impl Into<String>, span: Range<usize>) {
        self.diagnostics
            .push(ParseDiagnostic::warning(message, span, self.file_id));
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Consume one element starting at `tokens[*j]` (its start tag), advancing
/// `*j` past the matching close tag. Same-name nesting is tracked; a
/// missing close tag runs the element to `limit`.
fn consume_element_at(
    tokens: &[(Token, Range<usize>)],
    j: &mut usize,
    limit: usize,
) -> ElementSpan {
    let (name, self_closing, open) = match &tokens[*j] {
        (
            Token::StartTag {
                name, self_closing, ..
            },
            range,
        ) => (name.clone(), *self_closing, range.clone()),
        (_, range) => {
            // Not a start tag; consume the single token.
            *j += 1;
            return ElementSpan {
                outer: range.clone(),
                inner: range.end..range.end,
                toks: *j..*j,
            };
        }
    };
    *j += 1;

    if self_closing || is_void(&name) {
        return ElementSpan {
            outer: open.clone(),
            inner: open.end..open.end,
            toks: *j..*j,
        };
    }

    let toks_start = *j;
    let mut depth = 1u32;
    while *j < limit {
        match &tokens[*j] {
            (
                Token::StartTag {
                    name: n,
                    self_closing: false,
                    ..
                },
                _,
            ) if *n == name => depth += 1,
            (Token::EndTag { name: n }, close) if *n == name => {
                depth -= 1;
                if depth == 0 {
                    let span = ElementSpan {
                        outer: open.start..close.end,
                        inner: open.end..close.start,
                        toks: toks_start..*j,
                    };
                    *j += 1;
                    return span;
                }
            }
            _ => {}
        }
        *j += 1;
    }

    // Unclosed: content runs to the enclosing limit.
    let end_byte = if limit > toks_start {
        tokens[limit - 1].1.end
    } else {
        open.end
    };
    ElementSpan {
        outer: open.start..end_byte,
        inner: open.end..end_byte,
        toks: toks_start..limit,
    }
}

/// Concatenated decoded text of a token range.
fn text_within(tokens: &[(Token, Range<usize>)], range: Range<usize>) -> String {
    let mut out = String::new();
    for (token, _) in &tokens[range] {
        if let Token::Text(text) = token {
            out.push_str(text);
        }
    }
    out
}

fn attr<'a>(attrs: &'a [Attr], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.value.as_str())
}

fn has_class(attrs: &[Attr], class: &str) -> bool {
    attr(attrs, "class")
        .map(|v| v.split_ascii_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
