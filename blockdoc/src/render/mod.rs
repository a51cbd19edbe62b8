//! Block sequence → HTML. Fixed template per block type.
//!
//! Content fields are trusted stored markup: they entered through the
//! import-boundary sanitizer. The two exceptions are code bodies (stored
//! plain, escaped here) and attribute values (always escaped).

use pulldown_cmark_escape::{escape_href, escape_html};
use tracing::warn;

use crate::block::embed::EmbedService;
use crate::block::{Block, FileData, ListStyle, TableCell};
use crate::document::Document;

pub fn render_document(doc: &Document) -> String {
    render_blocks(&doc.blocks)
}

pub fn render_blocks(blocks: &[Block]) -> String {
    let mut writer = HtmlWriter {
        out: String::new(),
    };
    for block in blocks {
        writer.block(block);
    }
    writer.out
}

struct HtmlWriter {
    out: String,
}

impl HtmlWriter {
    fn raw(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn escaped(&mut self, s: &str) {
        let _ = escape_html(&mut self.out, s);
    }

    fn href(&mut self, s: &str) {
        let _ = escape_href(&mut self.out, s);
    }

    fn block(&mut self, block: &Block) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        match block {
            Block::Paragraph { content } => {
                self.raw("<p>");
                self.raw(content);
                self.raw("</p>");
            }
            Block::Header { level, content } => {
                // Stored documents may carry an out-of-range level.
                let level = (*level).clamp(1, 6);
                self.raw(&format!("<h{level}>"));
                self.raw(content);
                self.raw(&format!("</h{level}>"));
            }
            Block::Quote { content } => {
                self.raw("<blockquote>");
                self.raw(content);
                self.raw("</blockquote>");
            }
            Block::Code { content, language } => {
                self.raw("<pre><code class=\"language-");
                self.escaped(language);
                self.raw("\">");
                self.escaped(content);
                self.raw("</code></pre>");
            }
            Block::List { style, items } => {
                let tag = match style {
                    ListStyle::Ordered => "ol",
                    ListStyle::Unordered => "ul",
                };
                self.raw(&format!("<{tag}>"));
                for item in items {
                    self.raw("<li>");
                    self.raw(item);
                    self.raw("</li>");
                }
                self.raw(&format!("</{tag}>"));
            }
            Block::Image {
                url,
                alt,
                caption,
                width,
                height,
            } => self.image(url, alt, caption.as_deref(), *width, *height),
            Block::Table { rows } => self.table(rows),
            Block::Delimiter => self.raw("<hr>"),
            Block::Embed {
                service,
                id,
                source,
                html,
                caption,
            } => self.embed(*service, id.as_deref(), source, html.as_deref(), caption.as_deref()),
            Block::File { data } => self.file(data),
            Block::Unknown => {
                warn!("skipping block of unknown type during render");
                // Nothing emitted; undo the separator.
                if self.out.ends_with('\n') {
                    self.out.pop();
                }
            }
        }
    }

    fn image(
        &mut self,
        url: &str,
        alt: &str,
        caption: Option<&str>,
        width: Option<u32>,
        height: Option<u32>,
    ) {
        let img = {
            let mut w = HtmlWriter {
                out: String::new(),
            };
            w.raw("<img src=\"");
            w.href(url);
            w.raw("\" alt=\"");
            w.escaped(alt);
            w.raw("\"");
            if let Some(width) = width {
                w.raw(&format!(" width=\"{width}\""));
            }
            if let Some(height) = height {
                w.raw(&format!(" height=\"{height}\""));
            }
            w.raw(">");
            w.out
        };

        match caption {
            Some(caption) => {
                self.raw("<figure>");
                self.raw(&img);
                self.raw("<figcaption>");
                self.raw(caption);
                self.raw("</figcaption></figure>");
            }
            None => self.raw(&img),
        }
    }

    fn table(&mut self, rows: &[Vec<TableCell>]) {
        self.raw("<table><tbody>");
        for row in rows {
            self.raw("<tr>");
            for cell in row {
                let tag = if cell.is_header { "th" } else { "td" };
                self.raw(&format!("<{tag}>"));
                self.raw(&cell.content);
                self.raw(&format!("</{tag}>"));
            }
            self.raw("</tr>");
        }
        self.raw("</tbody></table>");
    }

    fn embed(
        &mut self,
        service: EmbedService,
        id: Option<&str>,
        source: &str,
        html: Option<&str>,
        caption: Option<&str>,
    ) {
        self.raw("<div class=\"media-embed\" data-service=\"");
        self.raw(service.as_str());
        self.raw("\"");
        if let Some(id) = id {
            self.raw(" data-id=\"");
            self.escaped(id);
            self.raw("\"");
        }
        if !source.is_empty() {
            self.raw(" data-src=\"");
            self.href(source);
            self.raw("\"");
        }
        self.raw(">");

        if let Some(player) = id.and_then(|id| service.embed_url(id)) {
            self.raw("<iframe src=\"");
            self.href(&player);
            self.raw("\" frameborder=\"0\" allowfullscreen></iframe>");
        } else if let Some(html) = html {
            // Captured markup, replayed as stored.
            self.raw(html);
        } else if !source.is_empty() {
            self.raw("<a href=\"");
            self.href(source);
            self.raw("\">");
            self.escaped(source);
            self.raw("</a>");
        }

        if let Some(caption) = caption {
            self.raw("<figcaption>");
            self.raw(caption);
            self.raw("</figcaption>");
        }
        self.raw("</div>");
    }

    fn file(&mut self, data: &FileData) {
        self.raw("<div class=\"file-attachment\" data-url=\"");
        self.href(&data.url);
        self.raw("\" data-name=\"");
        self.escaped(&data.name);
        self.raw("\" data-mime=\"");
        self.escaped(&data.mime);
        self.raw(&format!("\" data-size=\"{}\">", data.size));
        self.raw("<a href=\"");
        self.href(&data.url);
        self.raw("\" download>");
        self.escaped(&data.name);
        self.raw("</a><span class=\"file-size\">");
        self.escaped(&human_size(data.size));
        self.raw("</span></div>");
    }
}

/// "412 B", "1.2 KB", "3.4 MB".
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_level_clamps_to_range() {
        let html = render_blocks(&[Block::Header {
            level: 9,
            content: "t".into(),
        }]);
        assert_eq!(html, "<h6>t</h6>");

        let html = render_blocks(&[Block::Header {
            level: 0,
            content: "t".into(),
        }]);
        assert_eq!(html, "<h1>t</h1>");
    }

    #[test]
    fn code_content_is_escaped() {
        let html = render_blocks(&[Block::Code {
            content: "if a < b { }".into(),
            language: "rust".into(),
        }]);
        assert_eq!(
            html,
            "<pre><code class=\"language-rust\">if a &lt; b { }</code></pre>"
        );
    }

    #[test]
    fn unknown_block_is_skipped() {
        let html = render_blocks(&[
            Block::paragraph("a"),
            Block::Unknown,
            Block::paragraph("b"),
        ]);
        assert_eq!(html, "<p>a</p>\n<p>b</p>");
    }

    #[test]
    fn youtube_embed_rebuilds_player_from_id() {
        let html = render_blocks(&[Block::Embed {
            service: EmbedService::Youtube,
            id: Some("abc123".into()),
            source: "https://www.youtube.com/watch?v=abc123".into(),
            html: None,
            caption: None,
        }]);
        assert!(html.contains("src=\"https://www.youtube.com/embed/abc123\""));
        assert!(html.contains("data-service=\"youtube\""));
    }

    #[test]
    fn human_sizes() {
        assert_eq!(human_size(412), "412 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
