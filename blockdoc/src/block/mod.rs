pub mod embed;

use serde::{Deserialize, Serialize};

use crate::block::embed::EmbedService;

/// One structural unit of post content.
///
/// Blocks are independent of one another; a post is an ordered sequence of
/// them. `content` fields hold inline markup that has already passed through
/// [`crate::sanitize::sanitize_inline`] at import time and is stored
/// verbatim thereafter. `Code` content is the exception: it is plain text,
/// escaped on render instead.
///
/// The JSON form is internally tagged on `"type"`, e.g.
/// `{"type":"header","level":2,"content":"Title"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Paragraph {
        content: String,
    },
    Header {
        /// 1-6. Clamped into that range on render if a foreign producer
        /// stored something else.
        level: u8,
        content: String,
    },
    Quote {
        content: String,
    },
    Code {
        content: String,
        #[serde(default = "default_language")]
        language: String,
    },
    List {
        style: ListStyle,
        items: Vec<String>,
    },
    Image {
        url: String,
        #[serde(default)]
        alt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
    },
    Table {
        rows: Vec<Vec<TableCell>>,
    },
    Delimiter,
    Embed {
        service: EmbedService,
        /// Service-specific media id. When present, the player markup is
        /// rebuilt from it on render; otherwise `html` is replayed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// The URL the embed was created from.
        source: String,
        /// Captured embed markup, used when no id reconstruction exists.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        html: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    File {
        data: FileData,
    },
    /// A block written by a newer or foreign producer. Skipped on render.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub content: String,
    #[serde(rename = "isHeader", default)]
    pub is_header: bool,
}

/// An uploaded file attachment, rendered as a download card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    pub url: String,
    pub name: String,
    /// MIME type, serialized as `type` to match the stored format.
    #[serde(rename = "type", default)]
    pub mime: String,
    #[serde(default)]
    pub size: u64,
}

pub(crate) fn default_language() -> String {
    "plaintext".to_string()
}

impl Block {
    /// The `"type"` tag this block serializes under.
    pub fn type_name(&self) -> &'static str {
        match self {
            Block::Paragraph { .. } => "paragraph",
            Block::Header { .. } => "header",
            Block::Quote { .. } => "quote",
            Block::Code { .. } => "code",
            Block::List { .. } => "list",
            Block::Image { .. } => "image",
            Block::Table { .. } => "table",
            Block::Delimiter => "delimiter",
            Block::Embed { .. } => "embed",
            Block::File { .. } => "file",
            Block::Unknown => "unknown",
        }
    }

    pub fn paragraph(content: impl Into<String>) -> Self {
        Block::Paragraph {
            content: content.into(),
        }
    }
}
