use serde::{Deserialize, Serialize};

use crate::block::Block;

/// Version stamped into every Document this crate produces.
pub const FORMAT_VERSION: &str = "1.0.0";

/// An ordered sequence of blocks plus metadata; the unit of persistence.
///
/// Documents are built fresh per import and never mutated in place. `time`
/// is milliseconds since the Unix epoch, matching the stored format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
    pub time: i64,
    pub version: String,
}

impl Document {
    pub fn new(blocks: Vec<Block>, time: i64) -> Self {
        Document {
            blocks,
            time,
            version: FORMAT_VERSION.to_string(),
        }
    }

    pub fn empty(time: i64) -> Self {
        Document::new(Vec::new(), time)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Document> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape_is_stable() {
        let doc = Document::new(
            vec![
                Block::paragraph("Hi"),
                Block::Header {
                    level: 2,
                    content: "Title".to_string(),
                },
            ],
            1_700_000_000_000,
        );
        let json = doc.to_json().unwrap();
        assert!(json.contains(r#""type":"paragraph""#));
        assert!(json.contains(r#""version":"1.0.0""#));
        assert_eq!(Document::from_json(&json).unwrap(), doc);
    }

    #[test]
    fn unknown_block_type_deserializes_to_catch_all() {
        let json = r#"{"blocks":[{"type":"marquee","speed":3},{"type":"paragraph","content":"x"}],"time":0,"version":"1.0.0"}"#;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.blocks[0], Block::Unknown);
        assert_eq!(doc.blocks[1], Block::paragraph("x"));
    }
}
