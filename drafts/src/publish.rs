//! Wire shapes of the backend boundary. The server itself is out of
//! scope; these exist so hosts serialize exactly what it expects.

use serde::{Deserialize, Serialize};

use crate::autosave::Draft;
use crate::error::StoreError;

/// Body of `POST/PUT /blog/posts[/:id]`. `content` is the Document JSON
/// as a string, not a nested object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishPayload {
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
}

impl PublishPayload {
    pub fn from_draft(draft: Draft<'_>) -> Result<Self, StoreError> {
        let content = draft
            .document
            .to_json()
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        Ok(PublishPayload {
            title: draft.title.to_string(),
            content,
            category: draft.category.to_string(),
            tags: draft.tags.to_vec(),
        })
    }
}

/// Response of `POST /blog/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file: UploadedFile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
}
