//! JSON:API response envelopes
//!
//! Only the members the client reads are modelled; `links`, `included` and
//! the rest are ignored.

use serde::Deserialize;

/// Envelope for a single resource: `{ "data": {...} }`
#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

/// Envelope for a collection: `{ "data": [...], "meta": { "count": n } }`
#[derive(Debug, Deserialize)]
pub struct ListDocument<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl<T> ListDocument<T> {
    /// Total number of matches reported by the server, if any
    pub fn count(&self) -> Option<u64> {
        self.meta.as_ref().and_then(|meta| meta.count)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub count: Option<u64>,
}

/// Entry of `/anime/{id}/characters`: a join record carrying the role
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterRef {
    pub id: String,
    #[serde(default)]
    pub attributes: CharacterRefAttributes,
    #[serde(default)]
    pub relationships: Option<CharacterRefRelationships>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterRefAttributes {
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterRefRelationships {
    #[serde(default)]
    pub character: Option<Relationship>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<Linkage>,
}

/// Resource identifier object
#[derive(Debug, Clone, Deserialize)]
pub struct Linkage {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl CharacterRef {
    /// Id to fetch from `/characters/{id}`
    ///
    /// Uses the linked character when the server includes linkage data,
    /// otherwise the entry's own id.
    pub fn character_id(&self) -> &str {
        self.relationships
            .as_ref()
            .and_then(|r| r.character.as_ref())
            .and_then(|c| c.data.as_ref())
            .map(|linkage| linkage.id.as_str())
            .unwrap_or(&self.id)
    }

    pub fn role(&self) -> String {
        self.attributes.role.clone().unwrap_or_default()
    }
}
