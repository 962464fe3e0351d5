//! Models for the structured (JSON) post payload.
//!
//! Two shapes are in the wild: the newer `{"items": [Media, ...]}` and the
//! legacy `{"graphql": {"shortcode_media": Media}}`. The `window._sharedData`
//! blob embeds the legacy media node as well. Every field is optional and
//! a field of the wrong type reads as absent, so a malformed sibling never
//! hides a valid caption.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize `T`, treating a value of the wrong shape as `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Deserialize a sequence, dropping elements of the wrong shape.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| T::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPayload {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub items: Vec<Media>,
    #[serde(default, deserialize_with = "lenient")]
    pub graphql: Option<Graphql>,
}

impl ApiPayload {
    /// First item, else the GraphQL media node.
    pub fn media(&self) -> Option<&Media> {
        self.items
            .first()
            .or_else(|| self.graphql.as_ref()?.shortcode_media.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Graphql {
    #[serde(default, deserialize_with = "lenient")]
    pub shortcode_media: Option<Media>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Media {
    #[serde(default, deserialize_with = "lenient")]
    pub edge_media_to_caption: Option<Edges<TextNode>>,
    #[serde(default, deserialize_with = "lenient")]
    pub caption: Option<Caption>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub owner: Option<Owner>,
    #[serde(default, deserialize_with = "lenient")]
    pub user: Option<Owner>,
    #[serde(default, deserialize_with = "lenient")]
    pub like_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub edge_liked_by: Option<Count>,
    #[serde(default, deserialize_with = "lenient")]
    pub edge_media_preview_like: Option<Count>,
}

impl Media {
    /// Caption text in preference order: GraphQL caption edge, flat
    /// `caption.text`, then `title`. Blank values are skipped.
    pub fn caption_text(&self) -> Option<&str> {
        let edge = self
            .edge_media_to_caption
            .as_ref()
            .and_then(|e| e.edges.first())
            .and_then(|e| e.node.text.as_deref());
        let flat = self.caption.as_ref().and_then(|c| c.text.as_deref());

        [edge, flat, self.title.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
    }

    pub fn username(&self) -> Option<&str> {
        [self.owner.as_ref(), self.user.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|o| o.username.as_deref())
            .find(|name| !name.trim().is_empty())
    }

    /// A zero `like_count` falls through to the edge counters.
    pub fn likes(&self) -> u64 {
        self.like_count
            .filter(|n| *n > 0)
            .or_else(|| self.edge_liked_by.as_ref().and_then(|c| c.count))
            .or_else(|| self.edge_media_preview_like.as_ref().and_then(|c| c.count))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Edges<T> {
    #[serde(default = "Vec::new", deserialize_with = "lenient_seq")]
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextNode {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Caption {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Owner {
    #[serde(default, deserialize_with = "lenient")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Count {
    #[serde(default, deserialize_with = "lenient")]
    pub count: Option<u64>,
}
