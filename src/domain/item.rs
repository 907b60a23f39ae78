use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Audio,
    Animation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub url: String,
}

/// A single post in a channel. Ids increase strictly with publication order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub channel: String,
    #[serde(default)]
    pub text: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub views: Option<u64>,
    /// Opaque token used when reporting that this item was seen.
    #[serde(default)]
    pub view_token: Option<String>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    /// Channel this post was forwarded from, if any.
    #[serde(default)]
    pub forwarded_from: Option<String>,
}

impl Item {
    pub fn new(id: i64, channel: &str) -> Self {
        Self {
            id,
            channel: channel.to_string(),
            text: None,
            date: Utc::now(),
            views: None,
            view_token: None,
            media: Vec::new(),
            forwarded_from: None,
        }
    }

    pub fn display_text(&self) -> &str {
        self.text.as_deref().unwrap_or("(no text)")
    }

    pub fn has_playable_media(&self) -> bool {
        self.media
            .iter()
            .any(|m| matches!(m.kind, MediaKind::Video | MediaKind::Audio))
    }
}

/// Sort a batch newest-first, the order of the live sequence.
pub fn newest_first(items: &mut [Item]) {
    items.sort_by(|a, b| b.id.cmp(&a.id));
}
