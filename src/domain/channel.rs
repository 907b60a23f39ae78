use serde::{Deserialize, Serialize};

use crate::app::{EddyError, Result};

/// Small per-channel metadata record, resolved through the resource cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMeta {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub subscribers: Option<u64>,
}

impl ChannelMeta {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Channel names accepted by the content service.
pub fn is_valid_channel(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn check_channel(name: &str) -> Result<()> {
    if is_valid_channel(name) {
        Ok(())
    } else {
        Err(EddyError::Validation(format!(
            "invalid channel name: {:?}",
            name
        )))
    }
}
