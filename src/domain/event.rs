use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One "item was seen" record waiting for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub item_id: i64,
    pub view_token: String,
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(item_id: i64, view_token: String) -> Self {
        Self {
            item_id,
            view_token,
            timestamp: Utc::now(),
        }
    }
}
