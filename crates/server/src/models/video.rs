//! Background videos.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bep_core::VideoSlot;

/// Live and pending video for a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteVideo {
    pub slot: VideoSlot,
    pub live_url: Option<String>,
    pub pending_url: Option<String>,
    pub pending_file_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// What anonymous visitors see: the live URL only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicVideo {
    pub slot: VideoSlot,
    pub url: Option<String>,
}

impl From<SiteVideo> for PublicVideo {
    fn from(video: SiteVideo) -> Self {
        Self {
            slot: video.slot,
            url: video.live_url,
        }
    }
}
