// src/video_id.rs

use serde::{Deserialize, Serialize};
use std::fmt;

const WATCH_MARKER: &str = "watch?v=";
const TIME_OFFSET_MARKER: &str = "&t=";

/// Opaque YouTube video identifier taken from a watch URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extracts the id between `watch?v=` and a trailing `&t=` offset (or the end of the URL).
    ///
    /// Returns `None` when the URL is not a watch URL; callers skip such anchors.
    pub fn from_watch_url(url: &str) -> Option<Self> {
        let without_offset = url.split(TIME_OFFSET_MARKER).next().unwrap_or_default();
        let id = without_offset.split(WATCH_MARKER).nth(1)?;
        if id.is_empty() {
            return None;
        }
        Some(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
