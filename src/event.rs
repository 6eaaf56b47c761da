// src/event.rs

use crate::surface::{Surface, SurfaceRoot};
use crate::video_id::VideoId;
use serde::{Deserialize, Serialize};

/// Live reference to a video title anchor. `key` is meaningful only to the host that issued it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRef {
    pub key: u64,
    #[serde(default)]
    pub href: String,
}

impl AnchorRef {
    pub fn new(key: u64, href: impl Into<String>) -> Self {
        Self {
            key,
            href: href.into(),
        }
    }

    pub fn video_id(&self) -> Option<VideoId> {
        VideoId::from_watch_url(&self.href)
    }
}

/// Notification delivered by a host's change observers.
///
/// The browser observer emits the same shape as JSON: `{"type": "activated", ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum PageEvent {
    /// `role` became `"main"` on `root`; `anchors` are every video currently on it.
    #[serde(rename = "activated")]
    SurfaceActivated {
        root: SurfaceRoot,
        #[serde(default)]
        anchors: Vec<AnchorRef>,
    },
    /// Renderer nodes were inserted below the observed surface `root` in one callback.
    /// `None` marks a renderer without a resolvable anchor.
    #[serde(rename = "inserted")]
    ItemsInserted {
        root: SurfaceRoot,
        #[serde(default)]
        items: Vec<Option<AnchorRef>>,
    },
    /// The main frame loaded a new document. Observers and labels from the previous one
    /// are gone.
    #[serde(rename = "reloaded")]
    Reloaded,
}

impl PageEvent {
    pub fn surface(&self) -> Option<Surface> {
        match self {
            PageEvent::SurfaceActivated { root, .. } | PageEvent::ItemsInserted { root, .. } => {
                root.surface()
            }
            PageEvent::Reloaded => None,
        }
    }
}
