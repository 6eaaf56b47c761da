// src/lib.rs
//! Like/dislike overlay for YouTube listing pages.
//!
//! A [`watcher::Watcher`] observes a [`host::PageHost`], batches newly visible video anchors
//! into statistics requests and paints the results next to each title.

pub mod annotate;
pub mod api;
pub mod config;
pub mod dom;
pub mod error;
pub mod event;
pub mod fetcher;
pub mod host;
pub mod js_scripts;
pub mod session;
pub mod stats;
pub mod status;
pub mod surface;
pub mod video_id;
pub mod wait;
pub mod watcher;

pub use api::{StatsApi, YoutubeDataApi};
pub use config::{Args, Settings};
pub use event::{AnchorRef, PageEvent};
pub use host::{ChromiumHost, MemoryHost, PageHost};
pub use stats::{StatsCache, StatsEntry};
pub use surface::Surface;
pub use video_id::VideoId;
pub use watcher::{Watcher, WatcherConfig, WatcherState};
