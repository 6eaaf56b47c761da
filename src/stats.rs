// src/stats.rs

use crate::video_id::VideoId;
use rustc_hash::FxHashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsEntry {
    pub likes: u64,
    pub dislikes: u64,
}

impl StatsEntry {
    pub fn new(likes: u64, dislikes: u64) -> Self {
        Self { likes, dislikes }
    }
}

/// One video's statistics as returned by the statistics API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoStatistics {
    pub id: VideoId,
    pub entry: StatsEntry,
}

/// Session-wide `VideoId -> StatsEntry` map. Entries are overwritten, never evicted.
#[derive(Debug, Default)]
pub struct StatsCache {
    entries: FxHashMap<VideoId, StatsEntry>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `entry` for `id`, returning the entry it replaced.
    pub fn insert(&mut self, id: VideoId, entry: StatsEntry) -> Option<StatsEntry> {
        self.entries.insert(id, entry)
    }

    pub fn merge(&mut self, stats: impl IntoIterator<Item = VideoStatistics>) -> usize {
        let mut merged = 0;
        for VideoStatistics { id, entry } in stats {
            self.insert(id, entry);
            merged += 1;
        }
        merged
    }

    pub fn get(&self, id: &VideoId) -> Option<StatsEntry> {
        self.entries.get(id).copied()
    }

    pub fn contains(&self, id: &VideoId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
