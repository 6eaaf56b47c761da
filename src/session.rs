// src/session.rs

use crate::stats::StatsCache;
use crate::video_id::VideoId;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;

/// Ids already dispatched through the insertion path during this session.
#[derive(Debug, Default)]
pub struct SeenIds {
    ids: FxHashSet<VideoId>,
}

impl SeenIds {
    /// Records `id`, returning `true` if it had not been seen before.
    pub fn insert(&mut self, id: VideoId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// State that lives for one page session: the stats cache and the seen-id set.
#[derive(Debug)]
pub struct Session {
    pub stats: StatsCache,
    pub seen: SeenIds,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            stats: StatsCache::new(),
            seen: SeenIds::default(),
            started_at: Utc::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Forgets everything learned from the previous document.
    pub fn reset(&mut self) {
        self.stats = StatsCache::new();
        self.seen = SeenIds::default();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seen_ids_accept_each_id_once() {
        let mut seen = SeenIds::default();
        assert!(seen.insert(VideoId::new("a1")));
        assert!(!seen.insert(VideoId::new("a1")));
        assert!(seen.insert(VideoId::new("b2")));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn reset_keeps_start_time() {
        let mut session = Session::new();
        let started_at = session.started_at();
        session.seen.insert(VideoId::new("a1"));
        session
            .stats
            .insert(VideoId::new("a1"), crate::stats::StatsEntry::new(1, 0));

        session.reset();
        assert!(session.seen.is_empty());
        assert!(session.stats.is_empty());
        assert_eq!(session.started_at(), started_at);
        assert!(session.seen.insert(VideoId::new("a1")));
    }
}
