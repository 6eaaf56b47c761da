//! Shared fixtures for watcher integration tests.
//!
//! Builds YouTube-shaped documents on a `MemoryHost` and provides a recording statistics API.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use ytreact_overview::api::StatsApi;
use ytreact_overview::error::StatsError;
use ytreact_overview::host::memory::{MemoryDom, NodeId};
use ytreact_overview::stats::{StatsEntry, VideoStatistics};
use ytreact_overview::{MemoryHost, VideoId};

#[derive(Default)]
struct FakeState {
    stats: HashMap<String, StatsEntry>,
    failing: HashSet<String>,
    calls: Vec<Vec<String>>,
}

/// Statistics API double: answers from a fixed table and records every request.
#[derive(Clone, Default)]
pub struct FakeStatsApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeStatsApi {
    pub fn with_stats(entries: &[(&str, u64, u64)]) -> Self {
        let api = Self::default();
        for &(id, likes, dislikes) in entries {
            api.set(id, likes, dislikes);
        }
        api
    }

    pub fn set(&self, id: &str, likes: u64, dislikes: u64) {
        self.state
            .lock()
            .unwrap()
            .stats
            .insert(id.to_string(), StatsEntry::new(likes, dislikes));
    }

    /// Any request containing `id` fails with a network error.
    pub fn fail_on(&self, id: &str) {
        self.state.lock().unwrap().failing.insert(id.to_string());
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl StatsApi for FakeStatsApi {
    async fn fetch_statistics(&self, ids: &[VideoId]) -> Result<Vec<VideoStatistics>, StatsError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(ids.iter().map(|id| id.as_str().to_string()).collect());

        if ids.iter().any(|id| state.failing.contains(id.as_str())) {
            return Err(StatsError::Network("connection reset".to_string()));
        }

        Ok(ids
            .iter()
            .filter_map(|id| {
                state.stats.get(id.as_str()).map(|entry| VideoStatistics {
                    id: id.clone(),
                    entry: *entry,
                })
            })
            .collect())
    }
}

/// `body > div#content > ytd-page-manager#page-manager`
pub fn youtube_page() -> (MemoryHost, NodeId) {
    let host = MemoryHost::default();
    let container = host.with_dom(build_page);
    (host, container)
}

/// Full navigation: the old document is discarded and a fresh page shell is built.
pub fn reload_page(host: &MemoryHost) -> NodeId {
    host.with_dom(|dom| {
        dom.reload();
        build_page(dom)
    })
}

fn build_page(dom: &mut MemoryDom) -> NodeId {
    let body = dom.document();
    let content = dom.append_element(body, "div", &[("id", "content")]);
    dom.append_element(content, "ytd-page-manager", &[("id", "page-manager")])
}

/// Appends a surface root with an `#items` list under it, returning `(root, items)`.
pub fn add_surface(
    host: &MemoryHost,
    container: NodeId,
    tag: &str,
    subtype: Option<&str>,
) -> (NodeId, NodeId) {
    host.with_dom(|dom| {
        let attrs: Vec<(&str, &str)> = subtype.map(|s| ("page-subtype", s)).into_iter().collect();
        let root = dom.append_element(container, tag, &attrs);
        let items = dom.append_element(root, "div", &[("id", "items")]);
        (root, items)
    })
}

/// Inserts one fully built renderer per id into `parent`, as the host page does while
/// scrolling. Returns the renderer nodes.
pub fn insert_renderers(host: &MemoryHost, parent: NodeId, tag: &str, ids: &[&str]) -> Vec<NodeId> {
    host.with_dom(|dom| {
        ids.iter()
            .map(|id| {
                let href = format!("https://www.youtube.com/watch?v={id}");
                let renderer = dom.create_element(tag, &[]);
                dom.append_element(renderer, "a", &[("id", "thumbnail"), ("href", href.as_str())]);
                let meta = dom.append_element(renderer, "div", &[("id", "meta")]);
                dom.append_element(meta, "a", &[("id", "video-title"), ("href", href.as_str())]);
                dom.append_child(parent, renderer);
                renderer
            })
            .collect()
    })
}

/// Text of every `likes` and `dislikes` label next to the title anchors of `video`.
pub fn labels_for(host: &MemoryHost, video: &str) -> (Vec<String>, Vec<String>) {
    use ytreact_overview::dom::DomTree;

    host.with_dom(|dom| {
        let suffix = format!("watch?v={video}");
        let mut likes = Vec::new();
        let mut dislikes = Vec::new();
        for node in dom.descendants(dom.document()) {
            if !dom.has_tag(node, "a") || dom.attr(node, "id") != Some("video-title") {
                continue;
            }
            if !dom.attr(node, "href").is_some_and(|href| href.ends_with(&suffix)) {
                continue;
            }
            let Some(parent) = dom.parent(node) else {
                continue;
            };
            for label in dom.children_with_class(parent, "likes") {
                likes.push(dom.text(label).to_string());
            }
            for label in dom.children_with_class(parent, "dislikes") {
                dislikes.push(dom.text(label).to_string());
            }
        }
        (likes, dislikes)
    })
}

pub fn ids(batch: &[&str]) -> Vec<String> {
    batch.iter().map(|id| id.to_string()).collect()
}
