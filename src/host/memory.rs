// src/host/memory.rs
//
// In-memory document with MutationObserver-like bookkeeping. Mutations on connected nodes are
// queued as records; `take_events` plays the observer callbacks over them.

use super::{ActiveSurface, PageHost};
use crate::annotate::{Annotator, LabelKind};
use crate::dom::{DomTree, is_renderer, representative_anchor, resolve_anchors, surface_root};
use crate::event::{AnchorRef, PageEvent};
use crate::stats::StatsEntry;
use crate::surface::{ACTIVE_ROLE, CONTAINER_ID, CONTAINER_PARENT_ID, ROLE_ATTR, SURFACE_TAGS};
use anyhow::anyhow;
use std::sync::{Arc, Mutex, PoisonError};

pub type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Attribute { target: NodeId },
    ChildList { target: NodeId, added: NodeId },
}

#[derive(Debug)]
pub struct MemoryDom {
    nodes: Vec<Node>,
    records: Vec<Mutation>,
    container: Option<NodeId>,
    observed: Vec<NodeId>,
    reloaded: bool,
}

impl MemoryDom {
    pub fn new() -> Self {
        let body = Node {
            tag: "body".to_string(),
            attrs: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![body],
            records: Vec::new(),
            container: None,
            observed: Vec::new(),
            reloaded: false,
        }
    }

    /// Replaces the document with an empty body, as a full navigation does. Observers are
    /// lost and the next `take_events` reports `PageEvent::Reloaded`.
    pub fn reload(&mut self) {
        *self = Self {
            reloaded: true,
            ..Self::new()
        };
    }

    /// The document body; nodes are connected when it is among their ancestors.
    pub fn document(&self) -> NodeId {
        0
    }

    /// Creates a detached element. Building a subtree before attaching it records nothing.
    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old_parent) = self.nodes[child].parent {
            self.remove_child(old_parent, child);
        }
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        if self.is_connected(parent) {
            self.records.push(Mutation::ChildList {
                target: parent,
                added: child,
            });
        }
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let child = self.create_element(tag, attrs);
        self.append_child(parent, child);
        child
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].children.retain(|&c| c != child);
        if self.nodes[child].parent == Some(parent) {
            self.nodes[child].parent = None;
        }
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let attrs = &mut self.nodes[node].attrs;
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
        if name == ROLE_ATTR && self.is_connected(node) {
            self.records.push(Mutation::Attribute { target: node });
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        self.nodes[node].attrs.retain(|(n, _)| n != name);
        if name == ROLE_ATTR && self.is_connected(node) {
            self.records.push(Mutation::Attribute { target: node });
        }
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node].text
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node].text = text.to_string();
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].children
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Direct children of `node` carrying `class`.
    pub fn children_with_class(&self, node: NodeId, class: &str) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&child| self.has_class(child, class))
            .collect()
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.document() || self.has_ancestor(node, self.document())
    }

    /// `#content #page-manager`
    pub fn find_container(&self) -> Option<NodeId> {
        self.descendants(self.document()).into_iter().find(|&node| {
            self.attr(node, "id") == Some(CONTAINER_ID)
                && self.ancestor_with_id(node, CONTAINER_PARENT_ID)
        })
    }

    fn ancestor_with_id(&self, node: NodeId, id: &str) -> bool {
        let mut current = self.parent(node);
        while let Some(ancestor) = current {
            if self.attr(ancestor, "id") == Some(id) {
                return true;
            }
            current = self.parent(ancestor);
        }
        false
    }

    fn is_surface_root(&self, node: NodeId) -> bool {
        SURFACE_TAGS.iter().any(|tag| self.has_tag(node, tag))
    }

    /// Attaches the structure observer to `container` and subtree observers to every surface
    /// root below it. Mutations queued before this call are discarded.
    pub fn observe(&mut self, container: NodeId) {
        self.records.clear();
        self.container = Some(container);
        self.observed = self
            .descendants(container)
            .into_iter()
            .filter(|&node| self.is_surface_root(node))
            .collect();
    }

    pub fn observed_roots(&self) -> &[NodeId] {
        &self.observed
    }

    fn observing_root(&self, node: NodeId) -> Option<NodeId> {
        self.observed
            .iter()
            .copied()
            .find(|&root| root == node || self.has_ancestor(node, root))
    }

    fn anchor_ref(&self, node: NodeId) -> AnchorRef {
        AnchorRef::new(node as u64, self.attr(node, "href").unwrap_or_default())
    }

    /// Delivers queued mutations as one observer callback per observer.
    ///
    /// All renderer insertions below one surface root are reported in a single
    /// `ItemsInserted` event.
    pub fn take_events(&mut self) -> Vec<PageEvent> {
        let records = std::mem::take(&mut self.records);
        let mut events = Vec::new();
        if std::mem::take(&mut self.reloaded) {
            events.push(PageEvent::Reloaded);
        }
        let Some(container) = self.container else {
            return events;
        };

        let mut inserted: Vec<(NodeId, Vec<Option<AnchorRef>>)> = Vec::new();

        for record in records {
            match record {
                Mutation::ChildList { target, added } => {
                    if target == container
                        && self.is_surface_root(added)
                        && !self.observed.contains(&added)
                    {
                        self.observed.push(added);
                        continue;
                    }
                    let Some(root) = self.observing_root(target) else {
                        continue;
                    };
                    if !is_renderer(self, added) {
                        continue;
                    }
                    let item = representative_anchor(self, added).map(|a| self.anchor_ref(a));
                    match inserted.iter_mut().find(|(r, _)| *r == root) {
                        Some((_, items)) => items.push(item),
                        None => inserted.push((root, vec![item])),
                    }
                }
                Mutation::Attribute { target } => {
                    if self.attr(target, ROLE_ATTR) != Some(ACTIVE_ROLE)
                        || self.observing_root(target).is_none()
                    {
                        continue;
                    }
                    let anchors = resolve_anchors(self, target)
                        .into_iter()
                        .map(|a| self.anchor_ref(a))
                        .collect();
                    events.push(PageEvent::SurfaceActivated {
                        root: surface_root(self, target),
                        anchors,
                    });
                }
            }
        }

        events.extend(
            inserted
                .into_iter()
                .map(|(root, items)| PageEvent::ItemsInserted {
                    root: surface_root(self, root),
                    items,
                }),
        );
        events
    }

    pub fn active_surface(&self) -> Option<ActiveSurface> {
        let container = self.container.or_else(|| self.find_container())?;
        let active = self
            .descendants(container)
            .into_iter()
            .find(|&node| self.attr(node, ROLE_ATTR) == Some(ACTIVE_ROLE))?;
        Some(ActiveSurface {
            root: surface_root(self, active),
            anchors: resolve_anchors(self, active)
                .into_iter()
                .map(|a| self.anchor_ref(a))
                .collect(),
        })
    }

    /// Replaces the like/dislike labels next to `anchor`.
    pub fn annotate(&mut self, anchor: NodeId, entry: StatsEntry) -> bool {
        if anchor >= self.nodes.len() || !self.is_connected(anchor) {
            return false;
        }
        let Some(parent) = self.parent(anchor) else {
            return false;
        };

        for kind in LabelKind::ALL {
            for stale in self.children_with_class(parent, kind.class()) {
                self.remove_child(parent, stale);
            }
            let style = kind.style();
            let label = self.create_element("div", &[("class", kind.class()), ("style", style.as_str())]);
            self.set_text(label, &kind.value(entry).to_string());
            self.append_child(parent, label);
        }
        true
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree for MemoryDom {
    type Node = NodeId;

    fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node].tag
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node]
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }
}

/// `PageHost` over a shared `MemoryDom`, used to exercise the watcher without a browser.
#[derive(Clone, Default)]
pub struct MemoryHost {
    dom: Arc<Mutex<MemoryDom>>,
}

impl MemoryHost {
    pub fn new(dom: MemoryDom) -> Self {
        Self {
            dom: Arc::new(Mutex::new(dom)),
        }
    }

    pub fn with_dom<R>(&self, f: impl FnOnce(&mut MemoryDom) -> R) -> R {
        let mut dom = self.dom.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut dom)
    }

    pub fn take_events(&self) -> Vec<PageEvent> {
        self.with_dom(MemoryDom::take_events)
    }
}

impl Annotator for MemoryHost {
    async fn annotate(&self, anchor: &AnchorRef, entry: StatsEntry) -> anyhow::Result<bool> {
        let node = usize::try_from(anchor.key)?;
        Ok(self.with_dom(|dom| dom.annotate(node, entry)))
    }
}

impl PageHost for MemoryHost {
    async fn content_ready(&self) -> anyhow::Result<bool> {
        Ok(self.with_dom(|dom| dom.find_container().is_some()))
    }

    async fn attach_observers(&self) -> anyhow::Result<()> {
        self.with_dom(|dom| {
            let container = dom
                .find_container()
                .ok_or_else(|| anyhow!("content container not found"))?;
            dom.observe(container);
            Ok(())
        })
    }

    async fn active_surface(&self) -> anyhow::Result<Option<ActiveSurface>> {
        Ok(self.with_dom(|dom| dom.active_surface()))
    }
}
