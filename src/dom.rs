// src/dom.rs

use crate::surface::{AnchorSelector, RENDERER_TAGS, SUBTYPE_ATTR, Surface, SurfaceRoot, TITLE_IDS};

/// Read-only view over a document tree. Tags are compared case-insensitively.
pub trait DomTree {
    type Node: Copy + Eq;

    fn tag(&self, node: Self::Node) -> &str;

    fn attr(&self, node: Self::Node, name: &str) -> Option<&str>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Descendants of `node` in document order, excluding `node` itself.
    fn descendants(&self, node: Self::Node) -> Vec<Self::Node>;

    fn has_tag(&self, node: Self::Node, tag: &str) -> bool {
        self.tag(node).eq_ignore_ascii_case(tag)
    }

    fn has_ancestor(&self, node: Self::Node, ancestor: Self::Node) -> bool {
        let mut current = self.parent(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }
}

pub fn surface_root<D: DomTree>(dom: &D, node: D::Node) -> SurfaceRoot {
    SurfaceRoot::new(
        dom.tag(node).to_ascii_lowercase(),
        dom.attr(node, SUBTYPE_ATTR),
    )
}

/// Title anchors of every video on the surface rooted at `root`, in document order.
///
/// Roots that are neither `ytd-search` nor `ytd-browse` yield nothing.
pub fn resolve_anchors<D: DomTree>(dom: &D, root: D::Node) -> Vec<D::Node> {
    let Some(surface) = surface_root(dom, root).surface() else {
        return Vec::new();
    };
    select(dom, root, surface.selector())
}

fn select<D: DomTree>(dom: &D, root: D::Node, selector: AnchorSelector) -> Vec<D::Node> {
    dom.descendants(root)
        .into_iter()
        .filter(|&node| {
            dom.attr(node, "id") == Some(selector.anchor_id)
                && ancestors_within(dom, node, root)
                    .any(|ancestor| dom.has_tag(ancestor, selector.item_tag))
        })
        .collect()
}

pub fn is_renderer<D: DomTree>(dom: &D, node: D::Node) -> bool {
    RENDERER_TAGS.iter().any(|tag| dom.has_tag(node, tag))
}

/// Picks the title anchor of a renderer node.
///
/// Prefers an `a` carrying a title id; otherwise the second `a`, since the first one wraps the
/// thumbnail.
pub fn representative_anchor<D: DomTree>(dom: &D, renderer: D::Node) -> Option<D::Node> {
    let anchors: Vec<D::Node> = dom
        .descendants(renderer)
        .into_iter()
        .filter(|&node| dom.has_tag(node, "a"))
        .collect();

    anchors
        .iter()
        .copied()
        .find(|&anchor| dom.attr(anchor, "id").is_some_and(|id| TITLE_IDS.contains(&id)))
        .or_else(|| anchors.get(1).copied())
}

/// Ancestors of `node` strictly below `root`.
fn ancestors_within<D: DomTree>(dom: &D, node: D::Node, root: D::Node) -> AncestorIter<'_, D> {
    AncestorIter {
        dom,
        current: dom.parent(node),
        root,
    }
}

struct AncestorIter<'a, D: DomTree> {
    dom: &'a D,
    current: Option<D::Node>,
    root: D::Node,
}

impl<D: DomTree> Iterator for AncestorIter<'_, D> {
    type Item = D::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;
        if node == self.root {
            self.current = None;
            return None;
        }
        self.current = self.dom.parent(node);
        Some(node)
    }
}
