// src/surface.rs
//
// Host markup coupling. Every tag, id and attribute name the observer depends on lives here
// and is shipped to the injected script as JSON, so the browser and the Rust resolver agree.

use serde::{Deserialize, Serialize};

/// Root content container that hosts the surface roots.
pub const CONTAINER_SELECTOR: &str = "#content #page-manager";
pub const CONTAINER_ID: &str = "page-manager";
pub const CONTAINER_PARENT_ID: &str = "content";

pub const SEARCH_TAG: &str = "ytd-search";
pub const BROWSE_TAG: &str = "ytd-browse";
pub const SURFACE_TAGS: [&str; 2] = [BROWSE_TAG, SEARCH_TAG];

pub const SUBTYPE_ATTR: &str = "page-subtype";
pub const ROLE_ATTR: &str = "role";
pub const ACTIVE_ROLE: &str = "main";

/// Tags of nodes that each represent a single video in a listing.
pub const RENDERER_TAGS: [&str; 3] = [
    "ytd-video-renderer",
    "ytd-rich-item-renderer",
    "ytd-grid-video-renderer",
];

/// Element ids used by title anchors across surfaces.
pub const TITLE_IDS: [&str; 2] = ["video-title", "video-title-link"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    Search,
    Subscriptions,
    Home,
    Trending,
    Generic,
}

impl Surface {
    /// Classifies a surface root by tag and, for browse roots, by `page-subtype`.
    pub fn classify(tag: &str, subtype: Option<&str>) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            SEARCH_TAG => Some(Self::Search),
            BROWSE_TAG => Some(match subtype {
                Some("subscriptions") => Self::Subscriptions,
                Some("home") => Self::Home,
                Some("trending") => Self::Trending,
                _ => Self::Generic,
            }),
            _ => None,
        }
    }

    /// Trending and unknown browse subtypes share the video-result fallback.
    pub fn selector(self) -> AnchorSelector {
        match self {
            Self::Subscriptions => AnchorSelector {
                item_tag: "ytd-grid-video-renderer",
                anchor_id: "video-title",
            },
            Self::Home => AnchorSelector {
                item_tag: "ytd-rich-grid-media",
                anchor_id: "video-title-link",
            },
            Self::Search | Self::Trending | Self::Generic => AnchorSelector {
                item_tag: "ytd-video-renderer",
                anchor_id: "video-title",
            },
        }
    }
}

/// Title anchors are the elements with `anchor_id` nested inside an `item_tag` element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AnchorSelector {
    pub item_tag: &'static str,
    pub anchor_id: &'static str,
}

impl AnchorSelector {
    pub fn css(&self) -> String {
        format!("{} #{}", self.item_tag, self.anchor_id)
    }
}

/// Tag and subtype of a surface root as reported by a host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceRoot {
    pub tag: String,
    #[serde(default)]
    pub subtype: Option<String>,
}

impl SurfaceRoot {
    pub fn new(tag: impl Into<String>, subtype: Option<&str>) -> Self {
        Self {
            tag: tag.into(),
            subtype: subtype.map(str::to_string),
        }
    }

    pub fn surface(&self) -> Option<Surface> {
        Surface::classify(&self.tag, self.subtype.as_deref())
    }
}

#[derive(Debug, Serialize)]
struct SelectorRule {
    tag: &'static str,
    subtype: Option<&'static str>,
    css: String,
}

/// Serializable copy of the markup table consumed by the injected observer.
#[derive(Debug, Serialize)]
pub struct HostTable {
    container: &'static str,
    surface_tags: [&'static str; 2],
    renderer_tags: [&'static str; 3],
    title_ids: [&'static str; 2],
    subtype_attr: &'static str,
    role_attr: &'static str,
    active_role: &'static str,
    rules: Vec<SelectorRule>,
    fallback: SelectorRule,
}

impl HostTable {
    pub fn new() -> Self {
        let rule = |tag, subtype, surface: Surface| SelectorRule {
            tag,
            subtype,
            css: surface.selector().css(),
        };
        Self {
            container: CONTAINER_SELECTOR,
            surface_tags: SURFACE_TAGS,
            renderer_tags: RENDERER_TAGS,
            title_ids: TITLE_IDS,
            subtype_attr: SUBTYPE_ATTR,
            role_attr: ROLE_ATTR,
            active_role: ACTIVE_ROLE,
            rules: vec![
                rule(SEARCH_TAG, None, Surface::Search),
                rule(BROWSE_TAG, Some("subscriptions"), Surface::Subscriptions),
                rule(BROWSE_TAG, Some("home"), Surface::Home),
                rule(BROWSE_TAG, Some("trending"), Surface::Trending),
            ],
            fallback: rule(BROWSE_TAG, None, Surface::Generic),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }
}

impl Default for HostTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_browse_subtypes() {
        assert_eq!(Surface::classify("ytd-search", None), Some(Surface::Search));
        assert_eq!(
            Surface::classify("YTD-BROWSE", Some("subscriptions")),
            Some(Surface::Subscriptions)
        );
        assert_eq!(Surface::classify("ytd-browse", Some("home")), Some(Surface::Home));
        assert_eq!(
            Surface::classify("ytd-browse", Some("trending")),
            Some(Surface::Trending)
        );
        assert_eq!(
            Surface::classify("ytd-browse", Some("channels")),
            Some(Surface::Generic)
        );
        assert_eq!(Surface::classify("ytd-browse", None), Some(Surface::Generic));
        assert_eq!(Surface::classify("ytd-watch-flexy", None), None);
    }

    #[test]
    fn trending_and_generic_share_fallback() {
        assert_eq!(Surface::Trending.selector(), Surface::Generic.selector());
        assert_eq!(Surface::Search.selector().css(), "ytd-video-renderer #video-title");
        assert_eq!(
            Surface::Home.selector().css(),
            "ytd-rich-grid-media #video-title-link"
        );
    }

    #[test]
    fn host_table_serializes_rules() {
        let json: serde_json::Value = serde_json::from_str(&HostTable::new().to_json()).unwrap();
        assert_eq!(json["container"], CONTAINER_SELECTOR);
        assert_eq!(json["rules"].as_array().map(Vec::len), Some(4));
        assert_eq!(json["fallback"]["css"], "ytd-video-renderer #video-title");
        assert_eq!(json["renderer_tags"][2], "ytd-grid-video-renderer");
    }
}
