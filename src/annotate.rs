// src/annotate.rs

use crate::event::AnchorRef;
use crate::stats::StatsEntry;
use std::future::Future;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelKind {
    Likes,
    Dislikes,
}

impl LabelKind {
    pub const ALL: [LabelKind; 2] = [LabelKind::Likes, LabelKind::Dislikes];

    pub fn class(self) -> &'static str {
        match self {
            LabelKind::Likes => "likes",
            LabelKind::Dislikes => "dislikes",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            LabelKind::Likes => "green",
            LabelKind::Dislikes => "red",
        }
    }

    pub fn style(self) -> String {
        format!("color: {}", self.color())
    }

    pub fn value(self, entry: StatsEntry) -> u64 {
        match self {
            LabelKind::Likes => entry.likes,
            LabelKind::Dislikes => entry.dislikes,
        }
    }
}

/// Paints like/dislike labels next to a video anchor.
///
/// Implementations replace existing labels under the anchor's parent instead of adding a
/// second pair, so annotating twice leaves one pair showing the latest entry.
pub trait Annotator {
    /// Returns `Ok(false)` when the anchor is no longer part of the document.
    fn annotate(
        &self,
        anchor: &AnchorRef,
        entry: StatsEntry,
    ) -> impl Future<Output = anyhow::Result<bool>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_carry_class_color_and_value() {
        let entry = StatsEntry::new(12, 2);
        assert_eq!(LabelKind::Likes.class(), "likes");
        assert_eq!(LabelKind::Likes.style(), "color: green");
        assert_eq!(LabelKind::Dislikes.style(), "color: red");
        assert_eq!(LabelKind::Likes.value(entry), 12);
        assert_eq!(LabelKind::Dislikes.value(entry), 2);
    }
}
