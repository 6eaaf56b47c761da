// src/host/mod.rs

pub mod chromium;
pub mod memory;

use crate::annotate::Annotator;
use crate::event::AnchorRef;
use crate::surface::SurfaceRoot;
use std::future::Future;

pub use chromium::ChromiumHost;
pub use memory::{MemoryDom, MemoryHost};

/// The surface currently marked `role="main"` and its video anchors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveSurface {
    pub root: SurfaceRoot,
    pub anchors: Vec<AnchorRef>,
}

/// A document that can be observed and annotated.
///
/// Change notifications are delivered out of band as `PageEvent`s once observers are attached.
pub trait PageHost: Annotator {
    /// Whether the root content container exists yet.
    fn content_ready(&self) -> impl Future<Output = anyhow::Result<bool>> + Send;

    /// Attaches subtree observers to every surface root and a structure observer to the
    /// content container.
    fn attach_observers(&self) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn active_surface(&self) -> impl Future<Output = anyhow::Result<Option<ActiveSurface>>> + Send;
}
