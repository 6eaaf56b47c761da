// src/host/chromium.rs

use super::{ActiveSurface, PageHost};
use crate::annotate::Annotator;
use crate::event::{AnchorRef, PageEvent};
use crate::js_scripts;
use crate::stats::StatsEntry;
use crate::surface::SurfaceRoot;
use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::EventLoadEventFired;
use chromiumoxide::cdp::js_protocol::runtime::EventBindingCalled;
use chromiumoxide::listeners::EventStream;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// A live YouTube tab driven over the DevTools protocol.
#[derive(Clone)]
pub struct ChromiumHost {
    page: Page,
}

#[derive(Deserialize)]
struct ScannedSurface {
    root: SurfaceRoot,
    #[serde(default)]
    anchors: Vec<AnchorRef>,
}

impl ChromiumHost {
    /// Exposes the event binding on `page` and starts forwarding observer events into `events`.
    ///
    /// Listeners are registered before the binding exists, so no payload can be missed. Every
    /// main-frame load is forwarded as `PageEvent::Reloaded`.
    pub async fn connect(page: Page, events: UnboundedSender<PageEvent>) -> Result<Self> {
        let bindings = page.event_listener::<EventBindingCalled>().await?;
        let loads = page.event_listener::<EventLoadEventFired>().await?;

        page.expose_function(js_scripts::EVENT_BINDING, js_scripts::BINDING_SHIM)
            .await
            .context("failed to expose observer binding")?;

        tokio::spawn(forward_page_events(bindings, loads, events));
        Ok(Self { page })
    }
}

async fn forward_page_events(
    mut bindings: EventStream<EventBindingCalled>,
    mut loads: EventStream<EventLoadEventFired>,
    events: UnboundedSender<PageEvent>,
) {
    loop {
        let page_event = tokio::select! {
            Some(binding) = bindings.next() => {
                if binding.name != js_scripts::EVENT_BINDING {
                    continue;
                }
                match serde_json::from_str::<PageEvent>(&binding.payload) {
                    Ok(page_event) => page_event,
                    Err(err) => {
                        warn!(error = %err, "Dropping malformed observer payload");
                        continue;
                    }
                }
            }
            Some(_) = loads.next() => {
                info!("Main frame loaded a new document");
                PageEvent::Reloaded
            }
            else => {
                warn!("Page event listeners closed");
                break;
            }
        };
        if events.send(page_event).is_err() {
            debug!("Watcher gone, closing page event listener");
            break;
        }
    }
}

impl Annotator for ChromiumHost {
    async fn annotate(&self, anchor: &AnchorRef, entry: StatsEntry) -> Result<bool> {
        let painted: bool = self
            .page
            .evaluate(js_scripts::annotate_script(anchor.key, entry))
            .await?
            .into_value()
            .unwrap_or_default();
        Ok(painted)
    }
}

impl PageHost for ChromiumHost {
    async fn content_ready(&self) -> Result<bool> {
        let ready: bool = self
            .page
            .evaluate(js_scripts::CONTENT_READY)
            .await?
            .into_value()
            .unwrap_or_default();
        Ok(ready)
    }

    async fn attach_observers(&self) -> Result<()> {
        let attached: bool = self
            .page
            .evaluate(js_scripts::observer_script())
            .await?
            .into_value()
            .unwrap_or_default();
        anyhow::ensure!(attached, "observer setup did not complete");
        Ok(())
    }

    async fn active_surface(&self) -> Result<Option<ActiveSurface>> {
        let raw: String = self
            .page
            .evaluate(js_scripts::active_scan_script())
            .await?
            .into_value()
            .context("active surface scan returned no payload")?;
        let scanned: Option<ScannedSurface> =
            serde_json::from_str(&raw).context("unexpected active surface payload")?;
        Ok(scanned.map(|s| ActiveSurface {
            root: s.root,
            anchors: s.anchors,
        }))
    }
}
