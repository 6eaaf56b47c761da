// src/watcher.rs

use crate::api::{MAX_BATCH_SIZE, StatsApi};
use crate::event::{AnchorRef, PageEvent};
use crate::fetcher::{BatchFetcher, BatchOutcome};
use crate::host::PageHost;
use crate::session::Session;
use crate::status::{SessionCounters, StatusReporter};
use crate::wait::wait_until;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatcherConfig {
    pub batch_size: usize,
    pub poll_interval: Duration,
    /// `None` polls for the content container forever.
    pub ready_attempts: Option<usize>,
    pub status_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            poll_interval: Duration::from_millis(500),
            ready_attempts: None,
            status_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatcherState {
    Uninitialized,
    Observing,
}

#[derive(Clone, Debug)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub counters: SessionCounters,
}

/// Drives enrichment for one page session.
///
/// The watcher is the only owner of the session state: page events and batch outcomes are
/// both applied from its loop, so the cache and seen-id set need no locking.
pub struct Watcher<H: PageHost, A: StatsApi> {
    host: H,
    fetcher: BatchFetcher<A>,
    outcomes: UnboundedReceiver<BatchOutcome>,
    session: Session,
    config: WatcherConfig,
    state: WatcherState,
    cancel: CancellationToken,
    /// Outcomes of batches numbered below this were issued for a document that is gone.
    first_live_batch: u64,
    batches: usize,
    annotated: usize,
    failed_batches: usize,
}

impl<H: PageHost, A: StatsApi> Watcher<H, A> {
    pub fn new(host: H, api: A, config: WatcherConfig, cancel: CancellationToken) -> Self {
        let (fetcher, outcomes) = BatchFetcher::new(api, config.batch_size, cancel.clone());
        Self {
            host,
            fetcher,
            outcomes,
            session: Session::new(),
            config,
            state: WatcherState::Uninitialized,
            cancel,
            first_live_batch: 0,
            batches: 0,
            annotated: 0,
            failed_batches: 0,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn counters(&self) -> SessionCounters {
        SessionCounters {
            cached: self.session.stats.len(),
            seen: self.session.seen.len(),
            in_flight: self.fetcher.in_flight(),
            batches: self.batches,
            annotated: self.annotated,
            failed_batches: self.failed_batches,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            started_at: self.session.started_at(),
            counters: self.counters(),
        }
    }

    /// Waits for the content container, attaches observers and enriches the active surface.
    pub async fn start(&mut self) -> Result<()> {
        if self.state == WatcherState::Observing {
            return Ok(());
        }

        let host = &self.host;
        let attempts = wait_until(
            || host.content_ready(),
            self.config.poll_interval,
            self.config.ready_attempts,
        )
        .await
        .context("content container never appeared")?;
        info!(attempts, "Content container found");

        self.host.attach_observers().await?;
        self.state = WatcherState::Observing;
        info!("✅ Observers attached");

        match self.host.active_surface().await {
            Ok(Some(active)) => {
                info!(
                    surface = ?active.root.surface(),
                    anchors = active.anchors.len(),
                    "Enriching active surface"
                );
                self.submit(active.anchors);
            }
            Ok(None) => info!("No active surface yet"),
            Err(err) => warn!(error = %err, "Initial surface scan failed"),
        }
        Ok(())
    }

    /// Applies one observer notification, returning the number of requests it issued.
    pub fn handle_event(&mut self, event: PageEvent) -> usize {
        match event {
            PageEvent::SurfaceActivated { root, anchors } => {
                info!(
                    surface = ?root.surface(),
                    anchors = anchors.len(),
                    "Surface activated"
                );
                // Activation repaints everything visible, seen or not.
                self.submit(anchors)
            }
            PageEvent::ItemsInserted { root, items } => {
                let inserted = items.len();
                let accepted = self.accept_new(items);
                debug!(
                    surface = ?root.surface(),
                    inserted,
                    accepted = accepted.len(),
                    "Items inserted"
                );
                if accepted.is_empty() {
                    return 0;
                }
                self.submit(accepted)
            }
            PageEvent::Reloaded => {
                info!(
                    seen = self.session.seen.len(),
                    in_flight = self.fetcher.in_flight(),
                    "Page reloaded, resetting session"
                );
                self.session.reset();
                self.first_live_batch = self.fetcher.next_batch();
                self.state = WatcherState::Uninitialized;
                0
            }
        }
    }

    fn accept_new(&mut self, items: Vec<Option<AnchorRef>>) -> Vec<AnchorRef> {
        let mut accepted = Vec::new();
        for item in items {
            let Some(anchor) = item else {
                debug!("Renderer without title anchor, skipping");
                continue;
            };
            let Some(id) = anchor.video_id() else {
                debug!(href = %anchor.href, "Anchor has no video id, skipping");
                continue;
            };
            if self.session.seen.insert(id) {
                accepted.push(anchor);
            }
        }
        accepted
    }

    fn submit(&mut self, anchors: Vec<AnchorRef>) -> usize {
        let issued = self.fetcher.submit(anchors);
        self.batches += issued;
        issued
    }

    /// Merges a completed batch into the cache and paints its anchors. Returns how many
    /// anchors were annotated.
    pub async fn handle_outcome(&mut self, outcome: BatchOutcome) -> usize {
        let BatchOutcome {
            batch,
            anchors,
            result,
        } = outcome;

        if batch < self.first_live_batch {
            debug!(batch, "Dropping outcome issued for a previous document");
            return 0;
        }

        let stats = match result {
            Ok(stats) => stats,
            Err(err) => {
                self.failed_batches += 1;
                warn!(batch, ids = anchors.len(), error = %err, "Batch failed, ids stay unresolved");
                return 0;
            }
        };
        let merged = self.session.stats.merge(stats);

        let mut painted = 0;
        for (anchor, id) in &anchors {
            let Some(entry) = self.session.stats.get(id) else {
                continue;
            };
            match self.host.annotate(anchor, entry).await {
                Ok(true) => painted += 1,
                Ok(false) => debug!(key = anchor.key, %id, "Anchor left the document"),
                Err(err) => warn!(key = anchor.key, %id, error = %err, "Annotation failed"),
            }
        }
        self.annotated += painted;
        debug!(batch, merged, painted, "Batch applied");
        painted
    }

    /// Applies outcomes until no batch request remains in flight. Returns anchors painted.
    pub async fn settle(&mut self) -> usize {
        let mut painted = 0;
        loop {
            let idle = self.fetcher.in_flight() == 0;
            match self.outcomes.try_recv() {
                Ok(outcome) => painted += self.handle_outcome(outcome).await,
                Err(TryRecvError::Empty) if !idle => tokio::task::yield_now().await,
                Err(_) => break,
            }
        }
        painted
    }

    /// Runs until shutdown is requested or the host's event stream closes.
    pub async fn run(mut self, mut events: UnboundedReceiver<PageEvent>) -> Result<SessionSummary> {
        let cancel = self.cancel.clone();
        if !self.start_unless_cancelled(&cancel).await? {
            return Ok(self.summary());
        }

        let mut status = StatusReporter::new();
        let mut ticker = interval(self.config.status_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle_event(event);
                        if self.state == WatcherState::Uninitialized
                            && !self.start_unless_cancelled(&cancel).await?
                        {
                            break;
                        }
                    }
                    None => {
                        info!("Page event stream closed");
                        break;
                    }
                },
                Some(outcome) = self.outcomes.recv() => {
                    self.handle_outcome(outcome).await;
                }
                _ = ticker.tick() => status.report(self.counters()),
            }
        }

        let summary = self.summary();
        status.report(summary.counters);
        Ok(summary)
    }

    /// Runs `start`, returning `false` if shutdown was requested first.
    async fn start_unless_cancelled(&mut self, cancel: &CancellationToken) -> Result<bool> {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Shutdown requested before observers were attached");
                Ok(false)
            }
            started = self.start() => started.map(|()| true),
        }
    }
}
