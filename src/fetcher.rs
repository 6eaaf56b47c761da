// src/fetcher.rs

use crate::api::{MAX_BATCH_SIZE, StatsApi};
use crate::error::StatsError;
use crate::event::AnchorRef;
use crate::stats::VideoStatistics;
use crate::video_id::VideoId;
use rustc_hash::FxHashSet;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Completion of one batch request, handed back to the session owner.
#[derive(Debug)]
pub struct BatchOutcome {
    pub batch: u64,
    /// The anchors this batch was issued for, with their extracted ids.
    pub anchors: Vec<(AnchorRef, VideoId)>,
    pub result: Result<Vec<VideoStatistics>, StatsError>,
}

/// Splits anchors into batches and fires one request per batch.
///
/// Requests run as independent tasks. They are never retried and only the shutdown token
/// stops one that has started.
pub struct BatchFetcher<A: StatsApi> {
    api: Arc<A>,
    batch_size: usize,
    outcomes: UnboundedSender<BatchOutcome>,
    cancel: CancellationToken,
    next_batch: u64,
    in_flight: Arc<AtomicUsize>,
}

impl<A: StatsApi> BatchFetcher<A> {
    pub fn new(
        api: A,
        batch_size: usize,
        cancel: CancellationToken,
    ) -> (Self, UnboundedReceiver<BatchOutcome>) {
        let (outcomes, rx) = unbounded_channel();
        let fetcher = Self {
            api: Arc::new(api),
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
            outcomes,
            cancel,
            next_batch: 0,
            in_flight: Arc::new(AtomicUsize::new(0)),
        };
        (fetcher, rx)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Id the next issued batch will carry.
    pub fn next_batch(&self) -> u64 {
        self.next_batch
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Submits anchors for enrichment, returning the number of requests issued.
    ///
    /// Anchors whose href carries no video id are dropped before batching.
    pub fn submit(&mut self, anchors: Vec<AnchorRef>) -> usize {
        if anchors.is_empty() {
            info!("No elements found");
            return 0;
        }

        let identified: Vec<(AnchorRef, VideoId)> = anchors
            .into_iter()
            .filter_map(|anchor| match anchor.video_id() {
                Some(id) => Some((anchor, id)),
                None => {
                    debug!(href = %anchor.href, "Anchor has no video id, skipping");
                    None
                }
            })
            .collect();

        let batches = partition(identified, self.batch_size);
        let issued = batches.len();
        for anchors in batches {
            self.spawn_batch(anchors);
        }
        issued
    }

    fn spawn_batch(&mut self, anchors: Vec<(AnchorRef, VideoId)>) {
        let batch = self.next_batch;
        self.next_batch += 1;

        let ids = unique_ids(&anchors);
        info!(batch, ids = ids.len(), "Fetching yt api data");

        let api = Arc::clone(&self.api);
        let outcomes = self.outcomes.clone();
        let cancel = self.cancel.clone();
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    debug!(batch, "Batch abandoned at shutdown");
                    return;
                }
                result = api.fetch_statistics(&ids) => result,
            };

            // Decrement only after sending so an idle count implies every outcome is queued.
            if outcomes
                .send(BatchOutcome {
                    batch,
                    anchors,
                    result,
                })
                .is_err()
            {
                debug!(batch, "Session closed before batch completed");
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

/// Consecutive chunks of at most `size` items, preserving order.
pub fn partition<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size.min(items.len()));
    for item in items {
        current.push(item);
        if current.len() == size {
            batches.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

fn unique_ids(anchors: &[(AnchorRef, VideoId)]) -> Vec<VideoId> {
    let mut seen = FxHashSet::default();
    anchors
        .iter()
        .filter(|(_, id)| seen.insert(id))
        .map(|(_, id)| id.clone())
        .collect()
}
