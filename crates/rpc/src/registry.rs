//! Installed-filter bookkeeping.

use crate::{FilterChanges, FilterCriteria, FilterError};
use alloy_primitives::B256;
use heron_chain::EventScope;
use heron_primitives::{EgtxLog, matches_log};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{sync::broadcast::error::RecvError, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// How long an unpolled filter survives. Every successful poll pushes the
/// deadline out again.
pub const FILTER_DEADLINE: Duration = Duration::from_secs(300);

#[derive(Debug)]
enum FilterKind {
    Logs { criteria: FilterCriteria, pending: Vec<EgtxLog> },
    Blocks { pending: Vec<B256> },
}

#[derive(Debug)]
struct FilterEntry {
    deadline: Instant,
    kind: FilterKind,
}

#[derive(Debug)]
struct Inner {
    filters: Mutex<HashMap<u64, FilterEntry>>,
    next_id: AtomicU64,
    deadline: Duration,
    events: EventScope,
}

/// The set of installed polling filters.
///
/// Each installed filter owns a listener task fed from the producer's
/// broadcast channels; the task exits when its filter is gone. A sweeper
/// task evicts filters whose poll deadline passed. Cloning shares the set.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    inner: Arc<Inner>,
}

impl FilterRegistry {
    /// Creates a registry with the default poll deadline.
    pub fn new(events: EventScope) -> Self {
        Self::with_deadline(events, FILTER_DEADLINE)
    }

    /// Creates a registry with a custom poll deadline.
    pub fn with_deadline(events: EventScope, deadline: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                filters: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                deadline,
                events,
            }),
        }
    }

    /// Installs a log filter collecting matching logs from now on.
    pub fn install_log_filter(&self, criteria: FilterCriteria) -> u64 {
        let id = self.insert(FilterKind::Logs { criteria, pending: Vec::new() });
        let inner = self.inner.clone();
        let mut rx = inner.events.subscribe_logs();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(log) => {
                        let mut filters = lock(&inner.filters);
                        let Some(entry) = filters.get_mut(&id) else { break };
                        if let FilterKind::Logs { criteria, pending } = &mut entry.kind {
                            if matches_log(
                                &log.address,
                                &log.topics,
                                criteria.address.as_slice(),
                                &criteria.topics,
                            ) {
                                pending.push(log);
                            }
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        debug!(target: "filter_registry", id, missed, "log filter fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            trace!(target: "filter_registry", id, "log filter listener stopped");
        });
        id
    }

    /// Installs a block filter collecting produced head hashes from now on.
    pub fn install_block_filter(&self) -> u64 {
        let id = self.insert(FilterKind::Blocks { pending: Vec::new() });
        let inner = self.inner.clone();
        let mut rx = inner.events.subscribe_heads();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(block) => {
                        let mut filters = lock(&inner.filters);
                        let Some(entry) = filters.get_mut(&id) else { break };
                        if let FilterKind::Blocks { pending } = &mut entry.kind {
                            pending.push(block.hash);
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        debug!(target: "filter_registry", id, missed, "block filter fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            trace!(target: "filter_registry", id, "block filter listener stopped");
        });
        id
    }

    /// Drains a filter's buffered events and refreshes its deadline.
    pub fn poll_changes(&self, id: u64) -> Result<FilterChanges, FilterError> {
        let mut filters = lock(&self.inner.filters);
        let entry = filters.get_mut(&id).ok_or(FilterError::NotFound)?;
        entry.deadline = Instant::now() + self.inner.deadline;
        Ok(match &mut entry.kind {
            FilterKind::Logs { pending, .. } => FilterChanges::Logs(std::mem::take(pending)),
            FilterKind::Blocks { pending } => FilterChanges::Hashes(std::mem::take(pending)),
        })
    }

    /// The criteria of an installed log filter, deadline refreshed. Polling
    /// a block filter this way is [`FilterError::WrongType`].
    pub fn log_criteria(&self, id: u64) -> Result<FilterCriteria, FilterError> {
        let mut filters = lock(&self.inner.filters);
        let entry = filters.get_mut(&id).ok_or(FilterError::NotFound)?;
        entry.deadline = Instant::now() + self.inner.deadline;
        match &entry.kind {
            FilterKind::Logs { criteria, .. } => Ok(criteria.clone()),
            FilterKind::Blocks { .. } => Err(FilterError::WrongType),
        }
    }

    /// Removes a filter; its listener task exits on the next event. Returns
    /// whether the filter existed.
    pub fn uninstall(&self, id: u64) -> bool {
        lock(&self.inner.filters).remove(&id).is_some()
    }

    /// Number of installed filters.
    pub fn len(&self) -> usize {
        lock(&self.inner.filters).len()
    }

    /// Whether no filters are installed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawns the background task evicting filters whose deadline passed.
    /// Sweeps once per deadline period until `cancellation` fires.
    pub fn spawn_sweeper(&self, cancellation: CancellationToken) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.deadline);
            ticker.tick().await; // the immediate first tick
            loop {
                tokio::select! {
                    _ = cancellation.cancelled() => break,
                    _ = ticker.tick() => {
                        let now = Instant::now();
                        let mut filters = lock(&inner.filters);
                        let before = filters.len();
                        filters.retain(|_, entry| entry.deadline > now);
                        let evicted = before - filters.len();
                        if evicted > 0 {
                            debug!(target: "filter_registry", evicted, "swept expired filters");
                        }
                    }
                }
            }
        });
    }

    fn insert(&self, kind: FilterKind) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = FilterEntry { deadline: Instant::now() + self.inner.deadline, kind };
        lock(&self.inner.filters).insert(id, entry);
        id
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
