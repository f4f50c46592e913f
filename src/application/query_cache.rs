// Query cache - Keyed read cache with staleness and explicit invalidation
use crate::domain::dashboard::Dashboard;
use crate::domain::ids::{DashboardId, WidgetId};
use crate::domain::layout::DashboardLayout;
use crate::domain::widget::WidgetInstance;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    DashboardList,
    DashboardDetail(DashboardId),
    DashboardLayout(DashboardId),
    WidgetList,
    WidgetsByDashboard(DashboardId),
    WidgetDetail(WidgetId),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::DashboardList => write!(f, "dashboards/list"),
            QueryKey::DashboardDetail(id) => write!(f, "dashboards/detail/{}", id),
            QueryKey::DashboardLayout(id) => write!(f, "dashboards/layout/{}", id),
            QueryKey::WidgetList => write!(f, "widgets/list"),
            QueryKey::WidgetsByDashboard(id) => write!(f, "widgets/list?dashboardId={}", id),
            QueryKey::WidgetDetail(id) => write!(f, "widgets/detail/{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Dashboards(Vec<Dashboard>),
    Dashboard(Dashboard),
    Layout(DashboardLayout),
    Widgets(Vec<WidgetInstance>),
    Widget(WidgetInstance),
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedValue,
    fetched_at: Instant,
    invalidated: bool,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<QueryKey, CacheEntry>,
    /// Bumped by every `invalidate` or `remove` of a key, present or not.
    generations: HashMap<QueryKey, u64>,
    /// Bumped by `clear`.
    epoch: u64,
}

impl CacheState {
    fn generation(&self, key: &QueryKey) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }

    fn bump(&mut self, key: &QueryKey) {
        *self.generations.entry(key.clone()).or_insert(0) += 1;
    }
}

/// Taken before a backend read. The result is only cached if the key was
/// not invalidated while the read was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTicket {
    epoch: u64,
    generation: u64,
}

/// Read cache for the data access services.
///
/// `invalidate` keeps the entry but forces the next read to refetch;
/// `remove` forgets it entirely. Reads racing either of them are stored
/// through [`QueryCache::insert_if_current`] and dropped when they lose.
#[derive(Debug)]
pub struct QueryCache {
    stale_time: Duration,
    state: Mutex<CacheState>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            state: Mutex::new(CacheState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cached value if present, not invalidated and within the stale
    /// window.
    pub fn get_fresh(&self, key: &QueryKey) -> Option<CachedValue> {
        let state = self.lock();
        let entry = state.entries.get(key)?;
        if entry.invalidated || entry.fetched_at.elapsed() > self.stale_time {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn ticket(&self, key: &QueryKey) -> ReadTicket {
        let state = self.lock();
        ReadTicket {
            epoch: state.epoch,
            generation: state.generation(key),
        }
    }

    pub fn insert(&self, key: QueryKey, value: CachedValue) {
        self.lock().entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    /// Store `value` unless `key` was invalidated, removed or cleared since
    /// `ticket` was taken. Returns whether it was stored.
    pub fn insert_if_current(&self, key: QueryKey, ticket: ReadTicket, value: CachedValue) -> bool {
        let mut state = self.lock();
        if state.epoch != ticket.epoch || state.generation(&key) != ticket.generation {
            tracing::debug!("Discarding superseded read of {}", key);
            return false;
        }
        state.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                invalidated: false,
            },
        );
        true
    }

    pub fn invalidate(&self, key: &QueryKey) {
        let mut state = self.lock();
        state.bump(key);
        if let Some(entry) = state.entries.get_mut(key) {
            tracing::debug!("Invalidated {}", key);
            entry.invalidated = true;
        }
    }

    pub fn remove(&self, key: &QueryKey) {
        let mut state = self.lock();
        state.bump(key);
        if state.entries.remove(key).is_some() {
            tracing::debug!("Removed {}", key);
        }
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn is_invalidated(&self, key: &QueryKey) -> bool {
        self.lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.invalidated)
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.epoch += 1;
    }
}
