// Route list state for the commute dashboard.
//
// A RouteBoard owns the current Session. A session holds an immutable list of
// rows; every update swaps in a fresh list that shares the untouched rows with
// the previous one. Reloading replaces the session, so fetches still running
// against the old one find it gone and drop their result.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::traffic_models::{self, RouteDescriptor, RouteStatus, StatusLabel};

/// Immutable snapshot of the rows, in configuration order.
pub type RouteList = Arc<[Arc<RouteStatus>]>;

#[derive(Debug)]
pub struct Session {
    generation: u64,
    started_at: i64,
    rows: RwLock<RouteList>,
}

impl Session {
    fn new(generation: u64, descriptors: &[RouteDescriptor], placeholder: &str) -> Self {
        let rows: RouteList = descriptors
            .iter()
            .map(|d| Arc::new(RouteStatus::initial(d, placeholder)))
            .collect();

        Session {
            generation,
            started_at: traffic_models::get_current_timestamp(),
            rows: RwLock::new(rows),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> RouteList {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&rows)
    }

    pub fn row(&self, id: u32) -> Option<Arc<RouteStatus>> {
        self.snapshot().iter().find(|r| r.id == id).cloned()
    }

    /// Mark row `id` as real-time with the given duration text.
    ///
    /// Returns false (and changes nothing) when no row has that id.
    pub fn update(&self, id: u32, time: &str) -> bool {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);

        let Some(index) = rows.iter().position(|r| r.id == id) else {
            return false;
        };

        let next: RouteList = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if i == index {
                    Arc::new(row.with_real_time(time))
                } else {
                    Arc::clone(row)
                }
            })
            .collect();

        *rows = next;
        true
    }

    pub fn pending(&self) -> usize {
        self.snapshot()
            .iter()
            .filter(|r| r.status == StatusLabel::Checking)
            .count()
    }

    pub fn to_view(&self) -> CommuteBoard {
        let rows = self.snapshot();
        CommuteBoard {
            generation: self.generation,
            started_at: self.started_at,
            started_at_local: traffic_models::format_timestamp_full(self.started_at),
            pending: rows.iter().filter(|r| r.status == StatusLabel::Checking).count(),
            routes: rows.iter().map(|r| RouteStatus::clone(r)).collect(),
        }
    }
}

/// Serializable view of a session for the JSON API.
#[derive(Debug, Clone, Serialize)]
pub struct CommuteBoard {
    pub generation: u64,
    pub started_at: i64,
    pub started_at_local: String,
    pub pending: usize,
    pub routes: Vec<RouteStatus>,
}

#[derive(Debug)]
pub struct RouteBoard {
    descriptors: Arc<[RouteDescriptor]>,
    placeholder: String,
    next_generation: AtomicU64,
    current: RwLock<Arc<Session>>,
}

impl RouteBoard {
    pub fn new(descriptors: Vec<RouteDescriptor>, placeholder: impl Into<String>) -> Self {
        let descriptors: Arc<[RouteDescriptor]> = descriptors.into();
        let placeholder = placeholder.into();
        let first = Arc::new(Session::new(1, &descriptors, &placeholder));

        RouteBoard {
            descriptors,
            placeholder,
            next_generation: AtomicU64::new(2),
            current: RwLock::new(first),
        }
    }

    pub fn descriptors(&self) -> &[RouteDescriptor] {
        &self.descriptors
    }

    pub fn session(&self) -> Arc<Session> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    pub fn snapshot(&self) -> RouteList {
        self.session().snapshot()
    }

    /// Start over: new session, every row back to its initial state.
    pub fn reload(&self) -> Arc<Session> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let fresh = Arc::new(Session::new(generation, &self.descriptors, &self.placeholder));

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::clone(&fresh);
        fresh
    }
}
