use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{sync::RwLock, time::Instant};
use tracing::debug;

use crate::planner::{PinMode, TripPlanner};

/// In-memory planners keyed by session id. Nothing survives a restart.
///
/// A planner is only stored once its session mutates something; reads of an
/// unknown session see an empty planner. Sessions idle for longer than the
/// configured timeout are dropped the next time a new session is stored.
#[derive(Clone)]
pub struct SessionStore {
    mode: PinMode,
    idle_timeout: Duration,
    epoch: Instant,
    planners: Arc<RwLock<HashMap<String, Slot>>>,
}

struct Slot {
    planner: TripPlanner,
    /// Milliseconds since the store's epoch; touched by reads too.
    last_seen: AtomicU64,
}

impl SessionStore {
    pub fn new(mode: PinMode, idle_timeout: Duration) -> Self {
        Self {
            mode,
            idle_timeout,
            epoch: Instant::now(),
            planners: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn mode(&self) -> PinMode {
        self.mode
    }

    pub async fn len(&self) -> usize {
        self.planners.read().await.len()
    }

    fn now_millis(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn is_stale(&self, slot: &Slot, now: u64) -> bool {
        let idle = now.saturating_sub(slot.last_seen.load(Ordering::Relaxed));
        u128::from(idle) > self.idle_timeout.as_millis()
    }

    /// Runs `f` against the session's planner, or an empty one if the session
    /// is unknown or expired.
    pub async fn read<R>(&self, id: &str, f: impl FnOnce(&TripPlanner) -> R) -> R {
        let now = self.now_millis();
        let guard = self.planners.read().await;
        match guard.get(id) {
            Some(slot) if !self.is_stale(slot, now) => {
                slot.last_seen.store(now, Ordering::Relaxed);
                f(&slot.planner)
            }
            _ => f(&TripPlanner::new(self.mode)),
        }
    }

    /// Runs `f` with exclusive access to the session's planner, storing a
    /// fresh one first if the session is unknown or expired.
    pub async fn update<R>(&self, id: &str, f: impl FnOnce(&mut TripPlanner) -> R) -> R {
        let now = self.now_millis();
        let mut guard = self.planners.write().await;

        let live = guard.get(id).is_some_and(|slot| !self.is_stale(slot, now));
        if !live {
            let before = guard.len();
            guard.retain(|_, slot| !self.is_stale(slot, now));
            debug!(
                session = %id,
                expired = before - guard.len(),
                live = guard.len() + 1,
                "storing planner session"
            );
        }

        let slot = guard.entry(id.to_string()).or_insert_with(|| Slot {
            planner: TripPlanner::new(self.mode),
            last_seen: AtomicU64::new(now),
        });
        slot.last_seen.store(now, Ordering::Relaxed);
        f(&mut slot.planner)
    }
}
