use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::types::{SessionId, SessionState};
use crate::logging::{ActivityLog, ActivityLogger, ActivityType};

/// Shared handle to one session; lock it to read or mutate the state
pub type SessionHandle = Arc<Mutex<SessionState>>;

/// Registry of live sessions
pub trait SessionStore: Send + Sync {
    /// Existing handle for `id`, or a fresh session registered under it.
    /// The flag is true only for the call that registered the session.
    fn get_or_create(&self, id: &str) -> (SessionHandle, bool);

    fn get(&self, id: &str) -> Option<SessionHandle>;

    /// Drop a session right away. Returns false if it was not registered.
    fn evict(&self, id: &str) -> bool;

    /// Evict every session that exited at least `delay` before `now`.
    /// Returns the evicted ids.
    fn sweep_exited(&self, now: Instant, delay: Duration) -> Vec<SessionId>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// DashMap-backed session registry
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, SessionHandle>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        info!("Initializing session store with DashMap");
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, id: &str) -> (SessionHandle, bool) {
        match self.sessions.entry(id.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                debug!("Creating session {}", id);
                let handle = Arc::new(Mutex::new(SessionState::new(id)));
                entry.insert(handle.clone());
                (handle, true)
            }
        }
    }

    fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    fn evict(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    fn sweep_exited(&self, now: Instant, delay: Duration) -> Vec<SessionId> {
        let mut evicted = Vec::new();

        // A session locked by an in-flight request is left for the next sweep.
        self.sessions.retain(|id, handle| {
            let expired = handle.try_lock().is_ok_and(|state| {
                state
                    .exited_at
                    .is_some_and(|exited| now.saturating_duration_since(exited) >= delay)
            });
            if expired {
                evicted.push(id.clone());
            }
            !expired
        });

        if !evicted.is_empty() {
            info!("Evicted {} exited sessions", evicted.len());
        }
        evicted
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// Start the background task that evicts exited sessions.
///
/// Every `interval` it removes sessions whose exit is at least `delay` old.
pub fn spawn_sweeper(
    store: Arc<dyn SessionStore>,
    interval: Duration,
    delay: Duration,
    logger: ActivityLogger,
) -> JoinHandle<()> {
    info!(
        "Session sweeper started: interval={:?}, eviction_delay={:?}",
        interval, delay
    );

    tokio::spawn(async move {
        loop {
            sleep(interval).await;

            for session_id in store.sweep_exited(Instant::now(), delay) {
                debug!("Session {} evicted", session_id);
                logger.log(ActivityLog::builder(session_id, ActivityType::SessionEvicted).build());
            }
        }
    })
}
