use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

use crate::inquiry::InquirySession;
use crate::state::SharedState;

pub type SessionHandle = Arc<Mutex<InquirySession>>;

/// Open inquiry forms, keyed by the visitor's session cookie.
pub struct SessionRegistry {
    /// session id -> (form state, last access)
    entries: DashMap<Uuid, (SessionHandle, Instant)>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up a session and mark it as used.
    pub fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let mut entry = self.entries.get_mut(&id)?;
        let (session, last_seen) = entry.value_mut();
        *last_seen = Instant::now();
        Some(Arc::clone(session))
    }

    pub fn insert(&self, session: InquirySession) -> (Uuid, SessionHandle) {
        let id = Uuid::now_v7();
        let handle = Arc::new(Mutex::new(session));
        self.entries
            .insert(id, (Arc::clone(&handle), Instant::now()));
        (id, handle)
    }

    /// Drop sessions untouched for longer than `max_age`. Dropping a session
    /// cancels its pending status reset.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries
            .retain(|_, (_, last_seen)| now.duration_since(*last_seen) < max_age);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically expire idle sessions until shutdown is signaled.
pub fn spawn_sweeper(
    state: SharedState,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    let ttl = state.config.session_ttl;
    let every = (ttl / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));

    tokio::spawn(async move {
        tracing::debug!("Session sweeper started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let expired = state.sessions.cleanup(ttl);
            if expired > 0 {
                tracing::debug!("Expired {expired} idle sessions");
            }

            tokio::select! {
                _ = tokio::time::sleep(every) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Session sweeper stopped");
    })
}
