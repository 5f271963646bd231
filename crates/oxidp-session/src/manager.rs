//! Session persistence keyed by session id.

use chrono::{Duration, Utc};
use oxidp_store::KeyedStore;
use rand::distr::{Alphanumeric, SampleString};
use tracing::debug;

use crate::flow::FlowSession;

/// Length of generated CSRF tokens.
const CSRF_TOKEN_LEN: usize = 32;

/// Persists [`FlowSession`] state across the redirects of one flow.
///
/// Abandoned flows simply expire; stale state is overwritten the next
/// time the same session id starts a flow.
#[derive(Debug)]
pub struct SessionManager {
    sessions: KeyedStore<String, FlowSession>,
    lifetime_seconds: i64,
}

impl SessionManager {
    /// Creates a manager whose sessions expire after `lifetime_seconds`.
    #[must_use]
    pub fn new(lifetime_seconds: i64) -> Self {
        Self {
            sessions: KeyedStore::new(),
            lifetime_seconds,
        }
    }

    /// Returns the session for `id`, creating a fresh one if none is live.
    #[must_use]
    pub fn get_or_create(&self, id: &str) -> FlowSession {
        if let Some(session) = self.sessions.get(&id.to_string()) {
            return session;
        }
        debug!(session_id = id, "creating flow session");
        let mut session = FlowSession::new(id);
        session.csrf_token = Some(generate_csrf_token());
        self.save(session.clone());
        session
    }

    /// Returns the session for `id`, if one is live.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<FlowSession> {
        self.sessions.get(&id.to_string())
    }

    /// Persists `session`, resetting its expiry window.
    pub fn save(&self, session: FlowSession) {
        let expires_at = Utc::now() + Duration::seconds(self.lifetime_seconds);
        self.sessions
            .insert_until(session.id.clone(), session, expires_at);
    }

    /// Drops the session for `id`.
    pub fn invalidate(&self, id: &str) {
        self.sessions.remove(&id.to_string());
    }
}

impl Default for SessionManager {
    /// One-hour sessions.
    fn default() -> Self {
        Self::new(3600)
    }
}

/// Generates a random alphanumeric CSRF token.
#[must_use]
pub fn generate_csrf_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), CSRF_TOKEN_LEN)
}
