//! Shared application state for the game server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use game::modes::GameContext;
use game::modes::interactive::InteractiveGame;
use game::modes::inverse::InverseGame;

/// A game that lives across requests.
///
/// Each game sits behind its own mutex, held for one request at a time, so
/// concurrent requests on the same session are serialised.
#[derive(Clone)]
pub enum Session {
    Inverse(Arc<Mutex<InverseGame>>),
    Interactive(Arc<Mutex<InteractiveGame>>),
}

impl Session {
    pub fn kind(&self) -> &'static str {
        match self {
            Session::Inverse(_) => "inverse",
            Session::Interactive(_) => "interactive",
        }
    }
}

/// Per-turn sessions keyed by the caller's session id. Never evicted.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionRegistry {
    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a session, replacing any previous game under the same id.
    pub fn insert(&self, id: impl Into<String>, session: Session) {
        self.sessions().insert(id.into(), session);
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions().get(id).cloned()
    }
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub ctx: GameContext,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(ctx: GameContext) -> Self {
        Self {
            ctx,
            sessions: SessionRegistry::default(),
        }
    }
}

/// Lock a per-session game. A poisoned lock still holds a consistent game:
/// every mutation is validated before it is applied.
pub fn lock_game<T>(game: &Mutex<T>) -> MutexGuard<'_, T> {
    game.lock().unwrap_or_else(PoisonError::into_inner)
}
