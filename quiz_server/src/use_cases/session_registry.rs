// Authoritative in-memory record of who is waiting in which quiz session.

use crate::domain::{Identity, SessionId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-wide session membership plus the global "quiz open" flag.
///
/// Member sets live behind a single mutex; the flag is an atomic. Every
/// operation is synchronous and never awaits, so callers may invoke it while
/// holding their own short critical section.
#[derive(Debug)]
pub struct SessionRegistry {
    /// Reserved identity that receives broadcasts but is never counted.
    admin_identity: Identity,
    sessions: Mutex<HashMap<SessionId, HashSet<Identity>>>,
    active: AtomicBool,
}

impl SessionRegistry {
    /// Creates an empty registry with the quiz closed.
    pub fn new(admin_identity: Identity) -> Self {
        Self {
            admin_identity,
            sessions: Mutex::new(HashMap::new()),
            active: AtomicBool::new(false),
        }
    }

    pub fn admin_identity(&self) -> &Identity {
        &self.admin_identity
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        *identity == self.admin_identity
    }

    /// Adds `identity` to the session, creating the session on first join.
    /// Joining twice with the same identity keeps a single slot.
    /// Returns the number of non-admin members afterwards.
    pub fn join(&self, session_id: &SessionId, identity: &Identity) -> usize {
        let mut sessions = self.lock_sessions();
        let members = sessions.entry(session_id.clone()).or_default();
        members.insert(identity.clone());
        count_participants(members, &self.admin_identity)
    }

    /// Removes `identity` if present. Empty sessions are dropped.
    /// Returns the number of non-admin members left.
    pub fn leave(&self, session_id: &SessionId, identity: &Identity) -> usize {
        let mut sessions = self.lock_sessions();
        let Some(members) = sessions.get_mut(session_id) else {
            return 0;
        };
        members.remove(identity);
        let remaining = count_participants(members, &self.admin_identity);
        if members.is_empty() {
            sessions.remove(session_id);
        }
        remaining
    }

    pub fn participant_count(&self, session_id: &SessionId) -> usize {
        let sessions = self.lock_sessions();
        sessions
            .get(session_id)
            .map(|members| count_participants(members, &self.admin_identity))
            .unwrap_or(0)
    }

    /// True when at least one identity (admin included) is bound to the session.
    pub fn has_members(&self, session_id: &SessionId) -> bool {
        let sessions = self.lock_sessions();
        sessions
            .get(session_id)
            .is_some_and(|members| !members.is_empty())
    }

    /// Sets the quiz flag and returns the new value.
    pub fn set_active(&self, active: bool) -> bool {
        self.active.store(active, Ordering::SeqCst);
        active
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<SessionId, HashSet<Identity>>> {
        // A panic while holding the lock cannot leave a half-applied set insert.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn count_participants(members: &HashSet<Identity>, admin: &Identity) -> usize {
    members.iter().filter(|member| *member != admin).count()
}
