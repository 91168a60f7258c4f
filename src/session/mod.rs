//! Identifier-keyed session registry
//!
//! Front ends that juggle several analyses or optimizations at once keep
//! them in a [`SessionStore`]. Each session is owned by the store and
//! reached through a closure, so no reference outlives the shard lock.
//!
//! ```rust
//! use scout_doe::analysis::RegressionEngine;
//! use scout_doe::session::SessionStore;
//!
//! # fn main() -> scout_doe::Result<()> {
//! let store = SessionStore::new();
//! let id = store.create(RegressionEngine::new());
//! assert!(!store.with_session(id, |engine| engine.has_data())?);
//! store.remove(id)?;
//! assert!(store.is_empty());
//! # Ok(())
//! # }
//! ```

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Error, Result};

/// Opaque session identifier, unique within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Numeric value, for logs and URLs.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Concurrent map of sessions of type `S`.
pub struct SessionStore<S> {
    sessions: DashMap<SessionId, S>,
    next_id: AtomicU64,
}

impl<S> SessionStore<S> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a session and return its identifier.
    pub fn create(&self, session: S) -> SessionId {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sessions.insert(id, session);
        tracing::debug!(%id, "session created");
        id
    }

    /// Run `f` on a shared borrow of the session.
    ///
    /// # Errors
    /// Returns [`Error::SessionNotFound`] for an unknown id.
    pub fn with_session<R>(&self, id: SessionId, f: impl FnOnce(&S) -> R) -> Result<R> {
        let entry = self
            .sessions
            .get(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        Ok(f(entry.value()))
    }

    /// Run `f` on an exclusive borrow of the session.
    ///
    /// # Errors
    /// Returns [`Error::SessionNotFound`] for an unknown id.
    pub fn with_session_mut<R>(&self, id: SessionId, f: impl FnOnce(&mut S) -> R) -> Result<R> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        Ok(f(entry.value_mut()))
    }

    /// Remove and return a session.
    ///
    /// # Errors
    /// Returns [`Error::SessionNotFound`] for an unknown id.
    pub fn remove(&self, id: SessionId) -> Result<S> {
        self.sessions
            .remove(&id)
            .map(|(_, session)| session)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every session. Identifiers are not reused.
    pub fn clear(&self) {
        self.sessions.clear();
    }
}

impl<S> Default for SessionStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for SessionStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let store = SessionStore::new();
        let a = store.create("a");
        let b = store.create("b");
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_mutation_through_closure() {
        let store = SessionStore::new();
        let id = store.create(vec![1, 2]);
        store.with_session_mut(id, |v| v.push(3)).unwrap();
        assert_eq!(store.with_session(id, Vec::len).unwrap(), 3);
    }

    #[test]
    fn test_unknown_session() {
        let store: SessionStore<u8> = SessionStore::new();
        let id = store.create(1);
        store.remove(id).unwrap();
        assert!(matches!(store.with_session(id, |_| ()), Err(Error::SessionNotFound(_))));
        assert!(matches!(store.remove(id), Err(Error::SessionNotFound(_))));
    }

    #[test]
    fn test_clear_does_not_reuse_ids() {
        let store = SessionStore::new();
        let first = store.create(());
        store.clear();
        let second = store.create(());
        assert!(second > first);
        assert!(!store.contains(first));
    }
}
