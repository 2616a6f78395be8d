//! The session registry: every live game, keyed by session id.
//!
//! # Concurrency note
//!
//! Unlike a plain `HashMap` behind a lock, the registry is a sharded
//! [`DashMap`]. Operations on different sessions proceed in parallel and
//! each operation on one session holds only that entry's shard lock, so
//! the read-check-write of a move is atomic with respect to other callers.

use std::time::Instant;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use noughts_protocol::{Mark, SessionId};

use crate::{RegistryConfig, RegistryError, Session};

/// How many random ids `create_session` tries before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// A session plus the bookkeeping the reaper needs.
#[derive(Debug)]
struct Record {
    session: Session,
    last_active: Instant,
}

impl Record {
    fn new() -> Self {
        Self {
            session: Session::new(),
            last_active: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }
}

/// Authoritative store of all sessions.
///
/// ## Lifecycle
///
/// ```text
/// create_session() / get_or_create()
///          │
///          ▼
///      [Active] ──apply_move / reset_session / mark_joined──→ [Active]
///          │
///          ▼ (idle for session_ttl, nobody connected)
///     expire_idle() ──→ removed
/// ```
///
/// Reads hand out clones, never references into the map.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Record>,
    config: RegistryConfig,
}

impl SessionRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Creates a fresh session under a newly generated id.
    ///
    /// The capacity check and the insert are not one atomic step, so
    /// racing creators may overshoot `max_sessions` by a few entries.
    ///
    /// # Errors
    /// - [`RegistryError::Full`] if `max_sessions` sessions already exist
    /// - [`RegistryError::IdSpaceExhausted`] if every attempted id was taken
    pub fn create_session(&self) -> Result<SessionId, RegistryError> {
        let mut rng = rand::rng();
        self.create_with(|| SessionId::random(&mut rng))
    }

    fn create_with(
        &self,
        mut next_id: impl FnMut() -> SessionId,
    ) -> Result<SessionId, RegistryError> {
        self.ensure_capacity()?;

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = next_id();
            match self.sessions.entry(id.clone()) {
                Entry::Occupied(_) => {
                    tracing::debug!(session_id = %id, "session id collision, retrying");
                }
                Entry::Vacant(slot) => {
                    slot.insert(Record::new());
                    tracing::info!(session_id = %id, "session created");
                    return Ok(id);
                }
            }
        }

        tracing::warn!(attempts = MAX_ID_ATTEMPTS, "no free session id found");
        Err(RegistryError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }

    /// Returns a copy of the session.
    ///
    /// # Errors
    /// Returns [`RegistryError::NotFound`] if the id is unknown.
    pub fn get_session(&self, id: &SessionId) -> Result<Session, RegistryError> {
        let mut record = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        record.touch();
        Ok(record.session.clone())
    }

    /// Returns the session, creating a fresh one under `id` if it is
    /// unknown. Used when a player connects to an id nobody created.
    ///
    /// # Errors
    /// Returns [`RegistryError::Full`] if a new session would be needed
    /// and the registry is at capacity.
    pub fn get_or_create(&self, id: &SessionId) -> Result<Session, RegistryError> {
        if !self.sessions.contains_key(id) {
            self.ensure_capacity()?;
        }

        let mut record = self.sessions.entry(id.clone()).or_insert_with(|| {
            tracing::info!(session_id = %id, "session created on first connection");
            Record::new()
        });
        record.touch();
        Ok(record.session.clone())
    }

    /// Applies a move and returns the updated session.
    ///
    /// # Errors
    /// - [`RegistryError::NotFound`] if the id is unknown
    /// - [`RegistryError::Rejected`] if the rules refuse the move; the
    ///   session is unchanged
    pub fn apply_move(
        &self,
        id: &SessionId,
        cell: usize,
        mark: Mark,
    ) -> Result<Session, RegistryError> {
        let mut record = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        record.touch();
        record.session.apply_move(cell, mark)?;

        if let Some(winner) = record.session.outcome() {
            tracing::info!(session_id = %id, %winner, "round concluded");
        }
        Ok(record.session.clone())
    }

    /// Starts a new round and returns the updated session.
    ///
    /// # Errors
    /// Returns [`RegistryError::NotFound`] if the id is unknown.
    pub fn reset_session(&self, id: &SessionId) -> Result<Session, RegistryError> {
        let mut record = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        record.touch();
        record.session.reset();
        tracing::debug!(session_id = %id, "session reset");
        Ok(record.session.clone())
    }

    /// Records that a second player joined and returns the session.
    ///
    /// # Errors
    /// Returns [`RegistryError::NotFound`] if the id is unknown.
    pub fn mark_joined(&self, id: &SessionId) -> Result<Session, RegistryError> {
        let mut record = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        record.touch();
        record.session.mark_joined();
        Ok(record.session.clone())
    }

    /// Removes sessions idle for at least `session_ttl` for which
    /// `is_live` returns `false`. Returns the evicted ids.
    ///
    /// `is_live` runs while a shard lock is held and must not call back
    /// into the registry.
    pub fn expire_idle(&self, is_live: impl Fn(&SessionId) -> bool) -> Vec<SessionId> {
        let ttl = self.config.session_ttl;
        let mut expired = Vec::new();

        self.sessions.retain(|id, record| {
            let keep = record.last_active.elapsed() < ttl || is_live(id);
            if !keep {
                expired.push(id.clone());
            }
            keep
        });

        for id in &expired {
            tracing::info!(session_id = %id, "idle session evicted");
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    fn ensure_capacity(&self) -> Result<(), RegistryError> {
        let max = self.config.max_sessions;
        if self.sessions.len() >= max {
            tracing::warn!(max, "session registry is full");
            return Err(RegistryError::Full(max));
        }
        Ok(())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use noughts_protocol::Winner;

    use super::*;
    use crate::Rejection;

    fn registry_with(session_ttl: Duration, max_sessions: usize) -> SessionRegistry {
        SessionRegistry::new(RegistryConfig {
            session_ttl,
            max_sessions,
        })
    }

    fn id(s: &str) -> SessionId {
        SessionId::parse(s).unwrap()
    }

    // =====================================================================
    // create_session()
    // =====================================================================

    #[test]
    fn test_create_session_starts_fresh() {
        let registry = SessionRegistry::default();
        let id = registry.create_session().unwrap();

        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_session(&id).unwrap(), Session::new());
    }

    #[test]
    fn test_create_session_ids_are_distinct() {
        let registry = SessionRegistry::default();
        for _ in 0..200 {
            registry.create_session().unwrap();
        }
        assert_eq!(registry.len(), 200);
    }

    #[test]
    fn test_create_session_full_registry_fails() {
        let registry = registry_with(Duration::from_secs(60), 2);
        registry.create_session().unwrap();
        registry.create_session().unwrap();

        let result = registry.create_session();

        assert!(matches!(result, Err(RegistryError::Full(2))));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_create_with_constant_ids_exhausts_attempts() {
        let registry = SessionRegistry::default();
        let taken = id("AAAAA");
        registry.get_or_create(&taken).unwrap();

        let mut calls = 0;
        let result = registry.create_with(|| {
            calls += 1;
            taken.clone()
        });

        assert!(matches!(
            result,
            Err(RegistryError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
        ));
        assert_eq!(calls, MAX_ID_ATTEMPTS);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_create_with_retries_past_collision() {
        let registry = SessionRegistry::default();
        registry.get_or_create(&id("AAAAA")).unwrap();

        let mut candidates = vec![id("BBBBB"), id("AAAAA")];
        let created = registry.create_with(|| candidates.pop().unwrap()).unwrap();

        assert_eq!(created, id("BBBBB"));
        assert_eq!(registry.len(), 2);
    }

    // =====================================================================
    // get_session() / get_or_create()
    // =====================================================================

    #[test]
    fn test_get_session_unknown_is_not_found() {
        let registry = SessionRegistry::default();
        let result = registry.get_session(&id("ZZZZZ"));
        assert!(matches!(result, Err(RegistryError::NotFound(missing)) if missing == id("ZZZZZ")));
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let registry = SessionRegistry::default();
        let game = id("GAME1");

        registry.get_or_create(&game).unwrap();
        registry.apply_move(&game, 4, Mark::X).unwrap();
        let again = registry.get_or_create(&game).unwrap();

        assert_eq!(again.board()[4], Some(Mark::X));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_full_registry_still_returns_existing() {
        let registry = registry_with(Duration::from_secs(60), 1);
        let game = id("GAME1");
        registry.get_or_create(&game).unwrap();

        assert!(registry.get_or_create(&game).is_ok());
        assert!(matches!(
            registry.get_or_create(&id("GAME2")),
            Err(RegistryError::Full(1))
        ));
    }

    // =====================================================================
    // apply_move() / reset_session() / mark_joined()
    // =====================================================================

    #[test]
    fn test_apply_move_returns_updated_session() {
        let registry = SessionRegistry::default();
        let game = registry.create_session().unwrap();

        let session = registry.apply_move(&game, 0, Mark::X).unwrap();

        assert_eq!(session.board()[0], Some(Mark::X));
        assert_eq!(session.current_turn(), Some(Mark::O));
        assert_eq!(registry.get_session(&game).unwrap(), session);
    }

    #[test]
    fn test_apply_move_rejection_is_wrapped() {
        let registry = SessionRegistry::default();
        let game = registry.create_session().unwrap();

        let result = registry.apply_move(&game, 0, Mark::O);

        assert!(matches!(
            result,
            Err(RegistryError::Rejected(Rejection::NotYourTurn { .. }))
        ));
        assert_eq!(registry.get_session(&game).unwrap(), Session::new());
    }

    #[test]
    fn test_apply_move_unknown_session_is_not_found() {
        let registry = SessionRegistry::default();
        let result = registry.apply_move(&id("NOPE0"), 0, Mark::X);
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_reset_session_keeps_scores() {
        let registry = SessionRegistry::default();
        let game = registry.create_session().unwrap();
        for (cell, mark) in [(0, Mark::X), (3, Mark::O), (1, Mark::X), (4, Mark::O), (2, Mark::X)] {
            registry.apply_move(&game, cell, mark).unwrap();
        }
        assert_eq!(
            registry.get_session(&game).unwrap().outcome(),
            Some(Winner::X)
        );

        let session = registry.reset_session(&game).unwrap();

        assert_eq!(session.outcome(), None);
        assert_eq!(session.current_turn(), Some(Mark::X));
        assert_eq!(session.scores().get(Mark::X), 1);
    }

    #[test]
    fn test_mark_joined_is_idempotent() {
        let registry = SessionRegistry::default();
        let game = registry.create_session().unwrap();

        assert!(registry.mark_joined(&game).unwrap().is_joined());
        assert!(registry.mark_joined(&game).unwrap().is_joined());
    }

    // =====================================================================
    // expire_idle()
    // =====================================================================

    #[test]
    fn test_expire_idle_removes_idle_sessions_without_players() {
        let registry = registry_with(Duration::ZERO, 100);
        let idle = registry.create_session().unwrap();
        let live = registry.create_session().unwrap();

        let expired = registry.expire_idle(|candidate| *candidate == live);

        assert_eq!(expired, vec![idle.clone()]);
        assert!(!registry.contains(&idle));
        assert!(registry.contains(&live));
    }

    #[test]
    fn test_expire_idle_keeps_recent_sessions() {
        let registry = registry_with(Duration::from_secs(3600), 100);
        let game = registry.create_session().unwrap();

        let expired = registry.expire_idle(|_| false);

        assert!(expired.is_empty());
        assert!(registry.contains(&game));
    }
}
