//! Session history storage.
//!
//! [`SessionStore`] is the seam between the pattern tracker and whatever keeps
//! the history. [`InMemorySessionStore`] is the process-local implementation:
//! an append-only `Vec` behind a `RwLock`, so pattern scans run concurrently
//! while appends and outcome transitions are serialized.
//!
//! ## Guarantees
//! - Append-only: sessions are never removed or reordered
//! - Atomic transitions: `compare_and_set_outcome` checks and writes under one
//!   write lock, so racing feedback applies exactly once
//! - Non-panicking: a poisoned lock surfaces as [`AdvisorError::Internal`]

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{AdvisorError, Result};
use crate::session::{Outcome, Session};

/// Abstraction over the history backend.
pub trait SessionStore: Send + Sync {
    /// Append a new session. Ids must be unique.
    fn append(&self, session: Session) -> Result<()>;

    /// Visit every session in insertion order under a consistent read view.
    fn scan(&self, visit: &mut dyn FnMut(&Session)) -> Result<()>;

    fn find_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Set the outcome of `id` to `new` only if it is currently `expected`.
    /// Returns the updated session.
    ///
    /// Fails with `NotFound` for an unknown id and with `AlreadyFinalized`
    /// when the session already holds a terminal outcome.
    fn compare_and_set_outcome(&self, id: &str, expected: Outcome, new: Outcome) -> Result<Session>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Owned copy of the whole history.
    fn snapshot(&self) -> Result<Vec<Session>> {
        let mut out = Vec::new();
        self.scan(&mut |s| out.push(s.clone()))?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// InMemorySessionStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct History {
    sessions: Vec<Session>,
    /// session id → position in `sessions`
    index: HashMap<String, usize>,
}

/// Volatile, process-wide history. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    history: RwLock<History>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn append(&self, session: Session) -> Result<()> {
        let mut guard = self
            .history
            .write()
            .map_err(|_| AdvisorError::poisoned("session history"))?;
        if guard.index.contains_key(&session.id) {
            return Err(AdvisorError::Internal(format!(
                "duplicate session id '{}'",
                session.id
            )));
        }
        let pos = guard.sessions.len();
        guard.index.insert(session.id.clone(), pos);
        guard.sessions.push(session);
        Ok(())
    }

    fn scan(&self, visit: &mut dyn FnMut(&Session)) -> Result<()> {
        let guard = self
            .history
            .read()
            .map_err(|_| AdvisorError::poisoned("session history"))?;
        guard.sessions.iter().for_each(|s| visit(s));
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        let guard = self
            .history
            .read()
            .map_err(|_| AdvisorError::poisoned("session history"))?;
        Ok(guard.index.get(id).map(|&pos| guard.sessions[pos].clone()))
    }

    fn compare_and_set_outcome(&self, id: &str, expected: Outcome, new: Outcome) -> Result<Session> {
        let mut guard = self
            .history
            .write()
            .map_err(|_| AdvisorError::poisoned("session history"))?;
        let pos = *guard
            .index
            .get(id)
            .ok_or_else(|| AdvisorError::session_not_found(id))?;
        let session = &mut guard.sessions[pos];
        if session.outcome != expected {
            if session.outcome.is_terminal() {
                return Err(AdvisorError::AlreadyFinalized {
                    id: id.to_string(),
                    outcome: session.outcome,
                });
            }
            return Err(AdvisorError::Internal(format!(
                "session '{}' is {}, expected {}",
                id, session.outcome, expected
            )));
        }
        session.outcome = new;
        Ok(session.clone())
    }

    fn len(&self) -> Result<usize> {
        let guard = self
            .history
            .read()
            .map_err(|_| AdvisorError::poisoned("session history"))?;
        Ok(guard.sessions.len())
    }
}

#[cfg(test)]
pub(crate) fn make_session(id: &str, outcome: Outcome) -> Session {
    use crate::engine::DiagnosisCode;
    use crate::session::PatternAlert;
    use crate::symptoms::{Symptom, SymptomVector};

    Session {
        id: id.to_string(),
        symptoms: SymptomVector::default().with(Symptom::AppCrashes),
        diagnosis_code: DiagnosisCode::ReinstallAppClearCache,
        suggested_diagnosis: DiagnosisCode::ReinstallAppClearCache,
        justification: String::new(),
        summary: String::new(),
        rule_steps: Vec::new(),
        pattern_alert: PatternAlert::default(),
        outcome,
        created_at_ms: 1000,
    }
}
