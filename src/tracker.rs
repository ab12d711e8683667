//! # Pattern Tracker
//!
//! Owns the session history (through an injected [`SessionStore`]) and turns
//! past outcomes into escalation decisions.
//!
//! A diagnosis escalates when the history already holds `threshold` FAILED
//! sessions whose active symptom set equals the current one exactly and whose
//! *original* rule-engine diagnosis equals the current candidate. Escalated
//! sessions keep their original code, so they keep feeding future matches.

use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::DiagnosisCode;
use crate::error::{AdvisorError, Result};
use crate::session::{Outcome, PatternAlert, Session};
use crate::store::SessionStore;
use crate::symptoms::SymptomVector;

/// Prior failures needed before a pairing escalates (the third attempt).
pub const DEFAULT_FAILURE_THRESHOLD: usize = 2;

pub fn validate_threshold(threshold: usize) -> Result<()> {
    if threshold == 0 {
        return Err(AdvisorError::config("failure_threshold must be >= 1"));
    }
    Ok(())
}

pub struct PatternTracker {
    store: Arc<dyn SessionStore>,
    threshold: usize,
}

impl PatternTracker {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }

    /// A threshold of 0 would escalate every request and is rejected, the
    /// same rule [`crate::config::AdvisorConfig::validate`] applies.
    pub fn with_threshold(store: Arc<dyn SessionStore>, threshold: usize) -> Result<Self> {
        validate_threshold(threshold)?;
        Ok(Self { store, threshold })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Count matching failed precedents and decide whether to escalate.
    pub fn check_pattern(
        &self,
        symptoms: &SymptomVector,
        candidate: DiagnosisCode,
    ) -> Result<PatternAlert> {
        let wanted = symptoms.active();
        let mut failure_count = 0;
        self.store.scan(&mut |session| {
            if session.outcome == Outcome::Failed
                && session.diagnosis_code == candidate
                && session.symptoms.active() == wanted
            {
                failure_count += 1;
            }
        })?;
        Ok(PatternAlert {
            triggered: failure_count >= self.threshold,
            failure_count,
        })
    }

    pub fn record_session(&self, session: Session) -> Result<()> {
        if session.pattern_alert.triggered {
            info!(
                session_id = %session.id,
                code = %session.diagnosis_code,
                failures = session.pattern_alert.failure_count,
                "pattern alert raised, escalating"
            );
        }
        self.store.append(session)
    }

    /// Apply user feedback. Only `SUCCEEDED` and `FAILED` are accepted; the
    /// first terminal write wins and later calls get `AlreadyFinalized`.
    pub fn record_feedback(&self, session_id: &str, outcome: Outcome) -> Result<Session> {
        if !outcome.is_terminal() {
            return Err(AdvisorError::validation("feedback outcome must be terminal"));
        }
        match self
            .store
            .compare_and_set_outcome(session_id, Outcome::Pending, outcome)
        {
            Ok(session) => {
                info!(session_id = %session_id, outcome = %outcome, "feedback recorded");
                Ok(session)
            }
            Err(err) => {
                warn!(session_id = %session_id, error = %err, "feedback rejected");
                Err(err)
            }
        }
    }
}
