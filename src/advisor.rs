//! Advisor facade: the two core operations the boundary calls.
//!
//! `diagnose` runs the rule engine, asks the pattern tracker whether the
//! pairing has failed often enough to escalate, then records a PENDING
//! session. `submit_feedback` finalizes that session exactly once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::{self, DiagnosisCode, ESCALATION_STEP};
use crate::error::Result;
use crate::session::{Outcome, PatternAlert, Session};
use crate::stats::HistoryStats;
use crate::store::{InMemorySessionStore, SessionStore};
use crate::symptoms::SymptomVector;
use crate::tracker::PatternTracker;

/// Response of [`Advisor::diagnose`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub session_id: String,
    pub active_symptoms: Vec<String>,
    /// Root cause found by the rules.
    pub diagnosis_code: DiagnosisCode,
    /// Action the caller should take; `CONSULT_SPECIALIST` after escalation.
    pub final_diagnosis: DiagnosisCode,
    pub justification: String,
    pub summary: String,
    pub recommendation_steps: Vec<String>,
    pub pattern_alert: PatternAlert,
    pub alert_message: String,
}

/// Response of [`Advisor::submit_feedback`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReceipt {
    pub session_id: String,
    pub outcome: Outcome,
    pub message: String,
}

pub struct Advisor {
    tracker: PatternTracker,
}

impl Advisor {
    /// Fails with `Config` when `failure_threshold` is 0.
    pub fn new(store: Arc<dyn SessionStore>, failure_threshold: usize) -> Result<Self> {
        Ok(Self {
            tracker: PatternTracker::with_threshold(store, failure_threshold)?,
        })
    }

    /// Advisor over a fresh volatile history with the default threshold.
    pub fn in_memory() -> Self {
        Self {
            tracker: PatternTracker::new(Arc::new(InMemorySessionStore::new())),
        }
    }

    pub fn diagnose(&self, symptoms: &SymptomVector) -> Result<Diagnosis> {
        let result = engine::evaluate(symptoms);
        let alert = self.tracker.check_pattern(symptoms, result.code)?;

        let (final_diagnosis, steps) = if alert.triggered {
            (DiagnosisCode::ConsultSpecialist, vec![ESCALATION_STEP.to_string()])
        } else {
            (result.code, result.action_steps.clone())
        };

        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            symptoms: *symptoms,
            diagnosis_code: result.code,
            suggested_diagnosis: final_diagnosis,
            justification: result.justification.clone(),
            summary: result.summary.clone(),
            rule_steps: result.action_steps,
            pattern_alert: alert,
            outcome: Outcome::Pending,
            created_at_ms: now_ms(),
        };
        let session_id = session.id.clone();
        self.tracker.record_session(session)?;

        debug!(session_id = %session_id, code = %result.code, final_code = %final_diagnosis, "diagnosis issued");

        Ok(Diagnosis {
            session_id,
            active_symptoms: symptoms
                .active_labels()
                .into_iter()
                .map(str::to_string)
                .collect(),
            diagnosis_code: result.code,
            final_diagnosis,
            justification: result.justification,
            summary: result.summary,
            recommendation_steps: steps,
            pattern_alert: alert,
            alert_message: alert.message(),
        })
    }

    /// Parse `outcome` (case-insensitive SUCCEEDED/FAILED) and finalize the session.
    pub fn submit_feedback(&self, session_id: &str, outcome: &str) -> Result<FeedbackReceipt> {
        let outcome = Outcome::parse_feedback(outcome)?;
        let session = self.tracker.record_feedback(session_id, outcome)?;
        info!(session_id = %session.id, code = %session.diagnosis_code, "session finalized");
        Ok(FeedbackReceipt {
            message: format!(
                "Feedback recorded ({}) for session {}. Pattern history updated.",
                outcome, session.id
            ),
            session_id: session.id,
            outcome,
        })
    }

    pub fn history(&self) -> Result<Vec<Session>> {
        self.tracker.store().snapshot()
    }

    pub fn stats(&self) -> Result<HistoryStats> {
        let mut stats = HistoryStats::builder();
        self.tracker.store().scan(&mut |s| stats.add(s))?;
        Ok(stats.build())
    }
}

/// Current Unix epoch in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
