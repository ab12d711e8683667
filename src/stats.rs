//! Aggregate statistics over the session history (admin view).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::DiagnosisCode;
use crate::session::{Outcome, Session};
use crate::symptoms::Symptom;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub sessions: usize,
    pub failed: usize,
    pub succeeded: usize,
    pub pending: usize,
    /// Sessions answered with `CONSULT_SPECIALIST`.
    pub escalated: usize,
    /// Succeeded sessions as a percentage of all sessions; 0 when empty.
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub totals: Totals,
    /// Keyed by final (post-escalation) diagnosis, most frequent first.
    pub top_diagnoses: Vec<CountEntry>,
    pub top_symptoms: Vec<CountEntry>,
}

impl HistoryStats {
    pub fn builder() -> StatsBuilder {
        StatsBuilder::default()
    }

    pub fn from_sessions<'a, I: IntoIterator<Item = &'a Session>>(sessions: I) -> Self {
        let mut builder = Self::builder();
        for s in sessions {
            builder.add(s);
        }
        builder.build()
    }
}

/// Incremental accumulator, fed one session at a time during a store scan.
#[derive(Debug, Default)]
pub struct StatsBuilder {
    totals: Totals,
    diagnoses: HashMap<DiagnosisCode, usize>,
    symptoms: HashMap<Symptom, usize>,
}

impl StatsBuilder {
    pub fn add(&mut self, session: &Session) {
        self.totals.sessions += 1;
        match session.outcome {
            Outcome::Pending => self.totals.pending += 1,
            Outcome::Succeeded => self.totals.succeeded += 1,
            Outcome::Failed => self.totals.failed += 1,
        }
        if session.is_escalated() {
            self.totals.escalated += 1;
        }
        *self.diagnoses.entry(session.suggested_diagnosis).or_insert(0) += 1;
        for symptom in session.symptoms.active().iter() {
            *self.symptoms.entry(symptom).or_insert(0) += 1;
        }
    }

    pub fn build(self) -> HistoryStats {
        let mut totals = self.totals;
        totals.success_rate = if totals.sessions > 0 {
            totals.succeeded as f64 / totals.sessions as f64 * 100.0
        } else {
            0.0
        };
        HistoryStats {
            totals,
            top_diagnoses: ranked(self.diagnoses.into_iter().map(|(k, v)| (k.to_string(), v))),
            top_symptoms: ranked(self.symptoms.into_iter().map(|(k, v)| (k.key().to_string(), v))),
        }
    }
}

/// Sort by count descending, then name ascending.
fn ranked<I: Iterator<Item = (String, usize)>>(counts: I) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = counts
        .map(|(name, count)| CountEntry { name, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    entries
}
