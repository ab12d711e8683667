//! Session records and their outcome state machine.
//!
//! ```text
//! PENDING --feedback(SUCCEEDED)--> SUCCEEDED
//! PENDING --feedback(FAILED)-----> FAILED
//! ```
//!
//! Terminal outcomes never change again.

use serde::{Deserialize, Serialize};

use crate::engine::DiagnosisCode;
use crate::error::{AdvisorError, Result};
use crate::symptoms::SymptomVector;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Pending)
    }

    /// Parse a feedback value. Only the terminal outcomes are accepted and the
    /// comparison ignores case and surrounding whitespace.
    pub fn parse_feedback(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "SUCCEEDED" => Ok(Outcome::Succeeded),
            "FAILED" => Ok(Outcome::Failed),
            _ => Err(AdvisorError::validation(format!(
                "outcome must be SUCCEEDED or FAILED, got '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Pending => write!(f, "PENDING"),
            Outcome::Succeeded => write!(f, "SUCCEEDED"),
            Outcome::Failed => write!(f, "FAILED"),
        }
    }
}

// ---------------------------------------------------------------------------
// PatternAlert
// ---------------------------------------------------------------------------

/// Escalation signal computed from history at diagnosis time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternAlert {
    pub triggered: bool,
    /// Prior FAILED sessions with the same symptom set and original diagnosis.
    pub failure_count: usize,
}

impl PatternAlert {
    pub fn message(&self) -> String {
        if self.triggered {
            format!("Detected {} previous similar failures.", self.failure_count)
        } else {
            "No failure pattern detected.".to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub symptoms: SymptomVector,
    /// Rule engine output. Pattern matching always keys on this code.
    pub diagnosis_code: DiagnosisCode,
    /// Final diagnosis after escalation; equals `diagnosis_code` when no alert fired.
    pub suggested_diagnosis: DiagnosisCode,
    pub justification: String,
    pub summary: String,
    pub rule_steps: Vec<String>,
    pub pattern_alert: PatternAlert,
    pub outcome: Outcome,
    pub created_at_ms: u64,
}

impl Session {
    pub fn is_escalated(&self) -> bool {
        self.suggested_diagnosis.is_escalation()
    }
}
