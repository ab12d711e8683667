//! Rule-based troubleshooting advisor.
//!
//! A fixed, ordered rule table maps a set of observed symptoms to one
//! recommended remediation. Every diagnosis is recorded as a session; once a
//! user reports whether the fix worked, that history feeds a pattern tracker
//! that escalates to a specialist when the same symptoms and diagnosis have
//! already failed too often.
//!
//! ```
//! use diagnostic_advisor::advisor::Advisor;
//! use diagnostic_advisor::engine::DiagnosisCode;
//! use diagnostic_advisor::symptoms::{Symptom, SymptomVector};
//!
//! let advisor = Advisor::in_memory();
//! let symptoms = SymptomVector::default().with(Symptom::AppCrashes);
//! let d = advisor.diagnose(&symptoms).unwrap();
//! assert_eq!(d.final_diagnosis, DiagnosisCode::ReinstallAppClearCache);
//! advisor.submit_feedback(&d.session_id, "FAILED").unwrap();
//! ```

pub mod advisor;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod reports;
pub mod session;
pub mod stats;
pub mod store;
pub mod symptoms;
pub mod tracker;
pub mod web;

pub use advisor::{Advisor, Diagnosis, FeedbackReceipt};
pub use engine::{evaluate, DiagnosisCode, DiagnosisResult};
pub use error::{AdvisorError, Result};
pub use session::{Outcome, PatternAlert, Session};
pub use symptoms::{Symptom, SymptomVector};
