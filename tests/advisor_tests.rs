use std::sync::Arc;
use std::thread;

use diagnostic_advisor::advisor::Advisor;
use diagnostic_advisor::engine::{DiagnosisCode, ESCALATION_STEP};
use diagnostic_advisor::error::AdvisorError;
use diagnostic_advisor::session::Outcome;
use diagnostic_advisor::store::InMemorySessionStore;
use diagnostic_advisor::symptoms::{Symptom, SymptomVector};

fn crash() -> SymptomVector {
    SymptomVector::default().with(Symptom::AppCrashes)
}

fn fail_once(advisor: &Advisor, symptoms: &SymptomVector) -> String {
    let d = advisor.diagnose(symptoms).unwrap();
    advisor.submit_feedback(&d.session_id, "FAILED").unwrap();
    d.session_id
}

#[test]
fn test_repeated_failures_escalate_on_third_diagnosis() {
    let advisor = Advisor::in_memory();

    let first = advisor.diagnose(&crash()).unwrap();
    assert!(!first.pattern_alert.triggered);
    assert_eq!(first.pattern_alert.failure_count, 0);
    assert_eq!(first.alert_message, "No failure pattern detected.");
    advisor.submit_feedback(&first.session_id, "FAILED").unwrap();

    let second = advisor.diagnose(&crash()).unwrap();
    assert!(!second.pattern_alert.triggered);
    assert_eq!(second.pattern_alert.failure_count, 1);
    assert_eq!(second.final_diagnosis, DiagnosisCode::ReinstallAppClearCache);
    advisor.submit_feedback(&second.session_id, "FAILED").unwrap();

    let third = advisor.diagnose(&crash()).unwrap();
    assert!(third.pattern_alert.triggered);
    assert_eq!(third.pattern_alert.failure_count, 2);
    assert_eq!(third.final_diagnosis, DiagnosisCode::ConsultSpecialist);
    assert_eq!(third.diagnosis_code, DiagnosisCode::ReinstallAppClearCache);
    assert_eq!(third.recommendation_steps, vec![ESCALATION_STEP.to_string()]);
    assert_eq!(third.alert_message, "Detected 2 previous similar failures.");
}

#[test]
fn test_succeeded_and_pending_sessions_do_not_count() {
    let advisor = Advisor::in_memory();
    let ok = advisor.diagnose(&crash()).unwrap();
    advisor.submit_feedback(&ok.session_id, "SUCCEEDED").unwrap();
    advisor.diagnose(&crash()).unwrap();
    fail_once(&advisor, &crash());

    let d = advisor.diagnose(&crash()).unwrap();
    assert!(!d.pattern_alert.triggered);
    assert_eq!(d.pattern_alert.failure_count, 1);
}

#[test]
fn test_pattern_requires_exact_symptom_set() {
    let advisor = Advisor::in_memory();
    fail_once(&advisor, &crash());
    fail_once(&advisor, &crash());

    // Same rule fires (app crash wins over sluggishness) but the set differs.
    let superset = crash().with(Symptom::AppSluggishOrFrozen);
    let d = advisor.diagnose(&superset).unwrap();
    assert_eq!(d.diagnosis_code, DiagnosisCode::ReinstallAppClearCache);
    assert!(!d.pattern_alert.triggered);
    assert_eq!(d.pattern_alert.failure_count, 0);
}

#[test]
fn test_escalated_sessions_keep_feeding_the_pattern() {
    let advisor = Advisor::in_memory();
    fail_once(&advisor, &crash());
    fail_once(&advisor, &crash());

    let escalated = advisor.diagnose(&crash()).unwrap();
    assert!(escalated.pattern_alert.triggered);
    advisor.submit_feedback(&escalated.session_id, "FAILED").unwrap();

    let next = advisor.diagnose(&crash()).unwrap();
    assert!(next.pattern_alert.triggered);
    assert_eq!(next.pattern_alert.failure_count, 3);
}

#[test]
fn test_custom_threshold() {
    let advisor = Advisor::new(Arc::new(InMemorySessionStore::new()), 1).unwrap();
    fail_once(&advisor, &SymptomVector::default());
    let d = advisor.diagnose(&SymptomVector::default()).unwrap();
    assert!(d.pattern_alert.triggered);
    assert_eq!(d.diagnosis_code, DiagnosisCode::SimpleSystemRestart);
}

#[test]
fn test_zero_threshold_is_rejected() {
    let err = Advisor::new(Arc::new(InMemorySessionStore::new()), 0)
        .err()
        .unwrap();
    assert!(matches!(err, AdvisorError::Config(_)));
}

#[test]
fn test_stats_count_escalated_sessions() {
    let advisor = Advisor::in_memory();
    fail_once(&advisor, &crash());
    fail_once(&advisor, &crash());
    advisor.diagnose(&crash()).unwrap();

    let stats = advisor.stats().unwrap();
    assert_eq!(stats.totals.sessions, 3);
    assert_eq!(stats.totals.escalated, 1);
    assert!(advisor.history().unwrap()[2].is_escalated());
}

#[test]
fn test_feedback_is_final() {
    let advisor = Advisor::in_memory();
    let id = fail_once(&advisor, &crash());

    let err = advisor.submit_feedback(&id, "SUCCEEDED").unwrap_err();
    assert!(matches!(err, AdvisorError::AlreadyFinalized { .. }));
    assert_eq!(err.status_code(), 409);
    assert_eq!(advisor.history().unwrap()[0].outcome, Outcome::Failed);
}

#[test]
fn test_feedback_for_unknown_session() {
    let advisor = Advisor::in_memory();
    let err = advisor.submit_feedback("no-such-session", "FAILED").unwrap_err();
    assert!(matches!(err, AdvisorError::NotFound { .. }));
    assert!(advisor.history().unwrap().is_empty());
}

#[test]
fn test_feedback_outcome_is_case_insensitive() {
    let advisor = Advisor::in_memory();
    let d = advisor.diagnose(&crash()).unwrap();
    let receipt = advisor.submit_feedback(&d.session_id, "  failed ").unwrap();
    assert_eq!(receipt.outcome, Outcome::Failed);
    assert!(advisor.submit_feedback(&d.session_id, "PENDING").is_err());
}

#[test]
fn test_concurrent_feedback_finalizes_once() {
    let advisor = Arc::new(Advisor::in_memory());
    let d = advisor.diagnose(&crash()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let advisor = Arc::clone(&advisor);
            let id = d.session_id.clone();
            thread::spawn(move || {
                let outcome = if i % 2 == 0 { "FAILED" } else { "SUCCEEDED" };
                advisor.submit_feedback(&id, outcome).is_ok()
            })
        })
        .collect();
    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(wins, 1);
    assert!(advisor.history().unwrap()[0].outcome.is_terminal());
}

#[test]
fn test_concurrent_diagnoses_are_all_recorded() {
    let advisor = Arc::new(Advisor::in_memory());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let advisor = Arc::clone(&advisor);
            thread::spawn(move || {
                for _ in 0..10 {
                    let id = fail_once(&advisor, &crash());
                    assert!(!id.is_empty());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stats = advisor.stats().unwrap();
    assert_eq!(stats.totals.sessions, 80);
    assert_eq!(stats.totals.failed, 80);
}
