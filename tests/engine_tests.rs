use diagnostic_advisor::engine::{evaluate, rules, DiagnosisCode};
use diagnostic_advisor::symptoms::{Symptom, SymptomVector};
use proptest::prelude::*;
use rstest::rstest;

use Symptom::*;

fn vector(symptoms: &[Symptom]) -> SymptomVector {
    SymptomVector::from_symptoms(symptoms.iter().copied())
}

#[rstest]
#[case(&[RecentCriticalFailure, AppCrashes], DiagnosisCode::CriticalSystemCorruption)]
#[case(&[RecentCriticalFailure, InstallOrUpdateFailed], DiagnosisCode::CriticalSystemCorruption)]
#[case(&[AppSluggishOrFrozen, InstallOrUpdateFailed], DiagnosisCode::SoftwareOrLibraryConflict)]
#[case(&[AppCrashes, InstallOrUpdateFailed], DiagnosisCode::SoftwareOrLibraryConflict)]
#[case(&[AppCrashes], DiagnosisCode::ReinstallAppClearCache)]
#[case(&[AppCrashes, AppSluggishOrFrozen], DiagnosisCode::ReinstallAppClearCache)]
#[case(&[InstallOrUpdateFailed], DiagnosisCode::RetryAsAdministrator)]
#[case(&[AppSluggishOrFrozen], DiagnosisCode::KillTaskAndRestartApp)]
#[case(&[AppSluggishOrFrozen, PeripheralNotDetected], DiagnosisCode::KillTaskAndRestartApp)]
#[case(&[PeripheralNotDetected], DiagnosisCode::UpdateDriverOrPort)]
#[case(&[RecentCriticalFailure], DiagnosisCode::SimpleSystemRestart)]
#[case(&[], DiagnosisCode::SimpleSystemRestart)]
fn test_rule_table(#[case] symptoms: &[Symptom], #[case] expected: DiagnosisCode) {
    assert_eq!(evaluate(&vector(symptoms)).code, expected);
}

#[test]
fn test_conflict_rule_beats_reinstall_rule() {
    let both = vector(&[AppCrashes, InstallOrUpdateFailed]);
    assert!(rules()[2].matches(&both));
    assert_eq!(evaluate(&both).code, DiagnosisCode::SoftwareOrLibraryConflict);
}

#[test]
fn test_rules_are_in_priority_order_with_fallback_last() {
    let priorities: Vec<u8> = rules().iter().map(|r| r.priority).collect();
    assert_eq!(priorities, vec![1, 2, 3, 4, 5, 6, 7]);
    let last = rules().last().unwrap();
    assert_eq!(last.code, DiagnosisCode::SimpleSystemRestart);
    assert!(last.matches(&SymptomVector::default()));
    assert!(rules().iter().all(|r| r.code != DiagnosisCode::ConsultSpecialist));
}

#[test]
fn test_every_rule_has_text_and_steps() {
    for rule in rules() {
        assert!(!rule.justification.is_empty());
        assert!(!rule.summary.is_empty());
        assert!(rule.steps.len() >= 2, "{} has too few steps", rule.code);
    }
}

fn any_vector() -> impl Strategy<Value = SymptomVector> {
    proptest::collection::vec(any::<bool>(), 5).prop_map(|flags| {
        let mut v = SymptomVector::default();
        for (symptom, on) in Symptom::ALL.iter().zip(flags) {
            v.set(*symptom, on);
        }
        v
    })
}

proptest! {
    #[test]
    fn prop_evaluate_is_total_and_deterministic(v in any_vector()) {
        let a = evaluate(&v);
        let b = evaluate(&v);
        prop_assert_eq!(&a, &b);
        prop_assert!(!a.action_steps.is_empty());
        prop_assert_ne!(a.code, DiagnosisCode::ConsultSpecialist);
    }

    #[test]
    fn prop_critical_with_crash_is_always_critical(v in any_vector()) {
        let v = v.with(RecentCriticalFailure).with(AppCrashes);
        prop_assert_eq!(evaluate(&v).code, DiagnosisCode::CriticalSystemCorruption);
    }

    #[test]
    fn prop_result_comes_from_first_matching_rule(v in any_vector()) {
        let first = rules().iter().find(|r| r.matches(&v)).unwrap();
        prop_assert_eq!(evaluate(&v).code, first.code);
    }

    #[test]
    fn prop_insertion_order_does_not_matter(
        picks in proptest::sample::subsequence(Symptom::ALL.to_vec(), 0..=5)
    ) {
        let forward = SymptomVector::from_symptoms(picks.iter().copied());
        let backward = SymptomVector::from_symptoms(picks.iter().rev().copied());
        prop_assert_eq!(evaluate(&forward), evaluate(&backward));
    }
}
