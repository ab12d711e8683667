//! # Rule Engine
//!
//! Maps a [`SymptomVector`] to a [`DiagnosisResult`] by walking a static,
//! ordered rule table. The first rule whose predicate holds wins; later rules
//! are never consulted. When nothing matches, the fallback rule applies, so
//! [`evaluate`] is total.
//!
//! The engine is pure: no I/O, no shared state.

use serde::{Deserialize, Serialize};

use crate::symptoms::SymptomVector;

// ---------------------------------------------------------------------------
// DiagnosisCode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosisCode {
    CriticalSystemCorruption,
    SoftwareOrLibraryConflict,
    ReinstallAppClearCache,
    RetryAsAdministrator,
    KillTaskAndRestartApp,
    UpdateDriverOrPort,
    SimpleSystemRestart,
    /// Escalation code set by the pattern tracker. Never produced by the rules.
    ConsultSpecialist,
}

impl DiagnosisCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosisCode::CriticalSystemCorruption => "CRITICAL_SYSTEM_CORRUPTION",
            DiagnosisCode::SoftwareOrLibraryConflict => "SOFTWARE_OR_LIBRARY_CONFLICT",
            DiagnosisCode::ReinstallAppClearCache => "REINSTALL_APP_CLEAR_CACHE",
            DiagnosisCode::RetryAsAdministrator => "RETRY_AS_ADMINISTRATOR",
            DiagnosisCode::KillTaskAndRestartApp => "KILL_TASK_AND_RESTART_APP",
            DiagnosisCode::UpdateDriverOrPort => "UPDATE_DRIVER_OR_PORT",
            DiagnosisCode::SimpleSystemRestart => "SIMPLE_SYSTEM_RESTART",
            DiagnosisCode::ConsultSpecialist => "CONSULT_SPECIALIST",
        }
    }

    pub fn is_escalation(self) -> bool {
        self == DiagnosisCode::ConsultSpecialist
    }
}

impl std::fmt::Display for DiagnosisCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single recommendation returned once a pattern alert fires.
pub const ESCALATION_STEP: &str = "Contact a specialized technician.";

// ---------------------------------------------------------------------------
// DiagnosisResult
// ---------------------------------------------------------------------------

/// Output of one evaluation. The summary line is kept apart from the action
/// steps so callers never have to strip it out of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub code: DiagnosisCode,
    pub justification: String,
    pub summary: String,
    pub action_steps: Vec<String>,
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// One row of the decision table.
#[derive(Debug)]
pub struct Rule {
    /// 1 is evaluated first.
    pub priority: u8,
    pub code: DiagnosisCode,
    pub when: fn(&SymptomVector) -> bool,
    pub justification: &'static str,
    pub summary: &'static str,
    pub steps: &'static [&'static str],
}

impl Rule {
    pub fn matches(&self, symptoms: &SymptomVector) -> bool {
        (self.when)(symptoms)
    }

    fn to_result(&self) -> DiagnosisResult {
        DiagnosisResult {
            code: self.code,
            justification: self.justification.to_string(),
            summary: self.summary.to_string(),
            action_steps: self.steps.iter().map(|s| s.to_string()).collect(),
        }
    }
}

static RULES: [Rule; 7] = [
    Rule {
        priority: 1,
        code: DiagnosisCode::CriticalSystemCorruption,
        when: |s| s.recent_critical_failure && (s.app_crashes || s.install_or_update_failed),
        justification: "A recent blue/black screen together with software failures points to \
            corruption in the operating system kernel or a conflict between essential low-level drivers.",
        summary: "Critical: the problem sits at operating system / driver level and needs a deep recovery.",
        steps: &[
            "Boot into Safe Mode and run Startup Repair or restore the system to an earlier stable point.",
            "If recovery fails, reinstall the operating system cleanly or boot from recovery media.",
            "Back up personal files before any reinstall.",
        ],
    },
    Rule {
        priority: 2,
        code: DiagnosisCode::SoftwareOrLibraryConflict,
        when: |s| (s.app_sluggish_or_frozen || s.app_crashes) && s.install_or_update_failed,
        justification: "An application misbehaves right after an installation or update attempt. \
            This suggests a direct library (DLL) or software version conflict.",
        summary: "Software conflict or resource shortage after a recent change.",
        steps: &[
            "Roll back or uninstall the most recently installed application that matches the time of the failure.",
            "Disable startup programs temporarily (msconfig) to isolate the conflict.",
            "Reinstall the affected application once the conflicting change is removed.",
        ],
    },
    Rule {
        priority: 3,
        code: DiagnosisCode::ReinstallAppClearCache,
        when: |s| s.app_crashes,
        justification: "An application closing on its own without signs of system failure usually \
            means local corruption of the application's files or an application-specific memory error.",
        summary: "The application is corrupted, outdated or has a memory error.",
        steps: &[
            "Reinstall the application, clearing its cache where possible.",
            "Update to the latest version published by the developer.",
            "Check the minimum RAM/CPU requirements; the crash may be a resource limit.",
        ],
    },
    Rule {
        priority: 4,
        code: DiagnosisCode::RetryAsAdministrator,
        when: |s| s.install_or_update_failed,
        justification: "The installation failed on its own. This is usually a matter of insufficient \
            permissions or a missing prerequisite (e.g. .NET Framework, Visual C++ Redistributable).",
        summary: "Permission or prerequisite problem.",
        steps: &[
            "Run the installer again as Administrator.",
            "Temporarily disable the antivirus or firewall before retrying.",
            "Install common software prerequisites manually.",
        ],
    },
    Rule {
        priority: 5,
        code: DiagnosisCode::KillTaskAndRestartApp,
        when: |s| s.app_sluggish_or_frozen,
        justification: "Slowness or freezing is the most common symptom of a memory leak or of the \
            CPU being saturated by background processes.",
        summary: "Temporary resource exhaustion or memory leak.",
        steps: &[
            "Close the application from the Task Manager, or restart it, to release memory.",
            "Look for processes with high resource usage in the Task Manager and end them.",
        ],
    },
    Rule {
        priority: 6,
        code: DiagnosisCode::UpdateDriverOrPort,
        when: |s| s.peripheral_not_detected,
        justification: "An undetected peripheral is a driver problem or a fault in the physical port \
            it is connected to.",
        summary: "Hardware detection problem or missing driver.",
        steps: &[
            "Unplug the peripheral and connect it to a different USB port to rule out the port.",
            "Open Device Manager and update or reinstall the device driver to force detection.",
        ],
    },
    Rule {
        priority: 7,
        code: DiagnosisCode::SimpleSystemRestart,
        when: |_| true,
        justification: "No specific symptoms were reported. The failure is assumed to be intermittent or unknown.",
        summary: "No specific symptoms detected.",
        steps: &[
            "Save open work and close running applications.",
            "Restart the computer completely to clear memory and intermittent faults.",
        ],
    },
];

/// The decision table in evaluation order. The last row always matches.
pub fn rules() -> &'static [Rule] {
    &RULES
}

/// Evaluate the rule table against `symptoms`. First match wins.
pub fn evaluate(symptoms: &SymptomVector) -> DiagnosisResult {
    let fallback = &RULES[RULES.len() - 1];
    RULES
        .iter()
        .find(|rule| rule.matches(symptoms))
        .unwrap_or(fallback)
        .to_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symptoms::Symptom;

    #[test]
    fn test_rules_are_in_priority_order() {
        let priorities: Vec<u8> = rules().iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_fallback_rule_matches_everything() {
        let last = rules().last().unwrap();
        assert_eq!(last.code, DiagnosisCode::SimpleSystemRestart);
        assert!(last.matches(&SymptomVector::default()));
        assert!(last.matches(&SymptomVector::from_symptoms(Symptom::ALL)));
    }

    #[test]
    fn test_no_rule_produces_escalation_code() {
        assert!(rules().iter().all(|r| !r.code.is_escalation()));
    }

    #[test]
    fn test_every_rule_has_two_to_four_steps() {
        for rule in rules() {
            assert!(
                (2..=4).contains(&rule.steps.len()),
                "rule {} has {} steps",
                rule.priority,
                rule.steps.len()
            );
        }
    }

    #[test]
    fn test_summary_is_not_part_of_steps() {
        for rule in rules() {
            assert!(!rule.steps.contains(&rule.summary));
        }
    }

    #[test]
    fn test_empty_vector_restarts() {
        let result = evaluate(&SymptomVector::default());
        assert_eq!(result.code, DiagnosisCode::SimpleSystemRestart);
    }

    #[test]
    fn test_critical_failure_alone_falls_through_to_restart() {
        let v = SymptomVector::default().with(Symptom::RecentCriticalFailure);
        assert_eq!(evaluate(&v).code, DiagnosisCode::SimpleSystemRestart);
    }

    #[test]
    fn test_crash_alone_reinstalls_with_three_steps() {
        let result = evaluate(&SymptomVector::default().with(Symptom::AppCrashes));
        assert_eq!(result.code, DiagnosisCode::ReinstallAppClearCache);
        assert_eq!(result.action_steps.len(), 3);
        assert!(result.justification.contains("corruption"));
    }

    #[test]
    fn test_code_display_matches_serde() {
        for rule in rules() {
            let json = serde_json::to_string(&rule.code).unwrap();
            assert_eq!(json, format!("\"{}\"", rule.code));
        }
        assert_eq!(DiagnosisCode::ConsultSpecialist.to_string(), "CONSULT_SPECIALIST");
    }
}
