//! Closed symptom catalog and the symptom vector submitted by callers.
//!
//! Identity for pattern matching is the *set* of active flags, represented as
//! a [`SymptomSet`] bitmask so comparison is order-independent and exact.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    AppSluggishOrFrozen,
    AppCrashes,
    InstallOrUpdateFailed,
    RecentCriticalFailure,
    PeripheralNotDetected,
}

impl Symptom {
    /// Every symptom in catalog order.
    pub const ALL: [Symptom; 5] = [
        Symptom::AppSluggishOrFrozen,
        Symptom::AppCrashes,
        Symptom::InstallOrUpdateFailed,
        Symptom::RecentCriticalFailure,
        Symptom::PeripheralNotDetected,
    ];

    /// Wire name, identical to the JSON field of [`SymptomVector`].
    pub fn key(self) -> &'static str {
        match self {
            Symptom::AppSluggishOrFrozen => "app_sluggish_or_frozen",
            Symptom::AppCrashes => "app_crashes",
            Symptom::InstallOrUpdateFailed => "install_or_update_failed",
            Symptom::RecentCriticalFailure => "recent_critical_failure",
            Symptom::PeripheralNotDetected => "peripheral_not_detected",
        }
    }

    /// Human-readable label shown next to a diagnosis.
    pub fn label(self) -> &'static str {
        match self {
            Symptom::AppSluggishOrFrozen => "Application slow or frozen",
            Symptom::AppCrashes => "Application closes unexpectedly",
            Symptom::InstallOrUpdateFailed => "Installation / update failed",
            Symptom::RecentCriticalFailure => "Recent blue or black screen (BSOD)",
            Symptom::PeripheralNotDetected => "Peripheral (USB/camera) not detected",
        }
    }

    /// Parse a wire name, ignoring case, surrounding whitespace and `-`/`_`.
    pub fn from_str_loose(s: &str) -> Result<Self, String> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Symptom::ALL
            .into_iter()
            .find(|sym| sym.key() == normalized)
            .ok_or_else(|| format!("Unknown symptom: {}", s))
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for Symptom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// SymptomSet
// ---------------------------------------------------------------------------

/// Set of active symptoms. Two sets are equal only if they contain exactly the
/// same flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SymptomSet(u8);

impl SymptomSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn contains(self, symptom: Symptom) -> bool {
        self.0 & symptom.bit() != 0
    }

    pub fn insert(&mut self, symptom: Symptom) {
        self.0 |= symptom.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Active symptoms in catalog order.
    pub fn iter(self) -> impl Iterator<Item = Symptom> {
        Symptom::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl FromIterator<Symptom> for SymptomSet {
    fn from_iter<I: IntoIterator<Item = Symptom>>(iter: I) -> Self {
        let mut set = SymptomSet::empty();
        for symptom in iter {
            set.insert(symptom);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// SymptomVector
// ---------------------------------------------------------------------------

/// The boolean flags a caller reports. Missing fields default to `false`;
/// unknown fields and non-boolean values are rejected during deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SymptomVector {
    pub app_sluggish_or_frozen: bool,
    pub app_crashes: bool,
    pub install_or_update_failed: bool,
    pub recent_critical_failure: bool,
    pub peripheral_not_detected: bool,
}

impl SymptomVector {
    /// Vector with exactly the given symptoms active.
    pub fn from_symptoms<I: IntoIterator<Item = Symptom>>(symptoms: I) -> Self {
        let mut vector = SymptomVector::default();
        for symptom in symptoms {
            vector.set(symptom, true);
        }
        vector
    }

    /// Builder-style helper used heavily by tests and the CLI.
    pub fn with(mut self, symptom: Symptom) -> Self {
        self.set(symptom, true);
        self
    }

    pub fn is_active(&self, symptom: Symptom) -> bool {
        match symptom {
            Symptom::AppSluggishOrFrozen => self.app_sluggish_or_frozen,
            Symptom::AppCrashes => self.app_crashes,
            Symptom::InstallOrUpdateFailed => self.install_or_update_failed,
            Symptom::RecentCriticalFailure => self.recent_critical_failure,
            Symptom::PeripheralNotDetected => self.peripheral_not_detected,
        }
    }

    pub fn set(&mut self, symptom: Symptom, value: bool) {
        let slot = match symptom {
            Symptom::AppSluggishOrFrozen => &mut self.app_sluggish_or_frozen,
            Symptom::AppCrashes => &mut self.app_crashes,
            Symptom::InstallOrUpdateFailed => &mut self.install_or_update_failed,
            Symptom::RecentCriticalFailure => &mut self.recent_critical_failure,
            Symptom::PeripheralNotDetected => &mut self.peripheral_not_detected,
        };
        *slot = value;
    }

    pub fn active(&self) -> SymptomSet {
        Symptom::ALL
            .into_iter()
            .filter(|s| self.is_active(*s))
            .collect()
    }

    pub fn active_labels(&self) -> Vec<&'static str> {
        self.active().iter().map(Symptom::label).collect()
    }
}
