//! Free-text problem reports, appended to a JSON array on disk.
//!
//! Reports are unrelated to diagnostic sessions. The file is read in full,
//! extended and rewritten on every append; a missing or unreadable file is
//! treated as an empty list.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::advisor::now_ms;
use crate::error::{AdvisorError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemReport {
    pub id: String,
    pub description: String,
    pub created_at_ms: u64,
}

pub trait ReportStore: Send + Sync {
    fn append(&self, description: &str) -> Result<ProblemReport>;
    fn list(&self) -> Result<Vec<ProblemReport>>;
}

/// Report store backed by a pretty-printed JSON file.
pub struct JsonFileReportStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Vec<ProblemReport> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "report file unreadable, treating as empty");
            Vec::new()
        })
    }

    fn write_all(&self, reports: &[ProblemReport]) -> Result<()> {
        let json = serde_json::to_string_pretty(reports)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ReportStore for JsonFileReportStore {
    fn append(&self, description: &str) -> Result<ProblemReport> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AdvisorError::validation("report description must not be empty"));
        }
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AdvisorError::poisoned("report file"))?;

        let report = ProblemReport {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.to_string(),
            created_at_ms: now_ms(),
        };
        let mut reports = self.read_all();
        reports.push(report.clone());
        self.write_all(&reports)?;
        info!(report_id = %report.id, total = reports.len(), "problem report saved");
        Ok(report)
    }

    fn list(&self) -> Result<Vec<ProblemReport>> {
        Ok(self.read_all())
    }
}
