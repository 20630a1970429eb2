//! Scan results

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::enumerate::{AttemptError, Finding};

/// A candidate that ended in an error other than a plain rejection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAttempt {
    pub identifier: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub host: String,
    pub port: u16,
    pub findings: Vec<Finding>,
    /// Candidates the region answered "not recognized" to
    pub rejected: usize,
    pub errors: Vec<FailedAttempt>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScanReport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            findings: Vec::new(),
            rejected: 0,
            errors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record(&mut self, identifier: &str, result: Result<Finding, AttemptError>) {
        match result {
            Ok(finding) => self.findings.push(finding),
            Err(e) if e.is_rejection() => self.rejected += 1,
            Err(e) => self.errors.push(FailedAttempt {
                identifier: identifier.to_uppercase(),
                error: e.to_string(),
            }),
        }
    }

    /// Candidates with a result
    pub fn attempted(&self) -> usize {
        self.findings.len() + self.rejected + self.errors.len()
    }

    /// Stamp the end time and sort findings by ID
    pub fn finish(&mut self) {
        self.findings
            .sort_by(|a, b| a.identifier.cmp(&b.identifier));
        self.errors.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        self.finished_at = Some(Utc::now());
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Target: {}:{}", self.host, self.port);
        let _ = writeln!(
            out,
            "Tried {} transaction IDs: {} valid, {} rejected, {} errors",
            self.attempted(),
            self.findings.len(),
            self.rejected,
            self.errors.len()
        );
        if let Some(finished) = self.finished_at {
            let elapsed = finished - self.started_at;
            let _ = writeln!(out, "Elapsed: {}s", elapsed.num_seconds());
        }

        if !self.findings.is_empty() {
            let _ = writeln!(out, "\nValid transactions:");
            for finding in &self.findings {
                let _ = writeln!(out, "  {}", finding);
            }
        }

        if !self.errors.is_empty() {
            let _ = writeln!(out, "\nErrors:");
            for failed in &self.errors {
                let _ = writeln!(out, "  {}: {}", failed.identifier, failed.error);
            }
        }
        out
    }
}
