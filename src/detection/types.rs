//! Detection result types

use crate::monorepo::WorkspaceMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Framework name reported when no candidate clears the threshold
pub const UNKNOWN_FRAMEWORK: &str = "unknown";

/// Final stack determination for a (sub-)project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionResult {
    /// Winning framework name, or `"unknown"`
    pub framework: String,
    /// Normalized framework version if a dependency declared one
    pub version: Option<String>,
    /// Primary language (`"unknown"` for unknown results)
    pub language: String,
    /// Confidence in [0, 1]; for unknown results this is the best score
    /// found, so callers can see how close detection came
    pub confidence: f64,
    /// Detected tools grouped by category (testing, styling, database, ...)
    pub tools: BTreeMap<String, Vec<String>>,
    /// Downstream template identifiers recommended for this stack
    pub recommended_templates: Vec<String>,
    /// Human-readable strings naming the signals that matched
    pub evidence: Vec<String>,
    /// Non-fatal notes, e.g. manifests that failed to parse
    pub diagnostics: Vec<String>,
    /// True when a scan budget terminated the walk early
    pub partial: bool,
    /// Fingerprint of the manifest set this result was computed from
    pub fingerprint: String,
    pub computed_at: DateTime<Utc>,
}

impl DetectionResult {
    /// Build an "unknown" result carrying the best confidence found
    pub fn unknown(confidence: f64, fingerprint: String) -> Self {
        Self {
            framework: UNKNOWN_FRAMEWORK.to_string(),
            version: None,
            language: UNKNOWN_FRAMEWORK.to_string(),
            confidence,
            tools: BTreeMap::new(),
            recommended_templates: Vec::new(),
            evidence: Vec::new(),
            diagnostics: Vec::new(),
            partial: false,
            fingerprint,
            computed_at: Utc::now(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.framework == UNKNOWN_FRAMEWORK
    }
}

impl fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.0}% confidence, {})",
            self.framework,
            self.confidence * 100.0,
            self.language
        )
    }
}

/// Top-level detection output: the authoritative result for the project
/// path, plus the per-package map for workspaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionOutcome {
    /// Single-project result, or the workspace aggregate
    pub result: DetectionResult,
    /// Present when workspace markers were found at the root
    pub workspace: Option<WorkspaceMap>,
}

impl DetectionOutcome {
    pub fn single(result: DetectionResult) -> Self {
        Self {
            result,
            workspace: None,
        }
    }
}
