//! Normalized detection signals
//!
//! A [`Signal`] is one piece of evidence extracted from the project tree: a
//! declared dependency, the presence of a marker file or directory, or a
//! config key in a manifest. Signals are created per scan, fed to the rule
//! engine, and discarded after scoring.

mod extractor;

pub use extractor::{extract, is_manifest, ExtractionOutcome, MANIFEST_FILES};

use std::path::PathBuf;

/// The kind and value of one piece of evidence
#[derive(Debug, Clone, PartialEq)]
pub enum SignalKind {
    /// A declared dependency with an optional raw version range
    Dependency {
        name: String,
        version: Option<String>,
    },
    /// A marker file exists; variant-normalized (e.g. `next.config.ts`
    /// emits `next.config`)
    FilePresence(String),
    /// A top-level directory exists
    DirPresence(String),
    /// A notable key was declared in a manifest (e.g. `workspaces`)
    ConfigKey(String),
}

/// One piece of evidence extracted from a file
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// File the signal was extracted from, relative to the scan root
    pub source: PathBuf,
    pub kind: SignalKind,
}

impl Signal {
    pub fn dependency(source: PathBuf, name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            source,
            kind: SignalKind::Dependency {
                name: name.into(),
                version,
            },
        }
    }

    pub fn file_presence(source: PathBuf, marker: impl Into<String>) -> Self {
        Self {
            source,
            kind: SignalKind::FilePresence(marker.into()),
        }
    }

    pub fn dir_presence(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source: PathBuf::from(&name),
            kind: SignalKind::DirPresence(name),
        }
    }

    pub fn config_key(source: PathBuf, key: impl Into<String>) -> Self {
        Self {
            source,
            kind: SignalKind::ConfigKey(key.into()),
        }
    }

    /// Declared version for a dependency signal with the range syntax
    /// (`^`, `~`, `>=`, `v` prefix) stripped
    pub fn normalized_version(&self) -> Option<String> {
        match &self.kind {
            SignalKind::Dependency {
                version: Some(v), ..
            } => Some(normalize_version(v)),
            _ => None,
        }
    }
}

/// Strip version-range syntax from a declared version
pub fn normalize_version(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(['^', '~', '=', '>', '<', 'v', ' '])
        .trim()
        .to_string()
}
