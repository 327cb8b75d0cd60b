//! Manual override files
//!
//! Users can pin the detected stack (`.stack.yml`) or phase (`.phase.yml`)
//! at the project root. Overrides always win over computed detection and are
//! checked before any cache lookup, so cache-invalidation ordering can never
//! shadow them.
//!
//! A malformed override is the one hard error in the engine: silently
//! falling back to computed detection would mask a possibly-wrong result the
//! user explicitly tried to correct. Errors name the offending file and
//! field.

use crate::phase::Phase;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Stack override filename at the project root
pub const STACK_OVERRIDE_FILE: &str = ".stack.yml";

/// Phase override filename at the project root
pub const PHASE_OVERRIDE_FILE: &str = ".phase.yml";

#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("Override file {file} is not valid YAML: {detail}")]
    Malformed { file: PathBuf, detail: String },
    #[error("Override file {file} is missing required field '{field}'")]
    MissingField { file: PathBuf, field: &'static str },
    #[error(
        "Override file {file} has invalid value '{value}' for field '{field}' \
         (expected one of: prototype, mvp, production)"
    )]
    InvalidPhase {
        file: PathBuf,
        field: &'static str,
        value: String,
    },
}

/// User-pinned stack result
#[derive(Debug, Clone, PartialEq)]
pub struct StackOverride {
    pub framework: String,
    pub version: Option<String>,
    pub language: Option<String>,
}

/// User-pinned phase result
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOverride {
    pub phase: Phase,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
struct RawStackOverride {
    framework: Option<String>,
    version: Option<String>,
    language: Option<String>,
}

#[derive(Deserialize)]
struct RawPhaseOverride {
    phase: Option<String>,
    reason: Option<String>,
    expires: Option<DateTime<Utc>>,
}

/// Load the stack override if present. Absence is `Ok(None)`; a present but
/// malformed file is a hard error.
pub fn load_stack_override(root: &Path) -> Result<Option<StackOverride>, OverrideError> {
    let file = root.join(STACK_OVERRIDE_FILE);
    let Ok(content) = fs::read_to_string(&file) else {
        return Ok(None);
    };

    let raw: RawStackOverride =
        serde_yaml::from_str(&content).map_err(|e| OverrideError::Malformed {
            file: file.clone(),
            detail: e.to_string(),
        })?;

    let framework = raw.framework.ok_or(OverrideError::MissingField {
        file: file.clone(),
        field: "framework",
    })?;

    info!(framework = %framework, "Stack override active from {}", file.display());
    Ok(Some(StackOverride {
        framework,
        version: raw.version,
        language: raw.language,
    }))
}

/// Load the phase override if present and unexpired. An expired override is
/// ignored, reverting to computed detection.
pub fn load_phase_override(root: &Path) -> Result<Option<PhaseOverride>, OverrideError> {
    let file = root.join(PHASE_OVERRIDE_FILE);
    let Ok(content) = fs::read_to_string(&file) else {
        return Ok(None);
    };

    let raw: RawPhaseOverride =
        serde_yaml::from_str(&content).map_err(|e| OverrideError::Malformed {
            file: file.clone(),
            detail: e.to_string(),
        })?;

    let phase_str = raw.phase.ok_or(OverrideError::MissingField {
        file: file.clone(),
        field: "phase",
    })?;

    let phase = Phase::parse(&phase_str).ok_or_else(|| OverrideError::InvalidPhase {
        file: file.clone(),
        field: "phase",
        value: phase_str.clone(),
    })?;

    if let Some(expires) = raw.expires {
        if expires < Utc::now() {
            debug!(
                expires = %expires,
                "Phase override expired, reverting to computed detection"
            );
            return Ok(None);
        }
    }

    info!(phase = %phase, "Phase override active from {}", file.display());
    Ok(Some(PhaseOverride {
        phase,
        reason: raw.reason,
    }))
}
