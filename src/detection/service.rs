//! Detection pipeline orchestration
//!
//! [`DetectionService`] wires the pipeline together: override check, then
//! cache probe, then scan → extract → evaluate → score, then cache write.
//! Overrides are checked before any cache lookup so cache-invalidation
//! ordering can never shadow them. Workspace roots fan out into one
//! isolated pipeline run per sub-package.
//!
//! The cache is strictly advisory here: any cache failure is downgraded to
//! a warning and detection proceeds uncached.

use crate::cache::{
    fingerprint, project_key, CacheEntry, CacheLookup, DetectionCache, FileCache,
};
use crate::config::StackprobeConfig;
use crate::detection::tools::collect_tools;
use crate::detection::types::{DetectionOutcome, DetectionResult};
use crate::monorepo::{self, WorkspaceMap, WorkspacePackage};
use crate::overrides::{self, OverrideError, StackOverride};
use crate::phase::{self, PhaseResult};
use crate::rules::{evaluate, FrameworkCandidate, FrameworkId};
use crate::scanner::{self, ScanConfig, ScanError, ScanOutcome};
use crate::scoring::{pick_winner, Verdict};
use crate::signals::{self, Signal, SignalKind};
use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Override(#[from] OverrideError),
}

/// Pipeline entry point. Construct once per invocation; all methods are
/// synchronous and bounded by the scan budgets.
pub struct DetectionService {
    config: StackprobeConfig,
    cache: Option<Box<dyn DetectionCache>>,
}

impl DetectionService {
    /// Build with the on-disk cache when enabled. A cache store that cannot
    /// be created downgrades to uncached operation.
    pub fn new(config: StackprobeConfig) -> Self {
        let cache: Option<Box<dyn DetectionCache>> = if config.cache_enabled {
            match FileCache::new(
                config.cache_dir.clone(),
                config.cache_ttl,
                config.cache_lock_timeout,
            ) {
                Ok(cache) => Some(Box::new(cache)),
                Err(err) => {
                    warn!(error = %err, "Cache store unavailable, proceeding uncached");
                    None
                }
            }
        } else {
            None
        };
        Self { config, cache }
    }

    /// Build with an injected cache implementation
    pub fn with_cache(config: StackprobeConfig, cache: Box<dyn DetectionCache>) -> Self {
        Self {
            config,
            cache: Some(cache),
        }
    }

    /// Build with no cache at all
    pub fn uncached(config: StackprobeConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    /// Detect the stack for a project root. Workspace roots produce one
    /// result per sub-package plus an aggregate.
    pub fn detect(&self, root: &Path) -> Result<DetectionOutcome, DetectError> {
        if let Some(ovr) = overrides::load_stack_override(root)? {
            return Ok(DetectionOutcome::single(override_result(ovr)));
        }

        if let Some(spec) = monorepo::detect_markers(root) {
            info!(manager = spec.manager.name(), "Workspace markers found");
            let package_dirs = monorepo::expand_packages(root, &spec.patterns);
            let mut packages = Vec::with_capacity(package_dirs.len());
            for dir in &package_dirs {
                let result = self.detect_single(dir)?;
                packages.push(WorkspacePackage {
                    name: monorepo::package_name(dir),
                    path: dir.strip_prefix(root).unwrap_or(dir).to_path_buf(),
                    result,
                });
            }

            // The aggregate is the highest-confidence sub-package result;
            // ties keep the first in sorted package order.
            let mut aggregate: Option<&DetectionResult> = None;
            for package in &packages {
                match aggregate {
                    Some(best) if package.result.confidence <= best.confidence => {}
                    _ => aggregate = Some(&package.result),
                }
            }
            let aggregate = aggregate
                .cloned()
                .unwrap_or_else(|| DetectionResult::unknown(0.0, String::new()));

            return Ok(DetectionOutcome {
                result: aggregate,
                workspace: Some(WorkspaceMap {
                    root: root.to_path_buf(),
                    manager: spec.manager,
                    packages,
                }),
            });
        }

        Ok(DetectionOutcome::single(self.detect_single(root)?))
    }

    /// Run the pipeline for one (sub-)project directory.
    fn detect_single(&self, root: &Path) -> Result<DetectionResult, DetectError> {
        let scan_config = ScanConfig {
            max_files: self.config.max_files,
            timeout: self.config.scan_timeout,
        };
        let scan = scanner::scan(root, &scan_config)?;

        // Manifest set for the fingerprint comes from the file list alone,
        // so a cache hit skips manifest parsing entirely.
        let manifests: Vec<PathBuf> = scan
            .files
            .iter()
            .filter(|f| f.parent() == Some(root) && signals::is_manifest(f))
            .cloned()
            .collect();
        let fp = fingerprint(root, &manifests);
        let key = project_key(root);

        if let Some(cache) = &self.cache {
            match cache.get(&key, &fp) {
                Ok(CacheLookup::Hit(entry)) => {
                    debug!(key, "Returning cached result");
                    return Ok(entry.result);
                }
                Ok(CacheLookup::Miss) => {}
                Err(err) => warn!(error = %err, "Cache probe failed, recomputing"),
            }
        }

        let result = compute(root, &scan, fp);

        if let Some(cache) = &self.cache {
            let entry = CacheEntry::new(
                result.fingerprint.clone(),
                result.clone(),
                self.config.cache_ttl,
            );
            if let Err(err) = cache.put(&key, entry) {
                warn!(error = %err, "Cache write failed, result not persisted");
            }
        }

        Ok(result)
    }

    /// Compute the maturity phase for a project root. A `.phase.yml`
    /// override short-circuits indicator voting; computed phases are never
    /// cached.
    pub fn phase(&self, root: &Path) -> Result<PhaseResult, DetectError> {
        if let Some(ovr) = overrides::load_phase_override(root)? {
            return Ok(PhaseResult::overridden(ovr.phase, ovr.reason));
        }

        let scan_config = ScanConfig {
            max_files: self.config.max_files,
            timeout: self.config.scan_timeout,
        };
        let scan = scanner::scan(root, &scan_config)?;
        Ok(phase::detect(root, &scan.files))
    }
}

/// Scan-to-result computation, pure apart from manifest reads
fn compute(root: &Path, scan: &ScanOutcome, fp: String) -> DetectionResult {
    let extraction = signals::extract(root, &scan.files);
    let candidates = evaluate(&extraction.signals);

    let mut result = match pick_winner(&candidates) {
        Verdict::Detected {
            candidate,
            confidence,
        } => detected_result(&candidate, confidence, &extraction.signals, fp),
        Verdict::Unknown { best_confidence } => DetectionResult::unknown(best_confidence, fp),
    };

    result.diagnostics = extraction.diagnostics;
    result.partial = scan.partial;
    info!(
        framework = %result.framework,
        confidence = result.confidence,
        partial = result.partial,
        "Detection complete for {}",
        root.display()
    );
    result
}

fn detected_result(
    candidate: &FrameworkCandidate,
    confidence: f64,
    signals: &[Signal],
    fp: String,
) -> DetectionResult {
    let framework = candidate.framework;
    let version = framework_version(framework, signals);
    let language = refine_language(framework, signals);

    let mut templates: Vec<String> = framework
        .templates()
        .iter()
        .map(|t| t.to_string())
        .collect();
    if language == "typescript" {
        templates.push("type-checker".to_string());
    }

    DetectionResult {
        framework: framework.name().to_string(),
        version,
        language: language.to_string(),
        confidence,
        tools: collect_tools(signals),
        recommended_templates: templates,
        evidence: candidate.evidence.clone(),
        diagnostics: Vec::new(),
        partial: false,
        fingerprint: fp,
        computed_at: Utc::now(),
    }
}

/// Declared version of the winning framework's version-source dependency.
/// Module-path sources (containing `/`) match by prefix because Go module
/// paths carry major-version suffixes like `/v4`; plain package names match
/// exactly so a prefix-sharing sibling (`fastapi-users` vs `fastapi`) can
/// never supply the version.
fn framework_version(framework: FrameworkId, signals: &[Signal]) -> Option<String> {
    let source = framework.version_source();
    let module_path = source.contains('/');
    signals.iter().find_map(|signal| match &signal.kind {
        SignalKind::Dependency { name, .. }
            if name.eq_ignore_ascii_case(source)
                || (module_path && name.starts_with(source)) =>
        {
            signal.normalized_version()
        }
        _ => None,
    })
}

/// A `tsconfig.json` at the root flips javascript frameworks to typescript
fn refine_language(framework: FrameworkId, signals: &[Signal]) -> &'static str {
    let language = framework.language();
    if language == "javascript" {
        let has_tsconfig = signals
            .iter()
            .any(|s| matches!(&s.kind, SignalKind::FilePresence(m) if m == "tsconfig.json"));
        if has_tsconfig {
            return "typescript";
        }
    }
    language
}

fn override_result(ovr: StackOverride) -> DetectionResult {
    // Known framework names contribute their static language and template
    // metadata; unknown names are passed through verbatim.
    let known = FrameworkId::PRIORITY
        .iter()
        .find(|id| id.name() == ovr.framework);

    let language = ovr
        .language
        .or_else(|| known.map(|id| id.language().to_string()))
        .unwrap_or_else(|| "unknown".to_string());
    let templates = known
        .map(|id| id.templates().iter().map(|t| t.to_string()).collect())
        .unwrap_or_default();

    DetectionResult {
        framework: ovr.framework,
        version: ovr.version,
        language,
        confidence: 1.0,
        tools: Default::default(),
        recommended_templates: templates,
        evidence: vec![format!(
            "manual override ({})",
            overrides::STACK_OVERRIDE_FILE
        )],
        diagnostics: Vec::new(),
        partial: false,
        fingerprint: String::new(),
        computed_at: Utc::now(),
    }
}
