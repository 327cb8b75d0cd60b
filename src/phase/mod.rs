//! Project maturity phase detection
//!
//! Classifies a project as prototype, mvp, or production with a
//! weighted-voting scheme over independent indicators: declared semantic
//! version, VCS commit count, test file count, CI configuration, docs, and
//! directory structure. Each indicator votes for one phase with a fixed
//! weight; indicators that cannot observe their input (no declared version,
//! no `.git`) abstain and their weight does not participate. Confidence is
//! the winning phase's share of the participating weight.
//!
//! Phase detection runs independently of stack detection and its results are
//! never cached: the VCS indicator reads repository state that a
//! manifest-only fingerprint cannot track.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Indicator weights, fixed. Declared version is the strongest single
/// signal of intent.
pub const WEIGHT_VERSION: f64 = 0.30;
pub const WEIGHT_VCS: f64 = 0.20;
pub const WEIGHT_TESTS: f64 = 0.15;
pub const WEIGHT_CI: f64 = 0.15;
pub const WEIGHT_DOCS: f64 = 0.10;
pub const WEIGHT_STRUCTURE: f64 = 0.10;

/// Project maturity phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Prototype,
    Mvp,
    Production,
}

impl Phase {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prototype" => Some(Phase::Prototype),
            "mvp" => Some(Phase::Mvp),
            "production" => Some(Phase::Production),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Prototype => "prototype",
            Phase::Mvp => "mvp",
            Phase::Production => "production",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One indicator's contribution to the phase vote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorVote {
    pub indicator: String,
    pub vote: Phase,
    pub weight: f64,
    pub detail: String,
}

/// Maturity classification with its indicator breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub confidence: f64,
    pub indicators: Vec<IndicatorVote>,
    pub overridden: bool,
    pub reason: Option<String>,
}

impl PhaseResult {
    /// Result for a manually pinned phase. Indicator voting is skipped
    /// entirely.
    pub fn overridden(phase: Phase, reason: Option<String>) -> Self {
        Self {
            phase,
            confidence: 1.0,
            indicators: Vec::new(),
            overridden: true,
            reason,
        }
    }
}

/// Compute the phase for `root`. `files` is the scanned file list for the
/// same tree, reused for the test/docs counts so the tree is walked once.
pub fn detect(root: &Path, files: &[PathBuf]) -> PhaseResult {
    let mut indicators = Vec::new();

    if let Some(vote) = version_indicator(root) {
        indicators.push(vote);
    }
    if let Some(vote) = vcs_indicator(root) {
        indicators.push(vote);
    }
    indicators.push(tests_indicator(files));
    indicators.push(ci_indicator(root));
    indicators.push(docs_indicator(root, files));
    indicators.push(structure_indicator(root));

    tally(indicators)
}

fn tally(indicators: Vec<IndicatorVote>) -> PhaseResult {
    let mut totals = [0.0f64; 3];
    let mut participating = 0.0f64;
    for vote in &indicators {
        totals[vote.vote as usize] += vote.weight;
        participating += vote.weight;
    }

    if participating == 0.0 {
        return PhaseResult {
            phase: Phase::Prototype,
            confidence: 0.0,
            indicators,
            overridden: false,
            reason: None,
        };
    }

    // On a tie the less mature phase wins: claiming production maturity
    // needs a strict majority of the evidence.
    let mut winner = Phase::Prototype;
    let mut best = totals[Phase::Prototype as usize];
    for phase in [Phase::Mvp, Phase::Production] {
        if totals[phase as usize] > best {
            best = totals[phase as usize];
            winner = phase;
        }
    }

    let confidence = best / participating;
    debug!(phase = %winner, confidence, "Phase vote tallied");
    PhaseResult {
        phase: winner,
        confidence,
        indicators,
        overridden: false,
        reason: None,
    }
}

/// Declared semantic version: 0.x signals pre-stability intent, >=1.0 a
/// published interface. Abstains when no manifest declares a version.
fn version_indicator(root: &Path) -> Option<IndicatorVote> {
    let version = declared_version(root)?;
    let major: u64 = version
        .trim_start_matches('v')
        .split('.')
        .next()
        .and_then(|m| m.parse().ok())?;

    let vote = if major == 0 {
        Phase::Prototype
    } else {
        Phase::Production
    };
    Some(IndicatorVote {
        indicator: "version".to_string(),
        vote,
        weight: WEIGHT_VERSION,
        detail: format!("declared version {version}"),
    })
}

fn declared_version(root: &Path) -> Option<String> {
    if let Ok(content) = fs::read_to_string(root.join("package.json")) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&content) {
            if let Some(v) = value.get("version").and_then(|v| v.as_str()) {
                return Some(v.to_string());
            }
        }
    }
    if let Ok(content) = fs::read_to_string(root.join("Cargo.toml")) {
        if let Ok(value) = content.parse::<toml::Value>() {
            if let Some(v) = value
                .get("package")
                .and_then(|p| p.get("version"))
                .and_then(|v| v.as_str())
            {
                return Some(v.to_string());
            }
        }
    }
    if let Ok(content) = fs::read_to_string(root.join("pyproject.toml")) {
        if let Ok(value) = content.parse::<toml::Value>() {
            if let Some(v) = value
                .get("project")
                .and_then(|p| p.get("version"))
                .and_then(|v| v.as_str())
            {
                return Some(v.to_string());
            }
        }
    }
    None
}

/// Commit count from the VCS log. Abstains when the project is not a git
/// repository or `git` is unavailable.
fn vcs_indicator(root: &Path) -> Option<IndicatorVote> {
    if !root.join(".git").exists() {
        return None;
    }
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["rev-list", "--count", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let commits: u64 = String::from_utf8_lossy(&output.stdout).trim().parse().ok()?;

    let vote = if commits < 20 {
        Phase::Prototype
    } else if commits <= 100 {
        Phase::Mvp
    } else {
        Phase::Production
    };
    Some(IndicatorVote {
        indicator: "vcs".to_string(),
        vote,
        weight: WEIGHT_VCS,
        detail: format!("{commits} commits"),
    })
}

fn is_test_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let in_test_dir = path.components().any(|c| {
        matches!(
            c.as_os_str().to_str(),
            Some("tests") | Some("test") | Some("__tests__") | Some("spec")
        )
    });
    in_test_dir
        || name.contains(".test.")
        || name.contains(".spec.")
        || name.contains("_test.")
        || name.starts_with("test_")
}

fn tests_indicator(files: &[PathBuf]) -> IndicatorVote {
    let count = files.iter().filter(|f| is_test_file(f)).count();
    let vote = if count == 0 {
        Phase::Prototype
    } else if count <= 20 {
        Phase::Mvp
    } else {
        Phase::Production
    };
    IndicatorVote {
        indicator: "tests".to_string(),
        vote,
        weight: WEIGHT_TESTS,
        detail: format!("{count} test files"),
    }
}

const CI_MARKERS: &[&str] = &[
    ".github/workflows",
    ".gitlab-ci.yml",
    ".circleci",
    "Jenkinsfile",
    "Dockerfile",
];

fn ci_indicator(root: &Path) -> IndicatorVote {
    let found: Vec<&str> = CI_MARKERS
        .iter()
        .filter(|m| root.join(m).exists())
        .copied()
        .collect();
    let vote = match found.len() {
        0 => Phase::Prototype,
        1 => Phase::Mvp,
        _ => Phase::Production,
    };
    IndicatorVote {
        indicator: "ci".to_string(),
        vote,
        weight: WEIGHT_CI,
        detail: if found.is_empty() {
            "no CI configuration".to_string()
        } else {
            found.join(", ")
        },
    }
}

fn docs_indicator(root: &Path, files: &[PathBuf]) -> IndicatorVote {
    let mut score = 0usize;
    if root.join("README.md").is_file() || root.join("README.rst").is_file() {
        score += 1;
    }
    if root.join("docs").is_dir() {
        score += 1;
    }
    if root.join("CHANGELOG.md").is_file() || root.join("CONTRIBUTING.md").is_file() {
        score += 1;
    }
    let md_count = files
        .iter()
        .filter(|f| f.extension().and_then(|e| e.to_str()) == Some("md"))
        .count();

    let vote = match score {
        0 => Phase::Prototype,
        1 => Phase::Mvp,
        _ => Phase::Production,
    };
    IndicatorVote {
        indicator: "docs".to_string(),
        vote,
        weight: WEIGHT_DOCS,
        detail: format!("{md_count} markdown files"),
    }
}

const LOCKFILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "poetry.lock",
    "go.sum",
    "composer.lock",
];

fn structure_indicator(root: &Path) -> IndicatorVote {
    let mut score = 0usize;
    let mut parts = Vec::new();
    if root.join("src").is_dir() || root.join("app").is_dir() || root.join("lib").is_dir() {
        score += 1;
        parts.push("source layout");
    }
    if LOCKFILES.iter().any(|l| root.join(l).is_file()) {
        score += 1;
        parts.push("lockfile");
    }
    if root.join(".gitignore").is_file() {
        score += 1;
        parts.push(".gitignore");
    }

    let vote = match score {
        0 | 1 => Phase::Prototype,
        2 => Phase::Mvp,
        _ => Phase::Production,
    };
    IndicatorVote {
        indicator: "structure".to_string(),
        vote,
        weight: WEIGHT_STRUCTURE,
        detail: if parts.is_empty() {
            "no conventional structure".to_string()
        } else {
            parts.join(", ")
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_phase_parse_roundtrip() {
        for phase in [Phase::Prototype, Phase::Mvp, Phase::Production] {
            assert_eq!(Phase::parse(phase.name()), Some(phase));
        }
        assert_eq!(Phase::parse("Production"), Some(Phase::Production));
        assert_eq!(Phase::parse("beta"), None);
    }

    #[test]
    fn test_bare_project_is_prototype() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "main.py", "print('hi')");

        let result = detect(tmp.path(), &[tmp.path().join("main.py")]);
        assert_eq!(result.phase, Phase::Prototype);
        assert!(!result.overridden);
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn test_zero_major_version_votes_prototype() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "package.json", r#"{"version": "0.3.1"}"#);

        let result = detect(tmp.path(), &[]);
        let vote = result
            .indicators
            .iter()
            .find(|i| i.indicator == "version")
            .unwrap();
        assert_eq!(vote.vote, Phase::Prototype);
        assert_eq!(vote.weight, WEIGHT_VERSION);
    }

    #[test]
    fn test_mature_project_is_production() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "package.json", r#"{"version": "2.1.0"}"#);
        write(tmp.path(), "README.md", "# app");
        write(tmp.path(), "CHANGELOG.md", "## 2.1.0");
        write(tmp.path(), ".gitignore", "node_modules\n");
        write(tmp.path(), "package-lock.json", "{}");
        write(tmp.path(), "src/index.ts", "");
        write(tmp.path(), ".github/workflows/ci.yml", "on: push");
        write(tmp.path(), "Dockerfile", "FROM node:20");
        let files: Vec<PathBuf> = (0..25)
            .map(|i| tmp.path().join(format!("src/__tests__/case_{i}.test.ts")))
            .collect();

        let result = detect(tmp.path(), &files);
        assert_eq!(result.phase, Phase::Production);
        assert!(result.confidence > 0.8, "confidence {}", result.confidence);
    }

    #[test]
    fn test_version_indicator_abstains_without_manifest() {
        let tmp = TempDir::new().unwrap();
        let result = detect(tmp.path(), &[]);
        assert!(result.indicators.iter().all(|i| i.indicator != "version"));
    }

    #[test]
    fn test_confidence_is_winner_share_of_participating_weight() {
        // tests(mvp) vs ci+docs+structure(prototype): no version, no vcs
        let tmp = TempDir::new().unwrap();
        let files = vec![tmp.path().join("tests/test_app.py")];
        let result = detect(tmp.path(), &files);

        let participating: f64 = result.indicators.iter().map(|i| i.weight).sum();
        let winner_weight: f64 = result
            .indicators
            .iter()
            .filter(|i| i.vote == result.phase)
            .map(|i| i.weight)
            .sum();
        assert!((result.confidence - winner_weight / participating).abs() < 1e-9);
    }

    #[test]
    fn test_overridden_result_skips_indicators() {
        let result = PhaseResult::overridden(Phase::Production, Some("launch freeze".into()));
        assert_eq!(result.phase, Phase::Production);
        assert_eq!(result.confidence, 1.0);
        assert!(result.overridden);
        assert!(result.indicators.is_empty());
    }

    #[test]
    fn test_phase_result_serde_roundtrip() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "package.json", r#"{"version": "1.4.0"}"#);
        let original = detect(tmp.path(), &[]);
        assert!(!original.indicators.is_empty());

        let json = serde_json::to_string(&original).unwrap();
        let parsed: PhaseResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.phase, original.phase);
        assert_eq!(parsed.indicators.len(), original.indicators.len());
        assert_eq!(parsed.indicators[0].indicator, original.indicators[0].indicator);
    }

    #[test]
    fn test_is_test_file_patterns() {
        assert!(is_test_file(Path::new("src/app.test.ts")));
        assert!(is_test_file(Path::new("pkg/handler_test.go")));
        assert!(is_test_file(Path::new("tests/test_views.py")));
        assert!(is_test_file(Path::new("src/__tests__/index.tsx")));
        assert!(!is_test_file(Path::new("src/index.ts")));
    }
}
