//! Signal extraction from manifest files
//!
//! Parses the known manifest formats found at the scan root into a uniform
//! signal list. Parsing failures are non-fatal: the offending file's signals
//! are omitted and a diagnostic is attached to the outcome, so one malformed
//! `package.json` never sinks the whole detection.
//!
//! File-presence and directory-presence signals are emitted independently of
//! manifest parsing; marker files with filename variants (`next.config.js`,
//! `next.config.ts`, `next.config.mjs`) are normalized to a single marker
//! name so rule sets match any variant.

use super::Signal;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Manifest filenames the extractor knows how to parse
pub const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "composer.json",
    "Cargo.toml",
    "go.mod",
    "Podfile",
    "pubspec.yaml",
];

/// Marker files emitted as presence signals, normalized by variant
const MARKER_FILES: &[(&str, &str)] = &[
    ("next.config.js", "next.config"),
    ("next.config.ts", "next.config"),
    ("next.config.mjs", "next.config"),
    ("vite.config.js", "vite.config"),
    ("vite.config.ts", "vite.config"),
    ("vite.config.mjs", "vite.config"),
    ("tailwind.config.js", "tailwind.config"),
    ("tailwind.config.ts", "tailwind.config"),
    ("tsconfig.json", "tsconfig.json"),
    ("manage.py", "manage.py"),
    ("artisan", "artisan"),
];

/// Top-level directories emitted as presence signals
const MARKER_DIRS: &[&str] = &["app", "pages", "src", "lib", "tests", "docs"];

/// Whether a path's filename is a known manifest
pub fn is_manifest(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| MANIFEST_FILES.contains(&n))
        .unwrap_or(false)
}

/// Extraction result: signals plus non-fatal diagnostics and the set of
/// manifest files actually consulted (fingerprint input)
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    pub signals: Vec<Signal>,
    pub diagnostics: Vec<String>,
    /// Absolute paths of manifests consulted, sorted
    pub manifests: Vec<PathBuf>,
}

/// Extract signals from the scan-root-level manifests and markers.
///
/// Only root-level manifests are consulted; nested manifests belong to
/// sub-packages and are handled by scoping the whole pipeline to the
/// sub-package directory, which keeps signal sets isolated.
pub fn extract(root: &Path, files: &[PathBuf]) -> ExtractionOutcome {
    let mut outcome = ExtractionOutcome::default();

    for file in files {
        if file.parent() != Some(root) {
            continue;
        }
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if MANIFEST_FILES.contains(&name) {
            outcome.manifests.push(file.clone());
            let rel = PathBuf::from(name);
            outcome.signals.push(Signal::file_presence(rel.clone(), name));
            match fs::read_to_string(file) {
                Ok(content) => parse_manifest(name, &rel, &content, &mut outcome),
                Err(err) => outcome
                    .diagnostics
                    .push(format!("{name}: unreadable ({err})")),
            }
        }

        for (variant, marker) in MARKER_FILES {
            if name == *variant {
                outcome
                    .signals
                    .push(Signal::file_presence(PathBuf::from(name), *marker));
            }
        }
    }

    for dir in MARKER_DIRS {
        if root.join(dir).is_dir() {
            outcome.signals.push(Signal::dir_presence(*dir));
        }
    }

    outcome.manifests.sort();
    debug!(
        signals = outcome.signals.len(),
        manifests = outcome.manifests.len(),
        diagnostics = outcome.diagnostics.len(),
        "Signal extraction complete"
    );
    outcome
}

fn parse_manifest(name: &str, rel: &Path, content: &str, outcome: &mut ExtractionOutcome) {
    let result = match name {
        "package.json" => parse_package_json(rel, content, &mut outcome.signals),
        "requirements.txt" => {
            parse_requirements(rel, content, &mut outcome.signals);
            Ok(())
        }
        "pyproject.toml" => parse_pyproject(rel, content, &mut outcome.signals),
        "composer.json" => parse_composer(rel, content, &mut outcome.signals),
        "Cargo.toml" => parse_cargo_toml(rel, content, &mut outcome.signals),
        "go.mod" => {
            parse_go_mod(rel, content, &mut outcome.signals);
            Ok(())
        }
        "Podfile" => {
            parse_podfile(rel, content, &mut outcome.signals);
            Ok(())
        }
        "pubspec.yaml" => parse_pubspec(rel, content, &mut outcome.signals),
        _ => Ok(()),
    };

    if let Err(detail) = result {
        outcome.diagnostics.push(format!("{name}: {detail}"));
    }
}

fn parse_package_json(rel: &Path, content: &str, signals: &mut Vec<Signal>) -> Result<(), String> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("invalid JSON ({e})"))?;

    for section in ["dependencies", "devDependencies"] {
        if let Some(deps) = value.get(section).and_then(|v| v.as_object()) {
            for (dep, version) in deps {
                signals.push(Signal::dependency(
                    rel.to_path_buf(),
                    dep.clone(),
                    version.as_str().map(String::from),
                ));
            }
        }
    }

    if value.get("workspaces").is_some() {
        signals.push(Signal::config_key(rel.to_path_buf(), "workspaces"));
    }
    Ok(())
}

fn parse_requirements(rel: &Path, content: &str, signals: &mut Vec<Signal>) {
    static LINE: OnceLock<Regex> = OnceLock::new();
    let re = LINE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)(?:\[[^\]]*\])?\s*(?:(?:==|>=|<=|~=|!=|>|<)\s*([^,;\s#]+))?").unwrap()
    });

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('-') {
            continue;
        }
        if let Some(caps) = re.captures(trimmed) {
            let name = caps[1].to_ascii_lowercase();
            let version = caps.get(2).map(|m| m.as_str().to_string());
            signals.push(Signal::dependency(rel.to_path_buf(), name, version));
        }
    }
}

fn parse_pyproject(rel: &Path, content: &str, signals: &mut Vec<Signal>) -> Result<(), String> {
    let value: toml::Value = content
        .parse()
        .map_err(|e| format!("invalid TOML ({e})"))?;

    // PEP 621: [project] dependencies = ["fastapi>=0.100", ...]
    static REQ: OnceLock<Regex> = OnceLock::new();
    let re = REQ.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)(?:\[[^\]]*\])?\s*(?:(?:==|>=|<=|~=|!=|>|<)\s*([^,;\s]+))?").unwrap()
    });

    if let Some(deps) = value
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
    {
        for spec in deps.iter().filter_map(|d| d.as_str()) {
            if let Some(caps) = re.captures(spec.trim()) {
                let name = caps[1].to_ascii_lowercase();
                let version = caps.get(2).map(|m| m.as_str().to_string());
                signals.push(Signal::dependency(rel.to_path_buf(), name, version));
            }
        }
    }

    // Poetry: [tool.poetry.dependencies]
    if let Some(deps) = value
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_table())
    {
        for (dep, version) in deps {
            if dep.eq_ignore_ascii_case("python") {
                continue;
            }
            signals.push(Signal::dependency(
                rel.to_path_buf(),
                dep.to_ascii_lowercase(),
                version.as_str().map(String::from),
            ));
        }
    }
    Ok(())
}

fn parse_composer(rel: &Path, content: &str, signals: &mut Vec<Signal>) -> Result<(), String> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("invalid JSON ({e})"))?;

    for section in ["require", "require-dev"] {
        if let Some(deps) = value.get(section).and_then(|v| v.as_object()) {
            for (dep, version) in deps {
                signals.push(Signal::dependency(
                    rel.to_path_buf(),
                    dep.clone(),
                    version.as_str().map(String::from),
                ));
            }
        }
    }
    Ok(())
}

fn parse_cargo_toml(rel: &Path, content: &str, signals: &mut Vec<Signal>) -> Result<(), String> {
    let value: toml::Value = content
        .parse()
        .map_err(|e| format!("invalid TOML ({e})"))?;

    for section in ["dependencies", "dev-dependencies"] {
        if let Some(deps) = value.get(section).and_then(|d| d.as_table()) {
            for (dep, spec) in deps {
                let version = spec
                    .as_str()
                    .map(String::from)
                    .or_else(|| spec.get("version").and_then(|v| v.as_str()).map(String::from));
                signals.push(Signal::dependency(rel.to_path_buf(), dep.clone(), version));
            }
        }
    }

    if value.get("workspace").is_some() {
        signals.push(Signal::config_key(rel.to_path_buf(), "workspace"));
    }
    Ok(())
}

fn parse_go_mod(rel: &Path, content: &str, signals: &mut Vec<Signal>) {
    let mut in_require_block = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("module ") {
            signals.push(Signal::config_key(rel.to_path_buf(), "module"));
        } else if let Some(version) = trimmed.strip_prefix("go ") {
            signals.push(Signal::dependency(
                rel.to_path_buf(),
                "go",
                Some(version.trim().to_string()),
            ));
        } else if trimmed.starts_with("require (") {
            in_require_block = true;
        } else if in_require_block && trimmed == ")" {
            in_require_block = false;
        } else if in_require_block || trimmed.starts_with("require ") {
            let spec = trimmed.strip_prefix("require ").unwrap_or(trimmed);
            let mut parts = spec.split_whitespace();
            if let Some(path) = parts.next() {
                if path.contains('/') {
                    let version = parts.next().map(|v| v.to_string());
                    signals.push(Signal::dependency(rel.to_path_buf(), path, version));
                }
            }
        }
    }
}

fn parse_podfile(rel: &Path, content: &str, signals: &mut Vec<Signal>) {
    static POD: OnceLock<Regex> = OnceLock::new();
    let re = POD.get_or_init(|| {
        Regex::new(r#"pod\s+['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#).unwrap()
    });

    for caps in re.captures_iter(content) {
        let version = caps.get(2).map(|m| m.as_str().to_string());
        signals.push(Signal::dependency(rel.to_path_buf(), &caps[1], version));
    }
}

fn parse_pubspec(rel: &Path, content: &str, signals: &mut Vec<Signal>) -> Result<(), String> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| format!("invalid YAML ({e})"))?;

    for section in ["dependencies", "dev_dependencies"] {
        if let Some(deps) = value.get(section).and_then(|v| v.as_mapping()) {
            for (dep, spec) in deps {
                let Some(name) = dep.as_str() else { continue };
                let version = spec.as_str().map(String::from);
                signals.push(Signal::dependency(rel.to_path_buf(), name, version));
            }
        }
    }

    if let Some(sdk) = value
        .get("environment")
        .and_then(|e| e.get("sdk"))
        .and_then(|s| s.as_str())
    {
        signals.push(Signal::dependency(
            rel.to_path_buf(),
            "dart-sdk",
            Some(sdk.to_string()),
        ));
    }

    if value.get("flutter").is_some() {
        signals.push(Signal::config_key(rel.to_path_buf(), "flutter"));
    }
    Ok(())
}
