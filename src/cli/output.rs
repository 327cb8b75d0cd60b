//! Output formatting for detection and phase results
//!
//! Formatters for JSON (machine-readable), YAML, and human-readable text.
//! All formatters return the rendered string; callers decide where it goes.

use anyhow::{Context, Result};

use crate::cache::CacheStats;
use crate::cli::commands::OutputFormatArg;
use crate::detection::types::DetectionOutcome;
use crate::phase::PhaseResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Yaml => OutputFormat::Yaml,
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_detection(&self, outcome: &DetectionOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(outcome).context("Failed to serialize result as JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(outcome).context("Failed to serialize result as YAML")
            }
            OutputFormat::Human => Ok(human_detection(outcome)),
        }
    }

    pub fn format_phase(&self, result: &PhaseResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(result).context("Failed to serialize phase as JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(result).context("Failed to serialize phase as YAML")
            }
            OutputFormat::Human => Ok(human_phase(result)),
        }
    }

    pub fn format_cache_stats(&self, stats: &CacheStats) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(stats).context("Failed to serialize stats as JSON")
            }
            _ => Ok(format!(
                "Cache entries: {}\nTotal hits:    {}",
                stats.entries, stats.total_hits
            )),
        }
    }
}

fn human_detection(outcome: &DetectionOutcome) -> String {
    let mut out = String::new();
    let result = &outcome.result;

    out.push_str(&format!("Framework:  {}\n", result.framework));
    if let Some(version) = &result.version {
        out.push_str(&format!("Version:    {version}\n"));
    }
    out.push_str(&format!("Language:   {}\n", result.language));
    out.push_str(&format!(
        "Confidence: {:.0}%{}\n",
        result.confidence * 100.0,
        if result.partial { " (partial scan)" } else { "" }
    ));

    if !result.tools.is_empty() {
        out.push_str("Tools:\n");
        for (category, tools) in &result.tools {
            out.push_str(&format!("  {category}: {}\n", tools.join(", ")));
        }
    }
    if !result.recommended_templates.is_empty() {
        out.push_str(&format!(
            "Templates:  {}\n",
            result.recommended_templates.join(", ")
        ));
    }
    if !result.evidence.is_empty() {
        out.push_str("Evidence:\n");
        for line in &result.evidence {
            out.push_str(&format!("  - {line}\n"));
        }
    }
    for note in &result.diagnostics {
        out.push_str(&format!("Note: {note}\n"));
    }

    if let Some(workspace) = &outcome.workspace {
        out.push_str(&format!(
            "\nWorkspace ({}) with {} packages:\n",
            workspace.manager.name(),
            workspace.packages.len()
        ));
        for package in &workspace.packages {
            out.push_str(&format!(
                "  {} ({}): {}\n",
                package.name,
                package.path.display(),
                package.result
            ));
        }
    }
    out
}

fn human_phase(result: &PhaseResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Phase:      {}\n", result.phase));
    out.push_str(&format!(
        "Confidence: {:.0}%\n",
        result.confidence * 100.0
    ));
    if result.overridden {
        out.push_str("Source:     manual override\n");
        if let Some(reason) = &result.reason {
            out.push_str(&format!("Reason:     {reason}\n"));
        }
    } else {
        out.push_str("Indicators:\n");
        for vote in &result.indicators {
            out.push_str(&format!(
                "  {:<10} -> {:<10} (weight {:.2}, {})\n",
                vote.indicator, vote.vote, vote.weight, vote.detail
            ));
        }
    }
    out
}
