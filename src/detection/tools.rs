//! Tool map collection from dependency signals
//!
//! Groups well-known dependencies into the categories downstream template
//! generation consumes (testing, styling, state, api, database). Output maps
//! are `BTreeMap`s so iteration order is stable across scans.

use crate::signals::{Signal, SignalKind};
use std::collections::BTreeMap;

/// (category, dependency name, reported tool name)
const TOOL_TABLE: &[(&str, &str, &str)] = &[
    ("testing", "jest", "jest"),
    ("testing", "vitest", "vitest"),
    ("testing", "mocha", "mocha"),
    ("testing", "@testing-library/react", "testing-library"),
    ("testing", "pytest", "pytest"),
    ("styling", "tailwindcss", "tailwindcss"),
    ("styling", "styled-components", "styled-components"),
    ("styling", "@emotion/react", "emotion"),
    ("styling", "sass", "sass"),
    ("state", "zustand", "zustand"),
    ("state", "redux", "redux"),
    ("state", "@reduxjs/toolkit", "redux"),
    ("state", "pinia", "pinia"),
    ("api", "axios", "axios"),
    ("api", "swr", "swr"),
    ("api", "@tanstack/react-query", "react-query"),
    ("database", "prisma", "prisma"),
    ("database", "@prisma/client", "prisma"),
    ("database", "mongoose", "mongoose"),
    ("database", "typeorm", "typeorm"),
    ("database", "sqlalchemy", "sqlalchemy"),
    ("database", "diesel", "diesel"),
    ("database", "sqlx", "sqlx"),
];

/// Harvest the tool map from dependency signals
pub fn collect_tools(signals: &[Signal]) -> BTreeMap<String, Vec<String>> {
    let mut tools: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (category, dep, tool) in TOOL_TABLE {
        let present = signals.iter().any(|s| {
            matches!(&s.kind, SignalKind::Dependency { name, .. } if name.eq_ignore_ascii_case(dep))
        });
        if present {
            let entry = tools.entry(category.to_string()).or_default();
            if !entry.contains(&tool.to_string()) {
                entry.push(tool.to_string());
            }
        }
    }

    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn dep(name: &str) -> Signal {
        Signal::dependency(PathBuf::from("package.json"), name, None)
    }

    #[test]
    fn test_tools_grouped_by_category() {
        let signals = vec![
            dep("jest"),
            dep("@testing-library/react"),
            dep("tailwindcss"),
            dep("zustand"),
        ];

        let tools = collect_tools(&signals);
        assert_eq!(
            tools.get("testing").unwrap(),
            &["jest".to_string(), "testing-library".to_string()]
        );
        assert_eq!(tools.get("styling").unwrap(), &["tailwindcss".to_string()]);
        assert_eq!(tools.get("state").unwrap(), &["zustand".to_string()]);
        assert!(!tools.contains_key("database"));
    }

    #[test]
    fn test_redux_variants_deduplicate() {
        let signals = vec![dep("redux"), dep("@reduxjs/toolkit")];
        let tools = collect_tools(&signals);
        assert_eq!(tools.get("state").unwrap(), &["redux".to_string()]);
    }

    #[test]
    fn test_empty_signals_empty_map() {
        assert!(collect_tools(&[]).is_empty());
    }
}
