//! Pure rule evaluation over extracted signals
//!
//! Evaluation is deterministic and independent of file scan order: matchers
//! test set membership in the signal list, never positions. Each candidate
//! records which matchers fired so the final result can expose evidence
//! strings.

use super::{FrameworkId, Matcher, MatcherKind};
use crate::signals::{normalize_version, Signal, SignalKind};

/// A framework hypothesis with its accumulated evidence
#[derive(Debug, Clone)]
pub struct FrameworkCandidate {
    pub framework: FrameworkId,
    /// Sum of matched weights
    pub raw_score: f64,
    /// Sum of all weights in the rule set (saturation ceiling)
    pub total_weight: f64,
    /// How many required matchers fired (specificity tie-break input)
    pub required_matches: usize,
    pub evidence: Vec<String>,
}

impl FrameworkCandidate {
    /// Normalized score in [0, 1]: raw weighted sum capped at the rule
    /// set's total weight
    pub fn normalized(&self) -> f64 {
        if self.total_weight > 0.0 {
            (self.raw_score / self.total_weight).min(1.0)
        } else {
            0.0
        }
    }
}

/// Evaluate every framework's rule set against the signal list.
///
/// Candidates missing a required signal are disqualified. Output order
/// follows [`FrameworkId::PRIORITY`].
pub fn evaluate(signals: &[Signal]) -> Vec<FrameworkCandidate> {
    let mut candidates = Vec::new();

    'frameworks: for id in FrameworkId::PRIORITY {
        let rules = id.rule_set();
        let mut candidate = FrameworkCandidate {
            framework: id,
            raw_score: 0.0,
            total_weight: rules.total_weight(),
            required_matches: 0,
            evidence: Vec::new(),
        };

        for matcher in rules.matchers {
            let matched = signals.iter().any(|s| matcher_matches(matcher, s));
            if matched {
                candidate.raw_score += matcher.weight;
                if matcher.required {
                    candidate.required_matches += 1;
                }
                candidate
                    .evidence
                    .push(format!("{}: +{:.2}", matcher.label, matcher.weight));
            } else if matcher.required {
                continue 'frameworks;
            }
        }

        if candidate.raw_score > 0.0 {
            candidates.push(candidate);
        }
    }

    candidates
}

/// Whether one signal satisfies one matcher
pub fn matcher_matches(matcher: &Matcher, signal: &Signal) -> bool {
    match (&matcher.kind, &signal.kind) {
        (MatcherKind::Dependency(want), SignalKind::Dependency { name, .. }) => {
            name.eq_ignore_ascii_case(want)
        }
        (MatcherKind::DependencyPrefix(prefix), SignalKind::Dependency { name, .. }) => {
            name.starts_with(prefix)
        }
        (MatcherKind::DependencyAny(wanted), SignalKind::Dependency { name, .. }) => {
            wanted.iter().any(|w| name.eq_ignore_ascii_case(w))
        }
        (
            MatcherKind::DependencyMajor { name: want, major },
            SignalKind::Dependency {
                name,
                version: Some(version),
            },
        ) => {
            name.eq_ignore_ascii_case(want)
                && normalize_version(version)
                    .split('.')
                    .next()
                    .and_then(|m| m.parse::<u64>().ok())
                    == Some(*major)
        }
        (MatcherKind::FilePresence(want), SignalKind::FilePresence(marker)) => marker == want,
        (MatcherKind::DirPresence(want), SignalKind::DirPresence(dir)) => dir == want,
        (MatcherKind::DirPresenceAny(wanted), SignalKind::DirPresence(dir)) => {
            wanted.iter().any(|w| dir == w)
        }
        (MatcherKind::ConfigKey(want), SignalKind::ConfigKey(key)) => key == want,
        _ => false,
    }
}
