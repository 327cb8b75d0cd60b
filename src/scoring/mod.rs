//! Confidence scoring and winner selection
//!
//! Pure functions over candidate lists: no I/O, no clock. Normalization
//! saturates at each rule set's total weight, so a project matching every
//! known indicator reaches 1.0 and never overflows.
//!
//! Tie-break policy: when two candidates' normalized scores are within
//! [`TIE_EPSILON`], the one with more matched required signals wins
//! (specificity over generality); a remaining tie falls to the fixed
//! [`FrameworkId::PRIORITY`](crate::rules::FrameworkId::PRIORITY) ordering,
//! which is also the candidate iteration order here.

use crate::rules::FrameworkCandidate;
use tracing::debug;

/// Candidates below this normalized score yield an "unknown" result
pub const CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Scores closer than this are considered tied
pub const TIE_EPSILON: f64 = 0.05;

/// Outcome of winner selection
#[derive(Debug, Clone)]
pub enum Verdict {
    /// A candidate cleared the threshold; confidence is its normalized score
    Detected {
        candidate: FrameworkCandidate,
        confidence: f64,
    },
    /// No candidate cleared the threshold; carries the best score found so
    /// callers can see how close detection came
    Unknown { best_confidence: f64 },
}

/// Select the winning candidate, applying the tie-break policy.
///
/// `candidates` must be ordered by framework priority (as produced by
/// [`crate::rules::evaluate`]); earlier entries win residual ties.
pub fn pick_winner(candidates: &[FrameworkCandidate]) -> Verdict {
    let mut best: Option<&FrameworkCandidate> = None;

    for candidate in candidates {
        match best {
            None => best = Some(candidate),
            Some(current) => {
                let score = candidate.normalized();
                let best_score = current.normalized();
                if (score - best_score).abs() <= TIE_EPSILON {
                    // Within epsilon: more required matches wins; otherwise
                    // the earlier (higher-priority) candidate stands
                    if candidate.required_matches > current.required_matches {
                        best = Some(candidate);
                    }
                } else if score > best_score {
                    best = Some(candidate);
                }
            }
        }
    }

    match best {
        Some(candidate) => {
            let confidence = candidate.normalized();
            if confidence < CONFIDENCE_THRESHOLD {
                debug!(
                    framework = %candidate.framework,
                    confidence,
                    "Best candidate below threshold, reporting unknown"
                );
                Verdict::Unknown {
                    best_confidence: confidence,
                }
            } else {
                Verdict::Detected {
                    candidate: candidate.clone(),
                    confidence,
                }
            }
        }
        None => Verdict::Unknown {
            best_confidence: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::FrameworkId;

    fn candidate(
        framework: FrameworkId,
        raw: f64,
        total: f64,
        required: usize,
    ) -> FrameworkCandidate {
        FrameworkCandidate {
            framework,
            raw_score: raw,
            total_weight: total,
            required_matches: required,
            evidence: vec![],
        }
    }

    #[test]
    fn test_clear_winner_by_score() {
        let candidates = vec![
            candidate(FrameworkId::NextJs, 0.9, 1.0, 1),
            candidate(FrameworkId::React, 0.6, 1.0, 1),
        ];
        match pick_winner(&candidates) {
            Verdict::Detected {
                candidate,
                confidence,
            } => {
                assert_eq!(candidate.framework, FrameworkId::NextJs);
                assert!((confidence - 0.9).abs() < 1e-9);
            }
            Verdict::Unknown { .. } => panic!("expected detection"),
        }
    }

    #[test]
    fn test_epsilon_tie_resolved_by_required_matches() {
        // Scores tie within epsilon; Gin has two required matches vs Go's one
        let candidates = vec![
            candidate(FrameworkId::Gin, 1.0, 1.0, 2),
            candidate(FrameworkId::Go, 1.0, 1.0, 1),
        ];
        match pick_winner(&candidates) {
            Verdict::Detected { candidate, .. } => {
                assert_eq!(candidate.framework, FrameworkId::Gin)
            }
            Verdict::Unknown { .. } => panic!("expected detection"),
        }

        // Same tie presented in the opposite order resolves identically
        let reversed = vec![
            candidate(FrameworkId::Go, 1.0, 1.0, 1),
            candidate(FrameworkId::Gin, 1.0, 1.0, 2),
        ];
        match pick_winner(&reversed) {
            Verdict::Detected { candidate, .. } => {
                assert_eq!(candidate.framework, FrameworkId::Gin)
            }
            Verdict::Unknown { .. } => panic!("expected detection"),
        }
    }

    #[test]
    fn test_residual_tie_falls_to_priority_order() {
        // Equal scores and equal required counts: first (higher priority) wins
        let candidates = vec![
            candidate(FrameworkId::NextJs, 0.8, 1.0, 1),
            candidate(FrameworkId::React, 0.8, 1.0, 1),
        ];
        match pick_winner(&candidates) {
            Verdict::Detected { candidate, .. } => {
                assert_eq!(candidate.framework, FrameworkId::NextJs)
            }
            Verdict::Unknown { .. } => panic!("expected detection"),
        }
    }

    #[test]
    fn test_below_threshold_reports_best_score() {
        let candidates = vec![candidate(FrameworkId::Flask, 0.3, 1.0, 1)];
        match pick_winner(&candidates) {
            Verdict::Unknown { best_confidence } => {
                assert!((best_confidence - 0.3).abs() < 1e-9)
            }
            Verdict::Detected { .. } => panic!("expected unknown"),
        }
    }

    #[test]
    fn test_no_candidates_is_unknown_zero() {
        match pick_winner(&[]) {
            Verdict::Unknown { best_confidence } => assert_eq!(best_confidence, 0.0),
            Verdict::Detected { .. } => panic!("expected unknown"),
        }
    }

    #[test]
    fn test_confidence_saturates_at_one() {
        let candidates = vec![candidate(FrameworkId::NextJs, 1.5, 1.0, 1)];
        match pick_winner(&candidates) {
            Verdict::Detected { confidence, .. } => assert!(confidence <= 1.0),
            Verdict::Unknown { .. } => panic!("expected detection"),
        }
    }
}
