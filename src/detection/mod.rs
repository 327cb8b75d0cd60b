//! Detection results and pipeline orchestration

pub mod service;
pub mod tools;
pub mod types;

pub use service::{DetectError, DetectionService};
pub use types::{DetectionOutcome, DetectionResult};
