//! stackprobe - tech stack and maturity phase detection engine
//!
//! This library inspects a project's file tree and determines, with a
//! quantified confidence score, which technology stack (framework, language,
//! tooling) the project uses and which maturity phase (prototype / mvp /
//! production) it is in. Results are cached on disk keyed by a content
//! fingerprint so repeated invocations on an unchanged project avoid
//! redundant rescans.
//!
//! # Core Concepts
//!
//! - **Signals**: normalized pieces of evidence (a dependency entry, a file's
//!   presence, a config key) extracted from manifest files
//! - **Rule sets**: declarative per-framework (matcher, weight) lists
//!   evaluated against the signal set
//! - **Fingerprint**: a deterministic hash over the identity of every
//!   manifest file consulted during a scan, used as the cache key
//!
//! # Example Usage
//!
//! ```ignore
//! use stackprobe::{DetectionService, StackprobeConfig};
//! use std::path::Path;
//!
//! let config = StackprobeConfig::from_env()?;
//! let service = DetectionService::new(config);
//!
//! let outcome = service.detect(Path::new("/path/to/project"))?;
//! println!("Framework: {}", outcome.result.framework);
//! println!("Confidence: {:.2}", outcome.result.confidence);
//!
//! let phase = service.phase(Path::new("/path/to/project"))?;
//! println!("Phase: {}", phase.phase);
//! ```
//!
//! # Project Structure
//!
//! - [`scanner`]: bounded, deterministic file tree walk
//! - [`signals`]: manifest parsing into normalized signals
//! - [`rules`]: declarative framework rule sets and evaluation
//! - [`scoring`]: confidence normalization and tie-breaking
//! - [`monorepo`]: workspace detection and per-package recursion
//! - [`phase`]: maturity phase classification
//! - [`cache`]: fingerprint-keyed result cache
//! - [`detection`]: result types and pipeline orchestration

pub mod cache;
pub mod cli;
pub mod config;
pub mod detection;
pub mod monorepo;
pub mod overrides;
pub mod phase;
pub mod rules;
pub mod scanner;
pub mod scoring;
pub mod signals;
pub mod util;

// Re-export key types for convenient access
pub use cache::{CacheEntry, CacheError, CacheLookup, DetectionCache, FileCache, MemoryCache};
pub use config::{ConfigError, StackprobeConfig};
pub use detection::service::{DetectError, DetectionService};
pub use detection::types::{DetectionOutcome, DetectionResult};
pub use monorepo::{WorkspaceManager, WorkspaceMap, WorkspacePackage};
pub use overrides::{OverrideError, PhaseOverride, StackOverride};
pub use phase::{Phase, PhaseResult};
pub use rules::FrameworkId;
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
