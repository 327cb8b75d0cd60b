//! Declarative framework rule sets
//!
//! Every supported framework is a [`FrameworkId`] variant mapped to an
//! immutable rule set: a list of (matcher, weight, required) triples. The
//! tie-break priority between frameworks is the explicit [`FrameworkId::PRIORITY`]
//! ordering rather than incidental iteration order, so ambiguous pairs
//! (Next.js projects also satisfy the React rules) resolve deterministically.

mod engine;

pub use engine::{evaluate, matcher_matches, FrameworkCandidate};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Known framework hypotheses, in no particular order (see [`Self::PRIORITY`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameworkId {
    NextJs,
    Vue,
    React,
    Express,
    FastApi,
    Django,
    Flask,
    Laravel,
    Flutter,
    Gin,
    Echo,
    Fiber,
    Axum,
    Go,
}

impl FrameworkId {
    /// Evaluation and tie-break ordering: more specific frameworks first,
    /// so specificity wins when normalized scores tie within epsilon.
    pub const PRIORITY: [FrameworkId; 14] = [
        FrameworkId::NextJs,
        FrameworkId::Vue,
        FrameworkId::React,
        FrameworkId::Express,
        FrameworkId::FastApi,
        FrameworkId::Django,
        FrameworkId::Flask,
        FrameworkId::Laravel,
        FrameworkId::Flutter,
        FrameworkId::Gin,
        FrameworkId::Echo,
        FrameworkId::Fiber,
        FrameworkId::Axum,
        FrameworkId::Go,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FrameworkId::NextJs => "nextjs",
            FrameworkId::Vue => "vue",
            FrameworkId::React => "react",
            FrameworkId::Express => "express",
            FrameworkId::FastApi => "fastapi",
            FrameworkId::Django => "django",
            FrameworkId::Flask => "flask",
            FrameworkId::Laravel => "laravel",
            FrameworkId::Flutter => "flutter",
            FrameworkId::Gin => "go-gin",
            FrameworkId::Echo => "go-echo",
            FrameworkId::Fiber => "go-fiber",
            FrameworkId::Axum => "axum",
            FrameworkId::Go => "go",
        }
    }

    /// Primary language; javascript frameworks are refined to typescript
    /// when a tsconfig.json signal is present.
    pub fn language(&self) -> &'static str {
        match self {
            FrameworkId::NextJs | FrameworkId::Vue | FrameworkId::React | FrameworkId::Express => {
                "javascript"
            }
            FrameworkId::FastApi | FrameworkId::Django | FrameworkId::Flask => "python",
            FrameworkId::Laravel => "php",
            FrameworkId::Flutter => "dart",
            FrameworkId::Gin | FrameworkId::Echo | FrameworkId::Fiber | FrameworkId::Go => "go",
            FrameworkId::Axum => "rust",
        }
    }

    /// Dependency signal whose declared version is reported as the
    /// framework version
    pub fn version_source(&self) -> &'static str {
        match self {
            FrameworkId::NextJs => "next",
            FrameworkId::Vue => "vue",
            FrameworkId::React => "react",
            FrameworkId::Express => "express",
            FrameworkId::FastApi => "fastapi",
            FrameworkId::Django => "django",
            FrameworkId::Flask => "flask",
            FrameworkId::Laravel => "laravel/framework",
            FrameworkId::Flutter => "dart-sdk",
            FrameworkId::Gin => "github.com/gin-gonic/gin",
            FrameworkId::Echo => "github.com/labstack/echo",
            FrameworkId::Fiber => "github.com/gofiber/fiber",
            FrameworkId::Axum => "axum",
            FrameworkId::Go => "go",
        }
    }

    /// Downstream template identifiers recommended for this framework
    pub fn templates(&self) -> &'static [&'static str] {
        match self {
            FrameworkId::NextJs => &["nextjs-tester", "component-reviewer"],
            FrameworkId::Vue => &["vue-tester", "component-reviewer"],
            FrameworkId::React => &["react-tester", "component-reviewer"],
            FrameworkId::Express => &["express-tester", "api-reviewer"],
            FrameworkId::FastApi => &["fastapi-tester", "api-reviewer", "async-checker"],
            FrameworkId::Django => &["django-tester", "model-reviewer"],
            FrameworkId::Flask => &["flask-tester", "api-reviewer"],
            FrameworkId::Laravel => &["laravel-tester", "api-reviewer"],
            FrameworkId::Flutter => &["flutter-tester", "widget-reviewer"],
            FrameworkId::Gin | FrameworkId::Echo | FrameworkId::Fiber | FrameworkId::Go => {
                &["go-tester", "go-reviewer", "concurrency-checker"]
            }
            FrameworkId::Axum => &["axum-tester", "api-reviewer"],
        }
    }

    pub fn rule_set(&self) -> &'static RuleSet {
        match self {
            FrameworkId::NextJs => &NEXTJS,
            FrameworkId::Vue => &VUE,
            FrameworkId::React => &REACT,
            FrameworkId::Express => &EXPRESS,
            FrameworkId::FastApi => &FASTAPI,
            FrameworkId::Django => &DJANGO,
            FrameworkId::Flask => &FLASK,
            FrameworkId::Laravel => &LARAVEL,
            FrameworkId::Flutter => &FLUTTER,
            FrameworkId::Gin => &GIN,
            FrameworkId::Echo => &ECHO,
            FrameworkId::Fiber => &FIBER,
            FrameworkId::Axum => &AXUM,
            FrameworkId::Go => &GO,
        }
    }
}

impl fmt::Display for FrameworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a matcher tests against the signal set
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatcherKind {
    /// Exact dependency name (case-insensitive)
    Dependency(&'static str),
    /// Dependency whose name starts with the prefix (Go module paths carry
    /// major-version suffixes like `/v4`)
    DependencyPrefix(&'static str),
    /// Any of the listed dependency names
    DependencyAny(&'static [&'static str]),
    /// Dependency present with the given normalized major version
    DependencyMajor { name: &'static str, major: u64 },
    /// A marker file is present (variant-normalized names)
    FilePresence(&'static str),
    /// A top-level directory is present
    DirPresence(&'static str),
    /// Any of the listed directories is present
    DirPresenceAny(&'static [&'static str]),
    /// A manifest declared the given config key
    ConfigKey(&'static str),
}

/// One (matcher, weight) pair of a rule set
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    pub kind: MatcherKind,
    pub weight: f64,
    /// Required matchers are gates: a candidate missing one is disqualified
    pub required: bool,
    /// Evidence label recorded when the matcher fires
    pub label: &'static str,
}

/// Immutable rule set for one framework
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub framework: FrameworkId,
    pub matchers: &'static [Matcher],
}

impl RuleSet {
    /// Sum of all weights; the saturation ceiling for normalization
    pub fn total_weight(&self) -> f64 {
        self.matchers.iter().map(|m| m.weight).sum()
    }
}

const fn req(kind: MatcherKind, weight: f64, label: &'static str) -> Matcher {
    Matcher {
        kind,
        weight,
        required: true,
        label,
    }
}

const fn opt(kind: MatcherKind, weight: f64, label: &'static str) -> Matcher {
    Matcher {
        kind,
        weight,
        required: false,
        label,
    }
}

static NEXTJS: RuleSet = RuleSet {
    framework: FrameworkId::NextJs,
    matchers: &[
        req(MatcherKind::Dependency("next"), 0.55, "'next' dependency"),
        opt(
            MatcherKind::FilePresence("next.config"),
            0.35,
            "next.config.* present",
        ),
        opt(
            MatcherKind::DirPresenceAny(&["app", "pages"]),
            0.10,
            "app/ or pages/ router directory",
        ),
    ],
};

static VUE: RuleSet = RuleSet {
    framework: FrameworkId::Vue,
    matchers: &[
        req(MatcherKind::Dependency("vue"), 0.60, "'vue' dependency"),
        opt(
            MatcherKind::DependencyMajor {
                name: "vue",
                major: 3,
            },
            0.10,
            "vue 3.x",
        ),
        opt(MatcherKind::Dependency("vite"), 0.20, "'vite' build tool"),
        opt(
            MatcherKind::FilePresence("vite.config"),
            0.10,
            "vite.config.* present",
        ),
    ],
};

static REACT: RuleSet = RuleSet {
    framework: FrameworkId::React,
    matchers: &[
        req(MatcherKind::Dependency("react"), 0.60, "'react' dependency"),
        opt(
            MatcherKind::Dependency("react-dom"),
            0.20,
            "'react-dom' dependency",
        ),
        opt(
            MatcherKind::DependencyAny(&["vite", "react-scripts"]),
            0.20,
            "build tool (vite / react-scripts)",
        ),
    ],
};

static EXPRESS: RuleSet = RuleSet {
    framework: FrameworkId::Express,
    matchers: &[
        req(
            MatcherKind::Dependency("express"),
            0.80,
            "'express' dependency",
        ),
        opt(
            MatcherKind::DependencyAny(&["body-parser", "morgan", "cors"]),
            0.20,
            "express middleware",
        ),
    ],
};

static FASTAPI: RuleSet = RuleSet {
    framework: FrameworkId::FastApi,
    matchers: &[
        req(
            MatcherKind::Dependency("fastapi"),
            0.60,
            "'fastapi' dependency",
        ),
        opt(
            MatcherKind::Dependency("uvicorn"),
            0.25,
            "'uvicorn' server",
        ),
        opt(
            MatcherKind::Dependency("pydantic"),
            0.15,
            "'pydantic' models",
        ),
    ],
};

static DJANGO: RuleSet = RuleSet {
    framework: FrameworkId::Django,
    matchers: &[
        req(
            MatcherKind::FilePresence("manage.py"),
            0.60,
            "manage.py present",
        ),
        opt(
            MatcherKind::Dependency("django"),
            0.30,
            "'django' dependency",
        ),
        opt(
            MatcherKind::Dependency("gunicorn"),
            0.10,
            "'gunicorn' server",
        ),
    ],
};

static FLASK: RuleSet = RuleSet {
    framework: FrameworkId::Flask,
    matchers: &[
        req(MatcherKind::Dependency("flask"), 0.70, "'flask' dependency"),
        opt(
            MatcherKind::Dependency("gunicorn"),
            0.15,
            "'gunicorn' server",
        ),
        opt(
            MatcherKind::DependencyAny(&["flask-sqlalchemy", "flask-login"]),
            0.15,
            "flask extensions",
        ),
    ],
};

static LARAVEL: RuleSet = RuleSet {
    framework: FrameworkId::Laravel,
    matchers: &[
        req(
            MatcherKind::Dependency("laravel/framework"),
            0.70,
            "'laravel/framework' dependency",
        ),
        opt(MatcherKind::FilePresence("artisan"), 0.30, "artisan present"),
    ],
};

static FLUTTER: RuleSet = RuleSet {
    framework: FrameworkId::Flutter,
    matchers: &[
        req(
            MatcherKind::FilePresence("pubspec.yaml"),
            0.55,
            "pubspec.yaml present",
        ),
        opt(
            MatcherKind::Dependency("flutter"),
            0.35,
            "'flutter' sdk dependency",
        ),
        opt(MatcherKind::DirPresence("lib"), 0.10, "lib/ directory"),
    ],
};

static GIN: RuleSet = RuleSet {
    framework: FrameworkId::Gin,
    matchers: &[
        req(
            MatcherKind::DependencyPrefix("github.com/gin-gonic/gin"),
            0.60,
            "gin module dependency",
        ),
        req(
            MatcherKind::FilePresence("go.mod"),
            0.40,
            "go.mod present",
        ),
    ],
};

static ECHO: RuleSet = RuleSet {
    framework: FrameworkId::Echo,
    matchers: &[
        req(
            MatcherKind::DependencyPrefix("github.com/labstack/echo"),
            0.60,
            "echo module dependency",
        ),
        req(
            MatcherKind::FilePresence("go.mod"),
            0.40,
            "go.mod present",
        ),
    ],
};

static FIBER: RuleSet = RuleSet {
    framework: FrameworkId::Fiber,
    matchers: &[
        req(
            MatcherKind::DependencyPrefix("github.com/gofiber/fiber"),
            0.60,
            "fiber module dependency",
        ),
        req(
            MatcherKind::FilePresence("go.mod"),
            0.40,
            "go.mod present",
        ),
    ],
};

static AXUM: RuleSet = RuleSet {
    framework: FrameworkId::Axum,
    matchers: &[
        req(MatcherKind::Dependency("axum"), 0.60, "'axum' dependency"),
        req(
            MatcherKind::FilePresence("Cargo.toml"),
            0.40,
            "Cargo.toml present",
        ),
    ],
};

static GO: RuleSet = RuleSet {
    framework: FrameworkId::Go,
    matchers: &[
        req(MatcherKind::FilePresence("go.mod"), 0.80, "go.mod present"),
        opt(
            MatcherKind::ConfigKey("module"),
            0.20,
            "module declaration",
        ),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_covers_every_framework() {
        // Each variant appears exactly once in the tie-break ordering
        for (i, a) in FrameworkId::PRIORITY.iter().enumerate() {
            for b in &FrameworkId::PRIORITY[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(FrameworkId::PRIORITY.len(), 14);
    }

    #[test]
    fn test_rule_sets_are_well_formed() {
        for id in FrameworkId::PRIORITY {
            let rules = id.rule_set();
            assert_eq!(rules.framework, id);
            assert!(!rules.matchers.is_empty());
            assert!(rules.total_weight() > 0.0);
            assert!(
                rules.matchers.iter().any(|m| m.required),
                "{id} has no required matcher"
            );
            for matcher in rules.matchers {
                assert!(matcher.weight > 0.0 && matcher.weight <= 1.0);
            }
        }
    }

    #[test]
    fn test_names_are_stable() {
        assert_eq!(FrameworkId::NextJs.name(), "nextjs");
        assert_eq!(FrameworkId::Gin.name(), "go-gin");
        assert_eq!(FrameworkId::NextJs.language(), "javascript");
        assert_eq!(FrameworkId::Axum.language(), "rust");
    }
}
