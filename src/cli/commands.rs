use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Technology stack and maturity phase detection for software projects
#[derive(Parser, Debug)]
#[command(
    name = "stackprobe",
    about = "Detect a project's technology stack and maturity phase",
    version,
    author,
    long_about = "stackprobe scans a project tree, extracts signals from manifest files, \
                  and scores framework candidates against declarative rule sets. Results \
                  are cached on disk keyed by a manifest fingerprint. Monorepo workspaces \
                  are detected and scored per sub-package."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Detect the technology stack of a project",
        long_about = "Scans the project tree and reports the detected framework, language, \
                      version, tools, and confidence.\n\n\
                      Examples:\n  \
                      stackprobe detect\n  \
                      stackprobe detect /path/to/project --format json\n  \
                      stackprobe detect --no-cache"
    )]
    Detect(DetectArgs),

    #[command(
        about = "Classify the maturity phase of a project",
        long_about = "Scores maturity indicators (declared version, commit history, tests, \
                      CI, docs, structure) and reports prototype, mvp, or production.\n\n\
                      Examples:\n  \
                      stackprobe phase\n  \
                      stackprobe phase /path/to/project --format json"
    )]
    Phase(PhaseArgs),

    #[command(about = "Inspect or clear the detection result cache")]
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the project (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, help = "Bypass the result cache for this run")]
    pub no_cache: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PhaseArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the project (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CacheAction {
    #[command(about = "Show entry count and accumulated hits")]
    Stats,
    #[command(about = "Remove every cached result")]
    Clear,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Human,
    Json,
    Yaml,
}
