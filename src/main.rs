use stackprobe::cli::commands::{CliArgs, Commands};
use stackprobe::cli::handlers::{handle_cache, handle_detect, handle_phase};
use stackprobe::util::logging::{self, LoggingConfig};
use stackprobe::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("stackprobe v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Detect(detect_args) => handle_detect(detect_args),
        Commands::Phase(phase_args) => handle_phase(phase_args),
        Commands::Cache { action } => handle_cache(action),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        logging::parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("STACKPROBE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        logging::parse_level(&level_str)
    };

    logging::init_logging(LoggingConfig::with_level(level));
}
