use deploychain::cli::commands::{CliArgs, Commands};
use deploychain::cli::handlers::{handle_config, handle_rules, handle_run, handle_verify};
use deploychain::util::logging::{init_logging, parse_level, LoggingConfig};
use deploychain::VERSION;

use clap::Parser;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("deploychain v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Run(run_args) => handle_run(run_args, args.quiet),
        Commands::Verify(verify_args) => handle_verify(verify_args),
        Commands::Rules(rules_args) => handle_rules(rules_args),
        Commands::Config(config_args) => handle_config(config_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let mut config = LoggingConfig::from_env();
    if let Some(level_str) = &args.log_level {
        config.level = parse_level(level_str);
    } else if args.verbose {
        config.level = Level::DEBUG;
    } else if args.quiet {
        config.level = Level::ERROR;
    }
    init_logging(config);
}
