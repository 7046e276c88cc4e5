pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, ConfigArgs, RulesArgs, RunArgs, VerifyArgs};
pub use handlers::{handle_config, handle_rules, handle_run, handle_verify, read_source, InputError};
pub use output::{OutputFormat, OutputFormatter, RuleInfo};
