use clap::Parser;

/// Parsed command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "jobq-server")]
#[command(about = "HTTP endpoint that accepts job submissions and enqueues them")]
#[command(version)]
pub struct CliArgs {
    /// Path to configuration file (.toml, .yaml, .yml or .json).
    #[arg(short = 'c', long = "config-path", env = "JOBQ_CONFIG_PATH")]
    pub config_path: Option<String>,
}
