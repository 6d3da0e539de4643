use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "agentrail",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about = "Run agents and agent chains with durable execution tracking"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// SQLite database path (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// User id recorded as the owner of new executions
    #[arg(long, global = true, default_value = "cli")]
    pub user: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve(ServeArgs),
    /// List registered agents
    Agents,
    /// Run a single agent
    Run(RunArgs),
    /// Run a configured chain
    Chain(ChainArgs),
    /// Resume a chain execution left running
    Resume(ResumeArgs),
    /// List recorded executions
    Executions(ExecutionsArgs),
    /// Show execution metrics for a date range
    Metrics(MetricsArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen address (overrides the config file)
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port (overrides the config file)
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Agent type tag
    pub agent_type: String,

    /// Task instruction
    #[arg(short, long)]
    pub task: String,

    /// Parameter as key=value; JSON values are parsed, anything else is a string
    #[arg(short, long = "param")]
    pub params: Vec<String>,

    /// Input file (repeatable)
    #[arg(short, long = "file")]
    pub files: Vec<String>,

    /// Print the execution record as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ChainArgs {
    /// Chain id
    pub chain_id: String,

    /// Task instruction
    #[arg(short, long)]
    pub task: String,

    /// Input file (repeatable)
    #[arg(short, long = "file")]
    pub files: Vec<String>,

    /// Print the chain execution as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ResumeArgs {
    /// Chain execution id
    pub chain_execution_id: String,

    /// Print the chain execution as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ExecutionsArgs {
    /// Only executions of this agent type
    #[arg(long)]
    pub agent_type: Option<String>,

    /// Only executions with this status: running, completed, failed
    #[arg(long)]
    pub status: Option<String>,

    /// Only executions owned by this user
    #[arg(long = "owner")]
    pub owner: Option<String>,

    /// Only executions spawned by this parent execution or chain execution
    #[arg(long)]
    pub parent: Option<String>,

    /// Started at or after (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Started at or before (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    #[arg(long, default_value = "20")]
    pub limit: usize,

    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct MetricsArgs {
    /// Range start (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub from: String,

    /// Range end (RFC 3339 or YYYY-MM-DD, a bare date covers the whole day)
    #[arg(long)]
    pub to: String,

    /// Only this agent type
    #[arg(long)]
    pub agent_type: Option<String>,

    /// Time bucket: hour, day, week, month
    #[arg(long)]
    pub bucket: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Path to YAML config file
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_params() {
        let cli = Cli::parse_from([
            "agentrail", "--user", "dana", "run", "code-gen", "--task", "scaffold",
            "-p", "language=rust", "-p", "modules=[\"api\"]",
        ]);
        assert_eq!(cli.user, "dana");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.agent_type, "code-gen");
                assert_eq!(args.params.len(), 2);
            }
            _ => panic!("expected run"),
        }
    }
}
