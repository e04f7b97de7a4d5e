mod config;
mod ingest_cmd;
mod parse_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clawdrop_core::WorkspaceResolver;
use clawdrop_media::ParsedResult;
use tracing::debug;

use config::Runtime;

#[derive(Parser)]
#[command(name = "clawdrop")]
#[command(about = "Classify and store chat attachments for agent workspaces")]
#[command(version)]
struct Cli {
    /// Config file (defaults to `$CLAWDROP_CONFIG_DIR/config.yaml` or `~/.clawdrop/config.yaml`)
    #[arg(long, env = "CLAWDROP_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attach local files to a message
    Ingest(ingest_cmd::IngestArgs),
    /// Process a JSON chat request from a file or stdin
    Parse(parse_cmd::ParseArgs),
    /// Print the workspace directory an agent resolves to
    Workspace {
        /// Agent id (defaults to the configured default agent)
        agent: Option<String>,
    },
}

/// Print a parse result (or the user turn built from it) as pretty JSON on stdout.
pub(crate) fn print_result(result: ParsedResult, as_turn: bool) -> Result<()> {
    let json = if as_turn {
        serde_json::to_string_pretty(&result.into_user_turn())?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let raw = config::load_raw(cli.config.as_deref()).await?;
    let (log_dir, level) = config::log_settings(&raw);
    clawdrop_logging::init_logger(log_dir.as_deref(), &level);

    let runtime = Runtime::new(raw)?;
    debug!(state_dir = %runtime.resolver.state_dir().display(), "Config ready");

    match cli.command {
        Commands::Ingest(args) => ingest_cmd::run(&runtime, args).await?,
        Commands::Parse(args) => parse_cmd::run(&runtime, args).await?,
        Commands::Workspace { agent } => {
            let agent = agent.unwrap_or_else(|| runtime.resolver.default_agent().to_string());
            match runtime.resolver.resolve_workspace(&agent) {
                Some(dir) => println!("{}", dir.display()),
                None => anyhow::bail!("No workspace for agent '{agent}'"),
            }
        }
    }

    Ok(())
}
