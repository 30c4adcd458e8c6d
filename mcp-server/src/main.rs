use std::path::PathBuf;

use appbridge_mcp_server::run_main;
use clap::Parser;

/// MCP server bridging assistant tool calls to policy-gated AppleScript
/// automation.
#[derive(Parser)]
#[command(name = "appbridge-mcp-server")]
struct Cli {
    /// Path to the config file (overrides APPBRIDGE_CONFIG and the default
    /// location).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_main(cli.config).await?;
    Ok(())
}
