mod api;
mod auth;
mod cli;
mod router;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use sqlmcp_core::Config;
use sqlmcp_mcp::{McpServer, StdioTransport};
use sqlmcp_storage::Database;
use sqlmcp_tool_runtime::{sqlite_registry, SampleQueries};

use crate::cli::{Cli, Command};
use crate::state::AppState;

/// Build the database handle and the MCP server around its tool registry.
fn build_server(config: &Config) -> anyhow::Result<(Database, McpServer)> {
    let database = Database::from_config(&config.database);

    let samples = match &config.database.sample_queries_path {
        Some(path) => {
            let samples = SampleQueries::load(path)
                .with_context(|| format!("loading sample queries from {}", path.display()))?;
            info!(path = %path.display(), count = samples.len(), "Loaded sample queries");
            samples
        }
        None => SampleQueries::builtin(),
    };

    let registry = sqlite_registry(database.clone(), samples)?;
    info!(
        tools = ?registry.names().collect::<Vec<_>>(),
        "Tool registry ready"
    );

    let mcp = McpServer::new(registry).with_identity(config.mcp.clone());
    Ok((database, mcp))
}

async fn serve_stdio(mcp: McpServer) -> anyhow::Result<()> {
    let mut transport = StdioTransport::stdio();
    mcp.run(&mut transport).await?;
    Ok(())
}

async fn serve_http(config: Config, database: Database, mcp: McpServer) -> anyhow::Result<()> {
    let addr = config.server.bind_addr();
    let state = Arc::new(AppState {
        mcp,
        database,
        config,
    });
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("MCP HTTP server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout belongs to the stdio transport, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    sqlmcp_core::config::load_dotenv();
    let cli = Cli::parse();
    let config = cli.resolve_config();
    config.log_summary();

    if let Err(e) = config.ensure_database_exists() {
        tracing::error!("{}", e);
        return Err(e.into());
    }

    let (database, mcp) = build_server(&config)?;

    match cli.command {
        Command::Stdio(_) => serve_stdio(mcp).await,
        Command::Http(_) => serve_http(config, database, mcp).await,
    }
}
