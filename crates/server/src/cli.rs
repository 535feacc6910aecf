//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use sqlmcp_core::Config;

/// Serve a SQLite database to MCP clients over stdio or HTTP.
#[derive(Parser, Debug)]
#[command(name = "sqlmcp-server", version, about)]
pub struct Cli {
    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, global = true, env = "SQLMCP_PROFILE", default_value = "")]
    pub profile: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Newline-delimited JSON-RPC on stdin/stdout.
    Stdio(StdioArgs),
    /// JSON-RPC over HTTP POST plus the auxiliary endpoints.
    Http(HttpArgs),
}

#[derive(Args, Debug)]
pub struct StdioArgs {
    /// SQLite database file (overrides DATABASE_PATH).
    #[arg(long)]
    pub database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct HttpArgs {
    /// SQLite database file (overrides DATABASE_PATH).
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Bind host (overrides HOST).
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides PORT).
    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Environment config for the selected profile with CLI flags applied on top.
    pub fn resolve_config(&self) -> Config {
        let mut config = Config::for_profile(&self.profile);
        match &self.command {
            Command::Stdio(args) => {
                if let Some(path) = &args.database {
                    config.database.path = path.clone();
                }
            }
            Command::Http(args) => {
                if let Some(path) = &args.database {
                    config.database.path = path.clone();
                }
                if let Some(host) = &args.host {
                    config.server.host = host.clone();
                }
                if let Some(port) = args.port {
                    config.server.port = port;
                }
            }
        }
        config
    }
}
