#![deny(unsafe_code)]

//! birdwatch CLI: run the API daemon or query BIRD once.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use birdwatch_config::AppConfig;
use birdwatch_core::{BirdClient, Fetched, Outcome};

/// birdwatch: a cached, rate-limited JSON API for the BIRD routing daemon.
#[derive(Parser)]
#[command(name = "birdwatch", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "birdwatch.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API until interrupted.
    Serve,

    /// Run a single query and print the result as JSON.
    Query {
        #[command(subcommand)]
        query: QueryCommand,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
enum QueryCommand {
    Status,
    Protocols,
    /// BGP protocols only.
    ProtocolsBgp,
    Symbols,
    /// Imported and filtered routes.
    Dump,
    /// Routes for a prefix.
    Prefixed { prefix: String },
    /// Routes imported from a protocol.
    Protocol {
        protocol: String,
        /// Only count the routes.
        #[arg(long)]
        count: bool,
    },
    /// Routes rejected by the import filter of a protocol.
    Filtered { protocol: String },
    /// Routes exported to a protocol.
    Export {
        protocol: String,
        #[arg(long)]
        count: bool,
    },
    /// Routes not exported to a protocol.
    Noexport { protocol: String },
    /// Routes of a table.
    Table {
        table: String,
        #[arg(long)]
        count: bool,
    },
    /// Look up a network in a table.
    LookupTable { net: String, table: String },
    /// Look up a network among the routes of a protocol.
    LookupProtocol { net: String, protocol: String },
    /// Routes exported to a peer.
    Peer { peer: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = if cli.config.exists() {
        Some(AppConfig::load(&cli.config).await?)
    } else {
        None
    };

    let configured = loaded.as_ref().map(|c| c.logging.level.as_str());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose, configured))),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = loaded.unwrap_or_else(|| {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
        AppConfig::default()
    });

    match cli.command {
        Commands::Serve => cmd_serve(config).await?,
        Commands::Query { query } => cmd_query(&config, query).await?,
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
    }

    Ok(())
}

/// Default filter: `-v`/`-vv` win over the configured level.
fn log_filter(verbose: u8, configured: Option<&str>) -> String {
    match verbose {
        0 => configured.unwrap_or("info").to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

async fn cmd_serve(config: AppConfig) -> Result<()> {
    info!(version = %birdwatch_core::build_info::version_string(), "Starting birdwatch daemon");

    let daemon = birdwatch_core::Daemon::new(config);
    daemon.run().await?;

    Ok(())
}

async fn run_query(client: &BirdClient, query: QueryCommand) -> Fetched {
    match query {
        QueryCommand::Status => client.status().await,
        QueryCommand::Protocols => client.protocols().await,
        QueryCommand::ProtocolsBgp => client.protocols_bgp().await,
        QueryCommand::Symbols => client.symbols().await,
        QueryCommand::Dump => client.routes_dump().await,
        QueryCommand::Prefixed { prefix } => client.routes_prefixed(&prefix).await,
        QueryCommand::Protocol { protocol, count } if count => {
            client.routes_proto_count(&protocol).await
        }
        QueryCommand::Protocol { protocol, .. } => client.routes_proto(&protocol).await,
        QueryCommand::Filtered { protocol } => client.routes_filtered(&protocol).await,
        QueryCommand::Export { protocol, count } if count => {
            client.routes_export_count(&protocol).await
        }
        QueryCommand::Export { protocol, .. } => client.routes_export(&protocol).await,
        QueryCommand::Noexport { protocol } => client.routes_noexport(&protocol).await,
        QueryCommand::Table { table, count } if count => client.routes_table_count(&table).await,
        QueryCommand::Table { table, .. } => client.routes_table(&table).await,
        QueryCommand::LookupTable { net, table } => client.routes_lookup_table(&net, &table).await,
        QueryCommand::LookupProtocol { net, protocol } => {
            client.routes_lookup_protocol(&net, &protocol).await
        }
        QueryCommand::Peer { peer } => client.routes_peer(&peer).await,
    }
}

async fn cmd_query(config: &AppConfig, query: QueryCommand) -> Result<()> {
    let client = BirdClient::from_config(config);
    let fetched = run_query(&client, query).await;

    match fetched.outcome {
        Outcome::Ready(parsed) => {
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            Ok(())
        }
        Outcome::Unreachable => bail!("bird unreachable (is `{}` working?)", config.bird.bird_cmd),
        Outcome::NotAdmitted => bail!("rate limit exceeded"),
    }
}

fn cmd_config(config_path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        println!("{}", toml::to_string_pretty(config)?);
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0, None), "info");
        assert_eq!(log_filter(0, Some("warn")), "warn");
        assert_eq!(log_filter(1, Some("warn")), "debug");
        assert_eq!(log_filter(3, None), "trace");
    }

    #[test]
    fn test_parse_query_subcommands() {
        let cli = Cli::try_parse_from(["birdwatch", "query", "protocol", "ID_1", "--count"]).unwrap();
        let Commands::Query { query } = cli.command else {
            panic!("expected query command");
        };
        assert_eq!(
            query,
            QueryCommand::Protocol {
                protocol: "ID_1".to_string(),
                count: true
            }
        );

        let cli = Cli::try_parse_from([
            "birdwatch",
            "-c",
            "/etc/birdwatch.toml",
            "-vv",
            "query",
            "lookup-table",
            "10.0.0.1",
            "master4",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from("/etc/birdwatch.toml"));
        let Commands::Query { query } = cli.command else {
            panic!("expected query command");
        };
        assert_eq!(
            query,
            QueryCommand::LookupTable {
                net: "10.0.0.1".to_string(),
                table: "master4".to_string()
            }
        );
    }

    #[test]
    fn test_lookup_needs_both_arguments() {
        assert!(Cli::try_parse_from(["birdwatch", "query", "lookup-table", "10.0.0.1"]).is_err());
        assert!(Cli::try_parse_from(["birdwatch", "serve", "extra"]).is_err());
    }
}
