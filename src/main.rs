//! MySQL MCP Server - Main entry point.
//!
//! This server exposes the tables of one MySQL database as MCP schema
//! resources and offers a `query` tool that runs SQL read-only.

use mysql_mcp_server::config::{Config, TransportMode};
use mysql_mcp_server::db::DbPool;
use mysql_mcp_server::mcp::{McpService, Router};
use mysql_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs always go to stderr; stdout belongs to the stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Variables already set in the environment win over the file
    let env_file = dotenvy::dotenv();
    let config = Config::parse_args();

    init_tracing(&config);

    if let Ok(path) = &env_file {
        debug!(path = %path.display(), "Loaded environment file");
    }

    // Nothing touches the network until the configuration is known to be usable
    let (connect_options, base_url) = match config
        .connect_options()
        .and_then(|options| Ok((options, config.resource_base_url()?)))
    {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("Usage: mysql-mcp-server --database <name> [--host <host>] [--port <port>]");
            eprintln!("       MYSQL_DATABASE=<name> mysql-mcp-server");
            eprintln!();
            eprintln!("Examples:");
            eprintln!("  mysql-mcp-server --database shop");
            eprintln!("  MYSQL_HOST=db.internal MYSQL_USER=reader MYSQL_DATABASE=sales mysql-mcp-server");
            eprintln!("  mysql-mcp-server --database shop --transport http --http-port 3000");
            std::process::exit(1);
        }
    };

    info!(
        transport = %config.transport,
        resource_base = %base_url,
        "Starting MySQL MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let pool = DbPool::connect_lazy(connect_options, config.pool_options());
    let service = McpService::new(Router::new(pool, base_url));

    let result = match config.transport {
        TransportMode::Stdio => StdioTransport::new(service).run().await,
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                service,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .run()
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
