//!
//! todo-abac server binary
//! -----------------------
//! Starts the HTTP server. Configuration comes from `TODO_*` environment variables;
//! `--http-port <n>` overrides the port.

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use todo_abac::config::ServerConfig;

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1)?.parse::<u16>().ok()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let mut cfg = ServerConfig::from_env()?;
    let args: Vec<String> = std::env::args().collect();
    if let Some(port) = parse_port_arg(&args, "--http-port") {
        cfg.http_port = port;
    }

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "todo_abac", "todo-abac starting: RUST_LOG='{}', host={}, http_port={}", rust_log, cfg.host, cfg.http_port);

    todo_abac::server::run(cfg).await
}
