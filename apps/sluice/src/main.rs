//! # Sluice - Rewrite Decision Server
//!
//! The main binary for the sluice decision layer.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for filter resolution and critical-resource inspection
//! - A background dispatcher for periodic statistics reports
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      apps/sluice (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐     │
//! │  │   CLI       │    │   HTTP API  │    │  Scheduler       │     │
//! │  │  (clap)     │    │   (axum)    │    │  (own thread)    │     │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘     │
//! │         │                  │                    │               │
//! │         └──────────────────┼────────────────────┘               │
//! │                            ▼                                    │
//! │                    ┌───────────────┐                            │
//! │                    │  sluice-core  │                            │
//! │                    │ (THE DECISION)│                            │
//! │                    └───────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! sluice -c sluice.toml server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! sluice filters --level CoreFilters
//! sluice resolve www.example.com --enable inline_css --set css_inline_max_bytes=512
//! sluice critical show http://www.example.com/
//! ```

use clap::Parser;
use sluice::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // SLUICE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("SLUICE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sluice=info,sluice_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ███████╗██╗     ██╗   ██╗██╗ ██████╗███████╗
  ██╔════╝██║     ██║   ██║██║██╔════╝██╔════╝
  ███████╗██║     ██║   ██║██║██║     █████╗
  ╚════██║██║     ██║   ██║██║██║     ██╔══╝
  ███████║███████╗╚██████╔╝██║╚██████╗███████╗
  ╚══════╝╚══════╝ ╚═════╝ ╚═╝ ╚═════╝╚══════╝

  Rewrite Decision Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
