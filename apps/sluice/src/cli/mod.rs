//! # Sluice CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `filters` - List filters, groups and level defaults
//! - `resolve` - Resolve the options for a host
//! - `critical show` / `critical update` - Inspect or seed critical resources
//! - `init` - Write a starter configuration file

mod commands;

use clap::{Parser, Subcommand};
use sluice_core::SluiceError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Sluice - rewrite decision server
///
/// Resolves which HTML rewrite filters apply per host and request, and
/// caches each page's critical resources.
#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ./sluice.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// List filters, filter groups and level defaults
    Filters {
        /// Only list the filters a rewrite level enables by default
        #[arg(short, long)]
        level: Option<String>,
    },

    /// Resolve the effective options for a host
    Resolve {
        /// Host whose scope is layered over the global one
        #[arg(default_value = "")]
        host: String,

        /// Request-scope rewrite level
        #[arg(short, long)]
        level: Option<String>,

        /// Comma-separated filters or groups to enable (repeatable)
        #[arg(short, long)]
        enable: Vec<String>,

        /// Comma-separated filters or groups to disable (repeatable)
        #[arg(short, long)]
        disable: Vec<String>,

        /// Disable everything not explicitly enabled
        #[arg(long)]
        allow_list_only: bool,

        /// Option override as name=value (repeatable)
        #[arg(short, long)]
        set: Vec<String>,
    },

    /// Inspect or seed critical resources
    Critical {
        #[command(subcommand)]
        action: CriticalCommand,
    },

    /// Write a starter configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = crate::config::DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CriticalCommand {
    /// Show the critical sets for a page
    Show {
        /// Page URL
        url: String,

        /// Host whose options apply (TTL)
        #[arg(short = 'H', long, default_value = "")]
        host: String,

        /// Print the stored payload base64-encoded instead of decoding it
        #[arg(long)]
        raw: bool,
    },

    /// Store critical sets for a page
    Update {
        /// Page URL
        url: String,

        /// Comma-separated critical image URLs
        #[arg(long)]
        html: Option<String>,

        /// Comma-separated critical CSS image URLs
        #[arg(long)]
        css: Option<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SluiceError> {
    let config_path = cli.config.as_deref();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(config_path, &host, port).await,
        Some(Commands::Filters { level }) => cmd_filters(json_mode, level.as_deref()),
        Some(Commands::Resolve {
            host,
            level,
            enable,
            disable,
            allow_list_only,
            set,
        }) => {
            let scope = request_scope(level, enable, disable, allow_list_only, &set)?;
            cmd_resolve(config_path, json_mode, cli.verbose, &host, &scope)
        }
        Some(Commands::Critical {
            action: CriticalCommand::Show { url, host, raw },
        }) => cmd_critical_show(config_path, json_mode, &url, &host, raw),
        Some(Commands::Critical {
            action: CriticalCommand::Update { url, html, css },
        }) => cmd_critical_update(config_path, json_mode, &url, html.as_deref(), css.as_deref()),
        Some(Commands::Init { output, force }) => cmd_init(&output, force),
        None => cmd_filters(json_mode, None),
    }
}
