//! # opgraph - Computation Graph Editor
//!
//! The main binary for the opgraph editing engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            apps/opgraph (THE BINARY)        │
//! │                                             │
//! │   CLI (clap) -> snapshot file I/O           │
//! │                      │                      │
//! │                      ▼                      │
//! │              ┌───────────────┐              │
//! │              │ opgraph-core  │              │
//! │              │ (THE ENGINE)  │              │
//! │              └───────────────┘              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! opgraph init
//! opgraph add-op --name matmul --inputs 2 --outputs 1
//! opgraph connect -s 0 --src-output 0 -d 2 --dst-input 0
//! opgraph rewire -s 1 --src-output 0 -d 2 --dst-input 0
//! opgraph add-control -s 0 -d 2
//! opgraph set-device --op 2 --device /device:GPU:0
//! ```

use clap::Parser;
use opgraph::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Initialize tracing — OPGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("OPGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "opgraph=info".into());

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

    // Banner is suppressed by --quiet (and for JSON consumers).
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the opgraph banner.
fn print_banner() {
    println!(
        "opgraph v{} - computation graph editor",
        env!("CARGO_PKG_VERSION")
    );
}
