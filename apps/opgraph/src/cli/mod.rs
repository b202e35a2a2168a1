//! # opgraph CLI Module
//!
//! This module implements the CLI interface for opgraph.
//!
//! ## Available Commands
//!
//! - `init` - Create a new empty snapshot
//! - `status` - Show graph status
//! - `add-op` - Register a new operation
//! - `connect` - Wire an initial data edge
//! - `rewire` - Point an input port at a new source
//! - `add-control` - Add a control dependency
//! - `clear-control` - Remove all control dependencies of an op
//! - `set-device` - Set an op's requested device placement
//! - `show` - Show an op's incoming edges and placement

mod commands;

use clap::{Parser, Subcommand};
use opgraph_core::GraphError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// opgraph - Computation Graph Editor
///
/// Edits an on-disk computation-graph snapshot: rewires data edges,
/// manages control dependencies, and sets device placement hints.
#[derive(Parser, Debug)]
#[command(name = "opgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the graph snapshot file
    #[arg(short = 'G', long, global = true, default_value = "graph.opg")]
    pub graph: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new empty snapshot
    Init {
        /// Overwrite an existing snapshot
        #[arg(short, long)]
        force: bool,
    },

    /// Show graph status
    Status,

    /// Register a new operation
    AddOp {
        /// Operation name
        #[arg(short, long)]
        name: String,

        /// Number of input ports
        #[arg(short, long, default_value = "0")]
        inputs: usize,

        /// Number of output ports
        #[arg(short, long, default_value = "1")]
        outputs: usize,

        /// Requested device placement
        #[arg(short, long, default_value = "")]
        device: String,
    },

    /// Wire an initial data edge into an unconnected input port
    Connect {
        /// Source op id
        #[arg(short, long)]
        src: u64,

        /// Output index on the source op
        #[arg(long, default_value = "0")]
        src_output: usize,

        /// Destination op id
        #[arg(short, long)]
        dst: u64,

        /// Input index on the destination op
        #[arg(long, default_value = "0")]
        dst_input: usize,
    },

    /// Point a connected input port at a new source output
    Rewire {
        /// New source op id
        #[arg(short, long)]
        src: u64,

        /// Output index on the new source op
        #[arg(long, default_value = "0")]
        src_output: usize,

        /// Destination op id
        #[arg(short, long)]
        dst: u64,

        /// Input index on the destination op
        #[arg(long, default_value = "0")]
        dst_input: usize,
    },

    /// Add a control dependency (dst will not run before src)
    AddControl {
        /// Source op id
        #[arg(short, long)]
        src: u64,

        /// Destination op id
        #[arg(short, long)]
        dst: u64,
    },

    /// Remove every control dependency of an op
    ClearControl {
        /// Op id
        #[arg(short, long)]
        op: u64,
    },

    /// Set an op's requested device placement (empty string clears it)
    SetDevice {
        /// Op id
        #[arg(short, long)]
        op: u64,

        /// Device placement string
        #[arg(short, long, default_value = "")]
        device: String,
    },

    /// Show an op's incoming edges and placement
    Show {
        /// Op id
        #[arg(short, long)]
        op: u64,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), GraphError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&cli.graph, force),
        Some(Commands::Status) => cmd_status(&cli.graph, json_mode),
        Some(Commands::AddOp {
            name,
            inputs,
            outputs,
            device,
        }) => cmd_add_op(&cli.graph, json_mode, &name, inputs, outputs, &device),
        Some(Commands::Connect {
            src,
            src_output,
            dst,
            dst_input,
        }) => cmd_connect(&cli.graph, src, src_output, dst, dst_input),
        Some(Commands::Rewire {
            src,
            src_output,
            dst,
            dst_input,
        }) => cmd_rewire(&cli.graph, src, src_output, dst, dst_input),
        Some(Commands::AddControl { src, dst }) => cmd_add_control(&cli.graph, src, dst),
        Some(Commands::ClearControl { op }) => cmd_clear_control(&cli.graph, op),
        Some(Commands::SetDevice { op, device }) => cmd_set_device(&cli.graph, op, &device),
        Some(Commands::Show { op }) => cmd_show(&cli.graph, json_mode, op),
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.graph, json_mode)
        }
    }
}
