//! # opgraph-core
//!
//! The lock-guarded computation-graph editing engine - THE ENGINE.
//!
//! This crate owns an in-memory computation graph of operation nodes joined
//! by data edges (source output port to destination input port) and control
//! edges (ordering only), together with the per-op shape bookkeeping needed
//! to validate port indices.
//!
//! All structural mutation goes through `GraphEditor`, which serializes
//! concurrent callers under a single per-graph mutex: rewiring a data edge
//! to a new source, adding and clearing control dependencies, and setting an
//! operation's requested device placement.
//!
//! ## Architectural Constraints
//!
//! The engine:
//! - Is the only place where graph state lives (stateful)
//! - Validates before it mutates; on any reported error the graph is unchanged
//! - Has NO async, NO network dependencies (pure Rust)
//! - Uses `BTreeMap` exclusively for deterministic ordering

// =============================================================================
// MODULES
// =============================================================================

pub mod editor;
pub mod formats;
pub mod graph;
pub mod primitives;
pub mod shape;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    DeviceName, Edge, EdgeKind, GraphError, InputPort, OpId, OpName, OpNode, OutputPort,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use editor::{GraphEditor, OpRegistration};
pub use graph::{Graph, GraphMutator, SerializableGraph};
pub use shape::{InferenceContext, ShapeHandle, ShapeRefiner};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, editor_from_bytes, editor_to_bytes};
