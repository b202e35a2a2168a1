//! # Core Type Definitions
//!
//! This module contains all core types for the opgraph editing engine:
//! - Operation identifiers and metadata (`OpId`, `OpName`, `DeviceName`, `OpNode`)
//! - Edge endpoints (`OutputPort`, `InputPort`)
//! - Edge representation (`Edge`, `EdgeKind`)
//! - Error types (`GraphError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where used as `BTreeMap`/`BTreeSet` keys
//! - Carry no interior mutability

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// OPERATION IDENTIFIERS
// =============================================================================

/// Unique identifier for an operation node in the graph.
///
/// Ids are assigned sequentially by the graph and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpId(pub u64);

/// Name of an operation.
///
/// Names are caller-supplied labels; the engine does not interpret them
/// and does not require uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpName(pub String);

impl OpName {
    /// Create a new operation name from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Requested device placement for an operation.
///
/// A free-form hint string such as `"/device:GPU:0"`. The empty string
/// means "no placement requested".
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceName(pub String);

impl DeviceName {
    /// Create a new device name from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the device name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a placement has been requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// OPERATION NODE
// =============================================================================

/// An operation node in the graph.
///
/// The node carries only identity and placement metadata. Port counts and
/// inferred shapes live in the per-op `InferenceContext`, and the incident
/// edges live in the graph's edge maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpNode {
    /// The internal operation identifier.
    pub id: OpId,
    /// The caller-supplied operation name.
    pub name: OpName,
    /// The requested device placement (empty if none).
    pub requested_device: DeviceName,
}

impl OpNode {
    /// Create a new operation node with no requested device.
    #[must_use]
    pub fn new(id: OpId, name: OpName) -> Self {
        Self {
            id,
            name,
            requested_device: DeviceName::default(),
        }
    }
}

// =============================================================================
// EDGE ENDPOINTS
// =============================================================================

/// One end of a data edge: an operation and an index into its outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputPort {
    /// The operation the edge leaves from.
    pub op: OpId,
    /// Index into the outputs of that operation.
    pub index: usize,
}

impl OutputPort {
    /// Create a new output port reference.
    #[must_use]
    pub const fn new(op: OpId, index: usize) -> Self {
        Self { op, index }
    }
}

/// One end of a data edge: an operation and an index into its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InputPort {
    /// The operation the edge arrives at.
    pub op: OpId,
    /// Index into the inputs of that operation.
    pub index: usize,
}

impl InputPort {
    /// Create a new input port reference.
    #[must_use]
    pub const fn new(op: OpId, index: usize) -> Self {
        Self { op, index }
    }
}

// =============================================================================
// EDGES
// =============================================================================

/// The kind of a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// A data edge carrying a value from a source output port to a
    /// destination input port.
    Data {
        /// Output index on the source operation.
        src_output: usize,
        /// Input index on the destination operation.
        dst_input: usize,
    },
    /// A control edge enforcing execution ordering only; carries no data.
    Control,
}

/// A directed edge between two operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source operation.
    pub src: OpId,
    /// Destination operation.
    pub dst: OpId,
    /// Data ports or control.
    pub kind: EdgeKind,
}

impl Edge {
    /// Create a data edge.
    #[must_use]
    pub const fn data(src: OpId, src_output: usize, dst: OpId, dst_input: usize) -> Self {
        Self {
            src,
            dst,
            kind: EdgeKind::Data {
                src_output,
                dst_input,
            },
        }
    }

    /// Create a control edge.
    #[must_use]
    pub const fn control(src: OpId, dst: OpId) -> Self {
        Self {
            src,
            dst,
            kind: EdgeKind::Control,
        }
    }

    /// Check whether this is a control edge.
    #[must_use]
    pub const fn is_control(&self) -> bool {
        matches!(self.kind, EdgeKind::Control)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the opgraph engine.
///
/// - No silent failures
/// - Use `Result<T, GraphError>` for fallible operations
/// - The engine should never panic; all errors must be recoverable
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// The requested output index exceeds the operation's declared output
    /// count.
    #[error(
        "Cannot update edge. Output index [{index}] is greater than the number of total outputs [{num_outputs}]."
    )]
    OutputOutOfRange {
        /// The offending output index.
        index: usize,
        /// The declared number of outputs.
        num_outputs: usize,
    },

    /// The requested input index exceeds the operation's declared input
    /// count.
    #[error(
        "Cannot update edge. Input index [{index}] is greater than the number of total inputs [{num_inputs}]."
    )]
    InputOutOfRange {
        /// The offending input index.
        index: usize,
        /// The declared number of inputs.
        num_inputs: usize,
    },

    /// The requested operation was not found in the graph.
    #[error("Operation not found: {0:?}")]
    OpNotFound(OpId),

    /// No inference context is registered for the operation.
    #[error("No inference context for operation: {0:?}")]
    ContextNotFound(OpId),

    /// The destination input port has no incoming data edge to replace.
    #[error("Input port {index} of operation {op:?} has no incoming edge")]
    InputNotConnected {
        /// The destination operation.
        op: OpId,
        /// The unconnected input index.
        index: usize,
    },

    /// The destination input port already has an incoming data edge.
    #[error("Input port {index} of operation {op:?} is already connected")]
    PortOccupied {
        /// The destination operation.
        op: OpId,
        /// The occupied input index.
        index: usize,
    },

    /// The requested control edge does not exist.
    #[error("Control edge not found: {src:?} -> {dst:?}")]
    ControlEdgeNotFound {
        /// Source operation.
        src: OpId,
        /// Destination operation.
        dst: OpId,
    },

    /// An operation registration failed validation.
    #[error("Invalid operation registration: {0}")]
    InvalidRegistration(String),

    /// Two shapes could not be merged into a common refinement.
    #[error("Incompatible shapes: {0} and {1}")]
    IncompatibleShapes(String, String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
