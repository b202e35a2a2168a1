//! # Shape Bookkeeping
//!
//! Per-operation shape-inference state for the opgraph engine.
//!
//! The engine does not run a shape-inference algorithm. It only records the
//! declared port counts and the shape handle attached to each port, which is
//! exactly what the editing surface needs to validate port indices before a
//! structural mutation.

use crate::{GraphError, OpId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// SHAPE HANDLE
// =============================================================================

/// An inferred tensor shape attached to a port.
///
/// A handle is either of unknown rank, or of known rank with each dimension
/// extent possibly unknown. Extents use `i64` to match on-the-wire tensor
/// dimension encodings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeHandle {
    /// Rank and dimensions are unknown.
    Unknown,
    /// Rank is known; each dimension is a known extent or `None`.
    Known(Vec<Option<i64>>),
}

impl ShapeHandle {
    /// Create a handle of unknown rank.
    #[must_use]
    pub const fn unknown() -> Self {
        Self::Unknown
    }

    /// Create a handle with the given dimensions.
    #[must_use]
    pub fn known(dims: Vec<Option<i64>>) -> Self {
        Self::Known(dims)
    }

    /// Create a rank-0 (scalar) handle.
    #[must_use]
    pub fn scalar() -> Self {
        Self::Known(Vec::new())
    }

    /// The rank, if known.
    #[must_use]
    pub fn rank(&self) -> Option<usize> {
        match self {
            Self::Unknown => None,
            Self::Known(dims) => Some(dims.len()),
        }
    }

    /// Merge two handles into their most specific common refinement.
    ///
    /// - Unknown merges with anything, yielding the other handle.
    /// - Known shapes must agree on rank, and on every extent that both
    ///   sides know; an unknown extent refines to the known one.
    ///
    /// The rewire path deliberately does not call this; it is exposed for
    /// callers that want to check compatibility before reconnecting.
    pub fn merge(&self, other: &Self) -> Result<Self, GraphError> {
        match (self, other) {
            (Self::Unknown, s) | (s, Self::Unknown) => Ok(s.clone()),
            (Self::Known(a), Self::Known(b)) => {
                if a.len() != b.len() {
                    return Err(GraphError::IncompatibleShapes(
                        self.to_string(),
                        other.to_string(),
                    ));
                }
                let mut merged = Vec::with_capacity(a.len());
                for (da, db) in a.iter().zip(b.iter()) {
                    match (da, db) {
                        (Some(x), Some(y)) if x != y => {
                            return Err(GraphError::IncompatibleShapes(
                                self.to_string(),
                                other.to_string(),
                            ));
                        }
                        (Some(x), _) | (_, Some(x)) => merged.push(Some(*x)),
                        (None, None) => merged.push(None),
                    }
                }
                Ok(Self::Known(merged))
            }
        }
    }
}

impl fmt::Display for ShapeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "?"),
            Self::Known(dims) => {
                write!(f, "[")?;
                for (i, dim) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    match dim {
                        Some(d) => write!(f, "{d}")?,
                        None => write!(f, "?")?,
                    }
                }
                write!(f, "]")
            }
        }
    }
}

// =============================================================================
// INFERENCE CONTEXT
// =============================================================================

/// Per-operation shape bookkeeping: declared input and output counts and
/// one shape handle per port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceContext {
    inputs: Vec<ShapeHandle>,
    outputs: Vec<ShapeHandle>,
}

impl InferenceContext {
    /// Create a context with the given port shapes.
    #[must_use]
    pub fn new(inputs: Vec<ShapeHandle>, outputs: Vec<ShapeHandle>) -> Self {
        Self { inputs, outputs }
    }

    /// Create a context with the given port counts, all shapes unknown.
    #[must_use]
    pub fn with_counts(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            inputs: vec![ShapeHandle::Unknown; num_inputs],
            outputs: vec![ShapeHandle::Unknown; num_outputs],
        }
    }

    /// The declared number of inputs.
    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// The declared number of outputs.
    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// The shape handle of an input port, if the index is in range.
    #[must_use]
    pub fn input(&self, index: usize) -> Option<&ShapeHandle> {
        self.inputs.get(index)
    }

    /// The shape handle of an output port, if the index is in range.
    #[must_use]
    pub fn output(&self, index: usize) -> Option<&ShapeHandle> {
        self.outputs.get(index)
    }
}

// =============================================================================
// SHAPE REFINER
// =============================================================================

/// The per-graph registry of inference contexts.
///
/// Owned alongside the graph and consulted by the editor for port-bounds
/// validation before delegating a structural edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeRefiner {
    contexts: BTreeMap<OpId, InferenceContext>,
}

impl ShapeRefiner {
    /// Create an empty refiner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the context for an operation, replacing any existing one.
    pub fn insert(&mut self, op: OpId, context: InferenceContext) {
        self.contexts.insert(op, context);
    }

    /// Look up the context for an operation.
    pub fn context(&self, op: OpId) -> Result<&InferenceContext, GraphError> {
        self.contexts
            .get(&op)
            .ok_or(GraphError::ContextNotFound(op))
    }

    /// Look up the context for an operation, if registered.
    #[must_use]
    pub fn get(&self, op: OpId) -> Option<&InferenceContext> {
        self.contexts.get(&op)
    }

    /// Iterate all registered contexts in deterministic order.
    pub fn contexts(&self) -> impl Iterator<Item = (OpId, &InferenceContext)> {
        self.contexts.iter().map(|(op, ctx)| (*op, ctx))
    }

    /// The number of registered contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Check whether no contexts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
