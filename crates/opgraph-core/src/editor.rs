//! # Graph Editor
//!
//! The lock-guarded mutation surface of the opgraph engine.
//!
//! Every operation acquires the graph's mutex for its full duration and
//! releases it on every exit path, including early error returns. Callers on
//! multiple threads therefore observe serialized structural mutation and
//! never a partially applied edit.
//!
//! The editor validates port indices against the shape refiner's declared
//! bounds, then delegates the structural edit to the `GraphMutator`
//! primitive, passing delegate errors through unchanged. On any reported
//! error the graph is unmodified.

use crate::graph::{Graph, GraphMutator};
use crate::primitives::{
    MAX_DEVICE_LENGTH, MAX_OP_NAME_LENGTH, MAX_PORTS_PER_OP, MAX_SHAPE_RANK,
};
use crate::shape::{InferenceContext, ShapeHandle, ShapeRefiner};
use crate::{DeviceName, Edge, GraphError, InputPort, OpId, OpName, OutputPort};
use std::sync::{Mutex, MutexGuard, PoisonError};

// =============================================================================
// OPERATION REGISTRATION
// =============================================================================

/// The description of an operation to add to the graph: its name, optional
/// device placement, and per-port shapes (whose lengths are the declared
/// input and output counts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpRegistration {
    /// The operation name.
    pub name: OpName,
    /// Requested device placement (empty for none).
    pub device: DeviceName,
    /// One shape handle per input port.
    pub input_shapes: Vec<ShapeHandle>,
    /// One shape handle per output port.
    pub output_shapes: Vec<ShapeHandle>,
}

impl OpRegistration {
    /// Create a registration with the given port counts, all shapes unknown
    /// and no device placement.
    #[must_use]
    pub fn new(name: impl Into<String>, num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            name: OpName::new(name),
            device: DeviceName::default(),
            input_shapes: vec![ShapeHandle::Unknown; num_inputs],
            output_shapes: vec![ShapeHandle::Unknown; num_outputs],
        }
    }

    /// Set the requested device placement.
    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = DeviceName::new(device);
        self
    }

    /// Set the shape of one output port. Out-of-range indices are ignored;
    /// `validate` bounds the counts themselves.
    #[must_use]
    pub fn with_output_shape(mut self, index: usize, shape: ShapeHandle) -> Self {
        if let Some(slot) = self.output_shapes.get_mut(index) {
            *slot = shape;
        }
        self
    }

    /// Set the shape of one input port.
    #[must_use]
    pub fn with_input_shape(mut self, index: usize, shape: ShapeHandle) -> Self {
        if let Some(slot) = self.input_shapes.get_mut(index) {
            *slot = shape;
        }
        self
    }

    /// Validate the registration against the engine limits.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.name.as_str().is_empty() {
            return Err(GraphError::InvalidRegistration(
                "operation name must be non-empty".to_string(),
            ));
        }
        if self.name.as_str().len() > MAX_OP_NAME_LENGTH {
            return Err(GraphError::InvalidRegistration(format!(
                "operation name exceeds {MAX_OP_NAME_LENGTH} bytes"
            )));
        }
        if self.device.as_str().len() > MAX_DEVICE_LENGTH {
            return Err(GraphError::InvalidRegistration(format!(
                "device string exceeds {MAX_DEVICE_LENGTH} bytes"
            )));
        }
        if self.input_shapes.len() > MAX_PORTS_PER_OP
            || self.output_shapes.len() > MAX_PORTS_PER_OP
        {
            return Err(GraphError::InvalidRegistration(format!(
                "port count exceeds {MAX_PORTS_PER_OP}"
            )));
        }
        for shape in self.input_shapes.iter().chain(self.output_shapes.iter()) {
            if shape.rank().is_some_and(|r| r > MAX_SHAPE_RANK) {
                return Err(GraphError::InvalidRegistration(format!(
                    "shape rank exceeds {MAX_SHAPE_RANK}"
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// GRAPH EDITOR
// =============================================================================

/// Editor state protected by the per-graph mutex: the graph and its shape
/// refiner move together under one lock.
#[derive(Debug)]
struct EditorState<G> {
    graph: G,
    refiner: ShapeRefiner,
}

/// The lock-guarded editing surface over a graph.
///
/// Generic over the structural delegate so that the validate-then-delegate
/// behavior can be tested against a fake `GraphMutator`; production code
/// uses the default `Graph`.
#[derive(Debug)]
pub struct GraphEditor<G: GraphMutator = Graph> {
    inner: Mutex<EditorState<G>>,
}

impl<G: GraphMutator> GraphEditor<G> {
    /// Create an editor over an existing delegate and refiner.
    #[must_use]
    pub fn with_parts(graph: G, refiner: ShapeRefiner) -> Self {
        Self {
            inner: Mutex::new(EditorState { graph, refiner }),
        }
    }

    /// Acquire the graph lock, recovering from poisoning.
    ///
    /// Every mutation validates before it writes and each delegate edit is a
    /// single structural step, so state recovered from a poisoned lock is
    /// consistent.
    fn lock(&self) -> MutexGuard<'_, EditorState<G>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rewire the data edge feeding `dst` so that it comes from `new_src`.
    ///
    /// Validates both port indices against the declared bounds in the shape
    /// refiner, then delegates to the graph's edge-update primitive. On any
    /// error the graph is unchanged.
    ///
    /// Shape compatibility between the new source output and the destination
    /// input is not checked here; only port bounds are. Callers that want
    /// strictness can merge the two handles before rewiring.
    pub fn update_edge(&self, new_src: OutputPort, dst: InputPort) -> Result<(), GraphError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let src_ctx = state.refiner.context(new_src.op)?;
        if new_src.index >= src_ctx.num_outputs() {
            return Err(GraphError::OutputOutOfRange {
                index: new_src.index,
                num_outputs: src_ctx.num_outputs(),
            });
        }

        let dst_ctx = state.refiner.context(dst.op)?;
        if dst.index >= dst_ctx.num_inputs() {
            return Err(GraphError::InputOutOfRange {
                index: dst.index,
                num_inputs: dst_ctx.num_inputs(),
            });
        }

        state.graph.update_edge(new_src, dst)
    }

    /// Add a control dependency: `op` will not execute before `input`.
    ///
    /// Returns `true` if a new control edge was inserted, `false` if it
    /// already existed. No validation beyond the delegate's own.
    pub fn add_control_input(&self, op: OpId, input: OpId) -> Result<bool, GraphError> {
        let mut guard = self.lock();
        guard.graph.add_control_edge(input, op)
    }

    /// Remove every incoming control edge of `op`, leaving data edges
    /// untouched. Returns the number of control edges removed.
    pub fn clear_control_inputs(&self, op: OpId) -> Result<usize, GraphError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let incoming = state.graph.in_edges(op)?;
        let mut removed = 0;
        for edge in incoming {
            if edge.is_control() {
                state.graph.remove_control_edge(edge.src, edge.dst)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Overwrite the operation's requested device placement.
    ///
    /// Unconditional for a valid op; the empty string clears the hint.
    pub fn set_requested_device(
        &self,
        op: OpId,
        device: impl AsRef<str>,
    ) -> Result<(), GraphError> {
        let mut guard = self.lock();
        guard.graph.set_requested_device(op, device.as_ref())
    }

    /// All incoming edges of an operation at this instant.
    pub fn in_edges(&self, op: OpId) -> Result<Vec<Edge>, GraphError> {
        let guard = self.lock();
        guard.graph.in_edges(op)
    }

    /// Consume the editor and recover the delegate and refiner.
    #[must_use]
    pub fn into_parts(self) -> (G, ShapeRefiner) {
        let state = self
            .inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (state.graph, state.refiner)
    }
}

impl Default for GraphEditor<Graph> {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphEditor<Graph> {
    /// Create an editor over a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(Graph::new(), ShapeRefiner::new())
    }

    /// Register a new operation: inserts the node and its inference context
    /// in one lock acquisition. Returns the new op's id.
    pub fn add_op(&self, registration: OpRegistration) -> Result<OpId, GraphError> {
        registration.validate()?;

        let mut guard = self.lock();
        let state = &mut *guard;

        let id = state.graph.insert_op(registration.name);
        if !registration.device.is_empty() {
            state
                .graph
                .set_requested_device(id, registration.device.as_str())?;
        }
        state.refiner.insert(
            id,
            InferenceContext::new(registration.input_shapes, registration.output_shapes),
        );
        Ok(id)
    }

    /// Install an initial data edge, with the same port-bounds validation as
    /// `update_edge`. Fails if the destination port is already wired.
    pub fn connect(&self, src: OutputPort, dst: InputPort) -> Result<(), GraphError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let src_ctx = state.refiner.context(src.op)?;
        if src.index >= src_ctx.num_outputs() {
            return Err(GraphError::OutputOutOfRange {
                index: src.index,
                num_outputs: src_ctx.num_outputs(),
            });
        }
        let dst_ctx = state.refiner.context(dst.op)?;
        if dst.index >= dst_ctx.num_inputs() {
            return Err(GraphError::InputOutOfRange {
                index: dst.index,
                num_inputs: dst_ctx.num_inputs(),
            });
        }

        state.graph.connect(src, dst)
    }

    /// The source port currently feeding an input port, if connected.
    pub fn input_source(&self, dst: InputPort) -> Option<OutputPort> {
        let guard = self.lock();
        guard.graph.input_source(dst)
    }

    /// The control-edge sources of an operation, in deterministic order.
    pub fn control_inputs(&self, op: OpId) -> Vec<OpId> {
        let guard = self.lock();
        guard.graph.control_inputs(op)
    }

    /// The operation's current requested device, if the op exists.
    pub fn requested_device(&self, op: OpId) -> Result<DeviceName, GraphError> {
        let guard = self.lock();
        guard
            .graph
            .op(op)
            .map(|node| node.requested_device.clone())
            .ok_or(GraphError::OpNotFound(op))
    }

    /// The total number of operations.
    pub fn op_count(&self) -> usize {
        self.lock().graph.op_count()
    }

    /// The total number of data edges.
    pub fn data_edge_count(&self) -> usize {
        self.lock().graph.data_edge_count()
    }

    /// The total number of control edges.
    pub fn control_edge_count(&self) -> usize {
        self.lock().graph.control_edge_count()
    }

    /// A consistent point-in-time copy of the graph and its refiner.
    pub fn snapshot(&self) -> (Graph, ShapeRefiner) {
        let guard = self.lock();
        (guard.graph.clone(), guard.refiner.clone())
    }
}

// =============================================================================
// TESTS
// =============================================================================
