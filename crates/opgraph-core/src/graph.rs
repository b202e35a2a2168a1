//! # Graph Structure
//!
//! The deterministic graph storage for the opgraph engine.
//!
//! This module implements the `GraphMutator` trait.
//! All data structures use `BTreeMap` for deterministic ordering.
//!
//! Structural invariant: every connected input port has exactly one incoming
//! data edge, keyed by `(destination, input index)`. Control edges are
//! duplicate-free per `(source, destination)` pair.

use crate::{DeviceName, Edge, GraphError, InputPort, OpId, OpName, OpNode, OutputPort};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPHMUTATOR TRAIT
// =============================================================================

/// The GraphMutator trait defines the structural mutation primitives the
/// editing surface delegates to.
///
/// The concrete `Graph` implements it; tests can substitute a fake to verify
/// the editor's validate-then-delegate behavior in isolation.
///
/// All fallible operations return `Result<T, GraphError>`; implementations
/// must leave the graph unchanged when they report an error.
pub trait GraphMutator {
    /// Atomically replace the incoming data edge at the destination input
    /// port with one from the given source output port.
    ///
    /// Fails if either operation is missing or the destination port has no
    /// incoming edge to replace.
    fn update_edge(&mut self, new_src: OutputPort, dst: InputPort) -> Result<(), GraphError>;

    /// Insert a control edge from `src` to `dst`.
    ///
    /// Idempotent: returns `true` if a new edge was inserted, `false` if it
    /// already existed.
    fn add_control_edge(&mut self, src: OpId, dst: OpId) -> Result<bool, GraphError>;

    /// Remove the control edge from `src` to `dst`.
    ///
    /// Fails if the edge does not exist.
    fn remove_control_edge(&mut self, src: OpId, dst: OpId) -> Result<(), GraphError>;

    /// All incoming edges of an operation, data edges first (by input
    /// index), then control edges (by source id).
    fn in_edges(&self, op: OpId) -> Result<Vec<Edge>, GraphError>;

    /// Overwrite the operation's requested device placement.
    ///
    /// Unconditional apart from the op-existence check; the empty string
    /// clears the hint.
    fn set_requested_device(&mut self, op: OpId, device: &str) -> Result<(), GraphError>;
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The main Graph structure.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
/// No `HashMap` allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    /// Operation storage: OpId -> OpNode
    ops: BTreeMap<OpId, OpNode>,

    /// Incoming data edge per input port: (dst, dst_input) -> source port
    data_in: BTreeMap<(OpId, usize), OutputPort>,

    /// Incoming control edges: dst -> set of sources
    control_in: BTreeMap<OpId, BTreeSet<OpId>>,

    /// Next available OpId
    next_op_id: u64,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new operation node and return its id.
    pub fn insert_op(&mut self, name: OpName) -> OpId {
        let id = OpId(self.next_op_id);
        self.next_op_id = self.next_op_id.saturating_add(1);
        self.ops.insert(id, OpNode::new(id, name));
        id
    }

    /// Install an initial data edge into an unconnected input port.
    ///
    /// Fails if either operation is missing or the port is already wired.
    /// Port-bounds validation against declared counts happens in the editor;
    /// the graph itself only enforces its structural invariants.
    pub fn connect(&mut self, src: OutputPort, dst: InputPort) -> Result<(), GraphError> {
        self.check_op(src.op)?;
        self.check_op(dst.op)?;

        let key = (dst.op, dst.index);
        if self.data_in.contains_key(&key) {
            return Err(GraphError::PortOccupied {
                op: dst.op,
                index: dst.index,
            });
        }
        self.data_in.insert(key, src);
        Ok(())
    }

    /// Look up an operation node.
    #[must_use]
    pub fn op(&self, id: OpId) -> Option<&OpNode> {
        self.ops.get(&id)
    }

    /// Iterate all operations in deterministic order.
    pub fn ops(&self) -> impl Iterator<Item = &OpNode> {
        self.ops.values()
    }

    /// Check if the graph contains an operation.
    #[must_use]
    pub fn contains_op(&self, id: OpId) -> bool {
        self.ops.contains_key(&id)
    }

    /// The total number of operations.
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// The total number of data edges.
    #[must_use]
    pub fn data_edge_count(&self) -> usize {
        self.data_in.len()
    }

    /// The total number of control edges.
    #[must_use]
    pub fn control_edge_count(&self) -> usize {
        self.control_in.values().map(BTreeSet::len).sum()
    }

    /// The source port currently feeding an input port, if connected.
    #[must_use]
    pub fn input_source(&self, dst: InputPort) -> Option<OutputPort> {
        self.data_in.get(&(dst.op, dst.index)).copied()
    }

    /// The control-edge sources of an operation, in deterministic order.
    #[must_use]
    pub fn control_inputs(&self, op: OpId) -> Vec<OpId> {
        self.control_in
            .get(&op)
            .map(|srcs| srcs.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The next operation id that would be assigned.
    #[must_use]
    pub fn next_op_id(&self) -> u64 {
        self.next_op_id
    }

    fn check_op(&self, id: OpId) -> Result<(), GraphError> {
        if self.ops.contains_key(&id) {
            Ok(())
        } else {
            Err(GraphError::OpNotFound(id))
        }
    }
}

impl GraphMutator for Graph {
    fn update_edge(&mut self, new_src: OutputPort, dst: InputPort) -> Result<(), GraphError> {
        self.check_op(new_src.op)?;
        self.check_op(dst.op)?;

        let key = (dst.op, dst.index);
        if !self.data_in.contains_key(&key) {
            return Err(GraphError::InputNotConnected {
                op: dst.op,
                index: dst.index,
            });
        }

        // Single map insert: removal of the old edge and installation of the
        // new one cannot be observed separately.
        self.data_in.insert(key, new_src);
        Ok(())
    }

    fn add_control_edge(&mut self, src: OpId, dst: OpId) -> Result<bool, GraphError> {
        self.check_op(src)?;
        self.check_op(dst)?;

        Ok(self.control_in.entry(dst).or_default().insert(src))
    }

    fn remove_control_edge(&mut self, src: OpId, dst: OpId) -> Result<(), GraphError> {
        self.check_op(src)?;
        self.check_op(dst)?;

        let removed = self
            .control_in
            .get_mut(&dst)
            .is_some_and(|srcs| srcs.remove(&src));
        if !removed {
            return Err(GraphError::ControlEdgeNotFound { src, dst });
        }

        // Drop empty source sets so the map stays canonical.
        if self.control_in.get(&dst).is_some_and(BTreeSet::is_empty) {
            self.control_in.remove(&dst);
        }
        Ok(())
    }

    fn in_edges(&self, op: OpId) -> Result<Vec<Edge>, GraphError> {
        self.check_op(op)?;

        let mut edges = Vec::new();
        for (&(dst, dst_input), src) in self.data_in.range((op, 0)..=(op, usize::MAX)) {
            edges.push(Edge::data(src.op, src.index, dst, dst_input));
        }
        if let Some(srcs) = self.control_in.get(&op) {
            for &src in srcs {
                edges.push(Edge::control(src, op));
            }
        }
        Ok(edges)
    }

    fn set_requested_device(&mut self, op: OpId, device: &str) -> Result<(), GraphError> {
        let node = self.ops.get_mut(&op).ok_or(GraphError::OpNotFound(op))?;
        node.requested_device = DeviceName::new(device);
        Ok(())
    }
}

// =============================================================================
// SERIALIZATION SUPPORT
// =============================================================================

use serde::{Deserialize, Serialize};

/// Serializable representation of the graph for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableGraph {
    pub ops: Vec<OpNode>,
    /// Data edges as (src, src_output, dst, dst_input).
    pub data_edges: Vec<(OpId, usize, OpId, usize)>,
    /// Control edges as (src, dst).
    pub control_edges: Vec<(OpId, OpId)>,
    pub next_op_id: u64,
}

impl From<&Graph> for SerializableGraph {
    fn from(graph: &Graph) -> Self {
        let data_edges = graph
            .data_in
            .iter()
            .map(|(&(dst, dst_input), src)| (src.op, src.index, dst, dst_input))
            .collect();
        let control_edges = graph
            .control_in
            .iter()
            .flat_map(|(&dst, srcs)| srcs.iter().map(move |&src| (src, dst)))
            .collect();
        Self {
            ops: graph.ops.values().cloned().collect(),
            data_edges,
            control_edges,
            next_op_id: graph.next_op_id,
        }
    }
}

impl From<SerializableGraph> for Graph {
    fn from(sg: SerializableGraph) -> Self {
        let mut graph = Graph::new();
        graph.next_op_id = sg.next_op_id;

        for op in sg.ops {
            // Preserve original ids; advance the counter past them.
            if op.id.0 >= graph.next_op_id {
                graph.next_op_id = op.id.0.saturating_add(1);
            }
            graph.ops.insert(op.id, op);
        }

        for (src, src_output, dst, dst_input) in sg.data_edges {
            if graph.ops.contains_key(&src) && graph.ops.contains_key(&dst) {
                graph
                    .data_in
                    .insert((dst, dst_input), OutputPort::new(src, src_output));
            }
        }

        for (src, dst) in sg.control_edges {
            if graph.ops.contains_key(&src) && graph.ops.contains_key(&dst) {
                graph.control_in.entry(dst).or_default().insert(src);
            }
        }

        graph
    }
}

// =============================================================================
// TESTS
// =============================================================================
