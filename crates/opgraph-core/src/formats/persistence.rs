//! # Persistence Format
//!
//! Binary serialization for opgraph editor state.
//!
//! Format: Header (5 bytes) + postcard-serialized payload.
//! - 4 bytes: Magic ("OPGR")
//! - 1 byte: Version
//!
//! The payload carries the graph (ops, data edges, control edges) together
//! with the shape refiner's per-op contexts, so a restored editor validates
//! port bounds exactly as the saved one did.
//!
//! ## Pre-deserialization validation
//!
//! - Maximum payload size limit (`MAX_PERSISTENCE_PAYLOAD_SIZE`)
//! - Header validation before payload parsing
//! - Graceful error handling for corrupted data

use crate::graph::{Graph, SerializableGraph};
use crate::shape::{InferenceContext, ShapeRefiner};
use crate::{GraphEditor, GraphError, OpId, primitives};
use serde::{Deserialize, Serialize};

// =============================================================================
// SIZE LIMITS
// =============================================================================

/// Maximum allowed payload size for the persistence format.
///
/// This prevents memory exhaustion from malicious or corrupted data.
/// Validated BEFORE attempting deserialization.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 500 * 1024 * 1024; // 500 MB

/// Minimum valid data size (header only).
const MIN_FILE_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all snapshot data.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), GraphError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(GraphError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(GraphError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GraphError> {
        if bytes.len() < 5 {
            return Err(GraphError::SerializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// The serialized payload: graph plus per-op inference contexts.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotPayload {
    graph: SerializableGraph,
    contexts: Vec<(OpId, InferenceContext)>,
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize an editor's state to bytes (header + payload).
///
/// Takes one consistent snapshot under the editor's lock.
pub fn editor_to_bytes(editor: &GraphEditor) -> Result<Vec<u8>, GraphError> {
    let (graph, refiner) = editor.snapshot();
    let header = PersistenceHeader::new();
    let payload = SnapshotPayload {
        graph: SerializableGraph::from(&graph),
        contexts: refiner
            .contexts()
            .map(|(op, ctx)| (op, ctx.clone()))
            .collect(),
    };

    let encoded = postcard::to_stdvec(&payload)
        .map_err(|e| GraphError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(5 + encoded.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&encoded);

    Ok(result)
}

/// Deserialize an editor from bytes.
///
/// Validates, in order, before touching the payload:
/// 1. Minimum data size (header must be present)
/// 2. Maximum payload size (prevents memory exhaustion)
/// 3. Header magic bytes and version
pub fn editor_from_bytes(bytes: &[u8]) -> Result<GraphEditor, GraphError> {
    if bytes.len() < MIN_FILE_SIZE {
        return Err(GraphError::SerializationError(
            "Data too short: minimum 5 bytes required".to_string(),
        ));
    }

    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(GraphError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload: SnapshotPayload = postcard::from_bytes(&bytes[5..]).map_err(|e| {
        GraphError::SerializationError(format!("Failed to deserialize snapshot: {}", e))
    })?;

    let graph = Graph::from(payload.graph);
    let mut refiner = ShapeRefiner::new();
    for (op, ctx) in payload.contexts {
        // Contexts for ops the graph no longer knows are dropped.
        if graph.contains_op(op) {
            refiner.insert(op, ctx);
        }
    }

    Ok(GraphEditor::with_parts(graph, refiner))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::OpRegistration;
    use crate::{InputPort, OutputPort};

    fn sample_editor() -> GraphEditor {
        let editor = GraphEditor::new();
        let a = editor
            .add_op(OpRegistration::new("a", 0, 1))
            .expect("add a");
        let b = editor
            .add_op(OpRegistration::new("b", 1, 1).with_device("/cpu:0"))
            .expect("add b");
        editor
            .connect(OutputPort::new(a, 0), InputPort::new(b, 0))
            .expect("connect");
        editor.add_control_input(b, a).expect("control");
        editor
    }

    #[test]
    fn header_roundtrip() {
        let header = PersistenceHeader::new();
        let bytes = header.to_bytes();
        let restored = PersistenceHeader::from_bytes(&bytes).expect("parse header");

        assert_eq!(restored.magic, *primitives::MAGIC_BYTES);
        assert_eq!(restored.version, primitives::FORMAT_VERSION);
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let editor = sample_editor();

        let bytes1 = editor_to_bytes(&editor).expect("first serialize");
        let restored = editor_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = editor_to_bytes(&restored).expect("second serialize");

        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
    }

    #[test]
    fn restored_editor_validates_bounds() {
        let editor = sample_editor();
        let bytes = editor_to_bytes(&editor).expect("serialize");
        let restored = editor_from_bytes(&bytes).expect("deserialize");

        // Op "a" declares a single output; index 1 must still be rejected.
        let result = restored.update_edge(
            OutputPort::new(OpId(0), 1),
            InputPort::new(OpId(1), 0),
        );
        assert!(matches!(
            result,
            Err(GraphError::OutputOutOfRange { index: 1, .. })
        ));
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = editor_to_bytes(&sample_editor()).expect("serialize");
        bytes[0..4].copy_from_slice(b"XXXX");

        assert!(editor_from_bytes(&bytes).is_err());
    }

    #[test]
    fn unsupported_version_rejected() {
        let mut bytes = editor_to_bytes(&sample_editor()).expect("serialize");
        bytes[4] = primitives::FORMAT_VERSION.wrapping_add(1);

        assert!(editor_from_bytes(&bytes).is_err());
    }

    #[test]
    fn truncated_data_rejected() {
        let result = editor_from_bytes(&[0u8; 3]);
        assert!(result.is_err());
    }
}
