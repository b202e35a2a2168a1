//! Integration tests for the opgraph CLI commands.
//!
//! Drives the cmd_* functions directly against snapshot files in a
//! temporary directory, the same way the binary does.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use opgraph::cli::{
    cmd_add_control, cmd_add_op, cmd_clear_control, cmd_connect, cmd_init, cmd_rewire,
    cmd_set_device, cmd_show, cmd_status,
};
use opgraph_core::{GraphError, InputPort, OpId, OutputPort, editor_from_bytes};
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temp dir and a snapshot path inside it.
fn snapshot_path() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.opg");
    (dir, path)
}

/// Initialize a snapshot with three ops:
/// 0 = producer_a (1 output), 1 = producer_b (1 output), 2 = sink (1 input).
fn seeded_snapshot() -> (TempDir, PathBuf) {
    let (dir, path) = snapshot_path();
    cmd_init(&path, false).unwrap();
    cmd_add_op(&path, false, "producer_a", 0, 1, "").unwrap();
    cmd_add_op(&path, false, "producer_b", 0, 1, "").unwrap();
    cmd_add_op(&path, false, "sink", 1, 1, "").unwrap();
    (dir, path)
}

/// Read the snapshot back into an editor for assertions.
fn load(path: &PathBuf) -> opgraph_core::GraphEditor {
    let bytes = std::fs::read(path).unwrap();
    editor_from_bytes(&bytes).unwrap()
}

// =============================================================================
// INIT
// =============================================================================

#[test]
fn init_creates_empty_snapshot() {
    let (_dir, path) = snapshot_path();

    cmd_init(&path, false).unwrap();

    let editor = load(&path);
    assert_eq!(editor.op_count(), 0);
    assert_eq!(editor.data_edge_count(), 0);
    assert_eq!(editor.control_edge_count(), 0);
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let (_dir, path) = snapshot_path();

    cmd_init(&path, false).unwrap();
    let result = cmd_init(&path, false);
    assert!(matches!(result, Err(GraphError::IoError(_))));

    // --force overwrites
    cmd_init(&path, true).unwrap();
}

#[test]
fn status_fails_on_missing_snapshot() {
    let (_dir, path) = snapshot_path();

    let result = cmd_status(&path, false);
    assert!(matches!(result, Err(GraphError::IoError(_))));
}

// =============================================================================
// ADD-OP / CONNECT
// =============================================================================

#[test]
fn add_op_persists_registration() {
    let (_dir, path) = snapshot_path();
    cmd_init(&path, false).unwrap();

    cmd_add_op(&path, false, "matmul", 2, 1, "/device:GPU:0").unwrap();

    let editor = load(&path);
    assert_eq!(editor.op_count(), 1);
    assert_eq!(
        editor.requested_device(OpId(0)).unwrap().as_str(),
        "/device:GPU:0"
    );
}

#[test]
fn add_op_rejects_empty_name() {
    let (_dir, path) = snapshot_path();
    cmd_init(&path, false).unwrap();

    let result = cmd_add_op(&path, false, "", 0, 1, "");
    assert!(matches!(result, Err(GraphError::InvalidRegistration(_))));
}

#[test]
fn connect_wires_a_data_edge() {
    let (_dir, path) = seeded_snapshot();

    cmd_connect(&path, 0, 0, 2, 0).unwrap();

    let editor = load(&path);
    assert_eq!(editor.data_edge_count(), 1);
    assert_eq!(
        editor.input_source(InputPort::new(OpId(2), 0)),
        Some(OutputPort::new(OpId(0), 0))
    );
}

#[test]
fn connect_rejects_out_of_range_output() {
    let (_dir, path) = seeded_snapshot();

    let result = cmd_connect(&path, 0, 5, 2, 0);
    assert!(matches!(
        result,
        Err(GraphError::OutputOutOfRange { index: 5, .. })
    ));

    // A failed connect must not write anything
    let editor = load(&path);
    assert_eq!(editor.data_edge_count(), 0);
}

// =============================================================================
// REWIRE
// =============================================================================

#[test]
fn rewire_replaces_edge_source() {
    let (_dir, path) = seeded_snapshot();
    cmd_connect(&path, 0, 0, 2, 0).unwrap();

    cmd_rewire(&path, 1, 0, 2, 0).unwrap();

    let editor = load(&path);
    assert_eq!(editor.data_edge_count(), 1);
    assert_eq!(
        editor.input_source(InputPort::new(OpId(2), 0)),
        Some(OutputPort::new(OpId(1), 0))
    );
}

#[test]
fn rewire_of_unconnected_port_leaves_snapshot_unchanged() {
    let (_dir, path) = seeded_snapshot();
    let before = std::fs::read(&path).unwrap();

    let result = cmd_rewire(&path, 0, 0, 2, 0);
    assert!(matches!(result, Err(GraphError::InputNotConnected { .. })));

    let after = std::fs::read(&path).unwrap();
    assert_eq!(before, after);
}

// =============================================================================
// CONTROL EDGES
// =============================================================================

#[test]
fn add_and_clear_control_edges() {
    let (_dir, path) = seeded_snapshot();

    cmd_add_control(&path, 0, 2).unwrap();
    cmd_add_control(&path, 1, 2).unwrap();
    // Duplicate is absorbed, not an error
    cmd_add_control(&path, 0, 2).unwrap();

    let editor = load(&path);
    assert_eq!(editor.control_edge_count(), 2);

    cmd_clear_control(&path, 2).unwrap();

    let editor = load(&path);
    assert_eq!(editor.control_edge_count(), 0);
}

#[test]
fn add_control_rejects_unknown_op() {
    let (_dir, path) = seeded_snapshot();

    let result = cmd_add_control(&path, 0, 99);
    assert!(matches!(result, Err(GraphError::OpNotFound(_))));
}

// =============================================================================
// DEVICE PLACEMENT
// =============================================================================

#[test]
fn set_device_overwrites_and_clears() {
    let (_dir, path) = seeded_snapshot();

    cmd_set_device(&path, 2, "/device:GPU:0").unwrap();
    let editor = load(&path);
    assert_eq!(
        editor.requested_device(OpId(2)).unwrap().as_str(),
        "/device:GPU:0"
    );

    cmd_set_device(&path, 2, "").unwrap();
    let editor = load(&path);
    assert!(
        editor
            .requested_device(OpId(2))
            .unwrap()
            .is_empty()
    );
}

// =============================================================================
// SHOW / STATUS
// =============================================================================

#[test]
fn show_reports_incoming_edges() {
    let (_dir, path) = seeded_snapshot();
    cmd_connect(&path, 0, 0, 2, 0).unwrap();
    cmd_add_control(&path, 1, 2).unwrap();

    // Both output modes exercise the same read path
    cmd_show(&path, false, 2).unwrap();
    cmd_show(&path, true, 2).unwrap();
}

#[test]
fn show_fails_for_unknown_op() {
    let (_dir, path) = seeded_snapshot();

    let result = cmd_show(&path, false, 42);
    assert!(matches!(result, Err(GraphError::OpNotFound(_))));
}

#[test]
fn status_runs_in_both_output_modes() {
    let (_dir, path) = seeded_snapshot();

    cmd_status(&path, false).unwrap();
    cmd_status(&path, true).unwrap();
}
