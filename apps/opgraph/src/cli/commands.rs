//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Each mutating command follows the same shape: load the snapshot, apply
//! the edit through the lock-guarded editor, save the snapshot back. The
//! engine itself never touches the filesystem.

use opgraph_core::{
    GraphEditor, GraphError, InputPort, OpId, OpRegistration, OutputPort, editor_from_bytes,
    editor_to_bytes,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum snapshot file size accepted for loading (500 MB).
///
/// Matches the engine's own payload bound; checked here as well so an
/// oversized file is rejected before it is read into memory.
const MAX_SNAPSHOT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), GraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| GraphError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(GraphError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, GraphError> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        GraphError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    let filename = path
        .file_name()
        .ok_or_else(|| GraphError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// SNAPSHOT I/O
// =============================================================================

/// Load an editor from a snapshot file.
fn load_editor(path: &Path) -> Result<GraphEditor, GraphError> {
    validate_file_size(path, MAX_SNAPSHOT_FILE_SIZE)?;

    let bytes = std::fs::read(path)
        .map_err(|e| GraphError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
    let editor = editor_from_bytes(&bytes)?;

    tracing::debug!(
        path = %path.display(),
        ops = editor.op_count(),
        "loaded snapshot"
    );
    Ok(editor)
}

/// Save an editor to a snapshot file.
fn save_editor(path: &Path, editor: &GraphEditor) -> Result<(), GraphError> {
    let path = validate_output_path(path)?;
    let bytes = editor_to_bytes(editor)?;

    std::fs::write(&path, bytes)
        .map_err(|e| GraphError::IoError(format!("Cannot write '{}': {}", path.display(), e)))?;

    tracing::debug!(
        path = %path.display(),
        ops = editor.op_count(),
        "saved snapshot"
    );
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create a new empty snapshot.
pub fn cmd_init(path: &Path, force: bool) -> Result<(), GraphError> {
    if path.exists() && !force {
        return Err(GraphError::IoError(format!(
            "Snapshot '{}' already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let editor = GraphEditor::new();
    save_editor(path, &editor)?;

    println!("Initialized empty graph at '{}'", path.display());
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show graph status.
pub fn cmd_status(path: &Path, json_mode: bool) -> Result<(), GraphError> {
    let editor = load_editor(path)?;

    if json_mode {
        let status = serde_json::json!({
            "ops": editor.op_count(),
            "data_edges": editor.data_edge_count(),
            "control_edges": editor.control_edge_count(),
        });
        println!("{status}");
    } else {
        println!("Graph Status");
        println!("  Operations:    {}", editor.op_count());
        println!("  Data edges:    {}", editor.data_edge_count());
        println!("  Control edges: {}", editor.control_edge_count());
    }
    Ok(())
}

// =============================================================================
// EDIT COMMANDS
// =============================================================================

/// Register a new operation.
pub fn cmd_add_op(
    path: &Path,
    json_mode: bool,
    name: &str,
    inputs: usize,
    outputs: usize,
    device: &str,
) -> Result<(), GraphError> {
    let editor = load_editor(path)?;

    let mut registration = OpRegistration::new(name, inputs, outputs);
    if !device.is_empty() {
        registration = registration.with_device(device);
    }
    let id = editor.add_op(registration)?;
    save_editor(path, &editor)?;

    if json_mode {
        println!("{}", serde_json::json!({ "op": id.0 }));
    } else {
        println!("Added op {} ('{}')", id.0, name);
    }
    Ok(())
}

/// Wire an initial data edge.
pub fn cmd_connect(
    path: &Path,
    src: u64,
    src_output: usize,
    dst: u64,
    dst_input: usize,
) -> Result<(), GraphError> {
    let editor = load_editor(path)?;

    editor.connect(
        OutputPort::new(OpId(src), src_output),
        InputPort::new(OpId(dst), dst_input),
    )?;
    save_editor(path, &editor)?;

    println!("Connected {src}:{src_output} -> {dst}:{dst_input}");
    Ok(())
}

/// Point a connected input port at a new source output.
pub fn cmd_rewire(
    path: &Path,
    src: u64,
    src_output: usize,
    dst: u64,
    dst_input: usize,
) -> Result<(), GraphError> {
    let editor = load_editor(path)?;

    editor.update_edge(
        OutputPort::new(OpId(src), src_output),
        InputPort::new(OpId(dst), dst_input),
    )?;
    save_editor(path, &editor)?;

    println!("Rewired {dst}:{dst_input} to source {src}:{src_output}");
    Ok(())
}

/// Add a control dependency.
pub fn cmd_add_control(path: &Path, src: u64, dst: u64) -> Result<(), GraphError> {
    let editor = load_editor(path)?;

    let inserted = editor.add_control_input(OpId(dst), OpId(src))?;
    save_editor(path, &editor)?;

    if inserted {
        println!("Added control edge {src} -> {dst}");
    } else {
        println!("Control edge {src} -> {dst} already present");
    }
    Ok(())
}

/// Remove every control dependency of an op.
pub fn cmd_clear_control(path: &Path, op: u64) -> Result<(), GraphError> {
    let editor = load_editor(path)?;

    let removed = editor.clear_control_inputs(OpId(op))?;
    save_editor(path, &editor)?;

    println!("Removed {removed} control edge(s) into {op}");
    Ok(())
}

/// Set an op's requested device placement.
pub fn cmd_set_device(path: &Path, op: u64, device: &str) -> Result<(), GraphError> {
    let editor = load_editor(path)?;

    editor.set_requested_device(OpId(op), device)?;
    save_editor(path, &editor)?;

    if device.is_empty() {
        println!("Cleared requested device of {op}");
    } else {
        println!("Set requested device of {op} to '{device}'");
    }
    Ok(())
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Show an op's incoming edges and placement.
pub fn cmd_show(path: &Path, json_mode: bool, op: u64) -> Result<(), GraphError> {
    let editor = load_editor(path)?;
    let id = OpId(op);

    let incoming = editor.in_edges(id)?;
    let device = editor.requested_device(id)?;

    if json_mode {
        let edges: Vec<serde_json::Value> = incoming
            .iter()
            .map(|edge| match edge.kind {
                opgraph_core::EdgeKind::Data {
                    src_output,
                    dst_input,
                } => serde_json::json!({
                    "kind": "data",
                    "src": edge.src.0,
                    "src_output": src_output,
                    "dst_input": dst_input,
                }),
                opgraph_core::EdgeKind::Control => serde_json::json!({
                    "kind": "control",
                    "src": edge.src.0,
                }),
            })
            .collect();
        let output = serde_json::json!({
            "op": op,
            "requested_device": device.as_str(),
            "in_edges": edges,
        });
        println!("{output}");
    } else {
        println!("Op {op}");
        println!("  Requested device: '{}'", device.as_str());
        println!("  Incoming edges:");
        for edge in &incoming {
            match edge.kind {
                opgraph_core::EdgeKind::Data {
                    src_output,
                    dst_input,
                } => {
                    println!(
                        "    data    {}:{} -> {}:{}",
                        edge.src.0, src_output, op, dst_input
                    );
                }
                opgraph_core::EdgeKind::Control => {
                    println!("    control {} -> {}", edge.src.0, op);
                }
            }
        }
        if incoming.is_empty() {
            println!("    (none)");
        }
    }
    Ok(())
}
