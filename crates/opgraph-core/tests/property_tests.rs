//! # Property-Based Tests
//!
//! Verification tests using proptest.
//!
//! These tests ensure determinism and structural invariants of the editing
//! surface under arbitrary registration and mutation sequences.

use opgraph_core::{
    GraphEditor, InputPort, OpId, OpRegistration, OutputPort, editor_from_bytes, editor_to_bytes,
};
use proptest::collection::vec;
use proptest::prelude::*;

/// Build an editor with `sizes.len()` ops; op `i` has `sizes[i].0` inputs
/// and `sizes[i].1` outputs, and each input port `j` of op `i` is wired to
/// output 0 of op `(i + j) % i` for i > 0 (an arbitrary but valid wiring).
fn build_editor(sizes: &[(usize, usize)]) -> (GraphEditor, Vec<OpId>) {
    let editor = GraphEditor::new();
    let mut ids = Vec::with_capacity(sizes.len());

    for (i, &(num_inputs, num_outputs)) in sizes.iter().enumerate() {
        let id = editor
            .add_op(OpRegistration::new(
                format!("op{i}"),
                num_inputs,
                // Every op gets at least one output so it can act as a source.
                num_outputs.max(1),
            ))
            .expect("add op");
        ids.push(id);
    }

    for (i, &(num_inputs, _)) in sizes.iter().enumerate() {
        if i == 0 {
            continue;
        }
        for j in 0..num_inputs {
            let src = ids[(i + j) % i];
            editor
                .connect(OutputPort::new(src, 0), InputPort::new(ids[i], j))
                .expect("connect");
        }
    }

    (editor, ids)
}

proptest! {
    /// Same registration sequence produces identical ids and state.
    #[test]
    fn determinism_identical_input_produces_identical_output(
        sizes in vec((0usize..4, 1usize..4), 1..20)
    ) {
        let (editor1, ids1) = build_editor(&sizes);
        let (editor2, ids2) = build_editor(&sizes);

        prop_assert_eq!(ids1, ids2);
        prop_assert_eq!(editor1.snapshot(), editor2.snapshot());
        prop_assert_eq!(
            editor_to_bytes(&editor1).expect("serialize"),
            editor_to_bytes(&editor2).expect("serialize")
        );
    }

    /// A valid rewire preserves the data-edge count and the one-edge-per-port
    /// invariant.
    #[test]
    fn rewire_preserves_edge_count(
        sizes in vec((1usize..4, 1usize..4), 2..20),
        pick in any::<prop::sample::Index>()
    ) {
        let (editor, ids) = build_editor(&sizes);
        let edges_before = editor.data_edge_count();

        // Rewire input 0 of some non-root op to output 0 of the picked op.
        let dst = *ids.last().expect("at least two ops");
        let src = ids[pick.index(ids.len())];
        editor
            .update_edge(OutputPort::new(src, 0), InputPort::new(dst, 0))
            .expect("rewire");

        prop_assert_eq!(editor.data_edge_count(), edges_before);
        prop_assert_eq!(
            editor.input_source(InputPort::new(dst, 0)),
            Some(OutputPort::new(src, 0))
        );
    }

    /// An out-of-range rewire leaves the serialized state byte-identical.
    #[test]
    fn failed_rewire_is_a_noop(
        sizes in vec((1usize..4, 1usize..4), 2..20),
        extra in 0usize..8
    ) {
        let (editor, ids) = build_editor(&sizes);
        let before = editor_to_bytes(&editor).expect("serialize");

        let dst = *ids.last().expect("at least two ops");
        let src = ids[0];
        let bad_index = sizes[0].1.max(1) + extra;
        let result = editor.update_edge(OutputPort::new(src, bad_index), InputPort::new(dst, 0));

        prop_assert!(result.is_err());
        prop_assert_eq!(editor_to_bytes(&editor).expect("serialize"), before);
    }

    /// Control edges never disturb data edges, and clearing removes exactly
    /// the control edges added.
    #[test]
    fn control_churn_preserves_data_edges(
        sizes in vec((1usize..4, 1usize..4), 2..12),
        srcs in vec(any::<prop::sample::Index>(), 0..12)
    ) {
        let (editor, ids) = build_editor(&sizes);
        let data_before = editor.data_edge_count();
        let dst = *ids.last().expect("at least two ops");

        let mut distinct = std::collections::BTreeSet::new();
        for pick in &srcs {
            let src = ids[pick.index(ids.len())];
            let inserted = editor.add_control_input(dst, src).expect("add control");
            prop_assert_eq!(inserted, distinct.insert(src));
        }
        prop_assert_eq!(editor.control_inputs(dst).len(), distinct.len());
        prop_assert_eq!(editor.data_edge_count(), data_before);

        let removed = editor.clear_control_inputs(dst).expect("clear");
        prop_assert_eq!(removed, distinct.len());
        prop_assert!(editor.control_inputs(dst).is_empty());
        prop_assert_eq!(editor.data_edge_count(), data_before);
    }

    /// Snapshot bytes survive a save/load/save round trip bit-exactly.
    #[test]
    fn persistence_roundtrip_bit_exact(
        sizes in vec((0usize..4, 1usize..4), 1..16),
        device in "[a-z/:0-9]{0,24}"
    ) {
        let (editor, ids) = build_editor(&sizes);
        editor
            .set_requested_device(ids[0], &device)
            .expect("set device");

        let bytes1 = editor_to_bytes(&editor).expect("serialize");
        let restored = editor_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = editor_to_bytes(&restored).expect("serialize");

        prop_assert_eq!(bytes1, bytes2);
        let restored_device = restored.requested_device(ids[0]).expect("device");
        prop_assert_eq!(restored_device.as_str(), device.as_str());
    }

    /// Device placement writes are observable and overwrite cleanly.
    #[test]
    fn device_last_write_wins(
        devices in vec("[a-z/:0-9]{0,16}", 1..8)
    ) {
        let (editor, ids) = build_editor(&[(0, 1)]);
        for device in &devices {
            editor.set_requested_device(ids[0], device).expect("set");
        }

        let last = devices.last().expect("non-empty");
        let current = editor.requested_device(ids[0]).expect("get");
        prop_assert_eq!(current.as_str(), last.as_str());
    }
}
