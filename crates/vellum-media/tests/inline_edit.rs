use serde_json::Value;
use vellum_core::Attrs;
use vellum_media::inline_edit::{GatedAttrEditor, field_patch};
use vellum_media::{NodeStateTable, Waveform};

fn attrs(pairs: &[(&str, &str)]) -> Attrs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

#[test]
fn immediate_edits_patch_one_field_per_keystroke() {
    let patch = field_patch("alt", "a mountain");
    assert_eq!(
        patch.set.get("alt").and_then(|v| v.as_str()),
        Some("a mountain")
    );
    assert!(patch.remove.is_empty());

    // Clearing the field removes the attribute instead of storing "".
    let patch = field_patch("alt", "");
    assert!(patch.set.is_empty());
    assert_eq!(patch.remove, vec!["alt".to_string()]);
}

#[test]
fn gated_cancel_restores_the_pre_edit_snapshot() {
    let before = attrs(&[("src", "a.mp4"), ("width", "640px")]);
    let editor = GatedAttrEditor::open(&before);

    // Live previews changed src and added height.
    let mut current = before.clone();
    editor.stage("src", "b.mp4").apply(&mut current);
    editor.stage("height", "360px").apply(&mut current);
    assert_eq!(current.get("src").and_then(|v| v.as_str()), Some("b.mp4"));

    let restore = editor.cancel(&current);
    restore.apply(&mut current);
    assert_eq!(current, before);
}

#[test]
fn gated_save_keeps_the_staged_attributes() {
    let before = attrs(&[("src", "a.mp4")]);
    let editor = GatedAttrEditor::open(&before);

    let mut current = before.clone();
    editor.stage("width", "640px").apply(&mut current);
    editor.save();

    assert_eq!(
        current.get("width").and_then(|v| v.as_str()),
        Some("640px")
    );
}

#[test]
fn node_state_is_keyed_by_identity_not_position() {
    let mut table: NodeStateTable<&'static str> = NodeStateTable::new();
    let first = table.allocate();
    let second = table.allocate();
    assert_ne!(first, second);

    table.insert(first, "dragging");
    table.insert(second, "editing");
    assert_eq!(table.get(first), Some(&"dragging"));

    // Unmounting one node view leaves the other's state alone.
    table.remove(first);
    assert_eq!(table.get(first), None);
    assert_eq!(table.get(second), Some(&"editing"));
}

#[test]
fn waveform_peaks_are_bucketed_and_normalized() {
    let samples: Vec<f32> = vec![0.1, -0.8, 0.2, 0.4, -0.1, 0.05, 1.6, -0.2];
    let waveform = Waveform::from_samples(&samples, 4);

    let peaks = waveform.peaks();
    assert_eq!(peaks.len(), 4);
    // Normalized to the loudest bucket.
    assert!(peaks.iter().all(|p| (0.0..=1.0).contains(p)));
    assert_eq!(peaks[3], 1.0);

    assert!(Waveform::from_samples(&[], 16).is_empty());
    assert!(Waveform::from_samples(&samples, 0).is_empty());
}
