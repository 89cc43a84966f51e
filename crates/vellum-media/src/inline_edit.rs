//! Inline attribute editors.
//!
//! Two shapes: immediate editors (alt text, titles, link targets) where
//! every keystroke becomes its own small attribute transaction, and gated
//! editors (audio/video URL + dimensions) where edits preview live but a
//! Cancel restores the attributes captured when the editor opened.

use serde_json::Value;
use vellum_core::{AttrPatch, Attrs};

/// One keystroke in an immediate editor: a single-field patch. Clearing the
/// field removes the attribute instead of storing an empty string.
pub fn field_patch(field: &str, value: &str) -> AttrPatch {
    if value.is_empty() {
        AttrPatch::remove_key(field)
    } else {
        AttrPatch::set_value(field, Value::String(value.to_string()))
    }
}

/// Save/Cancel gated editing session over one node's attributes.
pub struct GatedAttrEditor {
    snapshot: Attrs,
}

impl GatedAttrEditor {
    /// Capture the pre-edit attributes. Staged changes are applied to the
    /// node as live previews; the snapshot is what Cancel restores.
    pub fn open(attrs: &Attrs) -> Self {
        Self {
            snapshot: attrs.clone(),
        }
    }

    /// A staged edit, applied to the node immediately as a preview.
    pub fn stage(&self, field: &str, value: &str) -> AttrPatch {
        field_patch(field, value)
    }

    /// Keep the staged attributes; the snapshot is no longer needed.
    pub fn save(self) {}

    /// The patch that restores the pre-edit snapshot over whatever the
    /// previews left behind.
    pub fn cancel(self, current: &Attrs) -> AttrPatch {
        let mut patch = AttrPatch::default();
        for (key, value) in &self.snapshot {
            if current.get(key) != Some(value) {
                patch.set.insert(key.clone(), value.clone());
            }
        }
        for key in current.keys() {
            if !self.snapshot.contains_key(key) {
                patch.remove.push(key.clone());
            }
        }
        patch
    }
}
