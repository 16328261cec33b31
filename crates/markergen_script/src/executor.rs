//! The capability surface scripts act through.

use serde::{Deserialize, Serialize};

/// Parameters of an `Emit Marker` node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmitMarkerSettings {
    pub marker_name: String,
    /// Copy the rotation of the first marker in the target slot with one of these names.
    pub copy_rotation_from_markers: Vec<String>,
    /// Copy the height of the first marker in the target slot with one of these names.
    pub copy_height_from_markers: Vec<String>,
}

impl EmitMarkerSettings {
    pub fn new(marker_name: impl Into<String>) -> Self {
        Self {
            marker_name: marker_name.into(),
            ..Default::default()
        }
    }

    pub fn with_copy_rotation_from(mut self, names: &[&str]) -> Self {
        self.copy_rotation_from_markers = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_copy_height_from(mut self, names: &[&str]) -> Self {
        self.copy_height_from_markers = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

/// What a rule script may read and change at the slot it is evaluated on.
///
/// The slot (coordinate, sub-cell type, orientation) is state of the
/// implementor; the interpreter only ever talks about "the current slot".
pub trait PatternRuleExecutor {
    /// Does the current slot hold a marker called `marker_name`?
    fn contains_marker(&self, marker_name: &str) -> bool;

    /// Add a marker to the current slot.
    fn emit_marker(&mut self, marker_name: &str, settings: &EmitMarkerSettings);

    /// Remove every marker called `marker_name` from the current slot.
    fn remove_marker(&mut self, marker_name: &str);
}
