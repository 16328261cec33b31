//! Script node kinds and their pin layouts.

use crate::executor::EmitMarkerSettings;
use crate::pin::{self, PinConstraint, PinDataType, PinDirection, ScriptPin};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a node within its owning [`PatternScript`](crate::PatternScript).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// The closed set of node kinds a rule script can contain.
///
/// `Result`, `LogicalAnd`, `LogicalOr`, `LogicalNot` and `MarkerExists` are
/// conditions. `OnPass`, `EmitMarker` and `RemoveMarker` are actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptNodeKind {
    Result,
    OnPass,
    EmitMarker(EmitMarkerSettings),
    RemoveMarker { marker_name: String },
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    MarkerExists { marker_name: String },
}

impl ScriptNodeKind {
    pub fn emit_marker(name: impl Into<String>) -> Self {
        ScriptNodeKind::EmitMarker(EmitMarkerSettings::new(name))
    }

    pub fn remove_marker(name: impl Into<String>) -> Self {
        ScriptNodeKind::RemoveMarker {
            marker_name: name.into(),
        }
    }

    pub fn marker_exists(name: impl Into<String>) -> Self {
        ScriptNodeKind::MarkerExists {
            marker_name: name.into(),
        }
    }

    pub fn is_conditional(&self) -> bool {
        matches!(
            self,
            ScriptNodeKind::Result
                | ScriptNodeKind::LogicalAnd
                | ScriptNodeKind::LogicalOr
                | ScriptNodeKind::LogicalNot
                | ScriptNodeKind::MarkerExists { .. }
        )
    }

    pub fn is_action(&self) -> bool {
        !self.is_conditional()
    }

    /// Display title used by authoring tools.
    pub fn title(&self) -> &'static str {
        match self {
            ScriptNodeKind::Result => "Selection Condition",
            ScriptNodeKind::OnPass => "On Pattern Selected",
            ScriptNodeKind::EmitMarker(_) => "Emit Marker",
            ScriptNodeKind::RemoveMarker { .. } => "Remove Marker",
            ScriptNodeKind::LogicalAnd => "AND",
            ScriptNodeKind::LogicalOr => "OR",
            ScriptNodeKind::LogicalNot => "NOT",
            ScriptNodeKind::MarkerExists { .. } => "Marker Exists",
        }
    }

    /// The marker name an effect or query node refers to.
    pub fn marker_name(&self) -> Option<&str> {
        match self {
            ScriptNodeKind::EmitMarker(settings) => Some(&settings.marker_name),
            ScriptNodeKind::RemoveMarker { marker_name }
            | ScriptNodeKind::MarkerExists { marker_name } => Some(marker_name),
            _ => None,
        }
    }
}

/// A node in a rule script: its kind plus named input and output pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptNode {
    pub id: NodeId,
    pub kind: ScriptNodeKind,
    pub input_pins: BTreeMap<String, ScriptPin>,
    pub output_pins: BTreeMap<String, ScriptPin>,
}

impl ScriptNode {
    /// Create a node with the default pin layout for `kind`.
    pub fn new(id: NodeId, kind: ScriptNodeKind) -> Self {
        let mut node = Self {
            id,
            kind,
            input_pins: BTreeMap::new(),
            output_pins: BTreeMap::new(),
        };
        node.allocate_default_pins();
        node
    }

    fn allocate_default_pins(&mut self) {
        use PinConstraint::*;
        use PinDataType::*;
        use PinDirection::*;

        match self.kind {
            ScriptNodeKind::Result => {
                self.add_pin(pin::SELECT, Bool, Input, Mandatory);
            }
            ScriptNodeKind::OnPass => {
                self.add_pin(pin::DEFAULT_OUTPUT, Exec, Output, Optional);
            }
            ScriptNodeKind::EmitMarker(_) | ScriptNodeKind::RemoveMarker { .. } => {
                self.add_pin(pin::DEFAULT_INPUT, Exec, Input, Mandatory);
                self.add_pin(pin::DEFAULT_OUTPUT, Exec, Output, Optional);
            }
            ScriptNodeKind::LogicalAnd | ScriptNodeKind::LogicalOr => {
                self.add_pin(pin::A, Bool, Input, Mandatory);
                self.add_pin(pin::B, Bool, Input, Mandatory);
                self.add_pin(pin::DEFAULT_OUTPUT, Bool, Output, Optional);
            }
            ScriptNodeKind::LogicalNot => {
                self.add_pin(pin::DEFAULT_INPUT, Bool, Input, Mandatory);
                self.add_pin(pin::DEFAULT_OUTPUT, Bool, Output, Optional);
            }
            ScriptNodeKind::MarkerExists { .. } => {
                self.add_pin(pin::DEFAULT_OUTPUT, Bool, Output, Optional);
            }
        }
    }

    fn add_pin(
        &mut self,
        name: &str,
        data_type: PinDataType,
        direction: PinDirection,
        constraint: PinConstraint,
    ) {
        let pin = ScriptPin::new(name, data_type, direction, constraint);
        let pins = match direction {
            PinDirection::Input => &mut self.input_pins,
            PinDirection::Output => &mut self.output_pins,
        };
        pins.insert(name.to_string(), pin);
    }

    pub fn input_pin(&self, name: &str) -> Option<&ScriptPin> {
        self.input_pins.get(name)
    }

    pub fn output_pin(&self, name: &str) -> Option<&ScriptPin> {
        self.output_pins.get(name)
    }

    pub fn pin(&self, name: &str, direction: PinDirection) -> Option<&ScriptPin> {
        match direction {
            PinDirection::Input => self.input_pins.get(name),
            PinDirection::Output => self.output_pins.get(name),
        }
    }

    pub fn pin_mut(&mut self, name: &str, direction: PinDirection) -> Option<&mut ScriptPin> {
        match direction {
            PinDirection::Input => self.input_pins.get_mut(name),
            PinDirection::Output => self.output_pins.get_mut(name),
        }
    }

    /// First output pin carrying exec flow, if any.
    pub fn output_exec_pin(&self) -> Option<&ScriptPin> {
        self.output_pins
            .values()
            .find(|pin| pin.data_type == PinDataType::Exec)
    }

    /// Pin id action nodes chain through. Only meaningful for action nodes.
    pub fn output_exec_pin_id(&self) -> &'static str {
        pin::DEFAULT_OUTPUT
    }

    pub fn out_pin_type(&self, name: &str) -> Option<PinDataType> {
        self.output_pin(name).map(|pin| pin.data_type)
    }

    /// Conditions with more than one input read as binary operators.
    pub fn is_binary_operator(&self) -> bool {
        self.kind.is_conditional() && self.input_pins.len() > 1
    }
}
