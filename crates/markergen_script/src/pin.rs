//! Node pins and the links between them.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Exec input of action nodes, bool input of `NOT`.
pub const DEFAULT_INPUT: &str = "DefaultInput";
/// The single output pin every node except the result node carries.
pub const DEFAULT_OUTPUT: &str = "DefaultOutput";
/// Left operand of `AND` / `OR`.
pub const A: &str = "A";
/// Right operand of `AND` / `OR`.
pub const B: &str = "B";
/// Input of the result node.
pub const SELECT: &str = "Select";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDataType {
    Bool,
    Exec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinConstraint {
    Mandatory,
    Optional,
}

/// Non-owning reference to a pin on another node of the same script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinLink {
    pub node: NodeId,
    pub pin: String,
}

impl PinLink {
    pub fn new(node: NodeId, pin: impl Into<String>) -> Self {
        Self {
            node,
            pin: pin.into(),
        }
    }
}

/// A named, typed connection point on a script node.
///
/// A pin links to at most one pin of the opposite direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptPin {
    pub name: String,
    pub data_type: PinDataType,
    pub direction: PinDirection,
    pub constraint: PinConstraint,
    /// Used when the pin is not linked. Bool pins read `"true"` (any case) as true.
    pub default_value: String,
    pub linked_to: Option<PinLink>,
}

impl ScriptPin {
    pub fn new(
        name: impl Into<String>,
        data_type: PinDataType,
        direction: PinDirection,
        constraint: PinConstraint,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            direction,
            constraint,
            default_value: String::new(),
            linked_to: None,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.linked_to.is_some()
    }

    /// Boolean interpretation of the default value.
    pub fn default_bool(&self) -> bool {
        self.default_value.eq_ignore_ascii_case("true")
    }
}
