use crate::node::NodeId;
use crate::pin::{PinDataType, PinDirection};
use std::fmt;

/// Errors raised while editing a [`PatternScript`](crate::PatternScript).
///
/// Execution never produces these; a malformed script simply fails to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// No node with this id exists in the script.
    UnknownNode(NodeId),
    /// The node has no pin with this name in the requested direction.
    UnknownPin {
        node: NodeId,
        pin: String,
        direction: PinDirection,
    },
    /// Both ends of a link must carry the same data type.
    DataTypeMismatch {
        output: PinDataType,
        input: PinDataType,
    },
    /// A node cannot be linked to itself.
    SelfLink(NodeId),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::UnknownNode(id) => write!(f, "unknown script node {}", id.0),
            ScriptError::UnknownPin {
                node,
                pin,
                direction,
            } => write!(f, "node {} has no {:?} pin named '{}'", node.0, direction, pin),
            ScriptError::DataTypeMismatch { output, input } => write!(
                f,
                "cannot link {:?} output to {:?} input",
                output, input
            ),
            ScriptError::SelfLink(id) => write!(f, "node {} cannot link to itself", id.0),
        }
    }
}

impl std::error::Error for ScriptError {}

/// Result type for script editing operations.
pub type ScriptResult<T> = Result<T, ScriptError>;
