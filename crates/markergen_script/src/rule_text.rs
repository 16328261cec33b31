//! Human readable rule and action descriptions for tooling.

use crate::node::{NodeId, ScriptNode, ScriptNodeKind};
use crate::pin;
use crate::script::PatternScript;

const NONE_TEXT: &str = "<NONE>";

fn friendly_name(name: &str) -> &str {
    if name.is_empty() {
        NONE_TEXT
    } else {
        name
    }
}

/// Describe what an action node does, e.g. `ADD Door` or `DEL Wall`.
pub fn action_text(node: &ScriptNode) -> String {
    match &node.kind {
        ScriptNodeKind::EmitMarker(settings) => {
            format!("ADD {}", friendly_name(&settings.marker_name))
        }
        ScriptNodeKind::RemoveMarker { marker_name } => {
            format!("DEL {}", friendly_name(marker_name))
        }
        _ => String::new(),
    }
}

/// Describe a condition node as an infix expression, e.g. `Wall AND (A OR B)`.
pub fn generate_rule_text(script: &PatternScript, node: &ScriptNode) -> String {
    RuleTextWriter {
        script,
        active: Vec::new(),
    }
    .node_text(node)
}

struct RuleTextWriter<'a> {
    script: &'a PatternScript,
    active: Vec<NodeId>,
}

impl RuleTextWriter<'_> {
    fn node_text(&mut self, node: &ScriptNode) -> String {
        if self.active.contains(&node.id) {
            return String::new();
        }
        self.active.push(node.id);

        let text = match &node.kind {
            ScriptNodeKind::Result => {
                let linked = self
                    .script
                    .upstream_node(node, pin::SELECT)
                    .is_some_and(|upstream| upstream.kind.is_conditional());
                if linked {
                    self.pin_text(node, pin::SELECT, false)
                } else {
                    String::new()
                }
            }
            ScriptNodeKind::LogicalAnd => format!(
                "{} AND {}",
                self.pin_text(node, pin::A, true),
                self.pin_text(node, pin::B, true)
            ),
            ScriptNodeKind::LogicalOr => format!(
                "{} OR {}",
                self.pin_text(node, pin::A, true),
                self.pin_text(node, pin::B, true)
            ),
            ScriptNodeKind::LogicalNot => {
                format!("NOT {}", self.pin_text(node, pin::DEFAULT_INPUT, true))
            }
            ScriptNodeKind::MarkerExists { marker_name } => friendly_name(marker_name).to_string(),
            _ => String::new(),
        };

        self.active.pop();
        text
    }

    fn pin_text(&mut self, node: &ScriptNode, pin_name: &str, parenthesize: bool) -> String {
        let Some(pin) = node.input_pin(pin_name) else {
            return String::new();
        };
        if pin.linked_to.is_none() {
            return if pin.default_bool() { "True" } else { "False" }.to_string();
        }

        match self.script.upstream_node(node, pin_name) {
            Some(upstream) if upstream.kind.is_conditional() => {
                let text = self.node_text(upstream);
                if parenthesize && upstream.is_binary_operator() {
                    format!("({text})")
                } else {
                    text
                }
            }
            _ => String::new(),
        }
    }
}
