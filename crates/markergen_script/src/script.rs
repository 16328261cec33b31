//! The pattern script graph: node arena, entry points and linking.

use crate::error::{ScriptError, ScriptResult};
use crate::node::{NodeId, ScriptNode, ScriptNodeKind};
use crate::pin::{self, PinDataType, PinDirection, PinLink, ScriptPin};
use serde::{Deserialize, Serialize};

/// A compiled rule script.
///
/// Nodes live in an arena owned by the script; pins refer to each other by
/// `(NodeId, pin name)`. A script is executable only when both the result
/// node and the pass event node are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternScript {
    nodes: Vec<ScriptNode>,
    next_node_id: u32,
    result_node: Option<NodeId>,
    pass_event_node: Option<NodeId>,
}

impl PatternScript {
    /// An empty script with no entry points. Never matches.
    pub fn new() -> Self {
        Self::default()
    }

    /// The script a freshly authored rule starts with: a result node whose
    /// `Select` pin defaults to `true` and an empty pass event chain.
    pub fn with_entry_nodes() -> Self {
        let mut script = Self::new();
        let result = script.create_node(ScriptNodeKind::Result);
        let on_pass = script.create_node(ScriptNodeKind::OnPass);
        if let Some(select) = script.pin_mut(result, pin::SELECT, PinDirection::Input) {
            select.default_value = "true".to_string();
        }
        script.result_node = Some(result);
        script.pass_event_node = Some(on_pass);
        script
    }

    pub fn create_node(&mut self, kind: ScriptNodeKind) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.push(ScriptNode::new(id, kind));
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&ScriptNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut ScriptNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    pub fn nodes(&self) -> &[ScriptNode] {
        &self.nodes
    }

    pub fn find_node<P>(&self, predicate: P) -> Option<&ScriptNode>
    where
        P: Fn(&ScriptNode) -> bool,
    {
        self.nodes.iter().find(|node| predicate(node))
    }

    pub fn find_nodes<P>(&self, predicate: P) -> Vec<&ScriptNode>
    where
        P: Fn(&ScriptNode) -> bool,
    {
        self.nodes.iter().filter(|node| predicate(node)).collect()
    }

    fn pin_mut(
        &mut self,
        node: NodeId,
        pin_name: &str,
        direction: PinDirection,
    ) -> Option<&mut ScriptPin> {
        self.node_mut(node)?.pin_mut(pin_name, direction)
    }

    pub fn result_node_id(&self) -> Option<NodeId> {
        self.result_node
    }

    pub fn pass_event_node_id(&self) -> Option<NodeId> {
        self.pass_event_node
    }

    /// The result node, if set and of the right kind.
    pub fn result_node(&self) -> Option<&ScriptNode> {
        self.result_node
            .and_then(|id| self.node(id))
            .filter(|node| node.kind == ScriptNodeKind::Result)
    }

    /// The pass event node, if set and of the right kind.
    pub fn pass_event_node(&self) -> Option<&ScriptNode> {
        self.pass_event_node
            .and_then(|id| self.node(id))
            .filter(|node| node.kind == ScriptNodeKind::OnPass)
    }

    pub fn set_result_node(&mut self, id: NodeId) -> ScriptResult<()> {
        self.node(id).ok_or(ScriptError::UnknownNode(id))?;
        self.result_node = Some(id);
        Ok(())
    }

    pub fn set_pass_event_node(&mut self, id: NodeId) -> ScriptResult<()> {
        self.node(id).ok_or(ScriptError::UnknownNode(id))?;
        self.pass_event_node = Some(id);
        Ok(())
    }

    /// Both entry points are present.
    pub fn is_valid(&self) -> bool {
        self.result_node().is_some() && self.pass_event_node().is_some()
    }

    /// Contains an action node other than the pass event entry.
    pub fn has_effect_node(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| node.kind.is_action() && node.kind != ScriptNodeKind::OnPass)
    }

    pub fn has_emit_marker(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| matches!(node.kind, ScriptNodeKind::EmitMarker(_)))
    }

    /// Set the literal used by an input pin when it is not linked.
    pub fn set_pin_default(
        &mut self,
        node: NodeId,
        pin_name: &str,
        value: impl Into<String>,
    ) -> ScriptResult<()> {
        let pin = self.pin_mut(node, pin_name, PinDirection::Input).ok_or_else(|| {
            ScriptError::UnknownPin {
                node,
                pin: pin_name.to_string(),
                direction: PinDirection::Input,
            }
        })?;
        pin.default_value = value.into();
        Ok(())
    }

    /// Link an output pin to an input pin.
    ///
    /// Both sides record the link. An exec output feeds a single successor
    /// and a bool input reads a single source, so an earlier link on that
    /// side is broken first. The other side only keeps a back reference to
    /// its latest link.
    pub fn link(
        &mut self,
        src_node: NodeId,
        src_pin: &str,
        dst_node: NodeId,
        dst_pin: &str,
    ) -> ScriptResult<()> {
        if src_node == dst_node {
            return Err(ScriptError::SelfLink(src_node));
        }

        let output_type = self.existing_pin(src_node, src_pin, PinDirection::Output)?;
        let input_type = self.existing_pin(dst_node, dst_pin, PinDirection::Input)?;
        if output_type != input_type {
            return Err(ScriptError::DataTypeMismatch {
                output: output_type,
                input: input_type,
            });
        }

        match output_type {
            PinDataType::Exec => self.unlink(src_node, src_pin, PinDirection::Output),
            PinDataType::Bool => self.unlink(dst_node, dst_pin, PinDirection::Input),
        }

        if let Some(pin) = self.pin_mut(src_node, src_pin, PinDirection::Output) {
            pin.linked_to = Some(PinLink::new(dst_node, dst_pin));
        }
        if let Some(pin) = self.pin_mut(dst_node, dst_pin, PinDirection::Input) {
            pin.linked_to = Some(PinLink::new(src_node, src_pin));
        }
        Ok(())
    }

    fn existing_pin(
        &self,
        node: NodeId,
        pin_name: &str,
        direction: PinDirection,
    ) -> ScriptResult<PinDataType> {
        let script_node = self.node(node).ok_or(ScriptError::UnknownNode(node))?;
        script_node
            .pin(pin_name, direction)
            .map(|pin| pin.data_type)
            .ok_or_else(|| ScriptError::UnknownPin {
                node,
                pin: pin_name.to_string(),
                direction,
            })
    }

    /// Break the link on a pin. The far side is cleared if it still points back.
    pub fn unlink(&mut self, node: NodeId, pin_name: &str, direction: PinDirection) {
        let Some(link) = self
            .pin_mut(node, pin_name, direction)
            .and_then(|pin| pin.linked_to.take())
        else {
            return;
        };

        let far_direction = match direction {
            PinDirection::Input => PinDirection::Output,
            PinDirection::Output => PinDirection::Input,
        };
        let back = PinLink::new(node, pin_name);
        if let Some(far) = self.pin_mut(link.node, &link.pin, far_direction) {
            if far.linked_to.as_ref() == Some(&back) {
                far.linked_to = None;
            }
        }
    }

    /// Node on the far side of an input pin's link.
    pub fn upstream_node(&self, node: &ScriptNode, pin_name: &str) -> Option<&ScriptNode> {
        let link = node.input_pin(pin_name)?.linked_to.as_ref()?;
        self.node(link.node)
    }

    /// Next action node in an exec chain, following the node's exec output.
    pub fn next_action_node(&self, node: &ScriptNode) -> Option<&ScriptNode> {
        let link = node.output_exec_pin()?.linked_to.as_ref()?;
        self.node(link.node).filter(|next| next.kind.is_action())
    }

    /// Remove every node and both entry points.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.result_node = None;
        self.pass_event_node = None;
    }
}
