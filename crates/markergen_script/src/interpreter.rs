//! Evaluation of rule conditions and execution of action chains.
//!
//! Conditions are pure reads against a [`PatternRuleExecutor`]. Actions run
//! as a singly linked chain starting at the script's pass event node; each
//! node in the chain runs at most once, so a looped chain terminates.

use crate::executor::PatternRuleExecutor;
use crate::node::{NodeId, ScriptNode, ScriptNodeKind};
use crate::pin;
use crate::script::PatternScript;
use bevy::log::trace;
use std::collections::HashSet;

/// Evaluate the script's result node.
///
/// A script without both entry points never matches.
pub fn evaluate_condition(script: &PatternScript, executor: &dyn PatternRuleExecutor) -> bool {
    if !script.is_valid() {
        return false;
    }
    match script.result_node() {
        Some(result) => evaluate_node(script, result, executor),
        None => false,
    }
}

/// Evaluate a single conditional node. Action nodes evaluate to `false`.
pub fn evaluate_node(
    script: &PatternScript,
    node: &ScriptNode,
    executor: &dyn PatternRuleExecutor,
) -> bool {
    let mut evaluator = ConditionEvaluator {
        script,
        executor,
        active: Vec::new(),
    };
    evaluator.evaluate(node)
}

struct ConditionEvaluator<'a> {
    script: &'a PatternScript,
    executor: &'a dyn PatternRuleExecutor,
    /// Nodes on the current evaluation path. Re-entering one reads as false.
    active: Vec<NodeId>,
}

impl ConditionEvaluator<'_> {
    fn evaluate(&mut self, node: &ScriptNode) -> bool {
        if self.active.contains(&node.id) {
            return false;
        }
        self.active.push(node.id);

        let value = match &node.kind {
            ScriptNodeKind::Result => self.input_value(node, pin::SELECT),
            ScriptNodeKind::LogicalAnd => {
                self.input_value(node, pin::A) && self.input_value(node, pin::B)
            }
            ScriptNodeKind::LogicalOr => {
                self.input_value(node, pin::A) || self.input_value(node, pin::B)
            }
            ScriptNodeKind::LogicalNot => !self.input_value(node, pin::DEFAULT_INPUT),
            ScriptNodeKind::MarkerExists { marker_name } => {
                self.executor.contains_marker(marker_name)
            }
            ScriptNodeKind::OnPass
            | ScriptNodeKind::EmitMarker(_)
            | ScriptNodeKind::RemoveMarker { .. } => false,
        };

        self.active.pop();
        value
    }

    /// Linked pins evaluate their upstream node, unlinked pins read their default.
    fn input_value(&mut self, node: &ScriptNode, pin_name: &str) -> bool {
        let Some(pin) = node.input_pin(pin_name) else {
            return false;
        };
        let Some(link) = &pin.linked_to else {
            return pin.default_bool();
        };
        match self.script.node(link.node) {
            Some(upstream) if upstream.kind.is_conditional() => self.evaluate(upstream),
            _ => false,
        }
    }
}

/// Run the action chain hanging off the pass event node.
///
/// Returns the number of action nodes executed.
pub fn run_pass_event(script: &PatternScript, executor: &mut dyn PatternRuleExecutor) -> usize {
    let Some(head) = script.pass_event_node() else {
        return 0;
    };

    let mut visited = HashSet::new();
    let mut next = script.next_action_node(head);
    while let Some(node) = next {
        if !visited.insert(node.id) {
            trace!("action chain loops back to node {}", node.id.0);
            break;
        }
        execute_action(node, executor);
        next = script.next_action_node(node);
    }
    visited.len()
}

fn execute_action(node: &ScriptNode, executor: &mut dyn PatternRuleExecutor) {
    match &node.kind {
        ScriptNodeKind::EmitMarker(settings) => {
            executor.emit_marker(&settings.marker_name, settings);
        }
        ScriptNodeKind::RemoveMarker { marker_name } => executor.remove_marker(marker_name),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::EmitMarkerSettings;

    /// Records calls against a fixed set of present markers.
    #[derive(Default)]
    struct RecordingExecutor {
        present: Vec<String>,
        log: Vec<String>,
    }

    impl RecordingExecutor {
        fn with_markers(names: &[&str]) -> Self {
            Self {
                present: names.iter().map(|n| n.to_string()).collect(),
                log: Vec::new(),
            }
        }
    }

    impl PatternRuleExecutor for RecordingExecutor {
        fn contains_marker(&self, marker_name: &str) -> bool {
            self.present.iter().any(|n| n == marker_name)
        }

        fn emit_marker(&mut self, marker_name: &str, _settings: &EmitMarkerSettings) {
            self.log.push(format!("emit {marker_name}"));
        }

        fn remove_marker(&mut self, marker_name: &str) {
            self.log.push(format!("remove {marker_name}"));
        }
    }

    fn select_from(script: &mut PatternScript, node: NodeId) {
        let result = script.result_node_id().unwrap();
        script.link(node, pin::DEFAULT_OUTPUT, result, pin::SELECT).unwrap();
    }

    #[test]
    fn test_default_select_value() {
        let mut script = PatternScript::with_entry_nodes();
        let executor = RecordingExecutor::default();
        assert!(evaluate_condition(&script, &executor));

        let result = script.result_node_id().unwrap();
        script.set_pin_default(result, pin::SELECT, "False").unwrap();
        assert!(!evaluate_condition(&script, &executor));
    }

    #[test]
    fn test_invalid_script_never_matches() {
        let mut script = PatternScript::new();
        let result = script.create_node(ScriptNodeKind::Result);
        script.set_pin_default(result, pin::SELECT, "true").unwrap();
        script.set_result_node(result).unwrap();

        let executor = RecordingExecutor::default();
        assert!(!evaluate_condition(&script, &executor));
    }

    #[test]
    fn test_marker_exists() {
        let mut script = PatternScript::with_entry_nodes();
        let exists = script.create_node(ScriptNodeKind::marker_exists("Wall"));
        select_from(&mut script, exists);

        assert!(evaluate_condition(&script, &RecordingExecutor::with_markers(&["Wall"])));
        assert!(!evaluate_condition(&script, &RecordingExecutor::with_markers(&["Door"])));
    }

    #[test]
    fn test_logical_operators() {
        let mut script = PatternScript::with_entry_nodes();
        let wall = script.create_node(ScriptNodeKind::marker_exists("Wall"));
        let door = script.create_node(ScriptNodeKind::marker_exists("Door"));
        let not_door = script.create_node(ScriptNodeKind::LogicalNot);
        let and = script.create_node(ScriptNodeKind::LogicalAnd);
        script.link(door, pin::DEFAULT_OUTPUT, not_door, pin::DEFAULT_INPUT).unwrap();
        script.link(wall, pin::DEFAULT_OUTPUT, and, pin::A).unwrap();
        script.link(not_door, pin::DEFAULT_OUTPUT, and, pin::B).unwrap();
        select_from(&mut script, and);

        assert!(evaluate_condition(&script, &RecordingExecutor::with_markers(&["Wall"])));
        assert!(!evaluate_condition(
            &script,
            &RecordingExecutor::with_markers(&["Wall", "Door"])
        ));
        assert!(!evaluate_condition(&script, &RecordingExecutor::default()));

        let mut or_script = PatternScript::with_entry_nodes();
        let wall = or_script.create_node(ScriptNodeKind::marker_exists("Wall"));
        let or = or_script.create_node(ScriptNodeKind::LogicalOr);
        or_script.link(wall, pin::DEFAULT_OUTPUT, or, pin::A).unwrap();
        or_script.set_pin_default(or, pin::B, "TRUE").unwrap();
        select_from(&mut or_script, or);
        assert!(evaluate_condition(&or_script, &RecordingExecutor::default()));
    }

    #[test]
    fn test_unlinked_operands_use_defaults() {
        let mut script = PatternScript::with_entry_nodes();
        let and = script.create_node(ScriptNodeKind::LogicalAnd);
        select_from(&mut script, and);
        let executor = RecordingExecutor::default();
        assert!(!evaluate_condition(&script, &executor));

        script.set_pin_default(and, pin::A, "true").unwrap();
        script.set_pin_default(and, pin::B, "true").unwrap();
        assert!(evaluate_condition(&script, &executor));
    }

    #[test]
    fn test_condition_cycle_reads_false() {
        let mut script = PatternScript::with_entry_nodes();
        let first = script.create_node(ScriptNodeKind::LogicalNot);
        let second = script.create_node(ScriptNodeKind::LogicalNot);
        script.link(first, pin::DEFAULT_OUTPUT, second, pin::DEFAULT_INPUT).unwrap();
        script.link(second, pin::DEFAULT_OUTPUT, first, pin::DEFAULT_INPUT).unwrap();

        // first -> NOT(second) -> NOT(first re-entered = false) -> true -> false
        let node = script.node(first).unwrap();
        assert!(!evaluate_node(&script, node, &RecordingExecutor::default()));
    }

    #[test]
    fn test_action_chain_order() {
        let mut script = PatternScript::with_entry_nodes();
        let on_pass = script.pass_event_node_id().unwrap();
        let remove = script.create_node(ScriptNodeKind::remove_marker("Wall"));
        let emit = script.create_node(ScriptNodeKind::emit_marker("Door"));
        script.link(on_pass, pin::DEFAULT_OUTPUT, remove, pin::DEFAULT_INPUT).unwrap();
        script.link(remove, pin::DEFAULT_OUTPUT, emit, pin::DEFAULT_INPUT).unwrap();

        let mut executor = RecordingExecutor::default();
        assert_eq!(run_pass_event(&script, &mut executor), 2);
        assert_eq!(executor.log, vec!["remove Wall", "emit Door"]);
    }

    #[test]
    fn test_action_cycle_runs_each_node_once() {
        let mut script = PatternScript::with_entry_nodes();
        let on_pass = script.pass_event_node_id().unwrap();
        let first = script.create_node(ScriptNodeKind::emit_marker("A"));
        let second = script.create_node(ScriptNodeKind::emit_marker("B"));
        script.link(on_pass, pin::DEFAULT_OUTPUT, first, pin::DEFAULT_INPUT).unwrap();
        script.link(first, pin::DEFAULT_OUTPUT, second, pin::DEFAULT_INPUT).unwrap();
        script.link(second, pin::DEFAULT_OUTPUT, first, pin::DEFAULT_INPUT).unwrap();

        let mut executor = RecordingExecutor::default();
        assert_eq!(run_pass_event(&script, &mut executor), 2);
        assert_eq!(executor.log, vec!["emit A", "emit B"]);
    }

    #[test]
    fn test_no_pass_event_node_runs_nothing() {
        let script = PatternScript::new();
        let mut executor = RecordingExecutor::default();
        assert_eq!(run_pass_event(&script, &mut executor), 0);
        assert!(executor.log.is_empty());
    }
}
