//! Pattern rule scripts for the marker generator.
//!
//! A rule script is a small graph of typed nodes. Condition nodes produce
//! booleans and are pure; action nodes mutate the grid through a
//! [`PatternRuleExecutor`]. Every script has two entry points:
//!
//! - the **result node** ("Selection Condition"), whose `Select` pin decides
//!   whether the owning rule matches, and
//! - the **pass event node** ("On Pattern Selected"), the head of the chain of
//!   action nodes run once every rule of a pattern has matched.
//!
//! # Example
//!
//! ```ignore
//! use markergen_script::{PatternScript, ScriptNodeKind, pin};
//!
//! let mut script = PatternScript::with_entry_nodes();
//! let exists = script.create_node(ScriptNodeKind::marker_exists("Wall"));
//! let result = script.result_node_id().unwrap();
//! script.link(exists, pin::DEFAULT_OUTPUT, result, pin::SELECT)?;
//! ```

pub mod error;
pub mod executor;
pub mod interpreter;
pub mod node;
pub mod pin;
pub mod rule_text;
pub mod script;

pub use error::ScriptError;
pub use executor::{EmitMarkerSettings, PatternRuleExecutor};
pub use interpreter::{evaluate_condition, evaluate_node, run_pass_event};
pub use node::{NodeId, ScriptNode, ScriptNodeKind};
pub use pin::{PinConstraint, PinDataType, PinDirection, PinLink, ScriptPin};
pub use rule_text::{action_text, generate_rule_text};
pub use script::PatternScript;
