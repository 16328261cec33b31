//! Authored grid patterns: rule blocks placed on a local grid.

use crate::grid::SubCellType;
use bevy::math::IVec2;
use markergen_script::PatternScript;
use serde::{Deserialize, Serialize};

/// One rule block of a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    pub coord: IVec2,
    pub rule_type: SubCellType,
    pub script: PatternScript,
    /// Matching this rule inserts an asset, so other matches in the same
    /// layer should not insert on top of it.
    pub hint_will_insert_asset_here: bool,
}

impl PatternRule {
    pub fn new(coord: IVec2, rule_type: SubCellType) -> Self {
        Self {
            coord,
            rule_type,
            script: PatternScript::with_entry_nodes(),
            hint_will_insert_asset_here: false,
        }
    }
}

/// Rule blocks in authoring order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridPattern {
    pub rules: Vec<PatternRule>,
}

impl GridPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule at `(coord, rule_type)`, or return the one already there.
    pub fn add_new_rule(&mut self, coord: IVec2, rule_type: SubCellType) -> &mut PatternRule {
        let index = match self.rule_index(coord, rule_type) {
            Some(index) => index,
            None => {
                self.rules.push(PatternRule::new(coord, rule_type));
                self.rules.len() - 1
            }
        };
        &mut self.rules[index]
    }

    fn rule_index(&self, coord: IVec2, rule_type: SubCellType) -> Option<usize> {
        self.rules
            .iter()
            .position(|rule| rule.coord == coord && rule.rule_type == rule_type)
    }

    pub fn rule(&self, coord: IVec2, rule_type: SubCellType) -> Option<&PatternRule> {
        self.rule_index(coord, rule_type).map(|i| &self.rules[i])
    }

    pub fn rule_mut(&mut self, coord: IVec2, rule_type: SubCellType) -> Option<&mut PatternRule> {
        let index = self.rule_index(coord, rule_type)?;
        Some(&mut self.rules[index])
    }

    pub fn remove_rule(&mut self, coord: IVec2, rule_type: SubCellType) -> bool {
        match self.rule_index(coord, rule_type) {
            Some(index) => {
                self.rules.remove(index);
                true
            }
            None => false,
        }
    }

    /// A pattern only does something if some rule has a real effect node.
    pub fn should_process(&self) -> bool {
        self.rules.iter().any(|rule| rule.script.has_effect_node())
    }
}
