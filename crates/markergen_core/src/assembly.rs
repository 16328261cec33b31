//! Flattened, bounds-computed pattern orientations used while matching.

use crate::grid::height::round_to_int;
use crate::grid::SubCellType;
use crate::pattern::GridPattern;
use bevy::math::{IVec2, Vec2};
use markergen_script::PatternScript;
use std::f32::consts::FRAC_PI_2;

/// A rule placed in one orientation of a pattern.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyRule<'a> {
    pub coord: IVec2,
    pub rule_type: SubCellType,
    pub hint_will_insert_asset_here: bool,
    pub script: &'a PatternScript,
}

/// One orientation of a pattern, borrowing the pattern's scripts.
#[derive(Debug, Clone)]
pub struct PatternAssembly<'a> {
    pub rules: Vec<AssemblyRule<'a>>,
    pub bound_min: IVec2,
    pub bound_max: IVec2,
    pub rotation_angle_rad: f32,
    pub rotation_90_index: i32,
}

impl<'a> PatternAssembly<'a> {
    /// The unrotated assembly of `pattern`.
    ///
    /// Rules that emit a marker are hinted as inserting an asset even when
    /// the author left the hint off.
    pub fn generate(pattern: &'a GridPattern) -> Self {
        let rules = pattern
            .rules
            .iter()
            .map(|rule| AssemblyRule {
                coord: rule.coord,
                rule_type: rule.rule_type,
                hint_will_insert_asset_here: rule.hint_will_insert_asset_here
                    || rule.script.has_emit_marker(),
                script: &rule.script,
            })
            .collect();

        let mut assembly = Self {
            rules,
            bound_min: IVec2::ZERO,
            bound_max: IVec2::ZERO,
            rotation_angle_rad: 0.0,
            rotation_90_index: 0,
        };
        assembly.update_bounds();
        assembly
    }

    /// The base assembly, followed by its 90, 180 and 270 degree turns when
    /// `rotate_to_fit` is set.
    pub fn orientations(pattern: &'a GridPattern, rotate_to_fit: bool) -> Vec<Self> {
        let mut assemblies = vec![Self::generate(pattern)];
        if rotate_to_fit {
            for _ in 0..3 {
                if let Some(last) = assemblies.last() {
                    let rotated = last.rotated_90();
                    assemblies.push(rotated);
                }
            }
        }
        assemblies
    }

    /// This assembly turned a quarter counter-clockwise about the centre of cell (0, 0).
    ///
    /// Horizontal edges become vertical edges and the other way round.
    pub fn rotated_90(&self) -> Self {
        let mut rotated = self.clone();
        rotated.rotation_angle_rad += FRAC_PI_2;
        rotated.rotation_90_index += 1;

        for rule in rotated.rules.iter_mut() {
            let coord = rule.coord.as_vec2();
            let (location, rule_type) = match rule.rule_type {
                SubCellType::Corner => {
                    let pivot = Vec2::new(0.5, 0.5);
                    (rotate_quarter(coord - pivot) + pivot, SubCellType::Corner)
                }
                SubCellType::Ground => (rotate_quarter(coord), SubCellType::Ground),
                SubCellType::EdgeX => (
                    rotate_quarter(coord - Vec2::new(0.0, 0.5)) + Vec2::new(0.5, 0.0),
                    SubCellType::EdgeY,
                ),
                SubCellType::EdgeY => (
                    rotate_quarter(coord - Vec2::new(0.5, 0.0)) + Vec2::new(0.0, 0.5),
                    SubCellType::EdgeX,
                ),
            };
            rule.coord = IVec2::new(round_to_int(location.x), round_to_int(location.y));
            rule.rule_type = rule_type;
        }

        rotated.update_bounds();
        rotated
    }

    fn update_bounds(&mut self) {
        let mut coords = self.rules.iter().map(|rule| rule.coord);
        let Some(first) = coords.next() else {
            self.bound_min = IVec2::ZERO;
            self.bound_max = IVec2::ZERO;
            return;
        };
        let (min, max) = coords.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c)));
        self.bound_min = min;
        self.bound_max = max;
    }

    /// Extent of the rule bounds, inclusive.
    pub fn pattern_size(&self) -> IVec2 {
        self.bound_max - self.bound_min + IVec2::ONE
    }
}

fn rotate_quarter(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use markergen_script::{pin, ScriptNodeKind};

    fn layout(assembly: &PatternAssembly) -> Vec<(IVec2, SubCellType)> {
        assembly.rules.iter().map(|r| (r.coord, r.rule_type)).collect()
    }

    fn sample_pattern() -> GridPattern {
        let mut pattern = GridPattern::new();
        pattern.add_new_rule(IVec2::new(0, 0), SubCellType::Ground);
        pattern.add_new_rule(IVec2::new(2, 1), SubCellType::Corner);
        pattern.add_new_rule(IVec2::new(0, 0), SubCellType::EdgeX);
        pattern.add_new_rule(IVec2::new(-1, 3), SubCellType::EdgeY);
        pattern
    }

    #[test]
    fn test_generate_bounds() {
        let pattern = sample_pattern();
        let assembly = PatternAssembly::generate(&pattern);
        assert_eq!(assembly.bound_min, IVec2::new(-1, 0));
        assert_eq!(assembly.bound_max, IVec2::new(2, 3));
        assert_eq!(assembly.pattern_size(), IVec2::new(4, 4));
        assert_eq!(assembly.rotation_90_index, 0);
    }

    #[test]
    fn test_empty_pattern_bounds() {
        let pattern = GridPattern::new();
        let assembly = PatternAssembly::generate(&pattern);
        assert_eq!(assembly.bound_min, IVec2::ZERO);
        assert_eq!(assembly.bound_max, IVec2::ZERO);
    }

    #[test]
    fn test_emit_marker_sets_hint() {
        let mut pattern = GridPattern::new();
        let rule = pattern.add_new_rule(IVec2::ZERO, SubCellType::Ground);
        let on_pass = rule.script.pass_event_node_id().unwrap();
        let emit = rule.script.create_node(ScriptNodeKind::emit_marker("Door"));
        rule.script
            .link(on_pass, pin::DEFAULT_OUTPUT, emit, pin::DEFAULT_INPUT)
            .unwrap();
        pattern.add_new_rule(IVec2::X, SubCellType::Ground);
        pattern
            .add_new_rule(IVec2::Y, SubCellType::Ground)
            .hint_will_insert_asset_here = true;

        let assembly = PatternAssembly::generate(&pattern);
        let hints: Vec<bool> = assembly
            .rules
            .iter()
            .map(|r| r.hint_will_insert_asset_here)
            .collect();
        assert_eq!(hints, vec![true, false, true]);
    }

    #[test]
    fn test_quarter_turn_of_each_sub_cell() {
        let mut pattern = GridPattern::new();
        pattern.add_new_rule(IVec2::new(0, 0), SubCellType::Ground);
        pattern.add_new_rule(IVec2::new(0, 0), SubCellType::Corner);
        pattern.add_new_rule(IVec2::new(0, 0), SubCellType::EdgeX);
        pattern.add_new_rule(IVec2::new(0, 0), SubCellType::EdgeY);
        pattern.add_new_rule(IVec2::new(2, 1), SubCellType::Ground);

        let rotated = PatternAssembly::generate(&pattern).rotated_90();
        assert_eq!(
            layout(&rotated),
            vec![
                (IVec2::new(0, 0), SubCellType::Ground),
                (IVec2::new(1, 0), SubCellType::Corner),
                (IVec2::new(1, 0), SubCellType::EdgeY),
                (IVec2::new(0, 0), SubCellType::EdgeX),
                (IVec2::new(-1, 2), SubCellType::Ground),
            ]
        );
        assert_eq!(rotated.rotation_90_index, 1);
        assert!((rotated.rotation_angle_rad - FRAC_PI_2).abs() < 1e-6);
        assert_eq!(rotated.bound_min, IVec2::new(-1, 0));
        assert_eq!(rotated.bound_max, IVec2::new(1, 2));
    }

    #[test]
    fn test_four_turns_restore_layout() {
        let pattern = sample_pattern();
        let base = PatternAssembly::generate(&pattern);
        let turned = base.rotated_90().rotated_90().rotated_90().rotated_90();
        assert_eq!(layout(&turned), layout(&base));
        assert_eq!(turned.bound_min, base.bound_min);
        assert_eq!(turned.bound_max, base.bound_max);
        assert_eq!(turned.rotation_90_index, 4);
    }

    #[test]
    fn test_orientations() {
        let pattern = sample_pattern();
        let fixed = PatternAssembly::orientations(&pattern, false);
        assert_eq!(fixed.len(), 1);

        let all = PatternAssembly::orientations(&pattern, true);
        let indices: Vec<i32> = all.iter().map(|a| a.rotation_90_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(layout(&all[2]), layout(&all[1].rotated_90()));
    }
}
