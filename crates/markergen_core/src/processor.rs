//! Layer processing: match a layer's pattern over a marker list.
//!
//! One call of [`MarkerGenProcessor::process`] builds a grid from the input
//! markers, tries every placement of every pattern orientation, runs the rule
//! scripts of each match and flattens the grid back into a marker list.
//! Candidates run in order and see the effects of earlier matches.

use crate::assembly::PatternAssembly;
use crate::executor::{GridRuleExecutor, RuleExecutorState};
use crate::grid::{GridSceneMarkerList, OccupancyGrid, SubCellType};
use crate::layer::{GridLayerSettings, MarkerGenLayer};
use crate::marker::{inverse_transform, transform_markers, MarkerInfo};
use crate::rng::{shuffle_with_rng, RandomStream};
use bevy::log::{debug, warn};
use bevy::math::{IVec2, Vec3};
use bevy::transform::components::Transform;
use markergen_script::{evaluate_condition, run_pass_event};
use std::collections::HashMap;

/// Rewrites a marker list according to one layer.
pub trait MarkerGenProcessor {
    /// `None` when the layer does not apply to this processor; the caller
    /// keeps its current markers.
    fn process(
        &self,
        layer: &MarkerGenLayer,
        markers: &[MarkerInfo],
        random: &mut dyn RandomStream,
    ) -> Option<Vec<MarkerInfo>>;
}

/// A placement of one assembly with its local origin at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatchCandidate {
    pub x: i32,
    pub y: i32,
    pub assembly_index: usize,
}

/// Why a candidate did or did not change the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOutcome {
    OverlapRejected,
    HeightRejected,
    ConditionFailed,
    Executed,
}

/// Counters for a processed layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub candidates: usize,
    pub gated_out: usize,
    pub overlap_rejected: usize,
    pub height_rejected: usize,
    pub condition_failed: usize,
    pub executed: usize,
}

impl ProcessStats {
    fn record(&mut self, outcome: PatternOutcome) {
        match outcome {
            PatternOutcome::OverlapRejected => self.overlap_rejected += 1,
            PatternOutcome::HeightRejected => self.height_rejected += 1,
            PatternOutcome::ConditionFailed => self.condition_failed += 1,
            PatternOutcome::Executed => self.executed += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub markers: Vec<MarkerInfo>,
    pub stats: ProcessStats,
}

/// Every placement of `assembly` whose rules can touch the grid window.
///
/// Rows run outer, columns inner, over
/// `[offset - pattern_size, offset + size]` inclusive.
pub fn generate_candidates(
    assembly: &PatternAssembly,
    assembly_index: usize,
    world_offset: IVec2,
    world_size: IVec2,
    out: &mut Vec<PatternMatchCandidate>,
) {
    if assembly.rules.is_empty() {
        return;
    }

    let start = world_offset - assembly.pattern_size();
    let end = world_offset + world_size;
    for y in start.y..=end.y {
        for x in start.x..=end.x {
            out.push(PatternMatchCandidate {
                x,
                y,
                assembly_index,
            });
        }
    }
}

/// Processor for grid based dungeons.
#[derive(Debug, Clone)]
pub struct GridProcessor {
    dungeon_transform: Transform,
    grid_size: Vec3,
}

impl GridProcessor {
    pub fn new(dungeon_transform: Transform, grid_size: Vec3) -> Self {
        Self {
            dungeon_transform,
            grid_size,
        }
    }

    pub fn dungeon_transform(&self) -> &Transform {
        &self.dungeon_transform
    }

    pub fn grid_size(&self) -> Vec3 {
        self.grid_size
    }

    /// Same as [`MarkerGenProcessor::process`], also reporting counters.
    pub fn process_with_stats(
        &self,
        layer: &MarkerGenLayer,
        markers: &[MarkerInfo],
        random: &mut dyn RandomStream,
    ) -> Option<ProcessOutput> {
        let Some(pattern) = &layer.pattern else {
            debug!("layer '{}' has no pattern, skipping", layer.name);
            return None;
        };
        let Some(settings) = layer.grid_settings() else {
            debug!("layer '{}' is not a grid layer, skipping", layer.name);
            return None;
        };
        if !pattern.should_process() {
            debug!("layer '{}' pattern has no effect nodes, skipping", layer.name);
            return None;
        }

        for rule in pattern.rules.iter().filter(|rule| !rule.script.is_valid()) {
            warn!(
                "layer '{}': rule at {} ({:?}) has no selection or pass event node and never matches",
                layer.name, rule.coord, rule.rule_type
            );
        }

        let assemblies = PatternAssembly::orientations(pattern, layer.rotate_to_fit);

        let mut local_markers = markers.to_vec();
        transform_markers(&mut local_markers, &inverse_transform(&self.dungeon_transform));

        let mut marker_list =
            GridSceneMarkerList::new(self.grid_size, &local_markers, settings.bounds_expansion());
        let world_offset = marker_list.world_offset();
        let world_size = marker_list.world_size();
        let mut occupancy = OccupancyGrid::new(world_offset, world_size);

        let mut candidates = Vec::new();
        for (index, assembly) in assemblies.iter().enumerate() {
            generate_candidates(assembly, index, world_offset, world_size, &mut candidates);
        }
        if layer.randomize_fitting_order {
            shuffle_with_rng(&mut candidates, random);
        }

        let mut stats = ProcessStats {
            candidates: candidates.len(),
            ..Default::default()
        };
        {
            let mut executor = GridRuleExecutor::new(&mut marker_list, settings.edge_height_mode);
            for candidate in &candidates {
                // Runs only when the draw is below the probability, so 0.0 never runs.
                if random.next_fraction() >= layer.probability {
                    stats.gated_out += 1;
                    continue;
                }
                let outcome = self.execute_pattern(
                    IVec2::new(candidate.x, candidate.y),
                    &assemblies[candidate.assembly_index],
                    layer,
                    settings,
                    &mut occupancy,
                    &mut executor,
                );
                stats.record(outcome);
            }
        }

        let mut output = marker_list.generate_marker_list();
        transform_markers(&mut output, &self.dungeon_transform);

        debug!(
            "layer '{}': {} candidates, {} gated out, {} overlapping, {} height mismatched, {} failed, {} executed",
            layer.name,
            stats.candidates,
            stats.gated_out,
            stats.overlap_rejected,
            stats.height_rejected,
            stats.condition_failed,
            stats.executed
        );

        Some(ProcessOutput {
            markers: output,
            stats,
        })
    }

    /// Try one placement: overlap check, same-height check, every rule
    /// condition, then every rule's actions.
    pub fn execute_pattern(
        &self,
        base: IVec2,
        assembly: &PatternAssembly,
        layer: &MarkerGenLayer,
        settings: &GridLayerSettings,
        occupancy: &mut OccupancyGrid,
        executor: &mut GridRuleExecutor,
    ) -> PatternOutcome {
        if !layer.allow_insertion_overlaps {
            let overlaps = assembly.rules.iter().any(|rule| {
                rule.hint_will_insert_asset_here
                    && occupancy.is_occupied(base + rule.coord, rule.rule_type)
            });
            if overlaps {
                return PatternOutcome::OverlapRejected;
            }
        }

        if !settings.same_height_markers.is_empty()
            && !self.heights_consistent(base, assembly, settings, executor.marker_list())
        {
            return PatternOutcome::HeightRejected;
        }

        for rule in &assembly.rules {
            executor.set_state(rule_state(base, rule.coord, rule.rule_type, assembly));
            if !evaluate_condition(rule.script, &*executor) {
                return PatternOutcome::ConditionFailed;
            }
        }

        for rule in &assembly.rules {
            let coord = base + rule.coord;
            executor.set_state(rule_state(base, rule.coord, rule.rule_type, assembly));
            run_pass_event(rule.script, executor);
            if rule.hint_will_insert_asset_here {
                occupancy.mark(coord, rule.rule_type);
            }
        }
        PatternOutcome::Executed
    }

    /// Every tracked marker name seen under the placement sits at one height index.
    fn heights_consistent(
        &self,
        base: IVec2,
        assembly: &PatternAssembly,
        settings: &GridLayerSettings,
        marker_list: &GridSceneMarkerList,
    ) -> bool {
        let cell_height = if self.grid_size.z > 0.0 {
            self.grid_size.z
        } else {
            1.0
        };

        let mut seen: HashMap<&str, i32> = HashMap::new();
        for rule in &assembly.rules {
            let Some(cell) = marker_list.cell(base + rule.coord) else {
                continue;
            };
            for marker in cell.markers(rule.rule_type) {
                if !settings
                    .same_height_markers
                    .iter()
                    .any(|name| *name == marker.marker_name)
                {
                    continue;
                }
                let height = (marker.location().z / cell_height) as i32;
                match seen.get(marker.marker_name.as_str()) {
                    Some(&existing) if existing != height => return false,
                    Some(_) => {}
                    None => {
                        seen.insert(marker.marker_name.as_str(), height);
                    }
                }
            }
        }
        true
    }
}

fn rule_state(
    base: IVec2,
    coord: IVec2,
    sub_cell: SubCellType,
    assembly: &PatternAssembly,
) -> RuleExecutorState {
    RuleExecutorState {
        coord: base + coord,
        sub_cell,
        base_angle_rad: assembly.rotation_angle_rad,
        rotation_90_index: assembly.rotation_90_index,
    }
}

impl MarkerGenProcessor for GridProcessor {
    fn process(
        &self,
        layer: &MarkerGenLayer,
        markers: &[MarkerInfo],
        random: &mut dyn RandomStream,
    ) -> Option<Vec<MarkerInfo>> {
        self.process_with_stats(layer, markers, random)
            .map(|output| output.markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerDomain;
    use crate::pattern::GridPattern;
    use crate::rng::StdRandom;
    use markergen_script::{pin, ScriptNodeKind};

    #[test]
    fn test_candidate_window_and_order() {
        let mut pattern = GridPattern::new();
        pattern.add_new_rule(IVec2::ZERO, SubCellType::Ground);
        pattern.add_new_rule(IVec2::new(1, 0), SubCellType::Ground);
        let assembly = PatternAssembly::generate(&pattern);

        let mut candidates = Vec::new();
        generate_candidates(&assembly, 3, IVec2::new(0, 0), IVec2::new(2, 1), &mut candidates);

        // pattern size (2, 1): x in -2..=2, y in -1..=1
        assert_eq!(candidates.len(), 5 * 3);
        assert_eq!(
            candidates[0],
            PatternMatchCandidate {
                x: -2,
                y: -1,
                assembly_index: 3
            }
        );
        assert_eq!(candidates[1].x, -1);
        assert_eq!((candidates[5].x, candidates[5].y), (-2, 0));
        assert_eq!((candidates[14].x, candidates[14].y), (2, 1));
    }

    #[test]
    fn test_empty_assembly_has_no_candidates() {
        let pattern = GridPattern::new();
        let assembly = PatternAssembly::generate(&pattern);
        let mut candidates = Vec::new();
        generate_candidates(&assembly, 0, IVec2::ZERO, IVec2::ONE, &mut candidates);
        assert!(candidates.is_empty());
    }

    fn remove_pattern(name: &str) -> GridPattern {
        let mut pattern = GridPattern::new();
        let rule = pattern.add_new_rule(IVec2::ZERO, SubCellType::Ground);
        let on_pass = rule.script.pass_event_node_id().unwrap();
        let remove = rule.script.create_node(ScriptNodeKind::remove_marker(name));
        rule.script
            .link(on_pass, pin::DEFAULT_OUTPUT, remove, pin::DEFAULT_INPUT)
            .unwrap();
        pattern
    }

    #[test]
    fn test_rejected_layers_return_none() {
        let processor = GridProcessor::new(Transform::IDENTITY, Vec3::new(100.0, 100.0, 50.0));
        let markers = vec![MarkerInfo::at(0, "Wall", Vec3::new(50.0, 50.0, 0.0))];
        let mut random = StdRandom::from_seed(1);

        let no_pattern = MarkerGenLayer::default();
        assert!(processor.process(&no_pattern, &markers, &mut random).is_none());

        let generic = MarkerGenLayer {
            domain: LayerDomain::Generic,
            ..MarkerGenLayer::grid("generic", remove_pattern("Wall"))
        };
        assert!(processor.process(&generic, &markers, &mut random).is_none());

        let mut no_effect = GridPattern::new();
        no_effect.add_new_rule(IVec2::ZERO, SubCellType::Ground);
        let idle = MarkerGenLayer::grid("idle", no_effect);
        assert!(processor.process(&idle, &markers, &mut random).is_none());

        let active = MarkerGenLayer::grid("active", remove_pattern("Wall"));
        let output = processor.process(&active, &markers, &mut random).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_dungeon_transform_round_trips_markers() {
        let dungeon = Transform::from_translation(Vec3::new(1000.0, -500.0, 25.0));
        let processor = GridProcessor::new(dungeon, Vec3::new(100.0, 100.0, 50.0));
        let markers = vec![
            MarkerInfo::at(0, "Wall", Vec3::new(1050.0, -450.0, 25.0)),
            MarkerInfo::at(1, "Keep", Vec3::new(1150.0, -450.0, 25.0)),
        ];
        let layer = MarkerGenLayer {
            randomize_fitting_order: false,
            ..MarkerGenLayer::grid("remove", remove_pattern("Wall"))
        };

        let output = processor
            .process(&layer, &markers, &mut StdRandom::from_seed(3))
            .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].marker_name, "Keep");
        assert!(output[0]
            .location()
            .abs_diff_eq(Vec3::new(1150.0, -450.0, 25.0), 1e-3));
        assert_eq!(output[0].id, 0);
    }

    /// Returns the same fraction on every draw.
    struct FixedRandom(f32);

    impl RandomStream for FixedRandom {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_fraction(&mut self) -> f32 {
            self.0
        }
    }

    #[test]
    fn test_gate_runs_only_below_probability() {
        let processor = GridProcessor::new(Transform::IDENTITY, Vec3::new(100.0, 100.0, 50.0));
        let markers = vec![MarkerInfo::at(0, "Wall", Vec3::new(50.0, 50.0, 0.0))];
        let mut layer = MarkerGenLayer {
            rotate_to_fit: false,
            randomize_fitting_order: false,
            ..MarkerGenLayer::grid("remove", remove_pattern("Wall"))
        };

        layer.probability = 0.5;
        let at_threshold = processor
            .process_with_stats(&layer, &markers, &mut FixedRandom(0.5))
            .unwrap();
        assert_eq!(at_threshold.stats.gated_out, at_threshold.stats.candidates);
        assert_eq!(at_threshold.markers.len(), 1);

        layer.probability = 0.0;
        let zero = processor
            .process_with_stats(&layer, &markers, &mut FixedRandom(0.0))
            .unwrap();
        assert_eq!(zero.stats.executed, 0);

        layer.probability = 0.51;
        let below = processor
            .process_with_stats(&layer, &markers, &mut FixedRandom(0.5))
            .unwrap();
        assert_eq!(below.stats.gated_out, 0);
        assert!(below.markers.is_empty());
    }
}
