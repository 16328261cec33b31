//! Grid-backed implementation of the script executor capability.

use crate::grid::{generate_height_data, EdgeHeightMode, GridSceneMarkerList, HeightGrid, SubCellType};
use crate::marker::MarkerInfo;
use bevy::math::{IVec2, Quat};
use bevy::transform::components::Transform;
use markergen_script::{EmitMarkerSettings, PatternRuleExecutor};
use std::f32::consts::{FRAC_PI_2, PI};

/// The slot and orientation a rule is currently evaluated on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleExecutorState {
    pub coord: IVec2,
    pub sub_cell: SubCellType,
    pub base_angle_rad: f32,
    pub rotation_90_index: i32,
}

impl Default for RuleExecutorState {
    fn default() -> Self {
        Self {
            coord: IVec2::ZERO,
            sub_cell: SubCellType::Ground,
            base_angle_rad: 0.0,
            rotation_90_index: 0,
        }
    }
}

/// Runs rule scripts against a marker list for the duration of one pass.
///
/// Height data is inferred once, when the executor is created.
pub struct GridRuleExecutor<'g> {
    markers: &'g mut GridSceneMarkerList,
    heights: HeightGrid,
    state: RuleExecutorState,
}

impl<'g> GridRuleExecutor<'g> {
    pub fn new(markers: &'g mut GridSceneMarkerList, edge_height_mode: EdgeHeightMode) -> Self {
        let heights = generate_height_data(markers, edge_height_mode);
        Self {
            markers,
            heights,
            state: RuleExecutorState::default(),
        }
    }

    pub fn set_state(&mut self, state: RuleExecutorState) {
        self.state = state;
    }

    pub fn state(&self) -> RuleExecutorState {
        self.state
    }

    pub fn marker_list(&self) -> &GridSceneMarkerList {
        &*self.markers
    }

    pub fn heights(&self) -> &HeightGrid {
        &self.heights
    }

    /// Yaw for markers emitted in the current state.
    ///
    /// Edges get an extra quarter or three-quarter turn depending on the
    /// orientation so edge assets face across the edge.
    pub fn world_rotation(&self) -> Quat {
        let extra = match (self.state.rotation_90_index, self.state.sub_cell) {
            (0, SubCellType::EdgeY) | (1, SubCellType::EdgeX) => FRAC_PI_2,
            (2, SubCellType::EdgeY) | (3, SubCellType::EdgeX) => PI * 1.5,
            _ => 0.0,
        };
        Quat::from_rotation_z(self.state.base_angle_rad + extra)
    }
}

impl PatternRuleExecutor for GridRuleExecutor<'_> {
    fn contains_marker(&self, marker_name: &str) -> bool {
        self.markers
            .cell(self.state.coord)
            .is_some_and(|cell| cell.contains(marker_name, self.state.sub_cell))
    }

    fn emit_marker(&mut self, marker_name: &str, settings: &EmitMarkerSettings) {
        let RuleExecutorState { coord, sub_cell, .. } = self.state;
        let Some(cell) = self.markers.cell(coord) else {
            return;
        };

        let height = self
            .heights
            .get(coord)
            .map_or(0, |heights| heights.height(sub_cell));

        let rotation = cell
            .find_first_named(&settings.copy_rotation_from_markers, sub_cell)
            .map(|marker| marker.transform.rotation)
            .unwrap_or_else(|| self.world_rotation());

        let mut location = self.markers.cell_to_world(coord, height, sub_cell);
        if let Some(source) = cell.find_first_named(&settings.copy_height_from_markers, sub_cell) {
            location.z = source.location().z;
        }

        let id = self.markers.generate_next_marker_id();
        let transform = Transform::from_translation(location).with_rotation(rotation);
        if let Some(cell) = self.markers.cell_mut(coord) {
            cell.add(MarkerInfo::new(id, marker_name, transform), sub_cell);
        }
    }

    fn remove_marker(&mut self, marker_name: &str) {
        let RuleExecutorState { coord, sub_cell, .. } = self.state;
        if let Some(cell) = self.markers.cell_mut(coord) {
            cell.remove(marker_name, sub_cell);
        }
    }
}
