//! Height index inference for every slot of the grid.
//!
//! Ground heights come from existing ground markers and are flood filled to
//! the rest of the grid. Edges and corners take the highest of the ground
//! cells they touch.

use super::{GridCells, GridSceneMarkerList, SubCellType};
use bevy::math::IVec2;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Integer height index of each slot of one coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellHeights {
    pub ground: i32,
    pub edge_x: i32,
    pub edge_y: i32,
    pub corner: i32,
}

impl CellHeights {
    pub fn height(&self, sub_cell: SubCellType) -> i32 {
        match sub_cell {
            SubCellType::Ground => self.ground,
            SubCellType::EdgeX => self.edge_x,
            SubCellType::EdgeY => self.edge_y,
            SubCellType::Corner => self.corner,
        }
    }
}

pub type HeightGrid = GridCells<CellHeights>;

/// How the height of a vertical (`EdgeY`) edge is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeHeightMode {
    /// Max of the `EdgeX` height of the same coordinate and the ground to the
    /// left. Matches content authored against the dungeon tool.
    #[default]
    Legacy,
    /// Max of the ground on both sides of the edge.
    Corrected,
}

const NEIGHBOR_DELTAS: [IVec2; 4] = [
    IVec2::new(-1, 0),
    IVec2::new(1, 0),
    IVec2::new(0, -1),
    IVec2::new(0, 1),
];

/// `floor(x + 0.5)`, rounding halves up.
pub(crate) fn round_to_int(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}

/// Infer a height index for every slot in the marker list's grid window.
pub fn generate_height_data(list: &GridSceneMarkerList, mode: EdgeHeightMode) -> HeightGrid {
    let cell_height = list.cell_height().max(1.0);
    let mut heights = HeightGrid::new(list.world_offset(), list.world_size());

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    for coord in list.coords() {
        let Some(first) = list
            .cell(coord)
            .and_then(|cell| cell.markers(SubCellType::Ground).first())
        else {
            continue;
        };
        let height = round_to_int(first.location().z / cell_height);
        visited.insert(coord);
        queue.push_back((coord, height));
    }

    while let Some((coord, height)) = queue.pop_front() {
        let Some(cell) = heights.get_mut(coord) else {
            continue;
        };
        cell.ground = height;

        for delta in NEIGHBOR_DELTAS {
            let neighbor = coord + delta;
            if heights.is_coord_valid(neighbor) && visited.insert(neighbor) {
                queue.push_back((neighbor, height));
            }
        }
    }

    let coords: Vec<IVec2> = heights.coords().collect();
    for coord in coords {
        let ground_at = |offset: IVec2| heights.get(coord + offset).map(|c| c.ground);
        let own = ground_at(IVec2::ZERO).unwrap_or(0);
        let below = ground_at(IVec2::new(0, -1));
        let left = ground_at(IVec2::new(-1, 0));
        let diagonal = ground_at(IVec2::new(-1, -1));

        let edge_x = below.map_or(own, |g| own.max(g));
        let edge_y = match (left, mode) {
            (Some(g), EdgeHeightMode::Legacy) => edge_x.max(g),
            (Some(g), EdgeHeightMode::Corrected) => own.max(g),
            (None, _) => own,
        };
        let corner = diagonal.map_or(edge_x.max(edge_y), |g| edge_x.max(edge_y).max(g));

        if let Some(cell) = heights.get_mut(coord) {
            cell.edge_x = edge_x;
            cell.edge_y = edge_y;
            cell.corner = corner;
        }
    }

    heights
}
