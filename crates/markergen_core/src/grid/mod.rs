//! Sparse marker scene laid out on a 2D grid.
//!
//! Every integer coordinate owns four marker slots:
//!
//! - `Ground`: the tile interior, at `(x + 0.5, y + 0.5)`
//! - `EdgeX`: the horizontal edge below the tile, at `(x + 0.5, y)`
//! - `EdgeY`: the vertical edge left of the tile, at `(x, y + 0.5)`
//! - `Corner`: the lower-left corner, at `(x, y)`
//!
//! Positions are in cell units; multiply by the cell size for world space.

pub mod cells;
pub mod height;

pub use cells::{CellOccupancy, GridCells, OccupancyGrid};
pub use height::{generate_height_data, CellHeights, EdgeHeightMode, HeightGrid};

use crate::marker::MarkerInfo;
use bevy::math::{IVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Tolerance on the fractional cell position when classifying a location.
pub const SUB_CELL_TOLERANCE: f32 = 1e-2;

/// The four addressable slots of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubCellType {
    Ground,
    EdgeX,
    EdgeY,
    Corner,
}

impl SubCellType {
    pub const ALL: [SubCellType; 4] = [
        SubCellType::Ground,
        SubCellType::EdgeX,
        SubCellType::EdgeY,
        SubCellType::Corner,
    ];

    /// Offset of the slot inside its cell, in cell units.
    pub fn cell_offset(self) -> Vec2 {
        match self {
            SubCellType::Ground => Vec2::new(0.5, 0.5),
            SubCellType::EdgeX => Vec2::new(0.5, 0.0),
            SubCellType::EdgeY => Vec2::new(0.0, 0.5),
            SubCellType::Corner => Vec2::ZERO,
        }
    }
}

/// Markers held by one grid coordinate, one list per slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridSceneCell {
    ground: Vec<MarkerInfo>,
    edge_x: Vec<MarkerInfo>,
    edge_y: Vec<MarkerInfo>,
    corner: Vec<MarkerInfo>,
}

impl GridSceneCell {
    pub fn markers(&self, sub_cell: SubCellType) -> &[MarkerInfo] {
        match sub_cell {
            SubCellType::Ground => &self.ground,
            SubCellType::EdgeX => &self.edge_x,
            SubCellType::EdgeY => &self.edge_y,
            SubCellType::Corner => &self.corner,
        }
    }

    fn markers_mut(&mut self, sub_cell: SubCellType) -> &mut Vec<MarkerInfo> {
        match sub_cell {
            SubCellType::Ground => &mut self.ground,
            SubCellType::EdgeX => &mut self.edge_x,
            SubCellType::EdgeY => &mut self.edge_y,
            SubCellType::Corner => &mut self.corner,
        }
    }

    /// Append a marker unless one with the same name already sits at the same location.
    ///
    /// Returns `true` if the marker was added.
    pub fn add(&mut self, marker: MarkerInfo, sub_cell: SubCellType) -> bool {
        let list = self.markers_mut(sub_cell);
        if list.iter().any(|existing| existing.is_same_marker(&marker)) {
            return false;
        }
        list.push(marker);
        true
    }

    /// Drop every marker with this name from the slot.
    pub fn remove(&mut self, marker_name: &str, sub_cell: SubCellType) {
        self.markers_mut(sub_cell)
            .retain(|marker| marker.marker_name != marker_name);
    }

    pub fn contains(&self, marker_name: &str, sub_cell: SubCellType) -> bool {
        self.markers(sub_cell)
            .iter()
            .any(|marker| marker.marker_name == marker_name)
    }

    /// First marker in the slot whose name is in `names`.
    pub fn find_first_named(&self, names: &[String], sub_cell: SubCellType) -> Option<&MarkerInfo> {
        self.markers(sub_cell)
            .iter()
            .find(|marker| names.iter().any(|name| *name == marker.marker_name))
    }

    pub fn clear(&mut self) {
        self.ground.clear();
        self.edge_x.clear();
        self.edge_y.clear();
        self.corner.clear();
    }

    pub fn is_empty(&self) -> bool {
        SubCellType::ALL.iter().all(|&t| self.markers(t).is_empty())
    }
}

/// Map a location to its grid coordinate and slot.
///
/// A non-positive cell size on either axis maps everything to the corner of
/// the origin cell.
pub fn world_to_cell_coords(cell_size: Vec2, location: Vec3) -> (IVec2, SubCellType) {
    if cell_size.x <= 0.0 || cell_size.y <= 0.0 {
        return (IVec2::ZERO, SubCellType::Corner);
    }

    let coord_f = location.truncate() / cell_size;
    let coord = coord_f.floor();
    let dx = coord_f.x - coord.x;
    let dy = coord_f.y - coord.y;

    let near = |value: f32, target: f32| (value - target).abs() <= SUB_CELL_TOLERANCE;
    let sub_cell = if near(dx, 0.0) && near(dy, 0.0) {
        SubCellType::Corner
    } else if near(dx, 0.5) && near(dy, 0.0) {
        SubCellType::EdgeX
    } else if near(dx, 0.0) && near(dy, 0.5) {
        SubCellType::EdgeY
    } else {
        SubCellType::Ground
    };
    (coord.as_ivec2(), sub_cell)
}

/// Map a grid coordinate, height index and slot back to a location.
pub fn cell_to_world_coords(cell_size: Vec3, coord: IVec2, height: i32, sub_cell: SubCellType) -> Vec3 {
    let coord_f = coord.as_vec2() + sub_cell.cell_offset();
    (coord_f * cell_size.truncate()).extend(height as f32 * cell_size.z)
}

/// All markers of one processing pass, bucketed by grid coordinate and slot.
///
/// The grid window covers the bounding box of the input markers plus an
/// expansion margin on every side.
#[derive(Debug, Clone)]
pub struct GridSceneMarkerList {
    cell_size: Vec3,
    cells: GridCells<GridSceneCell>,
    next_marker_id: i32,
}

impl GridSceneMarkerList {
    pub fn new(cell_size: Vec3, markers: &[MarkerInfo], bounds_expansion: i32) -> Self {
        let cell_size_2d = cell_size.truncate();

        let (mut bounds_min, mut bounds_max) = match markers.first() {
            Some(first) => {
                let start = first.location().truncate();
                markers.iter().fold((start, start), |(lo, hi), marker| {
                    let location = marker.location().truncate();
                    (lo.min(location), hi.max(location))
                })
            }
            None => (Vec2::ZERO, Vec2::ZERO),
        };

        if cell_size_2d.x > 0.0 && cell_size_2d.y > 0.0 {
            bounds_min /= cell_size_2d;
            bounds_max /= cell_size_2d;
        } else {
            bounds_min = Vec2::ZERO;
            bounds_max = Vec2::ZERO;
        }

        let start = bounds_min.floor().as_ivec2();
        let end = bounds_max.floor().as_ivec2();
        let expansion = IVec2::splat(bounds_expansion);
        let offset = start - expansion;
        let size = end - start + IVec2::ONE + expansion * 2;

        let mut list = Self {
            cell_size,
            cells: GridCells::new(offset, size),
            next_marker_id: markers.len() as i32,
        };

        for marker in markers {
            let (coord, sub_cell) = list.world_to_cell(marker.location());
            if let Some(cell) = list.cell_mut(coord) {
                cell.add(marker.clone(), sub_cell);
            }
        }
        list
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    pub fn cell_height(&self) -> f32 {
        self.cell_size.z
    }

    pub fn world_offset(&self) -> IVec2 {
        self.cells.offset()
    }

    pub fn world_size(&self) -> IVec2 {
        self.cells.size()
    }

    pub fn world_to_cell(&self, location: Vec3) -> (IVec2, SubCellType) {
        world_to_cell_coords(self.cell_size.truncate(), location)
    }

    pub fn cell_to_world(&self, coord: IVec2, height: i32, sub_cell: SubCellType) -> Vec3 {
        cell_to_world_coords(self.cell_size, coord, height, sub_cell)
    }

    pub fn is_coord_valid(&self, coord: IVec2) -> bool {
        self.cells.is_coord_valid(coord)
    }

    pub fn cell(&self, coord: IVec2) -> Option<&GridSceneCell> {
        self.cells.get(coord)
    }

    pub fn cell_mut(&mut self, coord: IVec2) -> Option<&mut GridSceneCell> {
        self.cells.get_mut(coord)
    }

    /// Coordinates of the grid window in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = IVec2> {
        self.cells.coords()
    }

    /// Ids handed out to markers created during the pass, starting after the inputs.
    pub fn generate_next_marker_id(&mut self) -> i32 {
        let id = self.next_marker_id;
        self.next_marker_id += 1;
        id
    }

    /// Flatten the grid into a marker list with ids renumbered from zero.
    ///
    /// Cells are visited row by row. Within a cell the slot order is
    /// ground, corner, edge X, edge Y.
    pub fn generate_marker_list(&self) -> Vec<MarkerInfo> {
        const FLATTEN_ORDER: [SubCellType; 4] = [
            SubCellType::Ground,
            SubCellType::Corner,
            SubCellType::EdgeX,
            SubCellType::EdgeY,
        ];

        let mut markers: Vec<MarkerInfo> = self
            .cells
            .values()
            .iter()
            .flat_map(|cell| FLATTEN_ORDER.into_iter().flat_map(move |t| cell.markers(t).iter()))
            .cloned()
            .collect();

        for (index, marker) in markers.iter_mut().enumerate() {
            marker.id = index as i32;
        }
        markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: Vec3 = Vec3::new(400.0, 400.0, 200.0);

    #[test]
    fn test_world_to_cell_classification() {
        let size = CELL.truncate();
        let cases = [
            (Vec3::new(0.0, 0.0, 0.0), IVec2::new(0, 0), SubCellType::Corner),
            (Vec3::new(200.0, 0.0, 0.0), IVec2::new(0, 0), SubCellType::EdgeX),
            (Vec3::new(0.0, 200.0, 0.0), IVec2::new(0, 0), SubCellType::EdgeY),
            (Vec3::new(200.0, 200.0, 0.0), IVec2::new(0, 0), SubCellType::Ground),
            (Vec3::new(-200.0, -200.0, 50.0), IVec2::new(-1, -1), SubCellType::Ground),
            (Vec3::new(1202.0, 800.0, 0.0), IVec2::new(3, 2), SubCellType::Corner),
            (Vec3::new(100.0, 0.0, 0.0), IVec2::new(0, 0), SubCellType::Ground),
        ];
        for (location, coord, sub_cell) in cases {
            assert_eq!(world_to_cell_coords(size, location), (coord, sub_cell), "{location}");
        }
    }

    #[test]
    fn test_coordinate_round_trip() {
        for y in -3..4 {
            for x in -3..4 {
                for height in [-2, 0, 5] {
                    for sub_cell in SubCellType::ALL {
                        let coord = IVec2::new(x, y);
                        let location = cell_to_world_coords(CELL, coord, height, sub_cell);
                        assert_eq!(location.z, height as f32 * CELL.z);
                        assert_eq!(
                            world_to_cell_coords(CELL.truncate(), location),
                            (coord, sub_cell)
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_cell_size_collapses_to_origin() {
        let markers = vec![
            MarkerInfo::at(0, "A", Vec3::new(1000.0, -300.0, 0.0)),
            MarkerInfo::at(1, "B", Vec3::new(-50.0, 20.0, 0.0)),
        ];
        let list = GridSceneMarkerList::new(Vec3::new(0.0, 400.0, 200.0), &markers, 0);
        assert_eq!(list.world_offset(), IVec2::ZERO);
        assert_eq!(list.world_size(), IVec2::ONE);

        let cell = list.cell(IVec2::ZERO).unwrap();
        assert!(cell.contains("A", SubCellType::Corner));
        assert!(cell.contains("B", SubCellType::Corner));
    }

    #[test]
    fn test_bounds_with_expansion() {
        let markers = vec![
            MarkerInfo::at(0, "Ground", Vec3::new(200.0, 200.0, 0.0)),
            MarkerInfo::at(1, "Ground", Vec3::new(1000.0, 600.0, 0.0)),
            MarkerInfo::at(2, "Wall", Vec3::new(-400.0, 200.0, 0.0)),
        ];
        let list = GridSceneMarkerList::new(CELL, &markers, 0);
        assert_eq!(list.world_offset(), IVec2::new(-1, 0));
        assert_eq!(list.world_size(), IVec2::new(4, 2));

        let expanded = GridSceneMarkerList::new(CELL, &markers, 2);
        assert_eq!(expanded.world_offset(), IVec2::new(-3, -2));
        assert_eq!(expanded.world_size(), IVec2::new(8, 6));
        assert!(expanded.cell(IVec2::new(4, 3)).is_some());
        assert!(expanded.cell(IVec2::new(5, 3)).is_none());
    }

    #[test]
    fn test_empty_input_has_single_cell() {
        let list = GridSceneMarkerList::new(CELL, &[], 1);
        assert_eq!(list.world_offset(), IVec2::new(-1, -1));
        assert_eq!(list.world_size(), IVec2::new(3, 3));
        assert!(list.generate_marker_list().is_empty());
    }

    #[test]
    fn test_add_deduplicates_by_name_and_location() {
        let mut cell = GridSceneCell::default();
        let wall = MarkerInfo::at(0, "Wall", Vec3::new(200.0, 0.0, 0.0));
        assert!(cell.add(wall.clone(), SubCellType::EdgeX));
        assert!(!cell.add(MarkerInfo { id: 9, ..wall.clone() }, SubCellType::EdgeX));
        assert_eq!(cell.markers(SubCellType::EdgeX).len(), 1);

        // Same name elsewhere, or another slot, is a different marker.
        assert!(cell.add(MarkerInfo::at(1, "Wall", Vec3::new(200.0, 0.0, 200.0)), SubCellType::EdgeX));
        assert!(cell.add(wall, SubCellType::Ground));
        assert_eq!(cell.markers(SubCellType::EdgeX).len(), 2);
    }

    #[test]
    fn test_remove_drops_all_matches() {
        let mut cell = GridSceneCell::default();
        cell.add(MarkerInfo::at(0, "Wall", Vec3::ZERO), SubCellType::Corner);
        cell.add(MarkerInfo::at(1, "Wall", Vec3::Z), SubCellType::Corner);
        cell.add(MarkerInfo::at(2, "Pillar", Vec3::ZERO), SubCellType::Corner);
        cell.add(MarkerInfo::at(3, "Wall", Vec3::ZERO), SubCellType::Ground);

        cell.remove("Wall", SubCellType::Corner);
        assert!(!cell.contains("Wall", SubCellType::Corner));
        assert!(cell.contains("Pillar", SubCellType::Corner));
        assert!(cell.contains("Wall", SubCellType::Ground));
    }

    #[test]
    fn test_generate_marker_list_order_and_ids() {
        let markers = vec![
            MarkerInfo::at(10, "EdgeY", Vec3::new(0.0, 200.0, 0.0)),
            MarkerInfo::at(11, "EdgeX", Vec3::new(200.0, 0.0, 0.0)),
            MarkerInfo::at(12, "Corner", Vec3::new(0.0, 0.0, 0.0)),
            MarkerInfo::at(13, "Ground", Vec3::new(200.0, 200.0, 0.0)),
            MarkerInfo::at(14, "NextRow", Vec3::new(200.0, 600.0, 0.0)),
            MarkerInfo::at(15, "NextColumn", Vec3::new(600.0, 200.0, 0.0)),
        ];
        let list = GridSceneMarkerList::new(CELL, &markers, 0);
        let output = list.generate_marker_list();

        let names: Vec<_> = output.iter().map(|m| m.marker_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Ground", "Corner", "EdgeX", "EdgeY", "NextColumn", "NextRow"]
        );
        let ids: Vec<_> = output.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_next_marker_id_starts_after_inputs() {
        let markers = vec![
            MarkerInfo::at(0, "A", Vec3::ZERO),
            MarkerInfo::at(1, "B", Vec3::X * 400.0),
        ];
        let mut list = GridSceneMarkerList::new(CELL, &markers, 0);
        assert_eq!(list.generate_next_marker_id(), 2);
        assert_eq!(list.generate_next_marker_id(), 3);
    }
}
