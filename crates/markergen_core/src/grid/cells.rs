//! Dense per-coordinate storage over a rectangular grid window.

use super::SubCellType;
use bevy::math::IVec2;

/// Row-major values covering `offset .. offset + size`.
///
/// Lookups outside the window return `None`; nothing is created on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCells<T> {
    offset: IVec2,
    size: IVec2,
    values: Vec<T>,
}

impl<T: Default + Clone> GridCells<T> {
    pub fn new(offset: IVec2, size: IVec2) -> Self {
        let count = (size.x.max(0) as usize) * (size.y.max(0) as usize);
        Self {
            offset,
            size,
            values: vec![T::default(); count],
        }
    }
}

impl<T> GridCells<T> {
    pub fn offset(&self) -> IVec2 {
        self.offset
    }

    pub fn size(&self) -> IVec2 {
        self.size
    }

    pub fn is_coord_valid(&self, coord: IVec2) -> bool {
        let local = coord - self.offset;
        local.x >= 0 && local.y >= 0 && local.x < self.size.x && local.y < self.size.y
    }

    pub fn index(&self, coord: IVec2) -> Option<usize> {
        if !self.is_coord_valid(coord) {
            return None;
        }
        let local = coord - self.offset;
        Some((self.size.x * local.y + local.x) as usize)
    }

    pub fn get(&self, coord: IVec2) -> Option<&T> {
        self.index(coord).map(|i| &self.values[i])
    }

    pub fn get_mut(&mut self, coord: IVec2) -> Option<&mut T> {
        let index = self.index(coord)?;
        Some(&mut self.values[index])
    }

    /// Every coordinate of the window, row by row.
    pub fn coords(&self) -> impl Iterator<Item = IVec2> {
        let (offset, size) = (self.offset, self.size);
        (0..size.y.max(0))
            .flat_map(move |y| (0..size.x.max(0)).map(move |x| offset + IVec2::new(x, y)))
    }

    /// Values in row-major order.
    pub fn values(&self) -> &[T] {
        &self.values
    }
}

/// Which sub-cell slots of a coordinate already received an insertion this pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellOccupancy {
    ground: bool,
    edge_x: bool,
    edge_y: bool,
    corner: bool,
}

impl CellOccupancy {
    pub fn is_occupied(&self, sub_cell: SubCellType) -> bool {
        match sub_cell {
            SubCellType::Ground => self.ground,
            SubCellType::EdgeX => self.edge_x,
            SubCellType::EdgeY => self.edge_y,
            SubCellType::Corner => self.corner,
        }
    }

    pub fn set_occupied(&mut self, sub_cell: SubCellType) {
        match sub_cell {
            SubCellType::Ground => self.ground = true,
            SubCellType::EdgeX => self.edge_x = true,
            SubCellType::EdgeY => self.edge_y = true,
            SubCellType::Corner => self.corner = true,
        }
    }
}

/// Occupancy for one processing pass. Only ever set, never cleared.
pub type OccupancyGrid = GridCells<CellOccupancy>;

impl OccupancyGrid {
    pub fn is_occupied(&self, coord: IVec2, sub_cell: SubCellType) -> bool {
        self.get(coord).is_some_and(|cell| cell.is_occupied(sub_cell))
    }

    pub fn mark(&mut self, coord: IVec2, sub_cell: SubCellType) {
        if let Some(cell) = self.get_mut(coord) {
            cell.set_occupied(sub_cell);
        }
    }
}
