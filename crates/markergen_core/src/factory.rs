//! Selecting a processor from the dungeon builder configuration.

use crate::processor::GridProcessor;
use bevy::math::{Vec2, Vec3};
use bevy::transform::components::Transform;
use serde::{Deserialize, Serialize};

/// The part of a dungeon builder's configuration the marker generator needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DungeonConfig {
    Grid { grid_cell_size: Vec3 },
    GridFlow { grid_size: Vec3 },
    /// City cells are flat; the height axis defaults to one unit.
    SimpleCity { cell_size: Vec2 },
    FloorPlan { grid_size: Vec3 },
    /// A builder without marker generation support.
    Unsupported,
}

/// Build the processor for a dungeon, or `None` if the builder has no support.
///
/// Classic grid dungeons only honour the translation of the dungeon transform.
pub fn create_processor(config: &DungeonConfig, dungeon_transform: &Transform) -> Option<GridProcessor> {
    match config {
        DungeonConfig::Grid { grid_cell_size } => Some(GridProcessor::new(
            Transform::from_translation(dungeon_transform.translation),
            *grid_cell_size,
        )),
        DungeonConfig::GridFlow { grid_size } | DungeonConfig::FloorPlan { grid_size } => {
            Some(GridProcessor::new(*dungeon_transform, *grid_size))
        }
        DungeonConfig::SimpleCity { cell_size } => {
            Some(GridProcessor::new(*dungeon_transform, cell_size.extend(1.0)))
        }
        DungeonConfig::Unsupported => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Quat;

    fn dungeon_transform() -> Transform {
        Transform {
            translation: Vec3::new(10.0, 20.0, 30.0),
            rotation: Quat::from_rotation_z(0.5),
            scale: Vec3::splat(2.0),
        }
    }

    #[test]
    fn test_grid_keeps_translation_only() {
        let config = DungeonConfig::Grid {
            grid_cell_size: Vec3::new(400.0, 400.0, 200.0),
        };
        let processor = create_processor(&config, &dungeon_transform()).unwrap();
        assert_eq!(
            *processor.dungeon_transform(),
            Transform::from_translation(Vec3::new(10.0, 20.0, 30.0))
        );
        assert_eq!(processor.grid_size(), Vec3::new(400.0, 400.0, 200.0));
    }

    #[test]
    fn test_other_builders_keep_full_transform() {
        let transform = dungeon_transform();
        let flow = create_processor(
            &DungeonConfig::GridFlow {
                grid_size: Vec3::new(100.0, 100.0, 50.0),
            },
            &transform,
        )
        .unwrap();
        assert_eq!(*flow.dungeon_transform(), transform);

        let floor = create_processor(
            &DungeonConfig::FloorPlan {
                grid_size: Vec3::new(200.0, 200.0, 300.0),
            },
            &transform,
        )
        .unwrap();
        assert_eq!(floor.grid_size(), Vec3::new(200.0, 200.0, 300.0));

        let city = create_processor(
            &DungeonConfig::SimpleCity {
                cell_size: Vec2::new(800.0, 600.0),
            },
            &transform,
        )
        .unwrap();
        assert_eq!(city.grid_size(), Vec3::new(800.0, 600.0, 1.0));
        assert_eq!(*city.dungeon_transform(), transform);
    }

    #[test]
    fn test_unsupported_builder() {
        assert!(create_processor(&DungeonConfig::Unsupported, &Transform::IDENTITY).is_none());
    }
}
