//! Marker generation for grid dungeons.
//!
//! A dungeon builder hands over a flat list of named markers. Marker
//! generation layers then rewrite that list by matching small grid patterns
//! against it:
//!
//! - [`grid`]: bucketing markers into cells and inferring per-cell heights
//! - [`pattern`] and [`assembly`]: authored patterns and their rotated forms
//! - [`processor`]: matching one layer over a marker list
//! - [`model`]: a stack of layers run in order
//! - [`model_io`]: model and marker file formats
//! - [`plugin`]: running models from a Bevy app
//!
//! Rule conditions and actions are scripts from `markergen_script`, run here
//! through [`GridRuleExecutor`].

pub mod assembly;
pub mod executor;
pub mod factory;
pub mod grid;
pub mod layer;
pub mod marker;
pub mod model;
pub mod model_io;
pub mod pattern;
pub mod plugin;
pub mod processor;
pub mod rng;


pub use assembly::{AssemblyRule, PatternAssembly};
pub use executor::{GridRuleExecutor, RuleExecutorState};
pub use factory::{create_processor, DungeonConfig};
pub use grid::{
    cell_to_world_coords, generate_height_data, world_to_cell_coords, CellHeights,
    EdgeHeightMode, GridCells, GridSceneCell, GridSceneMarkerList, HeightGrid, OccupancyGrid,
    SubCellType,
};
pub use layer::{GridLayerSettings, LayerDomain, MarkerGenLayer, MAX_MARKER_DOMAIN_EXPANSION};
pub use marker::{inverse_transform, transform_markers, MarkerInfo};
pub use model::MarkerGenModel;
pub use model_io::{
    load_markers, load_model, model_file_info, save_markers, save_model, ModelFileInfo,
    ModelFormat, ModelIoError, ModelIoResult,
};
pub use pattern::{GridPattern, PatternRule};
pub use plugin::{MarkerGenJob, MarkerGenPlugin, MarkerGenQueue, MarkerGenResult, RandomSource};
pub use processor::{
    generate_candidates, GridProcessor, MarkerGenProcessor, PatternMatchCandidate,
    PatternOutcome, ProcessOutput, ProcessStats,
};
pub use rng::{shuffle_with_rng, EngineRandomStream, RandomStream, StdRandom};
