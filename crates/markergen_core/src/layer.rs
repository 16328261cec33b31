//! Marker generation layers and the settings that drive pattern matching.

use crate::grid::EdgeHeightMode;
use crate::pattern::GridPattern;
use serde::{Deserialize, Serialize};

/// Largest margin a grid layer may add around the marker bounds.
pub const MAX_MARKER_DOMAIN_EXPANSION: i32 = 20;

/// One pass of pattern matching over a marker list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerGenLayer {
    pub name: String,
    /// Chance that any single placement candidate is tried at all.
    pub probability: f32,
    /// Also try the pattern turned by 90, 180 and 270 degrees.
    pub rotate_to_fit: bool,
    /// Shuffle placement candidates instead of scanning row by row.
    pub randomize_fitting_order: bool,
    /// Let matches insert on slots another match of this layer already filled.
    pub allow_insertion_overlaps: bool,
    pub pattern: Option<GridPattern>,
    pub domain: LayerDomain,
}

impl Default for MarkerGenLayer {
    fn default() -> Self {
        Self {
            name: "Layer".to_string(),
            probability: 1.0,
            rotate_to_fit: true,
            randomize_fitting_order: true,
            allow_insertion_overlaps: false,
            pattern: None,
            domain: LayerDomain::Grid(GridLayerSettings::default()),
        }
    }
}

impl MarkerGenLayer {
    /// A grid layer with default settings running `pattern`.
    pub fn grid(name: impl Into<String>, pattern: GridPattern) -> Self {
        Self {
            name: name.into(),
            pattern: Some(pattern),
            ..Default::default()
        }
    }

    pub fn grid_settings(&self) -> Option<&GridLayerSettings> {
        match &self.domain {
            LayerDomain::Grid(settings) => Some(settings),
            LayerDomain::Generic => None,
        }
    }

    pub fn grid_settings_mut(&mut self) -> Option<&mut GridLayerSettings> {
        match &mut self.domain {
            LayerDomain::Grid(settings) => Some(settings),
            LayerDomain::Generic => None,
        }
    }
}

/// Which processor family a layer targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayerDomain {
    Grid(GridLayerSettings),
    /// A layer with no grid specific settings. Grid processors reject it.
    Generic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayerSettings {
    /// Markers with these names must sit at one height across a match.
    pub same_height_markers: Vec<String>,
    pub expand_marker_domain: bool,
    pub expand_marker_domain_amount: i32,
    pub edge_height_mode: EdgeHeightMode,
}

impl GridLayerSettings {
    /// Cells added on every side of the marker bounds.
    pub fn bounds_expansion(&self) -> i32 {
        if self.expand_marker_domain {
            self.expand_marker_domain_amount
                .clamp(0, MAX_MARKER_DOMAIN_EXPANSION)
        } else {
            0
        }
    }
}
