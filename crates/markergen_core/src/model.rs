//! A stack of marker generation layers applied in order.

use crate::layer::MarkerGenLayer;
use crate::marker::MarkerInfo;
use crate::processor::MarkerGenProcessor;
use crate::rng::RandomStream;
use bevy::log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerGenModel {
    pub layers: Vec<MarkerGenLayer>,
}

impl MarkerGenModel {
    pub fn new(layers: Vec<MarkerGenLayer>) -> Self {
        Self { layers }
    }

    /// Run every layer in list order, each on the previous layer's output.
    ///
    /// A layer the processor rejects leaves the markers as they were.
    pub fn apply(
        &self,
        processor: &dyn MarkerGenProcessor,
        markers: &[MarkerInfo],
        random: &mut dyn RandomStream,
    ) -> Vec<MarkerInfo> {
        let mut current = markers.to_vec();
        for layer in &self.layers {
            match processor.process(layer, &current, random) {
                Some(output) => {
                    debug!(
                        "layer '{}' rewrote {} markers into {}",
                        layer.name,
                        current.len(),
                        output.len()
                    );
                    current = output;
                }
                None => debug!("layer '{}' left the markers unchanged", layer.name),
            }
        }
        current
    }
}
