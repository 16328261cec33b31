//! Bevy integration: queue marker generation jobs and collect their results.
//!
//! ```ignore
//! app.add_plugins(MarkerGenPlugin);
//! app.world_mut()
//!     .resource_mut::<MarkerGenQueue>()
//!     .push(MarkerGenJob::new("level 1", model, config, markers));
//! app.update();
//! let results = app.world_mut().resource_mut::<MarkerGenQueue>().take_completed();
//! ```

use crate::factory::{create_processor, DungeonConfig};
use crate::marker::MarkerInfo;
use crate::model::MarkerGenModel;
use crate::rng::{EngineRandomStream, RandomStream, StdRandom};
use bevy::prelude::*;

/// Runs every queued job once per `Update`.
pub struct MarkerGenPlugin;

impl Plugin for MarkerGenPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MarkerGenQueue>();
        app.add_systems(Update, run_marker_gen_jobs);
    }
}

/// Which random stream drives a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomSource {
    Std(u64),
    /// The engine's linear congruential stream, for reproducing engine output.
    Engine(i32),
}

impl Default for RandomSource {
    fn default() -> Self {
        RandomSource::Std(0)
    }
}

impl RandomSource {
    fn create_stream(self) -> Box<dyn RandomStream> {
        match self {
            RandomSource::Std(seed) => Box::new(StdRandom::from_seed(seed)),
            RandomSource::Engine(seed) => Box::new(EngineRandomStream::new(seed)),
        }
    }
}

/// A model to run over one dungeon's markers.
#[derive(Debug, Clone)]
pub struct MarkerGenJob {
    pub label: String,
    pub model: MarkerGenModel,
    pub config: DungeonConfig,
    pub dungeon_transform: Transform,
    pub markers: Vec<MarkerInfo>,
    pub random: RandomSource,
}

impl MarkerGenJob {
    pub fn new(
        label: impl Into<String>,
        model: MarkerGenModel,
        config: DungeonConfig,
        markers: Vec<MarkerInfo>,
    ) -> Self {
        Self {
            label: label.into(),
            model,
            config,
            dungeon_transform: Transform::IDENTITY,
            markers,
            random: RandomSource::default(),
        }
    }

    pub fn with_transform(mut self, dungeon_transform: Transform) -> Self {
        self.dungeon_transform = dungeon_transform;
        self
    }

    pub fn with_random(mut self, random: RandomSource) -> Self {
        self.random = random;
        self
    }

    /// Run the model. Unsupported builders return the input markers.
    pub fn run(&self) -> MarkerGenResult {
        let Some(processor) = create_processor(&self.config, &self.dungeon_transform) else {
            warn!(
                "marker generation job '{}': builder has no marker generation support",
                self.label
            );
            return MarkerGenResult {
                label: self.label.clone(),
                markers: self.markers.clone(),
                supported: false,
            };
        };

        let mut random = self.random.create_stream();
        let markers = self.model.apply(&processor, &self.markers, random.as_mut());
        MarkerGenResult {
            label: self.label.clone(),
            markers,
            supported: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarkerGenResult {
    pub label: String,
    pub markers: Vec<MarkerInfo>,
    /// False when the dungeon builder could not run the model.
    pub supported: bool,
}

#[derive(Resource, Default)]
pub struct MarkerGenQueue {
    pending: Vec<MarkerGenJob>,
    completed: Vec<MarkerGenResult>,
}

impl MarkerGenQueue {
    pub fn push(&mut self, job: MarkerGenJob) {
        self.pending.push(job);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn completed(&self) -> &[MarkerGenResult] {
        &self.completed
    }

    pub fn take_completed(&mut self) -> Vec<MarkerGenResult> {
        std::mem::take(&mut self.completed)
    }
}

fn run_marker_gen_jobs(mut queue: ResMut<MarkerGenQueue>) {
    if queue.pending.is_empty() {
        return;
    }

    let jobs = std::mem::take(&mut queue.pending);
    for job in jobs {
        let result = job.run();
        info!(
            "marker generation job '{}': {} markers in, {} out",
            job.label,
            job.markers.len(),
            result.markers.len()
        );
        queue.completed.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SubCellType;
    use crate::layer::MarkerGenLayer;
    use crate::pattern::GridPattern;
    use markergen_script::{pin, ScriptNodeKind};

    fn torch_model() -> MarkerGenModel {
        let mut pattern = GridPattern::new();
        let rule = pattern.add_new_rule(IVec2::ZERO, SubCellType::Ground);
        let result = rule.script.result_node_id().unwrap();
        let on_pass = rule.script.pass_event_node_id().unwrap();
        let exists = rule.script.create_node(ScriptNodeKind::marker_exists("Ground"));
        let emit = rule.script.create_node(ScriptNodeKind::emit_marker("Torch"));
        rule.script
            .link(exists, pin::DEFAULT_OUTPUT, result, pin::SELECT)
            .unwrap();
        rule.script
            .link(on_pass, pin::DEFAULT_OUTPUT, emit, pin::DEFAULT_INPUT)
            .unwrap();
        MarkerGenModel::new(vec![MarkerGenLayer::grid("torches", pattern)])
    }

    fn ground_markers() -> Vec<MarkerInfo> {
        vec![
            MarkerInfo::at(0, "Ground", Vec3::new(50.0, 50.0, 0.0)),
            MarkerInfo::at(1, "Ground", Vec3::new(150.0, 50.0, 0.0)),
        ]
    }

    #[test]
    fn test_plugin_runs_queued_jobs() {
        let mut app = App::new();
        app.add_plugins(MarkerGenPlugin);

        let job = MarkerGenJob::new(
            "level",
            torch_model(),
            DungeonConfig::Grid {
                grid_cell_size: Vec3::new(100.0, 100.0, 50.0),
            },
            ground_markers(),
        )
        .with_random(RandomSource::Engine(7));
        app.world_mut().resource_mut::<MarkerGenQueue>().push(job);
        app.update();

        let mut queue = app.world_mut().resource_mut::<MarkerGenQueue>();
        assert_eq!(queue.pending_count(), 0);
        let results = queue.take_completed();
        assert_eq!(results.len(), 1);
        assert!(results[0].supported);
        let torches = results[0]
            .markers
            .iter()
            .filter(|m| m.marker_name == "Torch")
            .count();
        assert_eq!(torches, 2);
        assert!(queue.completed().is_empty());
    }

    #[test]
    fn test_unsupported_builder_keeps_markers() {
        let job = MarkerGenJob::new(
            "city",
            torch_model(),
            DungeonConfig::Unsupported,
            ground_markers(),
        );
        let result = job.run();
        assert!(!result.supported);
        assert_eq!(result.markers, ground_markers());
    }
}
