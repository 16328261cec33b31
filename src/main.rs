use anyhow::{bail, Context, Result};
use bevy::prelude::*;
use clap::Parser;
use markergen_core::{
    load_markers, load_model, save_markers, DungeonConfig, MarkerGenJob, MarkerGenPlugin,
    MarkerGenQueue, RandomSource,
};
use markergen_script::generate_rule_text;
use std::path::PathBuf;

const LOG_FILTER: &str = "markergen_core=debug";

#[derive(Parser)]
#[command(author, version, about = "Run a marker generation model over a marker list", long_about = None)]
struct Args {
    /// Model file (`.json` or binary `.mkg`)
    model: PathBuf,

    /// Marker list (JSON), required unless describing
    #[arg(required_unless_present = "describe")]
    markers: Option<PathBuf>,

    /// Seed for the random stream: non-negative for StdRng, 32 bit signed with --engine-rng
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    seed: i64,

    /// Output marker list, defaults to stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Use the engine's random stream instead of StdRng
    #[arg(long, default_value_t = false)]
    engine_rng: bool,

    /// Grid cell size as X,Y,Z
    #[arg(long, value_delimiter = ',', default_value = "400,400,200")]
    cell_size: Vec<f32>,

    /// Print the selection rule of every pattern rule and exit
    #[arg(long, default_value_t = false)]
    describe: bool,
}

fn random_source(args: &Args) -> Result<RandomSource> {
    if args.engine_rng {
        let seed = i32::try_from(args.seed)
            .with_context(|| format!("--seed {} does not fit the engine stream", args.seed))?;
        Ok(RandomSource::Engine(seed))
    } else {
        let seed = u64::try_from(args.seed)
            .with_context(|| format!("--seed {} must not be negative", args.seed))?;
        Ok(RandomSource::Std(seed))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let model = load_model(&args.model)
        .with_context(|| format!("loading model {}", args.model.display()))?;

    if args.describe {
        for layer in &model.layers {
            println!("layer '{}'", layer.name);
            let Some(pattern) = &layer.pattern else {
                continue;
            };
            for rule in &pattern.rules {
                let text = rule
                    .script
                    .result_node()
                    .map(|node| generate_rule_text(&rule.script, node))
                    .unwrap_or_default();
                println!("  {} {:?}: {}", rule.coord, rule.rule_type, text);
            }
        }
        return Ok(());
    }

    let Some(markers_path) = &args.markers else {
        bail!("a marker list is required to run the model");
    };
    let markers = load_markers(markers_path)
        .with_context(|| format!("loading markers {}", markers_path.display()))?;

    let [x, y, z] = args.cell_size[..] else {
        bail!("--cell-size expects three values, got {}", args.cell_size.len());
    };
    let random = random_source(&args)?;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(bevy::log::LogPlugin {
            level: bevy::log::Level::INFO,
            filter: LOG_FILTER.to_string(),
            ..default()
        })
        .add_plugins(MarkerGenPlugin);

    let job = MarkerGenJob::new(
        markers_path.display().to_string(),
        model,
        DungeonConfig::Grid {
            grid_cell_size: Vec3::new(x, y, z),
        },
        markers,
    )
    .with_random(random);
    app.world_mut().resource_mut::<MarkerGenQueue>().push(job);
    app.update();

    let results = app.world_mut().resource_mut::<MarkerGenQueue>().take_completed();
    let Some(result) = results.into_iter().next() else {
        bail!("marker generation produced no result");
    };

    match &args.out {
        Some(path) => save_markers(&result.markers, path)
            .with_context(|| format!("writing markers {}", path.display()))?,
        None => println!("{}", serde_json::to_string_pretty(&result.markers)?),
    }
    Ok(())
}
