use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use clamp_harness::{clamped_clearance, create_site, SimulatedTileset, SiteParams};
use ground_clamp::{ClampConfig, GroundClamper, ModelTransform};
use nalgebra::Matrix4;

/// Command line arguments for the clamp demo
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Ground clamping demonstration on a simulated globe",
    long_about = "Drops a synthetic model onto the WGS84 ellipsoid.\n\n\
        The model is authored at an arbitrary height above (or below) the ellipsoid, \
        optionally with random mounds and pits across its footprint. The demo registers \
        a clamp on a simulated tileset, fires the tileset's load event the requested \
        number of times, and reports the translation applied and where the model's \
        lowest sampled point ended up. Useful for:\n  \
        - Checking clearance bias and sampling density settings\n  \
        - Verifying that repeated load events only clamp once\n  \
        - Trying saved clamp configurations before deploying them"
)]
struct Args {
    #[arg(long, default_value_t = 13.4, help = "Model longitude in degrees")]
    longitude: f64,

    #[arg(long, default_value_t = 52.5, help = "Model latitude in degrees")]
    latitude: f64,

    #[arg(
        long,
        default_value_t = 35.0,
        allow_hyphen_values = true,
        help = "Authored model height in metres",
        long_help = "Height above the ellipsoid at which the model surface was authored. \
            Negative values bury the model below the ellipsoid, which the clamp lifts \
            back up."
    )]
    offset: f64,

    #[arg(
        short,
        long,
        default_value_t = 20.0,
        help = "Bounding sphere radius in metres",
        long_help = "Radius of the model footprint and its bounding sphere. The sampler \
            takes about radius / step samples along each horizontal axis, so large \
            radii cast many rays."
    )]
    radius: f64,

    #[arg(
        long,
        default_value_t = 0,
        help = "Number of random mounds on the model surface",
        long_help = "Number of Gaussian mounds and pits scattered over the footprint. \
            Zero gives a flat model. Their heights are bounded by --relief."
    )]
    mounds: usize,

    #[arg(long, default_value_t = 3.0, help = "Maximum mound height in metres")]
    relief: f64,

    #[arg(long, default_value_t = 42, help = "Random seed for the model surface")]
    seed: u64,

    #[arg(
        short,
        long,
        help = "Clamp configuration JSON file",
        long_help = "Path to a JSON clamp configuration (sample_step, ray_origin_height, \
            clearance_bias). Missing fields take their defaults. When not given, the \
            built-in defaults are used and may be overridden by --step and --bias."
    )]
    config: Option<PathBuf>,

    #[arg(long, help = "Sample spacing in metres along each axis")]
    step: Option<usize>,

    #[arg(long, help = "Clearance bias in metres")]
    bias: Option<f64>,

    #[arg(
        long,
        default_value_t = 3,
        help = "Number of all-tiles-loaded events to fire",
        long_help = "How many times the simulated tileset reports that streaming has \
            finished. Hosts fire this repeatedly as the camera moves; only the first \
            firing clamps."
    )]
    fires: usize,

    #[arg(
        long,
        help = "Write the effective clamp configuration to this JSON file and exit"
    )]
    save_config: Option<PathBuf>,
}

fn load_config(args: &Args) -> anyhow::Result<ClampConfig> {
    let mut config = match &args.config {
        Some(path) => ClampConfig::load_from_file(path)
            .with_context(|| format!("loading clamp config from {}", path.display()))?,
        None => ClampConfig::default(),
    };
    if let Some(step) = args.step {
        config.sample_step = step;
    }
    if let Some(bias) = args.bias {
        config.clearance_bias = bias;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let clamper = GroundClamper::new(config.clone())?;

    if let Some(path) = &args.save_config {
        config
            .save_to_file(path)
            .with_context(|| format!("saving clamp config to {}", path.display()))?;
        println!("Saved clamp configuration to {}", path.display());
        return Ok(());
    }

    let params = SiteParams {
        longitude_deg: args.longitude,
        latitude_deg: args.latitude,
        base_height_m: args.offset,
        footprint_radius_m: args.radius,
        mound_count: args.mounds,
        max_relief_m: args.relief,
        seed: args.seed,
    };

    println!("Ground Clamp Demo");
    println!("=================");
    println!(
        "Site: lon {:.5}°, lat {:.5}°, authored at {:.2} m",
        args.longitude, args.latitude, args.offset
    );
    println!("Footprint radius: {:.1} m, mounds: {}", args.radius, args.mounds);
    println!(
        "Sample step: {} m, ray origin height: {:.1} m, clearance bias: {:.2} m",
        config.sample_step, config.ray_origin_height, config.clearance_bias
    );

    let (mut scene, sphere) = create_site(&params);
    let mut tileset = SimulatedTileset::new();

    let clamped_matrix: Rc<RefCell<Option<Matrix4<f64>>>> = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&clamped_matrix);
    clamper.clamp_to_ground(
        &mut scene,
        &mut tileset,
        sphere,
        Some(Box::new(move |model: &mut dyn ModelTransform| {
            *slot.borrow_mut() = Some(model.model_matrix());
        })),
    );

    for _ in 0..args.fires {
        tileset.fire_all_tiles_loaded(&scene);
    }

    println!();
    println!("Load events fired: {}", tileset.load_cycles());
    println!("Rays cast: {}", scene.pick_count());
    println!("Model matrix writes: {}", tileset.matrix_writes());

    let Some(matrix) = *clamped_matrix.borrow() else {
        println!("Clamp never ran (no load events fired)");
        return Ok(());
    };

    if tileset.matrix_writes() == 0 {
        println!("No surface found under the footprint; model left in place");
        return Ok(());
    }

    let translation = matrix.fixed_view::<3, 1>(0, 3).into_owned();
    println!(
        "Translation: [{:.3}, {:.3}, {:.3}] ({:.3} m)",
        translation.x,
        translation.y,
        translation.z,
        translation.norm()
    );

    match clamped_clearance(&clamper, &scene, &sphere, &matrix) {
        Some(clearance) => println!("Lowest sampled point after clamp: {clearance:.3} m"),
        None => println!("Lowest sampled point after clamp: unavailable"),
    }

    Ok(())
}
