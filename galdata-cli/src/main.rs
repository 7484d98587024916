use clap::Parser;
use galdata::binary::{connected_components, erode_inplace, holes_fill, open_inplace};
use galdata::io::load_gray_image;
use galdata::label::{
    clump_significance, grow_labels, indexes_per_label, SignificanceConfig, INIT_LABEL,
};
use galdata::tile::{fill_blank_neighbors, smooth};
use galdata::{
    binary, watershed, AllocOptions, BinaryOp, Data, DataType, Extremum, GalResult, Init, Noise,
    Tessellation, TessellationConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "galdata CLI: detect and segment sources (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct AllocJson {
    minmapsize: usize,
    quietmmap: bool,
}

impl Default for AllocJson {
    fn default() -> Self {
        let opts = AllocOptions::default();
        Self {
            minmapsize: opts.minmapsize,
            quietmmap: opts.quietmmap,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TessellationJson {
    tile_size: Vec<usize>,
    channel_size: Option<Vec<usize>>,
    remainder_frac: f64,
    interp_neighbors: usize,
    smooth_width: usize,
}

impl Default for TessellationJson {
    fn default() -> Self {
        let cfg = TessellationConfig::default();
        Self {
            tile_size: cfg.tile_size,
            channel_size: cfg.channel_size,
            remainder_frac: cfg.remainder_frac,
            interp_neighbors: 9,
            smooth_width: 3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectionJson {
    threshold_sigma: f64,
    erode: usize,
    erode_connectivity: usize,
    open: usize,
    open_connectivity: usize,
    holes_max_size: Option<usize>,
    connectivity: usize,
}

impl Default for DetectionJson {
    fn default() -> Self {
        Self {
            threshold_sigma: 1.0,
            erode: 1,
            erode_connectivity: 1,
            open: 1,
            open_connectivity: 1,
            holes_max_size: None,
            connectivity: 2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SegmentationJson {
    min_area: usize,
    variance: bool,
    keep_small: bool,
    grow: bool,
}

impl Default for SegmentationJson {
    fn default() -> Self {
        let cfg = SignificanceConfig::default();
        Self {
            min_area: cfg.min_area,
            variance: cfg.variance,
            keep_small: cfg.keep_small,
            grow: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    output_path: Option<String>,
    parallel: bool,
    alloc: AllocJson,
    tessellation: TessellationJson,
    detection: DetectionJson,
    segmentation: SegmentationJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            output_path: None,
            parallel: true,
            alloc: AllocJson::default(),
            tessellation: TessellationJson::default(),
            detection: DetectionJson::default(),
            segmentation: SegmentationJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    dsize: Vec<usize>,
    disk_backed: bool,
    channels: usize,
    tiles: usize,
    empty_tiles: usize,
    detections: usize,
    detection_areas: Vec<usize>,
    clumps: usize,
    /// NaN (serialized as null) for clumps kept without a significance.
    clump_significance: Vec<f64>,
    ungrown_pixels: usize,
}

/// Blank-aware mean and standard deviation of one tile.
fn tile_stats(values: impl Iterator<Item = f32>) -> (f64, f64) {
    let (mut n, mut sum, mut sum2) = (0usize, 0.0f64, 0.0f64);
    for v in values.filter(|v| !v.is_nan()) {
        let v = v as f64;
        n += 1;
        sum += v;
        sum2 += v * v;
    }
    if n < 2 {
        return (f64::NAN, f64::NAN);
    }
    let mean = sum / n as f64;
    let var = (sum2 / n as f64 - mean * mean).max(0.0);
    (mean, var.sqrt())
}

impl Config {
    fn alloc_options(&self) -> AllocOptions {
        AllocOptions {
            init: Init::Zeros,
            minmapsize: self.alloc.minmapsize,
            quietmmap: self.alloc.quietmmap,
        }
    }
}

/// Loads an image into a Float32 array that follows the config's storage
/// policy.
fn load_image(config: &Config) -> GalResult<Data> {
    let gray = load_gray_image(&config.image_path)?;
    let mut image = Data::alloc(DataType::Float32, gray.dsize(), &config.alloc_options())?;
    gray.copy_into(&mut image)?;
    Ok(image)
}

/// Detects and segments sources in a Float32 image.
fn run(image: &Data, config: &Config) -> GalResult<Report> {
    let alloc = config.alloc_options();

    // Sky level and noise per tile.
    let tess = Tessellation::from_config(
        image.dsize(),
        &TessellationConfig {
            tile_size: config.tessellation.tile_size.clone(),
            channel_size: config.tessellation.channel_size.clone(),
            remainder_frac: config.tessellation.remainder_frac,
        },
    )?;
    let stats = tess.map_tiles(config.parallel, |id, _tile| -> GalResult<(f64, f64)> {
        let view = tess.view(image, id)?;
        let stats = tile_stats(view.values::<f32>()?);
        Ok(stats)
    });
    let stats = stats.into_iter().collect::<GalResult<Vec<_>>>()?;
    let empty_tiles = stats.iter().filter(|s| s.0.is_nan()).count();
    let n = stats.len();
    let means = Data::from_vec(stats.iter().map(|s| s.0).collect(), &[n])?;
    let stds = Data::from_vec(stats.iter().map(|s| s.1).collect(), &[n])?;
    let interp = config.tessellation.interp_neighbors;
    let width = config.tessellation.smooth_width;
    let means = smooth(&tess, &fill_blank_neighbors(&tess, &means, interp, config.parallel)?, width)?;
    let stds = smooth(&tess, &fill_blank_neighbors(&tess, &stds, interp, config.parallel)?, width)?;

    // Threshold, clean up and label detections.
    let scaled = binary(
        BinaryOp::Multiply,
        tess.values_to_block(&stds)?,
        Data::scalar(config.detection.threshold_sigma),
        true,
    )?;
    let threshold = binary(BinaryOp::Plus, tess.values_to_block(&means)?, scaled, true)?;
    let mut mask = binary(BinaryOp::Gt, image.copy()?, threshold, false)?;
    let det = &config.detection;
    erode_inplace(&mut mask, det.erode, det.erode_connectivity)?;
    open_inplace(&mut mask, det.open, det.open_connectivity)?;
    holes_fill(&mut mask, det.connectivity, det.holes_max_size)?;
    let (detections, num_detections) = connected_components(&mask, det.connectivity)?;
    let per_detection = indexes_per_label(&detections, num_detections)?;

    // Over-segment detections into clumps and measure them.
    let mut indexes: Vec<usize> = per_detection.iter().flatten().copied().collect();
    let mut clumps = Data::alloc(DataType::Int32, image.dsize(), &alloc)?;
    let shed = watershed(image, &mut indexes, &mut clumps, Extremum::Max, false)?;
    let seg = &config.segmentation;
    let significance = clump_significance(
        image,
        &Noise::PerTile {
            tessellation: &tess,
            values: &stds,
        },
        &mut clumps,
        &indexes,
        &SignificanceConfig {
            min_area: seg.min_area,
            variance: seg.variance,
            keep_small: seg.keep_small,
            extremum: Extremum::Max,
        },
    )?;
    tracing::info!(
        clumps = shed.num_clumps,
        kept = significance.len(),
        "clumps measured"
    );

    let mut ungrown = 0;
    if seg.grow {
        let lab = clumps.as_mut_slice::<i32>()?;
        let mut frontier: Vec<usize> = indexes.iter().copied().filter(|&i| lab[i] <= 0).collect();
        for &i in &frontier {
            lab[i] = INIT_LABEL;
        }
        grow_labels(&mut clumps, &mut frontier, false, det.connectivity)?;
        ungrown = frontier.len();
    }

    Ok(Report {
        dsize: image.dsize().to_vec(),
        disk_backed: image.is_mapped(),
        channels: tess.num_channels(),
        tiles: tess.len(),
        empty_tiles,
        detections: num_detections,
        detection_areas: per_detection.iter().map(Vec::len).collect(),
        clumps: significance.len(),
        clump_significance: significance,
        ungrown_pixels: ungrown,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("galdata=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() {
        return Err("image_path must be set in the config".into());
    }

    let image = load_image(&config)?;
    tracing::info!(dsize = ?image.dsize(), mapped = image.is_mapped(), "image loaded");
    let report = run(&image, &config)?;
    let json = serde_json::to_string_pretty(&report)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
