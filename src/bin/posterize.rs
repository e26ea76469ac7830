use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use image_posterize_wasm::{
    DEFAULT_MAX_ITERATIONS, InitPolicy, Kernel, ReduceOptions, convolve_bytes, posterize_bytes,
};
use anyhow::{Context, Result, bail};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Init {
    /// Start from distinct colors of randomly picked pixels
    Pixel,
    /// Start from uniformly random colors
    Uniform,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    Identity,
    Blur,
    Sharpen,
    Edge,
    Emboss,
}

impl From<Preset> for Kernel {
    fn from(p: Preset) -> Self {
        match p {
            Preset::Identity => Kernel::identity(),
            Preset::Blur => Kernel::box_blur(),
            Preset::Sharpen => Kernel::sharpen(),
            Preset::Edge => Kernel::edge_detect(),
            Preset::Emboss => Kernel::emboss(),
        }
    }
}

/// Posterize images with k-means color reduction and 3x3 convolution filters.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of colors for k-means when no custom palette is provided
    #[arg(short = 'k', long, default_value_t = 8)]
    n_colors: usize,

    /// How the initial k-means palette is chosen
    #[arg(long, value_enum, default_value_t = Init::Pixel)]
    init: Init,

    /// Seed for the initial palette (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum k-means iterations, 0 for no limit
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Comma-separated list of hex colors to use as palette (skip k-means)
    #[arg(short = 'c', long)]
    palette: Option<String>,

    /// Convolution preset applied before color reduction
    #[arg(long, value_enum)]
    kernel: Option<Preset>,

    /// Custom convolution kernel: 9 comma-separated weights, row by row
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, conflicts_with = "kernel")]
    weights: Option<Vec<f32>>,

    /// Only convolve, keep all colors
    #[arg(long)]
    no_reduce: bool,

    /// Output directory
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,

    /// Output filename prefix (ignored when --out-dir supplied)
    #[arg(short = 'p', long, default_value = "posterized_")]
    prefix: String,

    /// Print a JSON record per image instead of plain text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let kernel: Option<Kernel> = match (&args.weights, args.kernel) {
        (Some(w), _) => Some(Kernel::from_slice(w)?),
        (None, Some(preset)) => Some(preset.into()),
        (None, None) => None,
    };
    if args.no_reduce && kernel.is_none() {
        bail!("--no-reduce needs --kernel or --weights");
    }

    let palette_vec: Option<Vec<String>> = args.palette.as_ref().map(|s| {
        s.split(',').map(|x| x.trim().trim_start_matches('#').to_uppercase()).collect()
    });

    let init = match args.init {
        Init::Pixel => InitPolicy::PixelSampled,
        Init::Uniform => InitPolicy::UniformRandom,
    };
    let options = ReduceOptions::default()
        .with_init(init)
        .with_max_iterations(args.max_iterations);

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

        let (png, palette) = match (&kernel, args.no_reduce) {
            (Some(kernel), true) => (
                convolve_bytes(&bytes, kernel).context("convolution failed")?,
                Vec::new(),
            ),
            _ => posterize_bytes(
                &bytes,
                args.n_colors,
                &options,
                args.seed,
                palette_vec.as_deref(),
                kernel.as_ref(),
            )
            .context("posterize processing failed")?,
        };

        let out_path = if let Some(dir) = &args.out_dir {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            dir.join(format!("{stem}.png"))
        } else {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            PathBuf::from(format!("{}{}.png", args.prefix, stem))
        };

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, png)?;

        if args.json {
            let record = serde_json::json!({
                "input": input.display().to_string(),
                "output": out_path.display().to_string(),
                "palette": palette,
            });
            println!("{}", serde_json::to_string(&record)?);
        } else {
            println!("Saved → {}", out_path.display());
            if !palette.is_empty() {
                println!("Palette: {}", palette.join(", "));
            }
        }
    }

    Ok(())
}
