use clap::{Parser, Subcommand};
use graymap::config::{self, ToolConfig};
use graymap::imaging::{self, AccessCounter, Instrumentation, Rect, Window};
use graymap::{output, process};
use std::path::{Path, PathBuf};

/// Input and output files for single-image transforms.
#[derive(clap::Args, Clone)]
struct IoArgs {
    /// Source PGM file
    input: PathBuf,
    /// Destination PGM file (overwritten)
    output: PathBuf,
}

/// Where a second image is placed on the first.
#[derive(clap::Args, Clone)]
struct PlaceArgs {
    /// Base image
    dst: PathBuf,
    /// Image placed on top
    src: PathBuf,
    /// Destination PGM file (overwritten)
    output: PathBuf,
    #[arg(long, default_value_t = 0)]
    x: u32,
    #[arg(long, default_value_t = 0)]
    y: u32,
}

/// Pipeline configuration files, later ones overriding earlier ones.
#[derive(clap::Args, Clone)]
struct ConfigArgs {
    /// Config file; repeat to layer overrides. Defaults to ./graymap.toml if present
    #[arg(long = "config", short = 'c')]
    configs: Vec<PathBuf>,
}

#[derive(Parser)]
#[command(name = "graymap")]
#[command(about = "Grayscale PGM toolkit")]
#[command(long_about = "\
Grayscale PGM toolkit

Reads and writes raw 8-bit PGM (P5) files and applies classic pixel
transforms. Single transforms are subcommands; `run` and `batch` apply an
ordered pipeline described in graymap.toml.

Rotation is a quarter turn counter-clockwise. Blur averages a
(2dx+1) x (2dy+1) window clipped at the image border.

Set RUST_LOG=debug for per-operation details.
Run 'graymap gen-config' to generate a documented graymap.toml.")]
#[command(version)]
struct Cli {
    /// Print elapsed time and pixel access counts to stderr when done
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show size, maxval and sample range of an image
    Info { input: PathBuf },
    /// Invert every sample
    Negate(IoArgs),
    /// Map samples to black below LEVEL and to maxval otherwise
    Threshold {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, default_value_t = 128)]
        level: u8,
    },
    /// Multiply every sample by FACTOR, saturating at maxval
    Brighten {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long)]
        factor: f64,
    },
    /// Add DELTA to every sample, saturating into [0, maxval]
    Offset {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, allow_hyphen_values = true)]
        delta: i32,
    },
    /// Rotate a quarter turn counter-clockwise
    Rotate(IoArgs),
    /// Flip left to right
    Mirror(IoArgs),
    /// Keep the WIDTHxHEIGHT region whose top-left corner is (X, Y)
    Crop {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, default_value_t = 0)]
        x: u32,
        #[arg(long, default_value_t = 0)]
        y: u32,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Overwrite part of DST with SRC
    Paste(PlaceArgs),
    /// Mix SRC into DST with weight ALPHA
    Blend {
        #[command(flatten)]
        place: PlaceArgs,
        #[arg(long, default_value_t = 0.5)]
        alpha: f64,
    },
    /// Find the first position where NEEDLE appears in HAYSTACK
    Locate { haystack: PathBuf, needle: PathBuf },
    /// Box blur with half-extents DX and DY
    Blur {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, default_value_t = 1)]
        dx: u32,
        #[arg(long, default_value_t = 1)]
        dy: u32,
    },
    /// Apply the configured pipeline to one file
    Run {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Apply the configured pipeline to every PGM under a directory
    Batch {
        /// Directory searched recursively for *.pgm files
        input_dir: PathBuf,
        /// Results land at the same relative paths here, plus manifest.json
        output_dir: PathBuf,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print a stock graymap.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut instr = Instrumentation::new();
    let counter = if cli.stats {
        instr.pixmem()
    } else {
        AccessCounter::disabled()
    };
    let load = |path: &Path| imaging::load_counted(path, counter.clone());
    instr.reset();

    match cli.command {
        Command::Info { input } => {
            let image = load(&input)?;
            output::print_info(&input.display().to_string(), &image);
        }
        Command::Negate(io) => {
            let mut image = load(&io.input)?;
            imaging::negate(&mut image);
            imaging::save(&image, &io.output)?;
        }
        Command::Threshold { io, level } => {
            let mut image = load(&io.input)?;
            imaging::threshold(&mut image, level);
            imaging::save(&image, &io.output)?;
        }
        Command::Brighten { io, factor } => {
            let mut image = load(&io.input)?;
            imaging::brighten(&mut image, factor);
            imaging::save(&image, &io.output)?;
        }
        Command::Offset { io, delta } => {
            let mut image = load(&io.input)?;
            imaging::offset(&mut image, delta);
            imaging::save(&image, &io.output)?;
        }
        Command::Rotate(io) => {
            let image = load(&io.input)?;
            imaging::save(&imaging::rotate90(&image)?, &io.output)?;
        }
        Command::Mirror(io) => {
            let image = load(&io.input)?;
            imaging::save(&imaging::mirror(&image)?, &io.output)?;
        }
        Command::Crop {
            io,
            x,
            y,
            width,
            height,
        } => {
            let image = load(&io.input)?;
            let cropped = imaging::crop(&image, Rect::new(x, y, width, height))?;
            imaging::save(&cropped, &io.output)?;
        }
        Command::Paste(place) => {
            let mut dst = load(&place.dst)?;
            let src = load(&place.src)?;
            imaging::paste(&mut dst, place.x, place.y, &src)?;
            imaging::save(&dst, &place.output)?;
        }
        Command::Blend { place, alpha } => {
            let mut dst = load(&place.dst)?;
            let src = load(&place.src)?;
            imaging::blend(&mut dst, place.x, place.y, &src, alpha)?;
            imaging::save(&dst, &place.output)?;
        }
        Command::Locate { haystack, needle } => {
            let haystack = load(&haystack)?;
            let needle = load(&needle)?;
            output::print_locate(imaging::locate(&haystack, &needle)?);
        }
        Command::Blur { io, dx, dy } => {
            let mut image = load(&io.input)?;
            imaging::blur_in_place(&mut image, Window::new(dx, dy))?;
            imaging::save(&image, &io.output)?;
        }
        Command::Run { io, config } => {
            let tool_config = resolve_tool_config(&config)?;
            let steps = imaging::plan_pipeline(&tool_config);
            let image = imaging::run_pipeline(load(&io.input)?, &steps)?;
            imaging::save(&image, &io.output)?;
        }
        Command::Batch {
            input_dir,
            output_dir,
            config,
        } => {
            let tool_config = resolve_tool_config(&config)?;
            init_thread_pool(&tool_config.processing);
            let steps = imaging::plan_pipeline(&tool_config);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let mut manifest =
                process::process(&input_dir, &output_dir, &steps, &counter, Some(tx))?;
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            if cli.stats {
                manifest.stats = Some(instr.report());
            }
            process::write_manifest(&manifest, &output_dir)?;
            output::print_process_summary(&manifest);
            if manifest.failures() > 0 {
                report_stats(cli.stats, &instr);
                return Err(format!(
                    "{} of {} images failed, see {}",
                    manifest.failures(),
                    manifest.images.len(),
                    output_dir.join("manifest.json").display()
                )
                .into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    report_stats(cli.stats, &instr);
    Ok(())
}

fn report_stats(enabled: bool, instr: &Instrumentation) {
    if enabled {
        output::print_report(&instr.report());
    }
}

/// Load the pipeline config named on the command line.
///
/// Explicitly named files must exist; without any, `./graymap.toml` is used
/// when present and the stock defaults otherwise.
fn resolve_tool_config(args: &ConfigArgs) -> Result<ToolConfig, Box<dyn std::error::Error>> {
    if args.configs.is_empty() {
        return Ok(config::load_config(Path::new("graymap.toml"))?);
    }
    if let Some(missing) = args.configs.iter().find(|path| !path.exists()) {
        return Err(format!("config file not found: {}", missing.display()).into());
    }
    Ok(config::load_layered(&args.configs)?)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
