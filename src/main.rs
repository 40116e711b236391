use clap::{Parser, Subcommand};
use imgshift::formats::TargetFormat;
use imgshift::imaging::RustBackend;
use imgshift::save::DirectoryTarget;
use imgshift::session::Session;
use imgshift::{config, loader, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imgshift")]
#[command(about = "Convert an image to PNG, JPEG, WebP, GIF or BMP")]
#[command(long_about = "\
Convert an image to PNG, JPEG, WebP, GIF or BMP

Accepted sources: JPEG, PNG, GIF, BMP, WebP, TIFF and SVG, up to 50 MB.
The source type is taken from the file extension.

Conversion rules:
  GIF → GIF           bytes are copied unchanged (animation kept)
  GIF → other         first frame only
  SVG → any           rasterized at its declared size (800x600 if it has none)
  → JPEG, BMP         transparency is flattened onto white
  --quality           applies to JPEG and WebP only (10-100)

The result is written as <name>_converted.<ext> in the output directory.

Run 'imgshift gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one image and save the result
    Convert {
        /// Source image
        file: PathBuf,
        /// Target format (defaults to the configured format)
        #[arg(long, value_enum)]
        to: Option<TargetFormat>,
        /// JPEG/WebP quality, clamped to 10-100
        #[arg(long)]
        quality: Option<u32>,
        /// Where to write the converted file
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Print the report as JSON instead of progress lines
        #[arg(long)]
        json: bool,
    },
    /// Validate an image and show its dimensions without converting
    Check {
        /// Source image
        file: PathBuf,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Convert {
            file,
            to,
            quality,
            output_dir,
            json,
        } => {
            let config = config::load_config(cli.config.as_deref())?;
            let backend = RustBackend::with_svg_fallback(config.svg_fallback());
            let mut session = Session::from_config(&config);

            session.select_path(&file)?;
            if let Some(target) = to {
                session.set_target(target)?;
            }
            if let Some(quality) = quality {
                session.set_quality(quality)?;
            }

            let (tx, rx) = std::sync::mpsc::channel();
            let task = session.begin_convert((!json).then_some(tx))?;
            let task_output = std::thread::scope(|s| {
                let printer = s.spawn(move || {
                    for event in rx {
                        output::print_event(&event);
                    }
                });
                let worker = s.spawn(|| task.run(&backend));
                let task_output = worker.join();
                printer.join().ok();
                task_output
            })
            .map_err(|_| "conversion worker panicked")?;

            let outcome = session.finish(task_output)?;
            let saved = session.download(&DirectoryTarget::new(&output_dir))?;

            if json {
                let report = serde_json::json!({
                    "outcome": outcome,
                    "saved": saved,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_outcome(&outcome, Some(saved.as_path()));
            }
        }
        Command::Check { file } => {
            let config = config::load_config(cli.config.as_deref())?;
            let backend = RustBackend::with_svg_fallback(config.svg_fallback());
            let mut session = Session::from_config(&config);

            session.select_path(&file)?;
            if let Some(asset) = session.asset() {
                let preview = loader::preview(&backend, asset)?;
                output::print_preview(asset, &preview);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
