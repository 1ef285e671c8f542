use clap::{Parser, Subcommand};
use comic_shrink::archive::{Compression, SourceArchive};
use comic_shrink::config::{self, AppConfig};
use comic_shrink::output;
use comic_shrink::pipeline::{PipelineError, eligible_entries};
use comic_shrink::processor::{Processor, Stage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Input extensions the tool accepts.
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "cbz"];

/// Flags for the `run` command. Each one overrides the matching config key.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Archive to shrink (.zip or .cbz)
    input: PathBuf,

    /// Directory for the resized archive [default: next to the input]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Cap on the longer edge of every page, in pixels
    #[arg(long)]
    max_long_edge: Option<u32>,

    /// Re-encode quality factor, greater than 0.0 and at most 1.0
    #[arg(long)]
    quality: Option<f32>,

    /// Compress pages again in the output archive
    #[arg(long)]
    deflate: bool,

    /// Maximum number of pages transcoded in parallel
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Print a JSON report instead of progress and summary
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(edge) = self.max_long_edge {
            config.resize.max_long_edge = edge;
        }
        if let Some(quality) = self.quality {
            config.resize.quality = quality;
        }
        if self.deflate {
            config.archive.compression = Compression::Deflated;
        }
        if let Some(jobs) = self.jobs {
            config.processing.max_processes = Some(jobs);
        }
    }
}

#[derive(Parser)]
#[command(name = "comic-shrink")]
#[command(about = "Shrink comic and manga archives")]
#[command(long_about = "\
Shrink comic and manga archives

Reads a .zip or .cbz, scales every page down so its longer edge fits the
cap, re-encodes it, and writes <name>_resized.zip with the same layout.

Format policy:
  .png                    → JPEG at the configured quality, renamed .jpg
  .jpg .jpeg              → JPEG at the configured quality
  .gif .bmp .tif(f) .webp → same format, encoder defaults
  .svg                    → copied unchanged

Entries under __MACOSX/ and .DS_Store files are left out. Anything else that
is not an image is left out too.

Set RUST_LOG=debug for diagnostics on stderr.

Run 'comic-shrink gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (TOML); command-line flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize every page and write <name>_resized.zip
    Run(RunArgs),
    /// List which entries would be processed, without transcoding
    Check {
        /// Archive to inspect
        input: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Run(args) => {
            check_extension(&args.input)?;
            let mut app_config = config::load_config(cli.config.as_deref())?;
            args.apply(&mut app_config);
            app_config.validate()?;
            init_thread_pool(&app_config.processing);

            let source = std::fs::read(&args.input)?;
            let processor = Processor::new();

            let printer = (!args.json).then(|| {
                let rx = processor.subscribe();
                std::thread::spawn(move || {
                    let mut prev = None;
                    for snapshot in rx {
                        for line in output::format_progress(prev.as_ref(), &snapshot) {
                            println!("{}", line);
                        }
                        prev = Some(snapshot);
                    }
                })
            });

            processor
                .submit(source, &file_name_of(&args.input), &app_config)?
                .join();
            let snapshot = processor.wait();
            // Closes the subscriber channel so the printer drains and exits.
            drop(processor);
            if let Some(printer) = printer {
                let _ = printer.join();
            }

            let result = match (snapshot.stage, snapshot.output) {
                (Stage::Done, Some(result)) => result,
                _ => {
                    if args.json {
                        eprintln!(
                            "Error: {}",
                            snapshot.error.as_deref().unwrap_or("run did not complete")
                        );
                    }
                    std::process::exit(1);
                }
            };

            let output_dir = match &args.output_dir {
                Some(dir) => {
                    std::fs::create_dir_all(dir)?;
                    dir.clone()
                }
                None => args
                    .input
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            };
            let output_path = output_dir.join(&result.file_name);
            std::fs::write(&output_path, &result.data)?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&*result)?);
            } else {
                println!();
                for line in output::format_run_summary(&result) {
                    println!("{}", line);
                }
                println!("==> {}", output_path.display());
            }
        }
        Command::Check { input } => {
            check_extension(&input)?;
            println!("==> Checking {}", input.display());
            let source = std::fs::read(&input)?;
            let archive = SourceArchive::load(&source)?;
            for line in output::format_check_output(&archive) {
                println!("{}", line);
            }
            if eligible_entries(&archive).is_empty() {
                return Err(PipelineError::EmptyArchive.into());
            }
            println!("==> Archive is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins; otherwise warnings only.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Reject inputs that do not carry an archive extension.
fn check_extension(input: &Path) -> Result<(), String> {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext {
        Some(ext) if ARCHIVE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(format!(
            "{} is not a .zip or .cbz archive",
            input.display()
        )),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
