use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use partsplit_backend::{MupdfBackend, TesseractOcr, write_splits};
use partsplit_core::config_file::{self, ConfigFile};
use partsplit_core::{
    AnalysisResult, ENSEMBLE_NAMES, InstrumentSet, OcrEngine, OcrMode, PdfBackend, ProgressEvent, Splitter,
    SplitterConfigBuilder,
};

mod output;

use output::ColorMode;

const DEFAULT_ENSEMBLE: &str = "brass-band";
const DEFAULT_OCR_LANG: &str = "eng";

/// Split multi-part sheet-music PDFs into one file per instrument
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log more detail to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct AnalysisArgs {
    /// Ensemble type: brass-band or wind-band
    #[arg(long)]
    ensemble: Option<String>,

    /// When to read labels through OCR: auto, never or always
    #[arg(long)]
    ocr: Option<String>,

    /// Tesseract language code(s), e.g. eng or eng+deu
    #[arg(long)]
    lang: Option<String>,

    /// Config file to use instead of the .partsplit.toml cascade
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect instrument parts and print the page ranges
    Analyze {
        /// Path to the PDF to analyze
        pdf: PathBuf,

        #[command(flatten)]
        args: AnalysisArgs,

        /// Print the splits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect instrument parts and write one PDF per part
    Split {
        /// Path to the PDF to split
        pdf: PathBuf,

        #[command(flatten)]
        args: AnalysisArgs,

        /// Directory for the part files (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run instrument detection on a piece of text
    Detect {
        /// Label text, e.g. "2nd Cornet Written for the Fairfield Band"
        text: String,

        /// Ensemble type: brass-band or wind-band
        #[arg(long)]
        ensemble: Option<String>,
    },

    /// List the known instrument names of an ensemble
    Instruments {
        /// Ensemble type: brass-band or wind-band
        #[arg(long)]
        ensemble: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Analyze { pdf, args, json } => {
            let settings = Settings::resolve(args)?;
            let splits = run_analysis(&pdf, settings, !json, color).await?;
            let mut stdout = std::io::stdout();
            if json {
                serde_json::to_writer_pretty(&mut stdout, &splits)?;
                writeln!(stdout)?;
            } else {
                output::print_summary(&mut stdout, &display_name(&pdf), &splits, color)?;
            }
            Ok(())
        }
        Command::Split { pdf, args, output } => {
            let settings = Settings::resolve(args)?;
            let out_dir = output
                .or_else(|| settings.file.output_directory().map(PathBuf::from))
                .unwrap_or_else(|| {
                    pdf.parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from("."))
                });

            let splits = run_analysis(&pdf, settings, true, color).await?;
            let mut stdout = std::io::stdout();
            output::print_summary(&mut stdout, &display_name(&pdf), &splits, color)?;

            let written = tokio::task::spawn_blocking(move || write_splits(&pdf, &splits, &out_dir))
                .await??;
            output::print_written(&mut stdout, &written, color)?;
            Ok(())
        }
        Command::Detect { text, ensemble } => {
            let file = config_file::load_config();
            let name = ensemble_name(ensemble, &file);
            let splitter = Splitter::for_ensemble(&name, file.to_config()?)?;
            let detected = splitter.detect(&text);
            output::print_detection(&mut std::io::stdout(), detected.as_deref(), color)?;
            Ok(())
        }
        Command::Instruments { ensemble } => {
            let file = config_file::load_config();
            let name = ensemble_name(ensemble, &file);
            let set = InstrumentSet::by_name(&name)
                .ok_or_else(|| {
                    anyhow!(
                        "Unknown ensemble: {name} (expected {})",
                        ENSEMBLE_NAMES.join(" or ")
                    )
                })?;
            let set = set.with_extra_instruments(file.to_config()?.extra_instruments());
            output::print_instruments(&mut std::io::stdout(), &set, color)?;
            Ok(())
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Ensemble name: flag > `PARTSPLIT_ENSEMBLE` > config file > brass-band.
fn ensemble_name(flag: Option<String>, file: &ConfigFile) -> String {
    flag.or_else(|| std::env::var("PARTSPLIT_ENSEMBLE").ok())
        .or_else(|| file.ensemble().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_ENSEMBLE.to_string())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Everything an analysis run needs, resolved as CLI flags > env vars >
/// config file > defaults.
struct Settings {
    splitter: Splitter,
    ocr_lang: String,
    file: ConfigFile,
}

impl Settings {
    fn resolve(args: AnalysisArgs) -> anyhow::Result<Self> {
        let file = match &args.config {
            Some(path) => config_file::load_from_path(path)
                .ok_or_else(|| anyhow!("Could not read config file {}", path.display()))?,
            None => config_file::load_config(),
        };

        let mut builder = file.apply(SplitterConfigBuilder::new());
        if let Some(mode) = args.ocr.or_else(|| std::env::var("PARTSPLIT_OCR").ok()) {
            let mode: OcrMode = mode.parse().map_err(|e: String| anyhow!(e))?;
            builder = builder.ocr_mode(mode);
        }
        let config = builder.build().context("Invalid stop word pattern")?;

        let ensemble = ensemble_name(args.ensemble, &file);
        let splitter = Splitter::for_ensemble(&ensemble, config)?;

        let ocr_lang = args
            .lang
            .or_else(|| std::env::var("TESSERACT_LANG").ok())
            .or_else(|| file.ocr_language().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_OCR_LANG.to_string());

        Ok(Self {
            splitter,
            ocr_lang,
            file,
        })
    }
}

async fn run_analysis(
    pdf: &Path,
    settings: Settings,
    show_progress: bool,
    color: ColorMode,
) -> anyhow::Result<AnalysisResult> {
    let Settings {
        splitter, ocr_lang, ..
    } = settings;

    if !pdf.exists() {
        anyhow::bail!("File not found: {}", pdf.display());
    }

    let backend = MupdfBackend::open(pdf)
        .with_context(|| format!("Failed to open {}", pdf.display()))?;
    let total = backend.page_count()?;

    let ocr = TesseractOcr::new(ocr_lang);
    let wants_ocr = splitter.config().ocr_mode() != OcrMode::Never;
    let ocr_available = wants_ocr && ocr.is_available();
    if wants_ocr && !ocr_available {
        tracing::warn!(lang = ocr.language(), "tesseract not found, OCR fallback disabled");
    }

    let bar = if show_progress {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    } else {
        ProgressBar::hidden()
    };

    let cancel = CancellationToken::new();

    // Set up Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let progress_bar = bar.clone();
    let result = tokio::task::spawn_blocking(move || {
        let ocr_engine: Option<&dyn OcrEngine> = if ocr_available { Some(&ocr) } else { None };
        splitter.analyze_with_cancel(
            &backend,
            ocr_engine,
            |event| match event {
                ProgressEvent::OcrModeEnabled { trigger } => {
                    progress_bar.println(output::ocr_trigger_message(trigger, color));
                }
                ProgressEvent::Page {
                    current,
                    ocr_active,
                    detected,
                    ..
                } => {
                    progress_bar.set_position(current as u64);
                    let source = if ocr_active { "ocr" } else { "text" };
                    progress_bar.set_message(format!(
                        "{} ({})",
                        detected.as_deref().unwrap_or("-"),
                        source
                    ));
                }
                ProgressEvent::SplitClosed { .. } => {}
            },
            &cancel,
        )
    })
    .await?;

    bar.finish_and_clear();
    Ok(result?)
}
