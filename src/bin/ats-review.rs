//! CLI binary for ats-review.
//!
//! `serve` runs the web form; `analyze` performs one action from the
//! terminal and prints the model's reply to stdout.

use anyhow::{Context, Result};
use ats_review::config::{AnalyzerConfig, DEFAULT_MODEL};
use ats_review::convert::read_document;
use ats_review::web::{self, AppState};
use ats_review::{AnalysisAction, AnalysisRequest, AtsError, AtsService, Outcome};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the web form on http://127.0.0.1:8501
  ats-review serve

  # Percentage match from the terminal
  ats-review analyze --action match --resume cv.pdf \
      --job-description "Senior backend engineer, 5 years Go experience"

  # HR-style review with the job description read from a file, JSON output
  ats-review analyze --action review --resume cv.pdf --job-description-file jd.txt --json

  # Another vision model through edgequake-llm
  ats-review --provider openai --model gpt-4.1-mini analyze --action match --resume cv.pdf -j jd

ENVIRONMENT VARIABLES:
  GOOGLE_API_KEY     Gemini API key (GEMINI_API_KEY is also accepted)
  ATS_MODEL          Model ID (default: gemini-1.5-flash)
  ATS_PROVIDER       edgequake-llm provider instead of the built-in Gemini client
  PDFIUM_LIB_PATH    Directory containing libpdfium
  RUST_LOG           Log filter, overrides --verbose / --quiet

  A .env file in the working directory is loaded if present.
"#;

/// Review a résumé PDF against a job description with a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "ats-review",
    version,
    about = "Review a résumé PDF against a job description with a vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    model: ModelArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "ATS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "ATS_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the résumé form over HTTP.
    Serve(ServeArgs),
    /// Run one action and print the reply.
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Model ID.
    #[arg(long, global = true, env = "ATS_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// edgequake-llm provider (openai, anthropic, ollama, …). Default: built-in Gemini.
    #[arg(long, global = true, env = "ATS_PROVIDER")]
    provider: Option<String>,

    /// Gemini API key.
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model call timeout in seconds.
    #[arg(long, global = true, env = "ATS_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Longest side of the rendered first page, in pixels.
    #[arg(long, global = true, env = "ATS_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// JPEG quality (1–100).
    #[arg(long, global = true, env = "ATS_JPEG_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// LLM temperature (0.0–2.0). Provider default when unset.
    #[arg(long, global = true, env = "ATS_TEMPERATURE")]
    temperature: Option<f32>,

    /// PDF user password for encrypted résumés.
    #[arg(long, global = true, env = "ATS_PDF_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Directory containing the pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "ATS_BIND", default_value = "127.0.0.1:8501")]
    bind: SocketAddr,

    /// Largest accepted upload, in MiB.
    #[arg(long, env = "ATS_MAX_UPLOAD_MB", default_value_t = 10)]
    max_upload_mb: usize,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Which analysis to run.
    #[arg(short, long, value_enum)]
    action: ActionArg,

    /// Résumé PDF. Only the first page is analysed.
    #[arg(short, long)]
    resume: PathBuf,

    /// Job description text.
    #[arg(short, long, conflicts_with = "job_description_file")]
    job_description: Option<String>,

    /// Read the job description from this file.
    #[arg(long)]
    job_description_file: Option<PathBuf>,

    /// Output the AnalysisResult as JSON instead of plain text.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "ATS_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    /// Review the Resume
    Review,
    /// Percentage Match
    Match,
}

impl From<ActionArg> for AnalysisAction {
    fn from(v: ActionArg) -> Self {
        match v {
            ActionArg::Review => AnalysisAction::Review,
            ActionArg::Match => AnalysisAction::PercentageMatch,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        match cli.command {
            Command::Serve(_) => "info",
            // The spinner is the feedback for one-shot runs.
            Command::Analyze(_) => "warn",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(ref args) => serve(&cli.model, args).await,
        Command::Analyze(ref args) => analyze(&cli.model, args, cli.quiet).await,
    }
}

async fn serve(model: &ModelArgs, args: &ServeArgs) -> Result<()> {
    let config = build_config(model, Some(args.max_upload_mb.saturating_mul(1024 * 1024)))?;
    let state = AppState::from_config(&config).context("Failed to initialise the analyzer")?;
    web::serve(state, args.bind)
        .await
        .with_context(|| format!("Server on {} stopped", args.bind))
}

async fn analyze(model: &ModelArgs, args: &AnalyzeArgs, quiet: bool) -> Result<()> {
    let job_description = match (&args.job_description, &args.job_description_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job description from {:?}", path))?,
        (None, None) => String::new(),
    };

    let config = build_config(model, None)?;
    let service = AtsService::from_config(&config).context("Failed to initialise the analyzer")?;
    let document = read_document(&args.resume)
        .await
        .context("Failed to read résumé")?;

    if !quiet {
        eprintln!("{} {}", green("✓"), dim(ats_review::prompts::UPLOAD_CONFIRMATION));
    }

    let action = AnalysisAction::from(args.action);
    let spinner = (!quiet && !args.no_progress && !args.json).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix(action.label());
        bar.set_message(format!("asking {}…", service.dispatcher().model()));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let outcome = service
        .handle(AnalysisRequest::new(job_description, Some(document), action))
        .await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let outcome = outcome.map_err(|e| {
        if !quiet {
            eprintln!("{} {}", red("✘"), e.code());
            if matches!(e, AtsError::PasswordRequired) {
                eprintln!("   {}", dim("Pass the PDF password with --password <PASSWORD>."));
            }
        }
        e
    })?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    match outcome {
        Outcome::UploadRequired { notice } => println!("{notice}"),
        Outcome::Completed(result) => {
            if !quiet {
                eprintln!("{}", bold(result.action.heading()));
            }
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(result.text.as_bytes())
                .context("Failed to write to stdout")?;
            if !result.text.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
            if !quiet {
                let tokens = match (result.input_tokens, result.output_tokens) {
                    (Some(i), Some(o)) => format!("{i} tokens in  /  {o} tokens out  ·  "),
                    _ => String::new(),
                };
                eprintln!(
                    "   {}",
                    dim(&format!(
                        "{}{} ({})  ·  {}ms",
                        tokens, result.model, result.provider, result.duration_ms
                    ))
                );
            }
        }
    }
    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
fn build_config(args: &ModelArgs, max_upload_bytes: Option<usize>) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .model(args.model.clone())
        .api_timeout_secs(args.api_timeout)
        .max_rendered_pixels(args.max_pixels)
        .jpeg_quality(args.jpeg_quality);

    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
        .filter(|k| !k.trim().is_empty());
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(t) = args.temperature {
        builder = builder.temperature(t);
    }
    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref dir) = args.pdfium_lib_path {
        builder = builder.pdfium_lib_path(dir.clone());
    }
    if let Some(limit) = max_upload_bytes {
        builder = builder.max_upload_bytes(limit);
    }

    builder.build().context("Invalid configuration")
}
