// ABOUTME: CLI for running NeuroFlow page transforms over saved HTML snapshots.
// ABOUTME: Reads a file or stdin, applies a command, and prints the page or the extracted reader region.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use neuroflow_engine::{
    extract_reader_region, Command, DetectionSource, Dispatcher, Options, Outcome, Page, Settings,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Apply accessibility transforms to HTML pages.
#[derive(Parser, Debug)]
#[command(name = "neuroflow")]
#[command(about = "Apply NeuroFlow reading aids to HTML pages", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Cmd,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output", global = true)]
    output: Option<PathBuf>,

    /// Engine options as JSON (missing fields take defaults)
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Charset of the input, as a label or a content-type value
    #[arg(long = "charset", global = true)]
    charset: Option<String>,

    /// Log engine decisions to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing", global = true)]
    timing: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Emphasize the first half of every word and print the page
    Bionic {
        /// HTML file, or "-" for stdin
        input: String,
    },
    /// Remove reading-aid emphasis from an annotated page
    Plain { input: String },
    /// Print the sanitized main-content region
    Extract {
        input: String,
        /// Print whitespace-normalized text instead of HTML
        #[arg(long, conflicts_with = "json")]
        text: bool,
        /// Print a JSON object with source, removed count, html and text
        #[arg(long)]
        json: bool,
    },
    /// Open the reader view inside the page and print the page
    Focus { input: String },
    /// Restore persisted extension settings on the page
    Apply {
        input: String,
        /// Settings JSON using the extension storage keys
        #[arg(long)]
        settings: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let opts = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Options::from_json(&raw)?
        }
        None => Options::default(),
    };

    let start = Instant::now();
    let rendered = run(&args, opts)?;
    let elapsed = start.elapsed();

    match &args.output {
        Some(path) => fs::write(path, &rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", rendered),
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }
    Ok(())
}

fn run(args: &Args, opts: Options) -> Result<String> {
    let charset = args.charset.as_deref();
    match &args.command {
        Cmd::Bionic { input } => {
            let page = load_page(input, charset)?;
            apply_commands(&page, opts, vec![Command::SetReadingAid(true)])?;
            Ok(page.html())
        }
        Cmd::Plain { input } => {
            let page = load_page(input, charset)?;
            apply_commands(&page, opts, vec![Command::SetReadingAid(false)])?;
            Ok(page.html())
        }
        Cmd::Focus { input } => {
            let page = load_page(input, charset)?;
            apply_commands(&page, opts, vec![Command::SetFocusView(true)])?;
            Ok(page.html())
        }
        Cmd::Apply { input, settings } => {
            let raw = fs::read_to_string(settings)
                .with_context(|| format!("reading settings {}", settings.display()))?;
            let settings = Settings::from_json(&raw)?;
            let page = load_page(input, charset)?;
            apply_commands(&page, opts, settings.commands())?;
            Ok(page.html())
        }
        Cmd::Extract { input, text, json } => {
            let page = load_page(input, charset)?;
            let region = extract_reader_region(page.document(), &opts);
            if *json {
                let source = match region.source {
                    DetectionSource::Article => "article",
                    DetectionSource::Scored(_) => "scored",
                    DetectionSource::BodyFallback => "body",
                };
                let report = json!({
                    "source": source,
                    "removed": region.removed,
                    "html": region.html(),
                    "text": region.text(),
                });
                return Ok(serde_json::to_string_pretty(&report)?);
            }
            Ok(if *text { region.text() } else { region.html() })
        }
    }
}

fn apply_commands(page: &Page, opts: Options, commands: Vec<Command>) -> Result<()> {
    let mut dispatcher = Dispatcher::builder().options(opts).build()?;
    for cmd in commands {
        let action = cmd.action();
        let outcome = dispatcher.dispatch(page, cmd)?;
        info!(action, outcome = outcome.name(), "command applied");
        if let Outcome::Annotated(summary) = outcome {
            if summary.failed_nodes > 0 {
                info!(failed = summary.failed_nodes, "some text nodes were skipped");
            }
        }
    }
    Ok(())
}

fn load_page(target: &str, charset: Option<&str>) -> Result<Page> {
    if target == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        if buf.is_empty() {
            bail!("stdin is empty");
        }
        return Ok(Page::from_bytes(&buf, charset));
    }

    let path = Path::new(target);
    if !path.exists() {
        return Err(anyhow!("file not found: {}", target));
    }
    Ok(Page::load(path, charset)?)
}
