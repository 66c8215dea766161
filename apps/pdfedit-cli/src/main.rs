//! pdfedit - rearrange, rotate and combine PDF pages from the command line
//!
//! Pages are numbered from 1 on the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pdfedit_core::{EditSession, FsStorage, LopdfEngine, SessionConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pdfedit")]
#[command(version, about = "Rearrange, rotate and combine PDF pages")]
struct Args {
    /// Document to open
    input: PathBuf,

    /// Where to save the edited document (defaults to overwriting the input)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// JSON session config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Print page count, sizes and rotations
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a span of pages so it starts before page `to`
    Move {
        #[arg(short, long)]
        pages: String,
        /// Insertion point; one past the last page appends
        #[arg(short, long)]
        to: usize,
    },
    /// Copy a span of pages so the copy starts before page `to`
    Copy {
        #[arg(short, long)]
        pages: String,
        #[arg(short, long)]
        to: usize,
    },
    /// Delete a span of pages
    Delete {
        #[arg(short, long)]
        pages: String,
    },
    /// Rotate a span of pages a quarter turn clockwise
    Rotate {
        #[arg(short, long)]
        pages: String,
        /// Rotate counter-clockwise instead
        #[arg(long)]
        left: bool,
    },
    /// Insert every page of another document before page `at`
    Insert {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        at: usize,
    },
    /// Append every page of another document
    Append {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Write a single page to `--output`
    Extract {
        #[arg(short, long)]
        page: usize,
    },
    /// Write selected pages, e.g. "1,3-5", to `--output`
    Export {
        #[arg(short, long)]
        pages: String,
    },
}

/// Parse a 1-indexed span like "3" or "3-5" into 0-indexed `(first, last)`
fn parse_span(text: &str) -> Result<(usize, usize)> {
    let text = text.trim();
    let (first, last) = match text.split_once('-') {
        Some((start, end)) => (start.trim(), end.trim()),
        None => (text, text),
    };
    let first: usize = first
        .parse()
        .with_context(|| format!("Invalid page: {:?}", first))?;
    let last: usize = last
        .parse()
        .with_context(|| format!("Invalid page: {:?}", last))?;
    if first == 0 || last == 0 {
        bail!("Pages are numbered from 1");
    }
    if first > last {
        bail!("Invalid range: {} > {}", first, last);
    }
    Ok((first - 1, last - 1))
}

/// Convert a 1-indexed page or insertion point to 0-indexed
fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .context("Pages are numbered from 1")
}

fn load_config(args: &Args) -> Result<SessionConfig> {
    match &args.config {
        Some(path) => SessionConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(SessionConfig::default()),
    }
}

fn print_info(session: &EditSession<LopdfEngine>, json: bool) -> Result<()> {
    let mut pages = Vec::with_capacity(session.page_count());
    for index in 0..session.page_count() {
        let size = session.page_size(index)?;
        let rotation = session.rotation(index)?;
        pages.push((size, rotation));
    }

    if json {
        let pages: Vec<_> = pages
            .iter()
            .enumerate()
            .map(|(i, (size, rotation))| {
                serde_json::json!({
                    "page": i + 1,
                    "width": size.width,
                    "height": size.height,
                    "rotation": rotation.degrees(),
                })
            })
            .collect();
        let report = serde_json::json!({
            "page_count": session.page_count(),
            "pages": pages,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pages: {}", session.page_count());
        for (i, (size, rotation)) in pages.iter().enumerate() {
            println!(
                "  {:>4}: {:.0} x {:.0} pt, rotated {}",
                i + 1,
                size.width,
                size.height,
                rotation.degrees()
            );
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let mut session = EditSession::with_storage(LopdfEngine::new(), FsStorage, config);
    session
        .open_file(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    match &args.command {
        Command::Info { json } => return print_info(&session, *json),
        Command::Extract { page } => {
            let output = args.output.as_ref().context("extract requires --output")?;
            let bytes = session.extract_page(to_index(*page)?)?;
            std::fs::write(output, bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Extracted page {} to {}", page, output.display());
            return Ok(());
        }
        Command::Export { pages } => {
            let output = args.output.as_ref().context("export requires --output")?;
            session.export(output, Some(pages.as_str()))?;
            return Ok(());
        }
        Command::Move { pages, to } => {
            let (first, last) = parse_span(pages)?;
            session.move_pages(to_index(*to)?, first, last)?;
        }
        Command::Copy { pages, to } => {
            let (first, last) = parse_span(pages)?;
            session.copy_pages(to_index(*to)?, first, last)?;
        }
        Command::Delete { pages } => {
            let (first, last) = parse_span(pages)?;
            session.delete_pages(first, last)?;
        }
        Command::Rotate { pages, left } => {
            let (first, last) = parse_span(pages)?;
            session.rotate_pages(first, last, *left)?;
        }
        Command::Insert { file, at } => {
            session
                .insert_file(file, to_index(*at)?)
                .with_context(|| format!("Failed to insert {}", file.display()))?;
        }
        Command::Append { file } => {
            session
                .append_file(file)
                .with_context(|| format!("Failed to append {}", file.display()))?;
        }
    }

    match &args.output {
        Some(output) => session.save_to(output)?,
        None => session.save()?,
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so `info --json` output stays clean
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(args)
}
