//! PDF Binder CLI tool
//!
//! A command-line tool for embedding files into a PDF and reading them back.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lopdf::Document;
use tracing_subscriber::EnvFilter;

use pdf_binder::attachment::{attachment_name, expand_patterns};
use pdf_binder::pdf::{
    extract_embedded_file, extract_metadata, list_embedded_files, AssembleOptions, Assembler,
    CloneStrategy,
};

/// PDF Binder - Attach files to a PDF
#[derive(Parser)]
#[command(name = "pdf-binder")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Attach two files, writing report-bound.pdf next to report.pdf
    pdf-binder attach report.pdf invoice.pdf receipt.pdf

    # Attach every CSV in a folder and choose the output name
    pdf-binder attach report.pdf \"data/*.csv\" -o merged.pdf

    # Show what a document carries and pull one file back out
    pdf-binder list merged.pdf
    pdf-binder extract merged.pdf -n invoice.pdf -d out/")]
struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed files into a copy of a PDF
    Attach(AttachArgs),

    /// List the files embedded in a PDF
    List {
        /// PDF file to inspect
        input: PathBuf,
    },

    /// Write embedded files back to disk
    Extract {
        /// PDF file to read
        input: PathBuf,

        /// Only extract the first file with this name
        #[arg(short, long)]
        name: Option<String>,

        /// Directory to write into
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

#[derive(Args)]
struct AttachArgs {
    /// Source PDF whose pages make up the output
    source: PathBuf,

    /// Files to embed (in order). Supports glob patterns like "*.csv"
    attachments: Vec<String>,

    /// Output PDF file path [default: <source>-bound.pdf]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Copy only the pages; outline, forms and metadata are dropped
    #[arg(long)]
    pages_only: bool,

    /// Leave uncompressed streams uncompressed
    #[arg(long)]
    no_compress: bool,

    /// Do not record attachment modification dates
    #[arg(long)]
    no_dates: bool,

    /// Open the output file after creation
    #[arg(long)]
    open: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Attach(args) => cmd_attach(args),
        Commands::List { input } => cmd_list(&input),
        Commands::Extract { input, name, output_dir } => cmd_extract(&input, name.as_deref(), &output_dir),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// `RUST_LOG` wins over `-v`
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pdf_binder={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `report.pdf` -> `report-bound.pdf` in the same directory
fn default_output(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    source.with_file_name(format!("{stem}-bound.pdf"))
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

fn load(input: &Path) -> Result<Document> {
    Document::load(input).with_context(|| format!("Failed to load PDF: {}", input.display()))
}

/// Embed files into a copy of the source PDF
fn cmd_attach(args: AttachArgs) -> Result<()> {
    let attachments = expand_patterns(&args.attachments)?;
    let output = args.output.unwrap_or_else(|| default_output(&args.source));

    let assembler = Assembler::new(AssembleOptions {
        strategy: if args.pages_only {
            CloneStrategy::PagesOnly
        } else {
            CloneStrategy::Full
        },
        compress: !args.no_compress,
        record_modification_dates: !args.no_dates,
    });

    eprintln!("Attaching {} files to {}...", attachments.len(), args.source.display());

    let report = assembler.assemble(&args.source, &attachments, &output)?;

    eprintln!(
        "Generated {} ({} pages, {} attachments)",
        report.display_name(),
        report.page_count,
        report.embedded.len()
    );

    if args.open {
        open_file(&output)?;
    }

    Ok(())
}

/// List embedded files with their sizes
fn cmd_list(input: &Path) -> Result<()> {
    let doc = load(input)?;
    let files = list_embedded_files(&doc)?;

    if files.is_empty() {
        println!("No embedded files");
    }
    for file in files {
        println!("{}\t{} bytes", file.name, file.data.len());
    }

    Ok(())
}

/// Write one or all embedded files to a directory
fn cmd_extract(input: &Path, name: Option<&str>, output_dir: &Path) -> Result<()> {
    let doc = load(input)?;

    let files = match name {
        Some(name) => vec![extract_embedded_file(&doc, name)?
            .with_context(|| format!("No embedded file named {name} in {}", input.display()))?],
        None => list_embedded_files(&doc)?,
    };

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    for file in files {
        // Never let an embedded name climb out of the output directory
        let file_name = attachment_name(Path::new(&file.name))
            .with_context(|| format!("Embedded file has an unusable name: {:?}", file.name))?;
        let target = output_dir.join(file_name);
        std::fs::write(&target, &file.data)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        eprintln!("Extracted {} ({} bytes)", target.display(), file.data.len());
    }

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: &Path) -> Result<()> {
    let metadata = extract_metadata(input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }
    println!("Outline entries: {}", metadata.outline_entries);
    println!("Attachments: {}", metadata.embedded_files.len());
    for (name, size) in metadata.embedded_files {
        println!("  {}\t{} bytes", name, size);
    }

    Ok(())
}
