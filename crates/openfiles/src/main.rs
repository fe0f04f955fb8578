use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use openfiles::app::export::MarkdownExporter;
use openfiles::app::preview::{PreviewOptions, PreviewOutcome, PreviewService};
use openfiles::app::tracker::OpenFilesTracker;
use openfiles::domain::errors::PreviewError;
use openfiles::domain::model::PanelEntry;
use openfiles::infra::config::Config;
use openfiles::infra::dispatch::UiQueue;
use openfiles::infra::local_host::LocalHost;
use openfiles::ui::app::PanelApp;

#[derive(Parser)]
#[command(author, version, about = "List open files and preview them as Markdown", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the given files as the panel would list them
    List {
        files: Vec<PathBuf>,
        /// Emit panel entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a Markdown preview of the given files
    Preview {
        files: Vec<PathBuf>,
        /// Print the report instead of writing a temporary file
        #[arg(long)]
        stdout: bool,
    },
    /// Open the interactive panel over the given files
    Panel { files: Vec<PathBuf> },
}

fn main() -> Result<()> {
    openfiles::init();
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::List { files, json } => list(files, json, &config),
        Commands::Preview { files, stdout } => preview(files, stdout, &config),
        Commands::Panel { files } => {
            let host = Arc::new(LocalHost::with_files(files));
            PanelApp::new(host, config)?.run()
        }
    }
}

fn list(files: Vec<PathBuf>, json: bool, config: &Config) -> Result<()> {
    let host = Arc::new(LocalHost::with_files(files));
    let tracker = OpenFilesTracker::new(host);
    let snapshot = tracker.refresh()?;
    let languages = config.language_tags();
    let entries: Vec<PanelEntry> = snapshot
        .iter()
        .map(|file| PanelEntry::for_file(file, &languages))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        println!("{}\t{}\t{}", entry.label, entry.tooltip, entry.icon_hint);
    }
    Ok(())
}

fn preview(files: Vec<PathBuf>, stdout: bool, config: &Config) -> Result<()> {
    let host = Arc::new(LocalHost::with_files(files));
    let queue = UiQueue::new();
    let exporter = MarkdownExporter::from_config(config)?;
    let service = PreviewService::new(
        host.clone(),
        queue.clone(),
        exporter,
        PreviewOptions::from_config(config),
    );
    let snapshot = OpenFilesTracker::new(host).refresh()?;

    if snapshot.is_empty() {
        println!("No open files to preview");
        return Ok(());
    }

    if stdout {
        let report = service.render(&snapshot)?;
        print!("{report}");
        return Ok(());
    }

    match service.create_preview(&snapshot) {
        Ok(PreviewOutcome::NothingOpen) => println!("No open files to preview"),
        Ok(PreviewOutcome::Created { file, report }) => {
            queue.drain();
            println!("{}", file.path().display());
            if report.failures() > 0 {
                eprintln!("{} of {} files could not be read", report.failures(), report.sections());
            }
        }
        Err(PreviewError::Write { report, source }) => {
            print!("{report}");
            return Err(source).context("failed to write preview file; report printed to stdout");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
