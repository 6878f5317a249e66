mod config;
mod error;
mod heuristics;
mod lookup;
mod pdf_text;
mod pipeline;
mod report;
mod watch;
mod writer;

use clap::{Parser, Subcommand};
use config::Config;
use heuristics::ItemParser;
use pipeline::Pipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    version,
    about = "Match order PDFs dropped into a folder against a product lookup sheet"
)]
struct Cli {
    /// Settings file; built-in defaults are used when it does not exist.
    #[arg(short, long, value_name = "PATH", default_value = "order_match.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the input folder and write a report for every new PDF (default).
    Watch,
    /// Write reports for the given PDFs and exit.
    Process {
        #[arg(required = true, value_name = "PDF")]
        pdfs: Vec<PathBuf>,
    },
    /// Print the items parsed from a PDF as JSON, without matching.
    Parse {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load_or_default(&cli.config)?;

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => {
            let input_dir = cfg.resolve(&cfg.watch.input_dir);
            std::fs::create_dir_all(&input_dir)?;
            let pipeline = Arc::new(Pipeline::from_config(&cfg)?);
            std::fs::create_dir_all(pipeline.output_dir())?;

            watch::run(pipeline, &input_dir, &cfg.watch).await?;
        }
        Command::Process { pdfs } => {
            let pipeline = Arc::new(Pipeline::from_config(&cfg)?);
            std::fs::create_dir_all(pipeline.output_dir())?;

            let mut failed = 0;
            for pdf in pdfs {
                if pipeline::run_document(Arc::clone(&pipeline), pdf).await.is_err() {
                    failed += 1;
                }
            }
            if failed > 0 {
                warn!(failed, "Some documents could not be processed");
                return Err(format!("{failed} document(s) failed").into());
            }
        }
        Command::Parse { pdf } => {
            let parser = ItemParser::new(&cfg.parse)?;
            let text = pdf_text::extract_text_from_file(&pdf)?;
            let items = parser.parse(&text);
            info!(file = %pdf.display(), items = items.len(), "Parsed");
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }

    Ok(())
}
