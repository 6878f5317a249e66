// src/pipeline.rs

use crate::config::{Config, OutputConfig};
use crate::error::{Error, Result};
use crate::heuristics::ItemParser;
use crate::lookup::LookupTable;
use crate::pdf_text;
use crate::report::{MatchSummary, build_report};
use crate::writer::ReportLayout;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Everything a document run needs. Built once at startup, never mutated.
#[derive(Debug)]
pub struct Pipeline {
    parser: ItemParser,
    lookup: LookupTable,
    layout: ReportLayout,
    output_dir: PathBuf,
    output: OutputConfig,
}

/// Result of one processed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    pub output: PathBuf,
    pub summary: MatchSummary,
}

impl Pipeline {
    pub fn new(
        parser: ItemParser,
        lookup: LookupTable,
        layout: ReportLayout,
        output_dir: PathBuf,
        output: OutputConfig,
    ) -> Self {
        Self {
            parser,
            lookup,
            layout,
            output_dir,
            output,
        }
    }

    /// Loads the lookup table and template layout named in `cfg`.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let parser = ItemParser::new(&cfg.parse)?;
        let lookup = LookupTable::load(&cfg.resolve(&cfg.lookup.path), &cfg.lookup)?;
        let layout = ReportLayout::from_template(&cfg.resolve(&cfg.template.path), &cfg.template)?;
        Ok(Self::new(
            parser,
            lookup,
            layout,
            cfg.resolve(&cfg.output.dir),
            cfg.output.clone(),
        ))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the report for `input` goes.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        match input.file_stem() {
            Some(stem) if self.output.per_input => {
                let mut name = stem.to_os_string();
                name.push(".xlsx");
                self.output_dir.join(name)
            }
            _ => self.output_dir.join(&self.output.filename),
        }
    }

    /// Parses `text`, matches it and writes the report for `input`.
    pub fn process_text(&self, input: &Path, text: &str) -> Result<DocumentOutcome> {
        let items = self.parser.parse(text);
        let report = build_report(&items, &self.lookup);
        let output = self.output_path(input);
        self.layout.write(&report, &output)?;

        Ok(DocumentOutcome {
            output,
            summary: report.summary,
        })
    }

    pub fn process_file(&self, input: &Path) -> Result<DocumentOutcome> {
        let text = pdf_text::extract_text_from_file(input)?;
        self.process_text(input, &text)
    }
}

/// Runs one document on a blocking thread and logs how it went.
///
/// Errors and panics stay inside this call; the caller always gets control back.
pub async fn run_document(pipeline: Arc<Pipeline>, input: PathBuf) -> Result<DocumentOutcome> {
    let name = display_name(&input);
    let span = tracing::info_span!("document", file = %name);

    let task = tokio::task::spawn_blocking({
        let input = input.clone();
        move || span.in_scope(|| pipeline.process_file(&input))
    });
    let result = match task.await {
        Ok(result) => result,
        Err(e) => Err(Error::Extraction(format!("worker stopped: {e}"))),
    };

    match &result {
        Ok(outcome) => info!(
            file = %name,
            output = %display_name(&outcome.output),
            total = outcome.summary.total,
            missing = outcome.summary.missing,
            "OK"
        ),
        Err(e) => error!(file = %name, error = %e, "Document failed"),
    }
    result
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
