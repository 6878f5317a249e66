// src/lookup.rs

use crate::config::LookupConfig;
use crate::error::{Error, Result};
use crate::heuristics::canonical_key;
use calamine::{Data, Reader, Xlsx, open_workbook};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Display form of a reference product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEntry {
    pub display_code: String,
    pub name: String,
}

/// Canonical code key → reference product. Read-only once built.
#[derive(Debug, Default)]
pub struct LookupTable {
    entries: HashMap<String, LookupEntry>,
}

impl LookupTable {
    /// Builds the table from `(code, name)` cell texts in sheet order.
    ///
    /// Rows whose code has no digits are skipped. When two rows share a key
    /// the later one wins.
    pub fn from_rows<I, C, N>(rows: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: AsRef<str>,
        N: AsRef<str>,
    {
        let mut entries = HashMap::new();

        for (code, name) in rows {
            let code = code.as_ref().trim();
            let Some(key) = canonical_key(code) else {
                continue;
            };
            let entry = LookupEntry {
                display_code: code.to_string(),
                name: name.as_ref().trim().to_string(),
            };
            if let Some(previous) = entries.insert(key.clone(), entry) {
                warn!(
                    key = %key,
                    replaced = %previous.display_code,
                    "Duplicate lookup key, keeping the later row"
                );
            }
        }

        Self { entries }
    }

    /// Reads the configured sheet of the reference workbook at `path`.
    pub fn load(path: &Path, cfg: &LookupConfig) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ResourceMissing {
                path: path.to_path_buf(),
            });
        }

        let mut workbook: Xlsx<_> = open_workbook(path).map_err(|source| Error::Spreadsheet {
            path: path.to_path_buf(),
            source,
        })?;

        let sheets = workbook.sheet_names();
        if !sheets.iter().any(|s| s == &cfg.sheet) {
            return Err(Error::schema(
                path,
                format!("no sheet named `{}` (found: {})", cfg.sheet, sheets.join(", ")),
            ));
        }

        let range = workbook
            .worksheet_range(&cfg.sheet)
            .map_err(|source| Error::Spreadsheet {
                path: path.to_path_buf(),
                source,
            })?;

        let first_row = cfg.first_row.saturating_sub(1);
        let code_col = cfg.code_column.saturating_sub(1);
        let name_col = cfg.name_column.saturating_sub(1);
        let last_row = range.end().map_or(0, |(row, _)| row + 1);

        let rows = (first_row..last_row).map(|row| {
            (
                cell_text(range.get_value((row, code_col))),
                cell_text(range.get_value((row, name_col))),
            )
        });
        let table = Self::from_rows(rows);
        if table.is_empty() {
            warn!(path = %path.display(), sheet = %cfg.sheet, "Lookup table has no entries, every item will be flagged");
        }

        info!(path = %path.display(), entries = table.len(), "Lookup table loaded");
        Ok(table)
    }

    pub fn get(&self, key: &str) -> Option<&LookupEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(value) => value.to_string(),
    }
}
