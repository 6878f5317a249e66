use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub watch: WatchConfig,
    pub output: OutputConfig,
    pub lookup: LookupConfig,
    pub template: TemplateConfig,
    pub parse: ParseConfig,
    /// Directory relative paths are resolved against. Set by `load`.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub input_dir: PathBuf,
    pub poll_interval_ms: u64,
    /// Consecutive unchanged polls before a new file counts as fully written.
    pub settle_polls: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("Input"),
            poll_interval_ms: 500,
            settle_polls: 2,
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub filename: String,
    /// Name each report after its input document instead of `filename`.
    pub per_input: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("Output"),
            filename: "Sajatkeszlet.xlsx".to_string(),
            per_input: false,
        }
    }
}

/// Reference workbook. Column and row numbers are 1-based, as shown in Excel.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub path: PathBuf,
    pub sheet: String,
    pub code_column: u32,
    pub name_column: u32,
    pub first_row: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("lookup.xlsx"),
            sheet: "Sheet1".to_string(),
            code_column: 2,
            name_column: 4,
            first_row: 3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub path: PathBuf,
    pub sheet: String,
    pub table: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("template.xlsx"),
            sheet: "Sheet1".to_string(),
            table: "Table1".to_string(),
        }
    }
}

/// Literals tied to the order layout's language.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Word that follows a quantity, e.g. "10 darab".
    pub unit: String,
    /// Lines scanned past an item line when its own line has no quantity.
    pub lookahead: usize,
    pub position_marker: String,
    pub order_marker: String,
    pub buyer_number_marker: String,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            unit: "darab".to_string(),
            lookahead: 20,
            position_marker: "poz.".to_string(),
            order_marker: "megrendelés".to_string(),
            buyer_number_marker: "vevőszám".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut cfg: Config = toml::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like `load`, but falls back to the built-in defaults when `path` does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match Config::load(path) {
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No config file, using defaults");
                let cfg = Config {
                    base_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                    ..Config::default()
                };
                cfg.validate()?;
                Ok(cfg)
            }
            other => other,
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| -> Result<()> { Err(Error::InvalidConfig(msg.to_string())) };

        if self.lookup.code_column == 0 || self.lookup.name_column == 0 {
            return invalid("lookup columns are 1-based and must be at least 1");
        }
        if self.lookup.first_row == 0 {
            return invalid("lookup.first_row is 1-based and must be at least 1");
        }
        if self.watch.poll_interval_ms == 0 {
            return invalid("watch.poll_interval_ms must be positive");
        }
        if self.parse.unit.trim().is_empty() {
            return invalid("parse.unit must not be empty");
        }
        if self.output.filename.trim().is_empty() {
            return invalid("output.filename must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [parse]
            unit = "pcs"

            [lookup]
            sheet = "Codes"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.parse.unit, "pcs");
        assert_eq!(cfg.parse.lookahead, 20);
        assert_eq!(cfg.lookup.sheet, "Codes");
        assert_eq!(cfg.lookup.code_column, 2);
        assert_eq!(cfg.template.table, "Table1");
        assert_eq!(cfg.output.filename, "Sajatkeszlet.xlsx");
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order_match.toml");
        fs::write(&path, "[watch]\ninput_dir = \"drop\"\n").unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.resolve(&cfg.watch.input_dir), dir.path().join("drop"));
        assert_eq!(
            cfg.resolve(Path::new("/abs/lookup.xlsx")),
            PathBuf::from("/abs/lookup.xlsx")
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.base_dir, dir.path());
        assert_eq!(cfg.parse.unit, "darab");
    }

    #[test]
    fn zero_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order_match.toml");
        fs::write(&path, "[lookup]\ncode_column = 0\n").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::InvalidConfig(_))));
    }
}
