// src/writer.rs

use crate::config::TemplateConfig;
use crate::error::{Error, Result};
use crate::report::{Report, ReportRow};
use calamine::{Reader, Xlsx, open_workbook};
use rust_xlsxwriter::{Color, Format, Table, TableColumn, TableStyle, Workbook, Worksheet, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CODE_COL: u16 = 0;
const NAME_COL: u16 = 1;
const QTY_COL: u16 = 2;

/// Light yellow fill for rows whose code is not in the lookup table.
const WARN_FILL: u32 = 0xFFF2CC;

/// Fixed table style of every report. The template's own style and column
/// widths are not read back.
const TABLE_STYLE: TableStyle = TableStyle::Medium7;

/// Sheet, table and column headers taken from the report template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    pub sheet: String,
    pub table: String,
    /// Code, name and quantity come first; extra columns are left empty.
    pub headers: Vec<String>,
}

impl ReportLayout {
    /// Reads the named table of the template workbook.
    pub fn from_template(path: &Path, cfg: &TemplateConfig) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ResourceMissing {
                path: path.to_path_buf(),
            });
        }

        let spreadsheet = |source: calamine::XlsxError| Error::Spreadsheet {
            path: path.to_path_buf(),
            source,
        };

        let mut workbook: Xlsx<_> = open_workbook(path).map_err(spreadsheet)?;

        let sheets = workbook.sheet_names();
        if !sheets.iter().any(|s| s == &cfg.sheet) {
            return Err(Error::schema(
                path,
                format!("no sheet named `{}` (found: {})", cfg.sheet, sheets.join(", ")),
            ));
        }

        workbook.load_tables().map_err(spreadsheet)?;
        let in_sheet = workbook.table_names_in_sheet(&cfg.sheet);
        if !in_sheet.iter().any(|t| *t == &cfg.table) {
            return Err(Error::schema(
                path,
                format!("no table named `{}` on sheet `{}`", cfg.table, cfg.sheet),
            ));
        }

        let table = workbook.table_by_name(&cfg.table).map_err(spreadsheet)?;
        let headers = table.columns().to_vec();
        if headers.len() <= usize::from(QTY_COL) {
            return Err(Error::schema(
                path,
                format!(
                    "table `{}` needs code, name and quantity columns, found {}",
                    cfg.table,
                    headers.len()
                ),
            ));
        }

        debug!(table = %cfg.table, headers = ?headers, "Template layout");
        Ok(Self {
            sheet: cfg.sheet.clone(),
            table: cfg.table.clone(),
            headers,
        })
    }

    /// Writes `report` to `path`, replacing any previous file.
    ///
    /// The workbook is saved next to `path` first and renamed into place, so a
    /// reader never sees a half-written report.
    pub fn write(&self, report: &Report, path: &Path) -> Result<()> {
        let write_err = |e: XlsxError| Error::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet).map_err(write_err)?;
        self.fill_sheet(worksheet, &report.rows).map_err(write_err)?;

        let partial = partial_path(path);
        let saved = workbook.save(&partial).map_err(write_err).and_then(|()| {
            fs::rename(&partial, path).map_err(|e| Error::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        });
        if let Err(e) = saved {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }

        info!(path = %path.display(), rows = report.rows.len(), "Report written");
        Ok(())
    }

    fn fill_sheet(&self, worksheet: &mut Worksheet, rows: &[ReportRow]) -> Result<(), XlsxError> {
        let last_col = self.headers.len().saturating_sub(1) as u16;
        let header = Format::new().set_bold();
        let warn = Format::new().set_background_color(Color::RGB(WARN_FILL));

        for (col, title) in self.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, title, &header)?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            if row.matched {
                worksheet.write_string(r, CODE_COL, &row.code)?;
                if let Some(name) = &row.name {
                    worksheet.write_string(r, NAME_COL, name)?;
                }
                if let Some(qty) = row.quantity {
                    worksheet.write_number(r, QTY_COL, qty)?;
                }
            } else {
                for col in 0..=last_col {
                    worksheet.write_blank(r, col, &warn)?;
                }
                worksheet.write_string_with_format(r, CODE_COL, &row.code, &warn)?;
                if let Some(qty) = row.quantity {
                    worksheet.write_number_with_format(r, QTY_COL, qty, &warn)?;
                }
            }
        }

        // a table needs at least one data row
        let last_row = rows.len().max(1) as u32;
        let columns: Vec<TableColumn> = self
            .headers
            .iter()
            .map(|h| TableColumn::new().set_header(h))
            .collect();
        let table = Table::new()
            .set_name(&self.table)
            .set_style(TABLE_STYLE)
            .set_columns(&columns);
        worksheet.add_table(0, 0, last_row, last_col, &table)?;
        worksheet.autofit();

        Ok(())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MatchSummary;
    use calamine::Data;

    fn write_template(path: &Path, sheet: &str, table: &str, headers: &[&str]) {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet).unwrap();
        let columns: Vec<TableColumn> = headers
            .iter()
            .map(|h| TableColumn::new().set_header(*h))
            .collect();
        let table = Table::new().set_name(table).set_columns(&columns);
        worksheet
            .add_table(0, 0, 1, headers.len() as u16 - 1, &table)
            .unwrap();
        workbook.save(path).unwrap();
    }

    fn template(dir: &Path) -> PathBuf {
        let path = dir.join("template.xlsx");
        write_template(&path, "Sheet1", "Table1", &["Cikkszám", "Megnevezés", "Mennyiség"]);
        path
    }

    fn sample_report() -> Report {
        Report {
            rows: vec![
                ReportRow {
                    code: "14936 000 1000".to_string(),
                    name: Some("Csavar".to_string()),
                    quantity: Some(10),
                    matched: true,
                },
                ReportRow {
                    code: "223344556677".to_string(),
                    name: None,
                    quantity: None,
                    matched: false,
                },
            ],
            summary: MatchSummary {
                missing: 1,
                total: 2,
            },
        }
    }

    #[test]
    fn layout_comes_from_template_table() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ReportLayout::from_template(&template(dir.path()), &TemplateConfig::default())
            .unwrap();

        assert_eq!(layout.sheet, "Sheet1");
        assert_eq!(layout.table, "Table1");
        assert_eq!(layout.headers, vec!["Cikkszám", "Megnevezés", "Mennyiség"]);
    }

    #[test]
    fn missing_template_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            ReportLayout::from_template(&dir.path().join("template.xlsx"), &TemplateConfig::default());
        assert!(matches!(result, Err(Error::ResourceMissing { .. })));
    }

    #[test]
    fn missing_table_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.xlsx");
        write_template(&path, "Sheet1", "Orders", &["A", "B", "C"]);

        let result = ReportLayout::from_template(&path, &TemplateConfig::default());
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn narrow_table_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.xlsx");
        write_template(&path, "Sheet1", "Table1", &["Code", "Name"]);

        let result = ReportLayout::from_template(&path, &TemplateConfig::default());
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn report_rows_land_under_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ReportLayout::from_template(&template(dir.path()), &TemplateConfig::default())
            .unwrap();
        let out = dir.path().join("Sajatkeszlet.xlsx");

        layout.write(&sample_report(), &out).unwrap();
        assert!(!partial_path(&out).exists());

        let mut workbook: Xlsx<_> = open_workbook(&out).unwrap();
        let range = workbook.worksheet_range("Sheet1").unwrap();
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String("Cikkszám".to_string()))
        );
        assert_eq!(
            range.get_value((1, 0)),
            Some(&Data::String("14936 000 1000".to_string()))
        );
        assert_eq!(
            range.get_value((1, 1)),
            Some(&Data::String("Csavar".to_string()))
        );
        assert_eq!(range.get_value((1, 2)), Some(&Data::Float(10.0)));
        assert_eq!(
            range.get_value((2, 0)),
            Some(&Data::String("223344556677".to_string()))
        );

        workbook.load_tables().unwrap();
        let table = workbook.table_by_name("Table1").unwrap();
        assert_eq!(table.columns(), ["Cikkszám", "Megnevezés", "Mennyiség"]);
    }

    #[test]
    fn failed_rename_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ReportLayout::from_template(&template(dir.path()), &TemplateConfig::default())
            .unwrap();
        // a directory in the way makes the final rename fail
        let out = dir.path().join("Sajatkeszlet.xlsx");
        fs::create_dir(&out).unwrap();

        let result = layout.write(&sample_report(), &out);

        assert!(matches!(result, Err(Error::Write { .. })));
        assert!(!partial_path(&out).exists());
    }

    #[test]
    fn rewrite_replaces_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ReportLayout::from_template(&template(dir.path()), &TemplateConfig::default())
            .unwrap();
        let out = dir.path().join("Sajatkeszlet.xlsx");

        layout.write(&sample_report(), &out).unwrap();
        let empty = Report {
            rows: Vec::new(),
            summary: MatchSummary {
                missing: 0,
                total: 0,
            },
        };
        layout.write(&empty, &out).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&out).unwrap();
        let range = workbook.worksheet_range("Sheet1").unwrap();
        assert_eq!(
            range.get_value((0, 2)),
            Some(&Data::String("Mennyiség".to_string()))
        );
        assert!(matches!(range.get_value((1, 0)), None | Some(Data::Empty)));
    }
}
