//! Export the current view to CSV or Excel.

use std::fmt;
use std::path::Path;

use rust_xlsxwriter::Workbook;
use unigrid_engine::{CellValue, Row};

/// Default file name (without extension) offered for exports.
pub const DEFAULT_FILE_STEM: &str = "tabla_combinada_filtrada";

/// Worksheet name used in Excel exports.
pub const SHEET_NAME: &str = "Datos";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Format implied by the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// `tabla_combinada_filtrada.<ext>`
    pub fn default_file_name(self) -> String {
        format!("{}.{}", DEFAULT_FILE_STEM, self.extension())
    }
}

#[derive(Debug)]
pub enum ExportError {
    /// Nothing to export; no file was created
    NoRows,
    UnsupportedFormat(String),
    Csv(String),
    Xlsx(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::NoRows => write!(f, "There is no data to export."),
            ExportError::UnsupportedFormat(p) => {
                write!(f, "unsupported export format: {} (use .csv or .xlsx)", p)
            }
            ExportError::Csv(msg) => write!(f, "CSV export failed: {}", msg),
            ExportError::Xlsx(msg) => write!(f, "Excel export failed: {}", msg),
        }
    }
}

impl std::error::Error for ExportError {}

/// Write `headers` then one line per row, format picked from the extension.
/// Returns the number of data rows written.
pub fn export<'a>(
    path: &Path,
    headers: &[String],
    rows: impl IntoIterator<Item = &'a Row>,
) -> Result<usize, ExportError> {
    let format = ExportFormat::from_path(path)
        .ok_or_else(|| ExportError::UnsupportedFormat(path.display().to_string()))?;
    export_as(path, format, headers, rows)
}

pub fn export_as<'a>(
    path: &Path,
    format: ExportFormat,
    headers: &[String],
    rows: impl IntoIterator<Item = &'a Row>,
) -> Result<usize, ExportError> {
    let rows: Vec<&Row> = rows.into_iter().collect();
    if rows.is_empty() {
        return Err(ExportError::NoRows);
    }

    match format {
        ExportFormat::Csv => write_csv(path, headers, &rows)?,
        ExportFormat::Xlsx => write_xlsx(path, headers, &rows)?,
    }
    log::info!("exported {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

fn write_csv(path: &Path, headers: &[String], rows: &[&Row]) -> Result<(), ExportError> {
    let err = |e: csv::Error| ExportError::Csv(e.to_string());
    let mut writer = csv::Writer::from_path(path).map_err(err)?;
    writer.write_record(headers).map_err(err)?;
    for row in rows {
        writer
            .write_record(headers.iter().map(|h| row.get(h).as_text().into_owned()))
            .map_err(err)?;
    }
    writer.flush().map_err(|e| ExportError::Csv(e.to_string()))
}

fn write_xlsx(path: &Path, headers: &[String], rows: &[&Row]) -> Result<(), ExportError> {
    let err = |e: rust_xlsxwriter::XlsxError| ExportError::Xlsx(e.to_string());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(SHEET_NAME).map_err(err)?;

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, header).map_err(err)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let row_num = (i + 1) as u32;
        for (col, header) in headers.iter().enumerate() {
            let col = col as u16;
            match row.get(header) {
                CellValue::Number(n) => worksheet.write_number(row_num, col, *n).map_err(err)?,
                other => worksheet.write_string(row_num, col, other.as_text()).map_err(err)?,
            };
        }
    }

    workbook.save(path).map_err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("x.CSV")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("x.xlsx")), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_path(Path::new("x.ods")), None);
        assert_eq!(ExportFormat::Xlsx.default_file_name(), "tabla_combinada_filtrada.xlsx");
    }

    #[test]
    fn no_rows_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let err = export(&path, &["A".to_string()], std::iter::empty()).unwrap_err();
        assert!(matches!(err, ExportError::NoRows));
        assert!(!path.exists());
    }
}
