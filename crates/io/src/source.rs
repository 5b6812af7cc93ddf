//! Spreadsheet folder source.
//!
//! Reads every Excel file in a folder (plus configured subfolders), first
//! worksheet only, first row as headers. Files that fail to open are
//! reported and skipped; the rest still load.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use unigrid_engine::{CellValue, Row, RowSource, SkippedFile, SourceBatch, SourceLoad};

use crate::dates::decode_number;

/// Extensions read as spreadsheets (compared case-insensitively).
pub const SPREADSHEET_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "xlsm"];

/// Header given to blank header cells (`__EMPTY`, `__EMPTY_1`, ...).
const EMPTY_HEADER: &str = "__EMPTY";

#[derive(Debug)]
pub enum SourceError {
    /// The folder does not exist or is not a directory
    MissingFolder(PathBuf),
    /// The folder holds no files at all
    NoFiles(PathBuf),
    /// The folder holds files, none of them spreadsheets
    NoSpreadsheets(PathBuf),
    Io(String),
    /// One workbook could not be read
    Workbook { path: PathBuf, message: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::MissingFolder(p) => write!(f, "folder not found: {}", p.display()),
            SourceError::NoFiles(p) => write!(f, "no files found in {}", p.display()),
            SourceError::NoSpreadsheets(p) => {
                write!(f, "no Excel files found in {}", p.display())
            }
            SourceError::Io(msg) => write!(f, "I/O error: {}", msg),
            SourceError::Workbook { path, message } => {
                write!(f, "{}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for SourceError {}

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SPREADSHEET_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// File name without its last extension.
pub fn file_title(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A folder of exports, plus subfolders read after it.
#[derive(Debug, Clone)]
pub struct FolderSource {
    root: PathBuf,
    subfolders: Vec<String>,
}

impl FolderSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            subfolders: Vec::new(),
        }
    }

    pub fn with_subfolders(
        mut self,
        subfolders: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.subfolders = subfolders.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Spreadsheets to read: the root folder's by name, then each subfolder's by name.
    pub fn list_spreadsheets(&self) -> Result<Vec<PathBuf>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::MissingFolder(self.root.clone()));
        }

        let mut any_file = false;
        let mut spreadsheets = Vec::new();

        let mut folders = vec![self.root.clone()];
        for sub in &self.subfolders {
            let path = self.root.join(sub);
            if path.is_dir() {
                folders.push(path);
            } else {
                log::debug!("subfolder {} not present", path.display());
            }
        }

        for folder in folders {
            let mut files: Vec<PathBuf> = fs::read_dir(&folder)
                .map_err(|e| SourceError::Io(format!("{}: {}", folder.display(), e)))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .collect();
            files.sort();

            any_file |= !files.is_empty();
            for file in files {
                let lock_file = file
                    .file_name()
                    .map(|n| n.to_string_lossy().starts_with("~$"))
                    .unwrap_or(false);
                if lock_file {
                    log::debug!("ignoring lock file {}", file.display());
                } else if is_spreadsheet(&file) {
                    spreadsheets.push(file);
                }
            }
        }

        if !any_file {
            return Err(SourceError::NoFiles(self.root.clone()));
        }
        if spreadsheets.is_empty() {
            return Err(SourceError::NoSpreadsheets(self.root.clone()));
        }
        Ok(spreadsheets)
    }

    /// Read every listed spreadsheet. Unreadable ones end up in `skipped`.
    pub fn read_all(&self) -> Result<SourceLoad, SourceError> {
        let files = self.list_spreadsheets()?;
        log::info!("reading {} spreadsheet(s) from {}", files.len(), self.root.display());

        let mut load = SourceLoad::default();
        for path in files {
            match read_first_sheet(&path) {
                Ok(rows) => {
                    log::debug!("{}: {} rows", path.display(), rows.len());
                    load.batches.push(SourceBatch::new(file_title(&path), rows));
                }
                Err(e) => {
                    log::warn!("skipping {}", e);
                    load.skipped.push(SkippedFile {
                        name: path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        reason: match e {
                            SourceError::Workbook { message, .. } => message,
                            other => other.to_string(),
                        },
                    });
                }
            }
        }
        Ok(load)
    }
}

impl RowSource for FolderSource {
    fn read(&self) -> Result<SourceLoad, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_all()?)
    }
}

// =============================================================================
// Worksheet -> rows
// =============================================================================

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::text(""),
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(n) => decode_number(*n),
        Data::Int(n) => decode_number(*n as f64),
        Data::Bool(b) => CellValue::text(if *b { "true" } else { "false" }),
        Data::Error(e) => CellValue::text(e.to_string()),
        Data::DateTime(dt) => decode_number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::text(s.as_str()),
        Data::DurationIso(s) => CellValue::text(s.as_str()),
    }
}

/// Header names from the first row. Blank cells become `__EMPTY`, repeats get
/// a `_n` suffix, so every header is unique.
pub fn header_names(cells: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    cells
        .iter()
        .map(|cell| {
            let raw = cell_value(cell).as_text().trim().to_string();
            let base = if raw.is_empty() { EMPTY_HEADER.to_string() } else { raw };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base.clone()
            } else {
                format!("{}_{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

/// Rows of the first worksheet. Fully blank rows are dropped; every kept row
/// has a value (possibly `""`) for every header.
pub fn read_first_sheet(path: &Path) -> Result<Vec<Row>, SourceError> {
    let workbook_err = |message: String| SourceError::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_err(e.to_string()))?;
    let Some(first) = workbook.sheet_names().first().cloned() else {
        return Err(workbook_err("workbook contains no sheets".into()));
    };
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| workbook_err(format!("sheet '{}': {}", first, e)))?;

    let mut rows_iter = range.rows();
    let Some(header_cells) = rows_iter.next() else {
        return Ok(Vec::new());
    };
    let headers = header_names(header_cells);

    let mut rows = Vec::new();
    for cells in rows_iter {
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let value = cells.get(i).map(cell_value).unwrap_or_else(|| CellValue::text(""));
                (h.clone(), value)
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreadsheet_extensions() {
        assert!(is_spreadsheet(Path::new("a/Ventas.XLSX")));
        assert!(is_spreadsheet(Path::new("b.xls")));
        assert!(is_spreadsheet(Path::new("c.xlsm")));
        assert!(!is_spreadsheet(Path::new("d.csv")));
        assert!(!is_spreadsheet(Path::new("xlsx")));
    }

    #[test]
    fn title_drops_last_extension() {
        assert_eq!(file_title(Path::new("/x/clientes.2025.xlsx")), "clientes.2025");
    }

    #[test]
    fn headers_are_unique() {
        let cells = vec![
            Data::String("Email".into()),
            Data::Empty,
            Data::String("Email".into()),
            Data::Empty,
            Data::Float(2024.0),
        ];
        assert_eq!(
            header_names(&cells),
            vec!["Email", "__EMPTY", "Email_1", "__EMPTY_1", "2024"]
        );
    }

    #[test]
    fn cell_conversion() {
        assert_eq!(cell_value(&Data::Empty), CellValue::text(""));
        assert_eq!(cell_value(&Data::Bool(true)), CellValue::text("true"));
        assert_eq!(cell_value(&Data::Float(45694.0)), CellValue::text("6-Feb-2025"));
        assert_eq!(cell_value(&Data::Int(7)), CellValue::Number(7.0));
    }

    #[test]
    fn missing_folder() {
        let err = FolderSource::new("/definitely/not/here").list_spreadsheets().unwrap_err();
        assert!(matches!(err, SourceError::MissingFolder(_)));
    }
}
