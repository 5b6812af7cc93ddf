//! File I/O: reading spreadsheet exports into row batches and writing the
//! filtered view back out.

pub mod dates;
pub mod export;
pub mod source;

pub use export::{export, ExportError, ExportFormat};
pub use source::{FolderSource, SourceError};
