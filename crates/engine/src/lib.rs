//! Merged table engine.
//!
//! Spreadsheet exports come in as per-file row batches and leave as one
//! filtered, sorted, paged table:
//!
//! merge -> correlate -> columns -> query -> paginate
//!
//! [`session::Session`] runs the whole pipeline and owns the view state.

pub mod collate;
pub mod columns;
pub mod correlate;
pub mod error;
pub mod input;
pub mod load;
pub mod merge;
pub mod paginate;
pub mod provider;
pub mod query;
pub mod row;
pub mod sanitize;
pub mod session;
pub mod value;
pub mod view;

pub use error::{LoadError, ProviderError};
pub use load::{LoadReport, RowSource, SkippedFile, SourceLoad};
pub use merge::SourceBatch;
pub use provider::{ContactProvider, ContactRecord, NoContacts, PendingContacts};
pub use query::{ColumnFilters, RowView, SortDirection, SortSpec};
pub use row::Row;
pub use session::{Page, PageReport, Session};
pub use value::CellValue;
pub use view::ViewState;
