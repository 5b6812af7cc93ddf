//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success                                  |
//! | 1       | Universal | General error (unspecified)              |
//! | 2       | Universal | CLI usage error (bad args, unknown column)|
//! | 3-9     | load      | Source folder and merge failures         |
//! | 10-19   | export    | Export failures                          |
//! | 20-29   | contacts  | `ugrid contacts` key and directory codes |
//!
//! During a load, contact lookup failures never change the exit code: the
//! load carries on with the rows' own phone numbers and reports the failure.

use unigrid_engine::LoadError;
use unigrid_io::export::ExportError;
use unigrid_io::source::SourceError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown column, unsupported extension.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Load (3-9)
// =============================================================================

/// Source folder does not exist.
pub const EXIT_LOAD_MISSING_FOLDER: u8 = 3;

/// Folder is empty or holds no Excel files.
pub const EXIT_LOAD_NO_SPREADSHEETS: u8 = 4;

/// Every spreadsheet was empty or unreadable.
pub const EXIT_LOAD_NO_DATA: u8 = 5;

/// Folder could not be listed.
pub const EXIT_LOAD_IO: u8 = 6;

// =============================================================================
// Export (10-19)
// =============================================================================

/// The filtered view has no rows; nothing was written.
pub const EXIT_EXPORT_NO_ROWS: u8 = 10;

/// Writing the output file failed.
pub const EXIT_EXPORT_WRITE: u8 = 11;

// =============================================================================
// Contacts (20-29)
// =============================================================================

/// Directory URL or API key missing.
pub const EXIT_CONTACTS_NOT_CONFIGURED: u8 = 20;

/// Keychain error (cannot read/write the key).
pub const EXIT_CONTACTS_KEYCHAIN: u8 = 21;

/// Directory unreachable, rejected the key, or sent something unreadable.
pub const EXIT_CONTACTS_FETCH: u8 = 22;

/// Map a load error to its exit code.
pub fn load_exit_code(err: &LoadError) -> u8 {
    match err {
        LoadError::NoData => EXIT_LOAD_NO_DATA,
        LoadError::Source(source) => match source.downcast_ref::<SourceError>() {
            Some(SourceError::MissingFolder(_)) => EXIT_LOAD_MISSING_FOLDER,
            Some(SourceError::NoFiles(_)) | Some(SourceError::NoSpreadsheets(_)) => {
                EXIT_LOAD_NO_SPREADSHEETS
            }
            Some(SourceError::Io(_)) | Some(SourceError::Workbook { .. }) => EXIT_LOAD_IO,
            None => EXIT_ERROR,
        },
    }
}

/// Map an export error to its exit code.
pub fn export_exit_code(err: &ExportError) -> u8 {
    match err {
        ExportError::NoRows => EXIT_EXPORT_NO_ROWS,
        ExportError::UnsupportedFormat(_) => EXIT_USAGE,
        ExportError::Csv(_) | ExportError::Xlsx(_) => EXIT_EXPORT_WRITE,
    }
}
