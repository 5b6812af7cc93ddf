//! Contact directory client.
//!
//! Supplies the external `{email, whatsapp}` pairs used to back-fill missing
//! phone numbers. Shared between the CLI and any other front-end.

pub mod client;

pub use client::{parse_record, unify_records, ContactsClient, ContactsError};
