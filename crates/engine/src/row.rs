//! Rows of the merged dataset and the per-row schema detection that resolves
//! the contact columns (email, whatsapp) once instead of on every access.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Provenance column stamped on every merged row.
pub const SOURCE_COLUMN: &str = "Source";

/// Canonical name used when back-fill has to create the phone column.
pub const WHATSAPP_COLUMN: &str = "Whatsapp";

static ABSENT: CellValue = CellValue::Absent;

/// A row: column name -> value, in the order the columns were first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: IndexMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for a column; a missing column reads as absent.
    pub fn get(&self, column: &str) -> &CellValue {
        self.fields.get(column).unwrap_or(&ABSENT)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Provenance (file title) once the row has been merged.
    pub fn source(&self) -> Option<&str> {
        match self.fields.get(SOURCE_COLUMN) {
            Some(CellValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn schema(&self) -> RowSchema {
        RowSchema::detect(self.columns())
    }

    /// Give the row an (absent) entry for every listed column it lacks.
    pub fn fill_absent(&mut self, columns: &[String]) {
        for column in columns {
            if !self.fields.contains_key(column) {
                self.fields.insert(column.clone(), CellValue::Absent);
            }
        }
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = (&String, &mut CellValue)> {
        self.fields.iter_mut()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

/// True for any spelling of the whatsapp column ("Whatsapp", "WHATSAPP", ...).
pub fn is_whatsapp_column(name: &str) -> bool {
    name.to_lowercase() == "whatsapp"
}

/// True for columns holding an email ("Email", "E-mail", "correo_email", ...).
pub fn is_email_column(name: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"(?i)e-?mail").expect("email header pattern is valid"))
        .is_match(name)
}

/// Resolved contact columns for one row. The first matching column wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSchema {
    pub email: Option<String>,
    pub whatsapp: Option<String>,
}

impl RowSchema {
    pub fn detect<'a>(columns: impl IntoIterator<Item = &'a str>) -> Self {
        let mut schema = RowSchema::default();
        for column in columns {
            if schema.email.is_none() && is_email_column(column) {
                schema.email = Some(column.to_string());
            }
            if schema.whatsapp.is_none() && is_whatsapp_column(column) {
                schema.whatsapp = Some(column.to_string());
            }
        }
        schema
    }

    pub fn email<'r>(&self, row: &'r Row) -> &'r CellValue {
        self.email.as_deref().map_or(&ABSENT, |c| row.get(c))
    }

    pub fn whatsapp<'r>(&self, row: &'r Row) -> &'r CellValue {
        self.whatsapp.as_deref().map_or(&ABSENT, |c| row.get(c))
    }

    /// Column back-fill writes to: the row's own whatsapp column, or the canonical name.
    pub fn whatsapp_target(&self) -> &str {
        self.whatsapp.as_deref().unwrap_or(WHATSAPP_COLUMN)
    }
}
