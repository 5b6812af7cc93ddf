//! Contact directory HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). Each configured table
//! is read with `select=email,whatsapp`; the results are unified into one
//! deduplicated list.

use std::time::Duration;

use indexmap::IndexMap;
use unigrid_config::{get_contacts_key, Settings};
use unigrid_engine::correlate::normalize_email;
use unigrid_engine::sanitize::sanitize_phone;
use unigrid_engine::{ContactProvider, ContactRecord, ProviderError};

/// Contact directory client (blocking).
#[derive(Clone)]
pub struct ContactsClient {
    http: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
    tables: Vec<String>,
}

/// Error type for contact lookups.
#[derive(Debug)]
pub enum ContactsError {
    /// No URL or API key configured
    NotConfigured(String),
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
}

impl std::fmt::Display for ContactsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactsError::NotConfigured(msg) => {
                write!(f, "Contact lookup not configured: {}", msg)
            }
            ContactsError::Network(msg) => write!(f, "Network error: {}", msg),
            ContactsError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ContactsError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for ContactsError {}

impl From<ContactsError> for ProviderError {
    fn from(e: ContactsError) -> Self {
        ProviderError::new(e.to_string())
    }
}

impl ContactsClient {
    /// Build a client from the settings file and the stored API key.
    pub fn from_settings(settings: &Settings) -> Result<Self, ContactsError> {
        let url = settings
            .contacts_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ContactsError::NotConfigured("contacts.url is not set".into()))?;

        let lookup = get_contacts_key();
        let key = lookup.key.ok_or_else(|| {
            ContactsError::NotConfigured(format!(
                "no API key in the keychain or {}",
                unigrid_config::secrets::CONTACTS_KEY_ENV
            ))
        })?;
        log::debug!("contacts API key from {}", lookup.source.as_str());

        Self::new(
            url,
            key,
            settings.contacts_tables.clone(),
            Duration::from_secs(settings.contacts_timeout_secs),
        )
    }

    /// Create a new client with explicit parameters.
    pub fn new(
        api_base: &str,
        api_key: String,
        tables: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, ContactsError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("ugrid/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ContactsError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            tables,
        })
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// `GET {base}/rest/v1/{table}?select=email,whatsapp`
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}?select=email,whatsapp", self.api_base, table)
    }

    /// Raw rows of one table.
    pub fn fetch_table(&self, table: &str) -> Result<Vec<serde_json::Value>, ContactsError> {
        let response = self
            .http
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|e| ContactsError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ContactsError::Http(status, body));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| ContactsError::Parse(e.to_string()))?;
        match json {
            serde_json::Value::Array(items) => Ok(items),
            other => Err(ContactsError::Parse(format!(
                "expected an array from {}, got {}",
                table,
                type_name(&other)
            ))),
        }
    }

    /// Every table, unified. A failing table is logged and skipped; only when
    /// every table fails is the last error returned.
    pub fn fetch_all(&self) -> Result<Vec<ContactRecord>, ContactsError> {
        let mut items = Vec::new();
        let mut last_error = None;
        let mut any_ok = false;

        for table in &self.tables {
            match self.fetch_table(table) {
                Ok(rows) => {
                    log::debug!("contacts table {}: {} rows", table, rows.len());
                    any_ok = true;
                    items.extend(rows);
                }
                Err(e) => {
                    log::warn!("error fetching contacts table {}: {}", table, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_ok => Err(e),
            _ => Ok(unify_records(&items)),
        }
    }
}

impl ContactProvider for ContactsClient {
    fn fetch_contacts(&self) -> Result<Vec<ContactRecord>, ProviderError> {
        Ok(self.fetch_all()?)
    }
}

// ── Free functions ──────────────────────────────────────────────────

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn field_text(item: &serde_json::Value, key: &str) -> String {
    match &item[key] {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// One cleaned pair, or `None` when either side ends up empty.
pub fn parse_record(item: &serde_json::Value) -> Option<ContactRecord> {
    let email = normalize_email(&field_text(item, "email"));
    let whatsapp = sanitize_phone(&field_text(item, "whatsapp"));
    if email.is_empty() || whatsapp.is_empty() {
        return None;
    }
    Some(ContactRecord { email, whatsapp })
}

/// Clean every item and keep one record per email. A later phone replaces an
/// earlier one; the email keeps its first position.
pub fn unify_records(items: &[serde_json::Value]) -> Vec<ContactRecord> {
    let mut unique: IndexMap<String, String> = IndexMap::new();
    for record in items.iter().filter_map(parse_record) {
        unique.insert(record.email, record.whatsapp);
    }
    unique
        .into_iter()
        .map(|(email, whatsapp)| ContactRecord { email, whatsapp })
        .collect()
}
