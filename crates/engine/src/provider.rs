//! External contact lookup seam.
//!
//! The provider is slow (network), so a load starts it on a worker thread
//! before scanning local files and only joins it when correlation needs the
//! external records.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// One `{email, whatsapp}` pair from the external directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub email: String,
    pub whatsapp: String,
}

impl ContactRecord {
    pub fn new(email: impl Into<String>, whatsapp: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            whatsapp: whatsapp.into(),
        }
    }
}

/// Something that can list known contacts. Duplicates are allowed; the last one wins.
pub trait ContactProvider: Send + Sync {
    fn fetch_contacts(&self) -> Result<Vec<ContactRecord>, ProviderError>;
}

/// Provider used when the external lookup is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContacts;

impl ContactProvider for NoContacts {
    fn fetch_contacts(&self) -> Result<Vec<ContactRecord>, ProviderError> {
        Ok(Vec::new())
    }
}

/// Fixed in-memory contact list.
#[derive(Debug, Clone, Default)]
pub struct StaticContacts(pub Vec<ContactRecord>);

impl ContactProvider for StaticContacts {
    fn fetch_contacts(&self) -> Result<Vec<ContactRecord>, ProviderError> {
        Ok(self.0.clone())
    }
}

/// A provider call in flight (or already finished).
pub enum PendingContacts {
    Running(JoinHandle<Result<Vec<ContactRecord>, ProviderError>>),
    Ready(Result<Vec<ContactRecord>, ProviderError>),
}

impl PendingContacts {
    /// Start the lookup on a worker thread.
    pub fn spawn(provider: Arc<dyn ContactProvider>) -> Self {
        let spawned = thread::Builder::new()
            .name("contact-lookup".into())
            .spawn(move || provider.fetch_contacts());

        match spawned {
            Ok(handle) => PendingContacts::Running(handle),
            Err(e) => PendingContacts::Ready(Err(ProviderError::new(format!(
                "could not start contact lookup: {}",
                e
            )))),
        }
    }

    /// Run the lookup on the calling thread.
    pub fn immediate(provider: &dyn ContactProvider) -> Self {
        PendingContacts::Ready(provider.fetch_contacts())
    }

    /// Nothing to look up.
    pub fn none() -> Self {
        PendingContacts::Ready(Ok(Vec::new()))
    }

    /// Block until the lookup has finished, successfully or not.
    pub fn wait(self) -> Result<Vec<ContactRecord>, ProviderError> {
        match self {
            PendingContacts::Ready(result) => result,
            PendingContacts::Running(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(ProviderError::new("contact lookup thread panicked"))),
        }
    }
}

impl std::fmt::Debug for PendingContacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingContacts::Running(_) => f.write_str("PendingContacts::Running"),
            PendingContacts::Ready(r) => {
                write!(f, "PendingContacts::Ready({:?})", r.as_ref().map(Vec::len))
            }
        }
    }
}
