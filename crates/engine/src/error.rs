use std::fmt;

/// Why a load produced no dataset.
#[derive(Debug)]
pub enum LoadError {
    /// The row source could not be read at all (missing folder, no files, ...)
    Source(Box<dyn std::error::Error + Send + Sync>),
    /// Files were read but none of them yielded a row
    NoData,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(e) => write!(f, "{e}"),
            Self::NoData => write!(f, "No data was loaded from the files."),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(e) => Some(e.as_ref()),
            Self::NoData => None,
        }
    }
}

/// The external contact lookup failed. Never fatal to a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderError {}
