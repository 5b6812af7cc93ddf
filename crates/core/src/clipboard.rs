//! Clipboard capability.
//!
//! The system clipboard can be missing (headless sessions, CI) or refuse a
//! write. Callers that copy as a side effect go through [`copy_text`], which
//! logs and swallows the failure.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// No clipboard could be opened
    Unavailable(String),
    /// The clipboard holds no text
    Empty,
    /// Read or write failed
    Access(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Unavailable(msg) => write!(f, "clipboard unavailable: {}", msg),
            ClipboardError::Empty => write!(f, "clipboard is empty"),
            ClipboardError::Access(msg) => write!(f, "clipboard error: {}", msg),
        }
    }
}

impl std::error::Error for ClipboardError {}

pub trait Clipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError>;
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Process-local clipboard. Fallback when the system one is unavailable.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()) }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        self.text.clone().ok_or(ClipboardError::Empty)
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.text = Some(text.to_string());
        Ok(())
    }
}

#[cfg(feature = "system-clipboard")]
pub use system::SystemClipboard;

#[cfg(feature = "system-clipboard")]
mod system {
    use super::{Clipboard, ClipboardError};

    /// The OS clipboard.
    pub struct SystemClipboard {
        inner: arboard::Clipboard,
    }

    impl SystemClipboard {
        pub fn open() -> Result<Self, ClipboardError> {
            arboard::Clipboard::new()
                .map(|inner| Self { inner })
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))
        }
    }

    impl Clipboard for SystemClipboard {
        fn read_text(&mut self) -> Result<String, ClipboardError> {
            self.inner.get_text().map_err(|e| match e {
                arboard::Error::ContentNotAvailable => ClipboardError::Empty,
                other => ClipboardError::Access(other.to_string()),
            })
        }

        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.inner
                .set_text(text.to_string())
                .map_err(|e| ClipboardError::Access(e.to_string()))
        }
    }
}

/// The system clipboard when one can be opened, else an in-memory one.
pub fn open_default() -> Box<dyn Clipboard> {
    open_system().unwrap_or_else(|| Box::new(MemoryClipboard::new()))
}

#[cfg(feature = "system-clipboard")]
fn open_system() -> Option<Box<dyn Clipboard>> {
    match SystemClipboard::open() {
        Ok(clipboard) => Some(Box::new(clipboard)),
        Err(e) => {
            log::warn!("{}; copies stay inside this process", e);
            None
        }
    }
}

#[cfg(not(feature = "system-clipboard"))]
fn open_system() -> Option<Box<dyn Clipboard>> {
    None
}

/// Write `text`, logging instead of failing. Returns whether the write landed.
pub fn copy_text(clipboard: &mut dyn Clipboard, text: &str) -> bool {
    match clipboard.write_text(text) {
        Ok(()) => {
            log::debug!("copied {} chars to clipboard", text.chars().count());
            true
        }
        Err(e) => {
            log::warn!("copy to clipboard failed: {}", e);
            false
        }
    }
}

/// Pasted text that looks like a phone number (only digits, spaces and
/// `+-()`, at least one digit) loses everything but the digits. Anything
/// else is just trimmed.
pub fn normalize_pasted(text: &str) -> String {
    static PHONE_LIKE: OnceLock<Regex> = OnceLock::new();
    let phone_like = PHONE_LIKE
        .get_or_init(|| Regex::new(r"^[\d\s+\-()]*$").expect("phone paste pattern is valid"));

    if phone_like.is_match(text) && text.chars().any(|c| c.is_ascii_digit()) {
        text.chars()
            .filter(|&c| !(c.is_whitespace() || matches!(c, '+' | '-' | '(' | ')')))
            .collect()
    } else {
        text.trim().to_string()
    }
}
