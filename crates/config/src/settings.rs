// Application settings
// Loaded from ~/.config/unigrid/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Page sizes offered to the operator.
pub const PAGE_SIZE_CHOICES: [usize; 5] = [25, 50, 100, 250, 500];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Source
    #[serde(rename = "source.folder")]
    pub source_folder: Option<PathBuf>, // None = ~/OneDrive/DEVELOPMENT/UPTODATE

    #[serde(rename = "source.subfolders")]
    pub source_subfolders: Vec<String>,

    // View
    #[serde(rename = "view.pageSize")]
    pub page_size: usize,

    #[serde(rename = "view.pageSizes")]
    pub page_sizes: Vec<usize>,

    // Input
    #[serde(rename = "input.debounceMs")]
    pub debounce_ms: u64,

    // Contacts
    #[serde(rename = "contacts.enabled")]
    pub contacts_enabled: bool,

    #[serde(rename = "contacts.url")]
    pub contacts_url: Option<String>,

    #[serde(rename = "contacts.tables")]
    pub contacts_tables: Vec<String>,

    #[serde(rename = "contacts.timeoutSecs")]
    pub contacts_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Source
            source_folder: None,
            source_subfolders: vec!["whatsapp".to_string()],
            // View
            page_size: 100,
            page_sizes: PAGE_SIZE_CHOICES.to_vec(),
            // Input
            debounce_ms: 200,
            // Contacts
            contacts_enabled: true,
            contacts_url: None,
            contacts_tables: vec!["contacts".to_string(), "activities".to_string()],
            contacts_timeout_secs: 30,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"{
    // Folder with the spreadsheet exports (null = ~/OneDrive/DEVELOPMENT/UPTODATE)
    "source.folder": null,
    // Subfolders read after the main folder
    "source.subfolders": ["whatsapp"],

    // Table
    "view.pageSize": 100,
    "view.pageSizes": [25, 50, 100, 250, 500],

    // Delay before typed filters are applied
    "input.debounceMs": 200,

    // Contact directory used to fill in missing phone numbers
    // The API key is read from the system keychain or UNIGRID_CONTACTS_KEY,
    // never from this file
    "contacts.enabled": true,
    "contacts.url": null,
    "contacts.tables": ["contacts", "activities"],
    "contacts.timeoutSecs": 30
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("unigrid");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults.
    /// The first run writes a commented default file.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }

        Self::load_from(&path)
    }

    /// Load from an explicit path. Any read or parse problem yields defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring `//` comment lines.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }

    /// Folder to read when none is given on the command line
    pub fn effective_source_folder(&self) -> PathBuf {
        self.source_folder.clone().unwrap_or_else(default_source_folder)
    }

    /// Whether `size` is one of the offered page sizes. An empty
    /// `view.pageSizes` list accepts any size.
    pub fn allows_page_size(&self, size: usize) -> bool {
        size > 0 && (self.page_sizes.is_empty() || self.page_sizes.contains(&size))
    }

    /// Contacts lookup is on and has somewhere to go
    pub fn contacts_configured(&self) -> bool {
        self.contacts_enabled
            && self.contacts_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

fn default_source_folder() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("OneDrive")
        .join("DEVELOPMENT")
        .join("UPTODATE")
}
