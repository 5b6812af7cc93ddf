// Configuration loading

pub mod secrets;
pub mod settings;

pub use secrets::{get_contacts_key, KeyLookup, KeySource};
pub use settings::Settings;
