//! Configuration module for Samtale.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    FinanceSettings, GeneralSettings, ModelSettings, SearchSettings, ServerSettings, Settings,
    StorageProvider, StorageSettings, YoutubeSettings,
};
