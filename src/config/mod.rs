//! Configuration module
//!
//! Handles data locations, diagnostics and OCR backend preferences.

pub mod settings;

pub use settings::{OcrSettings, PhraseIds, Settings, SettingsError};
