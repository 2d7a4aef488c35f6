//! Reader settings
//!
//! Defines every configurable option of the reader: data locations, the
//! fallback language, diagnostics and the OCR backend.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Guid;

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Main settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `texts/params.json`, `texts/ui_texts.json` and `icons/`
    pub data_dir: PathBuf,
    /// Language used when the requested one is not supported
    pub default_language: String,
    /// Raise per-match diagnostics to `info` and dump intermediate images
    pub verbose: bool,
    /// Target directory of the debug image dump
    pub debug_image_dir: PathBuf,
    /// OCR backend settings
    pub ocr: OcrSettings,
    /// Fixed UI phrases used for state detection
    pub phrases: PhraseIds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            default_language: "english".to_string(),
            verbose: false,
            debug_image_dir: PathBuf::from("debug_images"),
            ocr: OcrSettings::default(),
            phrases: PhraseIds::default(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Settings for debugging a misrecognised screenshot
    pub fn diagnostic_preset() -> Self {
        Self {
            verbose: true,
            ..Default::default()
        }
    }
}

/// Tesseract command line settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Executable name or path
    pub executable: PathBuf,
    /// Directory containing the `*.traineddata` files, if not the system default
    pub tessdata_dir: Option<PathBuf>,
    /// Resolution hint passed to the engine
    pub dpi: u32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("tesseract"),
            tessdata_dir: None,
            dpi: 70,
        }
    }
}

/// GUIDs of the UI texts that identify screen states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhraseIds {
    /// Title of the statistics overlay
    pub statistics_title: Guid,
    /// Island selector entry that stands for the whole world
    pub world_statistics: Guid,
}

impl Default for PhraseIds {
    fn default() -> Self {
        Self {
            statistics_title: 20022,
            world_statistics: 20013,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_language, "english");
        assert_eq!(settings.ocr.dpi, 70);
        assert!(!settings.verbose);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings =
            Settings::from_json(r#"{ "verbose": true, "ocr": { "dpi": 100 } }"#).unwrap();
        assert!(settings.verbose);
        assert_eq!(settings.ocr.dpi, 100);
        assert_eq!(settings.ocr.executable, PathBuf::from("tesseract"));
        assert_eq!(settings.phrases, PhraseIds::default());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Settings::from_json("{ verbose: "),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load("/nonexistent/settings.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn test_diagnostic_preset() {
        let settings = Settings::diagnostic_preset();
        assert!(settings.verbose);
        assert_eq!(settings.debug_image_dir, PathBuf::from("debug_images"));
    }
}
