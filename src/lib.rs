//! Anno Reader - statistics extraction from Anno 1404 screenshots
//!
//! This library reads population counts, building counts, productivities and
//! the selected island from a single screenshot of the game, at any output
//! resolution and in any of the supported UI languages.
//!
//! ## Pipeline
//!
//! A [`StatisticsReader`] receives a [`Screenshot`] per update cycle, decides
//! whether the statistics overlay is open and routes every query either to
//! the overlay reader or to the always visible HUD reader. Both readers are
//! built from the same primitives in [`vision`]: normalized layout geometry,
//! icon classification against the [`Catalog`], OCR with error correction,
//! fuzzy name matching and unsupervised row/box segmentation.

pub mod catalog;
pub mod config;
pub mod screen;
pub mod vision;

pub use catalog::{load_catalog, Catalog, CatalogError, Guid, KeywordDictionary};
pub use config::Settings;
pub use screen::{RecognitionSession, ScreenState, Statistics, StatisticsReader, ALL_ISLANDS};
pub use vision::capture::{PixelOrder, Screenshot};
pub use vision::ocr::{OcrBackend, TesseractCli};
pub use vision::GuidMatch;

use std::path::Path;

/// Load the catalog described by `settings` and build a reader backed by
/// the Tesseract command line tool.
///
/// The catalog must outlive the reader, so it is loaded by the caller:
///
/// ```no_run
/// use anno_reader::{load_catalog, open_reader, Settings};
///
/// let settings = Settings::default();
/// let catalog = load_catalog(&settings.data_dir).expect("catalog");
/// let reader = open_reader(&catalog, &settings);
/// ```
pub fn open_reader<'c>(catalog: &'c Catalog, settings: &Settings) -> StatisticsReader<'c, TesseractCli> {
    let backend = TesseractCli::new(settings.ocr.clone());
    StatisticsReader::new(RecognitionSession::new(catalog, backend, settings))
}

/// Convenience wrapper used by the debug binary: load settings from an
/// optional JSON file, falling back to defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, config::SettingsError> {
    match path {
        Some(path) => Settings::load(path),
        None => Ok(Settings::default()),
    }
}
