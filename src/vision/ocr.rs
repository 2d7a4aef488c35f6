//! OCR for names, numbers and phrases
//!
//! The recognizer owns one OCR backend and re-initializes it only when the
//! UI language changes. Backend failures never escape: they surface as
//! [`OcrOutcome::BackendUnavailable`] and from there as absent values.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

use image::GrayImage;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::geometry::Region;
use crate::config::OcrSettings;

/// Language used when a requested one has no OCR training data
pub const FALLBACK_LANGUAGE: &str = "english";

/// UI language name to Tesseract language code
pub static LANGUAGE_CODES: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("german", "deu"),
        ("english", "eng"),
        ("french", "fra"),
        ("spanish", "spa"),
        ("italian", "ita"),
        ("polish", "pol"),
        ("russian", "rus"),
    ])
});

/// Glyphs commonly misread in digit strings
const DIGIT_SUBSTITUTIONS: [(char, char); 6] = [
    ('£', '5'),
    ('O', '0'),
    ('Q', '0'),
    ('I', '1'),
    ('Z', '2'),
    ('B', '8'),
];

/// Tesseract code of a UI language, `None` for unsupported languages
pub fn language_code(language: &str) -> Option<&'static str> {
    LANGUAGE_CODES.get(language).copied()
}

/// A recognized word and its position in the input image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub bbox: Region,
}

/// How the backend should segment the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutMode {
    #[default]
    SingleLine,
    SingleBlock,
    SparseText,
}

impl LayoutMode {
    /// Tesseract page segmentation mode
    pub fn psm(self) -> u8 {
        match self {
            LayoutMode::SingleLine => 7,
            LayoutMode::SingleBlock => 6,
            LayoutMode::SparseText => 11,
        }
    }
}

/// OCR errors
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR backend is not configured")]
    NotConfigured,
    #[error("OCR executable {} cannot be started: {source}", .path.display())]
    ExecutableMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("OCR process failed: {0}")]
    ProcessFailed(String),
    #[error("OCR output is not valid UTF-8")]
    InvalidOutput,
    #[error("Failed to hand image to OCR: {0}")]
    Image(#[from] image::ImageError),
    #[error("Failed to create temporary file: {0}")]
    TempFile(#[from] std::io::Error),
}

/// Contract of an OCR engine
pub trait OcrBackend {
    /// Load the model for a Tesseract language code
    fn configure(&mut self, language_code: &str) -> Result<(), OcrError>;
    fn set_layout_mode(&mut self, mode: LayoutMode);
    /// Words in reading order
    fn recognize(&mut self, image: &GrayImage) -> Result<Vec<Word>, OcrError>;
}

/// Result of one OCR call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrOutcome {
    Words(Vec<Word>),
    BackendUnavailable,
}

impl OcrOutcome {
    /// Recognized words; none if the backend was unavailable
    pub fn words(&self) -> &[Word] {
        match self {
            OcrOutcome::Words(words) => words,
            OcrOutcome::BackendUnavailable => &[],
        }
    }
}

/// Language binding of the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Unloaded,
    LoadedFor(String),
}

/// OCR with per-language engine management and digit correction
pub struct TextRecognizer<B> {
    backend: B,
    state: EngineState,
}

impl<B: OcrBackend> TextRecognizer<B> {
    /// Recognizer with an unloaded engine
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: EngineState::Unloaded,
        }
    }

    /// Language the engine is loaded for
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Underlying OCR backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Bind the engine to `language`. Nothing happens if it already is.
    pub fn ensure_language(&mut self, language: &str) {
        let (language, code) = match language_code(language) {
            Some(code) => (language, code),
            None => (FALLBACK_LANGUAGE, "eng"),
        };
        if self.state == EngineState::LoadedFor(language.to_string()) {
            return;
        }

        log::info!("Initializing OCR for {} ({})", language, code);
        self.state = match self.backend.configure(code) {
            Ok(()) => EngineState::LoadedFor(language.to_string()),
            Err(e) => {
                log::warn!("OCR initialization failed: {}", e);
                EngineState::Unloaded
            }
        };
    }

    /// Words in `image` in reading order
    pub fn detect_words(&mut self, image: &GrayImage, mode: LayoutMode) -> OcrOutcome {
        if self.state == EngineState::Unloaded {
            return OcrOutcome::BackendUnavailable;
        }
        if image.width() == 0 || image.height() == 0 {
            return OcrOutcome::Words(Vec::new());
        }

        self.backend.set_layout_mode(mode);
        match self.backend.recognize(image) {
            Ok(words) => OcrOutcome::Words(words),
            Err(e) => {
                log::warn!("OCR failed: {}", e);
                OcrOutcome::BackendUnavailable
            }
        }
    }

    /// All text of a single-line region
    pub fn text_from_region(&mut self, image: &GrayImage, with_spaces: bool) -> String {
        join_words(self.detect_words(image, LayoutMode::SingleLine).words(), with_spaces)
    }

    /// Integer printed in a region, `None` if there is none
    pub fn number_from_region(&mut self, image: &GrayImage) -> Option<i32> {
        let text = self.text_from_region(image, false);
        let number = number_from_string(&text);
        log::trace!("OCR number '{}' -> {:?}", text, number);
        number
    }
}

/// Parse an OCR'd integer, correcting glyphs commonly confused with digits
pub fn number_from_string(text: &str) -> Option<i32> {
    let digits: String = text
        .chars()
        .map(|c| {
            DIGIT_SUBSTITUTIONS
                .iter()
                .find(|(glyph, _)| *glyph == c)
                .map_or(c, |&(_, digit)| digit)
        })
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Concatenate word texts, optionally separated by spaces
pub fn join_words(words: &[Word], with_spaces: bool) -> String {
    let separator = if with_spaces { " " } else { "" };
    words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Tesseract driven through its command line interface
pub struct TesseractCli {
    settings: OcrSettings,
    language_code: Option<String>,
    mode: LayoutMode,
}

impl TesseractCli {
    /// Backend using the executable named in `settings`
    pub fn new(settings: OcrSettings) -> Self {
        Self {
            settings,
            language_code: None,
            mode: LayoutMode::default(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.settings.executable);
        if let Some(dir) = &self.settings.tessdata_dir {
            command.arg("--tessdata-dir").arg(dir);
        }
        command
    }
}

impl OcrBackend for TesseractCli {
    fn configure(&mut self, language_code: &str) -> Result<(), OcrError> {
        let output = Command::new(&self.settings.executable)
            .arg("--version")
            .output()
            .map_err(|source| OcrError::ExecutableMissing {
                path: self.settings.executable.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(OcrError::ProcessFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        self.language_code = Some(language_code.to_string());
        Ok(())
    }

    fn set_layout_mode(&mut self, mode: LayoutMode) {
        self.mode = mode;
    }

    fn recognize(&mut self, image: &GrayImage) -> Result<Vec<Word>, OcrError> {
        let code = self.language_code.as_deref().ok_or(OcrError::NotConfigured)?;

        let input = NamedTempFile::with_suffix(".png")?;
        image.save(input.path())?;

        let output = self
            .command()
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(code)
            .arg("--psm")
            .arg(self.mode.psm().to_string())
            .arg("-c")
            .arg(format!("user_defined_dpi={}", self.settings.dpi))
            .arg("tsv")
            .output()
            .map_err(|source| OcrError::ExecutableMissing {
                path: self.settings.executable.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::ProcessFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        let tsv = String::from_utf8(output.stdout).map_err(|_| OcrError::InvalidOutput)?;
        Ok(parse_tsv(&tsv))
    }
}

/// Word rows of Tesseract's TSV output
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Level 5 rows are words.
fn parse_tsv(tsv: &str) -> Vec<Word> {
    tsv.lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 12 || fields[0] != "5" {
                return None;
            }
            let text = fields[11].trim();
            if text.is_empty() {
                return None;
            }

            let number = |i: usize| fields[i].parse::<u32>().unwrap_or(0);
            Some(Word {
                text: text.to_string(),
                bbox: Region::new(number(6), number(7), number(8), number(9)),
            })
        })
        .collect()
}
