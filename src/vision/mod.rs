//! Vision and image processing module
//!
//! Screenshot ingestion, resolution independent layout geometry, icon
//! classification, OCR, fuzzy name matching and row/box segmentation.

pub mod capture;
pub mod geometry;
pub mod icons;
pub mod layout;
pub mod names;
pub mod ocr;
pub mod preprocess;

use std::collections::BTreeSet;

use crate::catalog::Guid;

pub use capture::{DebugDump, PixelOrder, Screenshot};
pub use geometry::{NormalizedRect, Region};
pub use icons::{HuMomentMatcher, IconMatcher, TemplateMatcher};
pub use ocr::{LayoutMode, OcrBackend, OcrOutcome, TesseractCli, TextRecognizer, Word};

/// Outcome of matching an observation against a GUID keyed reference set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuidMatch {
    /// Exactly one reference matched
    Unique(Guid),
    /// Several references tied for the best score
    Ambiguous(BTreeSet<Guid>),
    /// Nothing was close enough
    NoMatch,
}

impl GuidMatch {
    /// Collapse the tied best candidates into a match
    pub fn from_candidates(candidates: impl IntoIterator<Item = Guid>) -> Self {
        let mut guids: BTreeSet<Guid> = candidates.into_iter().collect();
        match guids.len() {
            0 => GuidMatch::NoMatch,
            1 => guids.pop_first().map_or(GuidMatch::NoMatch, GuidMatch::Unique),
            _ => GuidMatch::Ambiguous(guids),
        }
    }

    /// The matched GUID, if the match is unambiguous
    pub fn unique(&self) -> Option<Guid> {
        match self {
            GuidMatch::Unique(guid) => Some(*guid),
            _ => None,
        }
    }

    /// True unless nothing matched
    pub fn is_match(&self) -> bool {
        !matches!(self, GuidMatch::NoMatch)
    }

    /// All candidates, in ascending GUID order
    pub fn guids(&self) -> Vec<Guid> {
        match self {
            GuidMatch::Unique(guid) => vec![*guid],
            GuidMatch::Ambiguous(guids) => guids.iter().copied().collect(),
            GuidMatch::NoMatch => Vec::new(),
        }
    }
}

/// Vision system errors
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("Invalid frame data: expected {expected} bytes, got {actual}")]
    InvalidFrameData { expected: usize, actual: usize },
    #[error("Empty frame")]
    EmptyFrame,
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),
}
