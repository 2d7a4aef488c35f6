//! Recognition session
//!
//! Binds the catalog, the OCR engine and the icon matching strategy to the
//! current UI language. Created once; only a language switch mutates it.

use image::{EncodableLayout, GrayImage, ImageBuffer, Pixel, PixelWithColorType, Rgba, RgbaImage};
use log::Level;
use once_cell::sync::Lazy;

use crate::catalog::{Catalog, Guid, IconCategory, KeywordDictionary, Keywords};
use crate::config::{PhraseIds, Settings};
use crate::vision::names::{match_name, name_from_words};
use crate::vision::ocr::{language_code, LayoutMode, OcrBackend, OcrOutcome, TextRecognizer};
use crate::vision::{DebugDump, GuidMatch, IconMatcher, TemplateMatcher};

static EMPTY_DICTIONARY: Lazy<KeywordDictionary> = Lazy::new(KeywordDictionary::default);

/// Language binding, OCR engine and diagnostics of a reader
pub struct RecognitionSession<'c, B> {
    catalog: &'c Catalog,
    recognizer: TextRecognizer<B>,
    matcher: Box<dyn IconMatcher>,
    language: String,
    default_language: String,
    phrases: PhraseIds,
    verbose: bool,
    debug: DebugDump,
}

impl<'c, B: OcrBackend> RecognitionSession<'c, B> {
    /// Session bound to the default language of `settings`
    pub fn new(catalog: &'c Catalog, backend: B, settings: &Settings) -> Self {
        let debug = if settings.verbose {
            DebugDump::to_dir(&settings.debug_image_dir)
        } else {
            DebugDump::disabled()
        };

        Self {
            catalog,
            recognizer: TextRecognizer::new(backend),
            matcher: Box::new(TemplateMatcher),
            language: settings.default_language.clone(),
            default_language: settings.default_language.clone(),
            phrases: settings.phrases,
            verbose: settings.verbose,
            debug,
        }
    }

    /// Replace the icon matching strategy
    pub fn with_matcher(mut self, matcher: impl IconMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// True if the catalog has names and the OCR has a model for `language`
    pub fn has_language(&self, language: &str) -> bool {
        self.catalog.has_dictionary(language) && language_code(language).is_some()
    }

    /// Switch to `language`, or to the default language if it is unsupported
    pub fn update(&mut self, language: &str) {
        if self.has_language(language) {
            self.language = language.to_string();
        } else {
            log::warn!(
                "Language {} not supported, using {}",
                language,
                self.default_language
            );
            self.language = self.default_language.clone();
        }
        self.recognizer.ensure_language(&self.language);
    }

    /// Active UI language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Catalog the session reads from
    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// GUIDs of the state-defining UI phrases
    pub fn phrases(&self) -> PhraseIds {
        self.phrases
    }

    /// True if diagnostics and image dumps are enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// OCR engine of the session
    pub fn recognizer(&self) -> &TextRecognizer<B> {
        &self.recognizer
    }

    /// Names in the active language
    pub fn dictionary(&self) -> &'c KeywordDictionary {
        let catalog = self.catalog;
        catalog
            .dictionary(&self.language)
            .or_else(|| catalog.dictionary(&self.default_language))
            .unwrap_or_else(|| &*EMPTY_DICTIONARY)
    }

    /// Level of per-match diagnostics
    pub fn diagnostics(&self) -> Level {
        if self.verbose {
            Level::Info
        } else {
            Level::Debug
        }
    }

    /// Match an icon against the references of one category
    pub fn classify_icon(
        &self,
        icon: &RgbaImage,
        category: IconCategory,
        background: Rgba<u8>,
    ) -> GuidMatch {
        let references = self.catalog.icons().category(category);
        let result = self.matcher.classify(icon, references, background);
        log::log!(self.diagnostics(), "{:?} icon: {:?}", category, result);
        result
    }

    /// Words in `image`, empty if the OCR is unavailable
    pub fn detect_words(&mut self, image: &GrayImage, mode: LayoutMode) -> OcrOutcome {
        self.recognizer.detect_words(image, mode)
    }

    /// Text of a single-line region
    pub fn text_from_region(&mut self, image: &GrayImage, with_spaces: bool) -> String {
        let text = self.recognizer.text_from_region(image, with_spaces);
        log::log!(self.diagnostics(), "OCR text: '{}'", text);
        text
    }

    /// Integer printed in a region
    pub fn number_from_region(&mut self, image: &GrayImage) -> Option<i32> {
        let number = self.recognizer.number_from_region(image);
        log::log!(self.diagnostics(), "OCR number: {:?}", number);
        number
    }

    /// Read a single-line name and match it against `keywords`
    pub fn name_from_image(&mut self, image: &GrayImage, keywords: &Keywords) -> GuidMatch {
        let outcome = self.recognizer.detect_words(image, LayoutMode::SingleLine);
        let name = name_from_words(outcome.words());
        let result = match_name(&name, keywords);
        log::log!(self.diagnostics(), "Name '{}': {:?}", name, result);
        result
    }

    /// True if `image` shows the UI text `phrase` in the active language
    pub fn phrase_matches(&mut self, image: &GrayImage, phrase: Guid) -> bool {
        let phrases = self.dictionary().phrases(&[phrase]);
        if phrases.is_empty() {
            return false;
        }
        self.name_from_image(image, &phrases).is_match()
    }

    /// Write an intermediate image when running verbose
    pub fn dump<P>(&self, name: &str, image: &ImageBuffer<P, Vec<P::Subpixel>>)
    where
        P: Pixel + PixelWithColorType,
        [P::Subpixel]: EncodableLayout,
    {
        self.debug.save(name, image);
    }
}
