//! Screen state machine
//!
//! Decides per screenshot whether the statistics overlay is open and routes
//! every statistics query to the surface that can answer it: the overlay
//! when it is open, the permanent HUD otherwise.

pub mod hud;
pub mod overlay;
pub mod session;
pub mod state;

use std::collections::BTreeMap;

use crate::catalog::Guid;
use crate::vision::ocr::OcrBackend;
use crate::vision::Screenshot;

pub use hud::Hud;
pub use overlay::StatisticsOverlay;
pub use session::RecognitionSession;
pub use state::{ScreenState, ScreenTracker, SurfaceState};

/// Selected island name standing for the whole world
pub const ALL_ISLANDS: &str = "All Islands";

/// GUID keyed readings
pub type Statistics = BTreeMap<Guid, i32>;

/// Statistics reader for a stream of screenshots
///
/// Accessors describe the screenshot passed to the latest
/// [`update`](Self::update) and read it lazily.
pub struct StatisticsReader<'c, B> {
    session: RecognitionSession<'c, B>,
    overlay: StatisticsOverlay,
    hud: Hud,
    tracker: ScreenTracker,
}

impl<'c, B: OcrBackend> StatisticsReader<'c, B> {
    /// Reader in the closed state, before the first update
    pub fn new(session: RecognitionSession<'c, B>) -> Self {
        Self {
            session,
            overlay: StatisticsOverlay::new(),
            hud: Hud::new(),
            tracker: ScreenTracker::new(),
        }
    }

    /// Process a new screenshot taken with the game running in `language`
    pub fn update(&mut self, language: &str, screenshot: &Screenshot) -> ScreenState {
        self.session.update(language);

        let open = self.overlay.update(&mut self.session, screenshot);
        self.hud.update(screenshot);

        let state = if open {
            ScreenState::OverlayOpen
        } else {
            ScreenState::OverlayClosed
        };
        self.tracker.update_state(state);
        state
    }

    /// State found in the latest screenshot
    pub fn state(&self) -> ScreenState {
        self.tracker.state
    }

    /// True if `language` can be read without falling back
    pub fn has_language(&self, language: &str) -> bool {
        self.session.has_language(language)
    }

    /// Language binding and OCR engine of the reader
    pub fn session(&self) -> &RecognitionSession<'c, B> {
        &self.session
    }

    /// Headcount per population tier. Every tier of the active language is
    /// present, with 0 if it could not be read.
    pub fn population_amount(&mut self) -> Statistics {
        let mut population = match self.state() {
            ScreenState::OverlayOpen => self.overlay.population_amount(),
            ScreenState::OverlayClosed => self.hud.population_amount(&mut self.session),
        };
        for &tier in self.session.dictionary().population_levels.keys() {
            population.entry(tier).or_insert(0);
        }
        population
    }

    /// Productivity per factory GUID; empty unless the overlay is open
    pub fn average_productivities(&mut self) -> Statistics {
        match self.state() {
            ScreenState::OverlayOpen => self.overlay.average_productivities(&mut self.session),
            ScreenState::OverlayClosed => Statistics::new(),
        }
    }

    /// Building count per building GUID; empty unless the overlay is open
    pub fn existing_buildings(&mut self) -> Statistics {
        match self.state() {
            ScreenState::OverlayOpen => self.overlay.existing_buildings(&mut self.session),
            ScreenState::OverlayClosed => Statistics::new(),
        }
    }

    /// Name of the selected island, [`ALL_ISLANDS`] unless the overlay shows one
    pub fn selected_island(&mut self) -> String {
        match self.state() {
            ScreenState::OverlayOpen => self.overlay.selected_island(&mut self.session),
            ScreenState::OverlayClosed => self.hud.selected_island(),
        }
    }

    /// True if the statistics cover the whole world
    pub fn is_all_islands_selected(&mut self) -> bool {
        match self.state() {
            ScreenState::OverlayOpen => self.overlay.is_all_islands_selected(&mut self.session),
            ScreenState::OverlayClosed => true,
        }
    }
}
