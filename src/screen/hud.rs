//! Permanent HUD reader
//!
//! The HUD at the bottom of the screen always shows the world-wide
//! headcount of every population tier as a short list of icon and number.

use super::state::SurfaceState;
use super::{RecognitionSession, Statistics, ALL_ISLANDS};
use crate::catalog::IconCategory;
use crate::vision::geometry::{cell, pane, square};
use crate::vision::layout::iterate_rows;
use crate::vision::ocr::OcrBackend;
use crate::vision::preprocess::binarize;
use crate::vision::Screenshot;

/// Resolution independent layout of the HUD
pub mod params {
    use image::Rgba;

    use crate::vision::geometry::NormalizedRect;

    pub const BACKGROUND_BROWN_LIGHT: Rgba<u8> = Rgba([216, 179, 126, 255]);

    /// Tier icon at the left end of a row, relative to the row
    pub const POSITION_POPULATION_ICON: NormalizedRect = NormalizedRect::from_corners(0.0, 0.0, 0.1, 1.0);
    pub const PANE_POPULATION: NormalizedRect = NormalizedRect::from_corners(0.12792, 0.73848, 0.18238, 0.98427);

    /// Headcount cell: left crop, width and vertical crop relative to the row
    pub const HEADCOUNT_CELL: (f32, f32, f32) = (0.2, 0.8, 0.1);
    pub const ROW_DENSITY: f32 = 0.75;
    /// The game has no more tiers than this
    pub const MAX_TIERS: usize = 7;
}

/// Reader for the population list of the HUD
#[derive(Debug, Default)]
pub struct Hud {
    surface: SurfaceState,
}

impl Hud {
    /// Reader without a screenshot
    pub fn new() -> Self {
        Self::default()
    }

    /// The HUD is part of every screenshot
    pub fn update(&mut self, screenshot: &Screenshot) {
        self.surface.reset();
        self.surface.capture(screenshot, true);
    }

    /// Headcount per population tier GUID, for the tiers that could be read
    pub fn population_amount<B: OcrBackend>(&self, session: &mut RecognitionSession<'_, B>) -> Statistics {
        let mut population = Statistics::new();
        let Some(screenshot) = self.surface.screenshot() else {
            return population;
        };

        let roi = pane(screenshot.image(), &params::PANE_POPULATION);
        session.dump("population_pane", &roi);

        let (crop_left, width, crop_vertical) = params::HEADCOUNT_CELL;
        iterate_rows(&roi, params::ROW_DENSITY, |row| {
            if population.len() >= params::MAX_TIERS {
                return;
            }
            session.dump("population_row", row);

            let icon = square(row, &params::POSITION_POPULATION_ICON);
            let Some(tier) = session
                .classify_icon(&icon, IconCategory::PopulationLevels, params::BACKGROUND_BROWN_LIGHT)
                .unique()
            else {
                return;
            };

            let text = binarize(&cell(row, crop_left, width, crop_vertical), false);
            session.dump("population_text", &text);
            if let Some(headcount) = session.number_from_region(&text).filter(|&n| n >= 0) {
                population.entry(tier).or_insert(headcount);
            }
        });

        population
    }

    /// The HUD always shows world-wide totals
    pub fn selected_island(&self) -> String {
        ALL_ISLANDS.to_string()
    }
}
