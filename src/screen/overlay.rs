//! Statistics overlay reader
//!
//! The overlay lists every building of the selected island as a grid of
//! framed icons with a count below each frame, and the products with their
//! average productivity as a list next to it.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::state::SurfaceState;
use super::{RecognitionSession, Statistics, ALL_ISLANDS};
use crate::catalog::IconCategory;
use crate::vision::geometry::{cell, crop, pane, pane_region, square, Region};
use crate::vision::layout::{detect_boxes, iterate_rows, reading_order};
use crate::vision::ocr::OcrBackend;
use crate::vision::preprocess::{binarize, closer_to, EdgeThresholds};
use crate::vision::Screenshot;

/// Resolution independent layout of the overlay
pub mod params {
    use image::Rgba;

    use crate::vision::geometry::NormalizedRect;

    pub const BACKGROUND_BROWN_LIGHT: Rgba<u8> = Rgba([216, 179, 126, 255]);
    /// Highlight of the selected list entry
    pub const BACKGROUND_BLUE_DARK: Rgba<u8> = Rgba([36, 52, 76, 255]);
    pub const ICON_BACKGROUND: Rgba<u8> = Rgba([198, 196, 184, 255]);

    /// Outer size of a framed building icon
    pub const SIZE_FRAMED_ICON: NormalizedRect = NormalizedRect::from_corners(0.26455, 0.38384, 0.29399, 0.43520);
    /// Icon inside its frame, relative to the frame
    pub const SIZE_ICON: NormalizedRect = NormalizedRect::new(0.068493151, 0.068493151, 0.8630137, 0.8630137);

    pub const PANE_TITLE: NormalizedRect = NormalizedRect::from_corners(0.35460, 0.15582, 0.43390, 0.18032);
    pub const PANE_ISLAND: NormalizedRect = NormalizedRect::from_corners(0.45350, 0.19592, 0.53259, 0.21295);
    /// Grid of framed building icons
    pub const PANE_PRODUCTION_LEFT: NormalizedRect = NormalizedRect::from_corners(0.26210, 0.37516, 0.45077, 0.81145);
    /// List of products and their productivity
    pub const PANE_PRODUCTIVITY: NormalizedRect = NormalizedRect::from_corners(0.54923, 0.37516, 0.73790, 0.81145);

    /// Product icon at the left end of a list row, relative to the row
    pub const POSITION_PRODUCT_ICON: NormalizedRect = NormalizedRect::new(0.0, 0.1, 0.1, 0.8);

    /// Allowed deviation of a frame from the expected size
    pub const BOX_TOLERANCE: f32 = 0.1;
    pub const ROW_DENSITY: f32 = 0.9;
}

const FRAME_OUTLINE: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Reader for the statistics overlay
#[derive(Debug, Default)]
pub struct StatisticsOverlay {
    surface: SurfaceState,
}

impl StatisticsOverlay {
    /// Reader in the closed state
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `screenshot` shows the overlay. Drops all values
    /// derived from the previous screenshot.
    pub fn update<B: OcrBackend>(
        &mut self,
        session: &mut RecognitionSession<'_, B>,
        screenshot: &Screenshot,
    ) -> bool {
        self.surface.reset();

        let title = binarize(&pane(screenshot.image(), &params::PANE_TITLE), true);
        session.dump("statistics_text", &title);
        session.dump("statistics_screenshot", screenshot.image());

        let open = session.phrase_matches(&title, session.phrases().statistics_title);
        self.surface.capture(screenshot, open);
        open
    }

    /// True if the latest screenshot shows the overlay
    pub fn is_open(&self) -> bool {
        self.surface.is_open()
    }

    fn image(&self) -> Option<&RgbaImage> {
        self.surface.screenshot().map(Screenshot::image)
    }

    /// The production tab shows no headcounts
    pub fn population_amount(&self) -> Statistics {
        Statistics::new()
    }

    /// Number of buildings per building GUID
    pub fn existing_buildings<B: OcrBackend>(&self, session: &mut RecognitionSession<'_, B>) -> Statistics {
        let mut buildings = Statistics::new();
        let Some(image) = self.image() else {
            return buildings;
        };

        let Some(frame) = pane_region(image.dimensions(), &params::SIZE_FRAMED_ICON).filter(|f| !f.is_empty()) else {
            return buildings;
        };
        let production = pane(image, &params::PANE_PRODUCTION_LEFT);
        session.dump("statistics_production", &production);

        let boxes = detect_boxes(
            &production,
            (frame.width, frame.height),
            None,
            params::BOX_TOLERANCE,
            EdgeThresholds::default(),
        );
        log::log!(session.diagnostics(), "{} building frames", boxes.len());
        if session.is_verbose() {
            session.dump("boxes", &outline_frames(&production, &boxes));
        }

        for frame in reading_order(boxes, frame.height) {
            // Count label would be cut off at the bottom of the pane
            if frame.y as f32 + 1.5 * frame.height as f32 >= production.height() as f32 {
                continue;
            }

            let icon = crop(&production, Some(inner_icon(frame)));
            let Some(guid) = session
                .classify_icon(&icon, IconCategory::Buildings, params::ICON_BACKGROUND)
                .unique()
            else {
                continue;
            };

            let label = Region::new(
                frame.x,
                frame.y + frame.height + frame.height / 8,
                frame.width,
                frame.height / 3,
            )
            .clamp_to(production.width(), production.height());
            let text = binarize(&crop(&production, Some(label)), true);
            session.dump("factory_count", &text);

            if let Some(count) = session.number_from_region(&text).filter(|&c| c > 0) {
                buildings.entry(guid).or_insert(count);
            }
        }

        buildings
    }

    /// Average productivity in percent per factory GUID
    pub fn average_productivities<B: OcrBackend>(&self, session: &mut RecognitionSession<'_, B>) -> Statistics {
        let mut productivities = Statistics::new();
        let Some(image) = self.image() else {
            return productivities;
        };

        let list = pane(image, &params::PANE_PRODUCTIVITY);
        session.dump("statistics_productivity", &list);
        let catalog = session.catalog();

        iterate_rows(&list, params::ROW_DENSITY, |row| {
            let icon = square(row, &params::POSITION_PRODUCT_ICON);
            if icon.width() == 0 || icon.height() == 0 {
                return;
            }
            let background = if is_selected(*icon.get_pixel(0, 0)) {
                params::BACKGROUND_BLUE_DARK
            } else {
                params::BACKGROUND_BROWN_LIGHT
            };

            let products = session.classify_icon(&icon, IconCategory::Products, background);
            if !products.is_match() {
                return;
            }

            let highlight = *row.get_pixel(row.width() / 2, row.height() / 10);
            let text = binarize(&cell(row, 0.7, 0.1, 0.4), is_selected(highlight));
            session.dump("productivity_text", &text);

            let Some(mut productivity) = session.number_from_region(&text) else {
                return;
            };
            // The percent sign is sometimes read as "00"
            if productivity > 500 && productivity % 100 == 0 {
                productivity /= 100;
            }
            if productivity < 0 {
                return;
            }

            for product in products.guids() {
                for factory in catalog.factories_for(product) {
                    productivities.entry(factory).or_insert(productivity);
                }
            }
        });

        productivities
    }

    /// Name of the selected island, [`ALL_ISLANDS`] for the world view
    pub fn selected_island<B: OcrBackend>(&mut self, session: &mut RecognitionSession<'_, B>) -> String {
        if let Some(island) = self.surface.selected_island() {
            return island.to_string();
        }
        let Some(image) = self.image() else {
            return String::new();
        };

        let roi = binarize(&pane(image, &params::PANE_ISLAND), true);
        session.dump("selected_island", &roi);

        let island = if session.phrase_matches(&roi, session.phrases().world_statistics) {
            ALL_ISLANDS.to_string()
        } else {
            session.text_from_region(&roi, true)
        };
        log::log!(session.diagnostics(), "Selected island: {}", island);
        self.surface.cache_selected_island(island).to_string()
    }

    /// True if the open overlay shows world-wide statistics
    pub fn is_all_islands_selected<B: OcrBackend>(&mut self, session: &mut RecognitionSession<'_, B>) -> bool {
        self.is_open() && self.selected_island(session) == ALL_ISLANDS
    }
}

/// Icon area of a building frame
fn inner_icon(frame: Region) -> Region {
    let dim = frame.width.min(frame.height) as f32;
    let s = &params::SIZE_ICON;
    Region::new(
        frame.x + (dim * s.x) as u32,
        frame.y + (dim * s.y) as u32,
        (dim * s.width) as u32,
        (dim * s.height) as u32,
    )
}

/// Copy of `image` with every frame outlined
fn outline_frames(image: &RgbaImage, frames: &[Region]) -> RgbaImage {
    let mut outlined = image.clone();
    for frame in frames.iter().filter(|f| !f.is_empty()) {
        let rect = Rect::at(frame.x as i32, frame.y as i32).of_size(frame.width, frame.height);
        draw_hollow_rect_mut(&mut outlined, rect, FRAME_OUTLINE);
    }
    outlined
}

/// True for the highlight colour of the selected list entry
fn is_selected(color: Rgba<u8>) -> bool {
    closer_to(color, params::BACKGROUND_BLUE_DARK, params::BACKGROUND_BROWN_LIGHT)
}
