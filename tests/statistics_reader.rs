use std::collections::VecDeque;

use anno_reader::catalog::{IconCategory, TextCategory};
use anno_reader::screen::hud::params::BACKGROUND_BROWN_LIGHT;
use anno_reader::screen::overlay::params as overlay;
use anno_reader::vision::geometry::pane_region;
use anno_reader::vision::geometry::Region;
use anno_reader::vision::ocr::{LayoutMode, OcrError, Word};
use anno_reader::{
    Catalog, OcrBackend, RecognitionSession, ScreenState, Screenshot, Settings, Statistics, StatisticsReader,
    ALL_ISLANDS,
};
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Replays canned OCR results, repeating the last one once the script ends
struct ScriptedOcr {
    script: VecDeque<&'static str>,
    last: &'static str,
}

impl ScriptedOcr {
    fn new(script: &[&'static str]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            last: "",
        }
    }
}

impl OcrBackend for ScriptedOcr {
    fn configure(&mut self, _language_code: &str) -> Result<(), OcrError> {
        Ok(())
    }

    fn set_layout_mode(&mut self, _mode: LayoutMode) {}

    fn recognize(&mut self, _image: &GrayImage) -> Result<Vec<Word>, OcrError> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        Ok(self
            .last
            .split_whitespace()
            .map(|text| Word {
                text: text.to_string(),
                bbox: Region::default(),
            })
            .collect())
    }
}

const BEGGARS: u32 = 15000000;
const PEASANTS: u32 = 15000001;
const CITIZENS: u32 = 15000002;
const NOMADS: u32 = 15000003;
const ENVOYS: u32 = 15000004;

const SEPARATOR: Rgba<u8> = Rgba([20, 15, 10, 255]);

/// Tiers drawn into the HUD, top to bottom, and their icon colours
const DRAWN_TIERS: [(u32, Rgba<u8>); 4] = [
    (BEGGARS, Rgba([220, 40, 40, 255])),
    (PEASANTS, Rgba([40, 80, 220, 255])),
    (CITIZENS, Rgba([40, 200, 60, 255])),
    (ENVOYS, Rgba([240, 240, 240, 255])),
];

fn catalog() -> Catalog {
    let settings = Settings::default();
    let mut catalog = Catalog::new();
    catalog.insert_text("english", TextCategory::UiTexts, settings.phrases.statistics_title, "Statistics");
    catalog.insert_text("english", TextCategory::UiTexts, settings.phrases.world_statistics, "World");
    for (guid, name) in [
        (BEGGARS, "Beggars"),
        (PEASANTS, "Peasants"),
        (CITIZENS, "Citizens"),
        (NOMADS, "Nomads"),
    ] {
        catalog.insert_text("english", TextCategory::PopulationLevels, guid, name);
    }

    // Envoys only have an icon
    for (guid, color) in DRAWN_TIERS {
        catalog.insert_icon(IconCategory::PopulationLevels, guid, RgbaImage::from_pixel(16, 16, color));
    }
    catalog.insert_icon(
        IconCategory::PopulationLevels,
        NOMADS,
        RgbaImage::from_pixel(16, 16, Rgba([230, 220, 20, 255])),
    );
    catalog
}

fn reader<'c>(catalog: &'c Catalog, script: &[&'static str]) -> StatisticsReader<'c, ScriptedOcr> {
    reader_with(catalog, script, &Settings::default())
}

fn reader_with<'c>(
    catalog: &'c Catalog,
    script: &[&'static str],
    settings: &Settings,
) -> StatisticsReader<'c, ScriptedOcr> {
    StatisticsReader::new(RecognitionSession::new(catalog, ScriptedOcr::new(script), settings))
}

const FISHERY: u32 = 1010;
const SHEEP_FARM: u32 = 1011;
const WEAVER: u32 = 1012;
const SPICE_FARM: u32 = 1013;
const INDIGO_FARM: u32 = 1014;

const FISH: u32 = 120;
const WOOL: u32 = 121;
const SPICES: u32 = 122;
const INDIGO: u32 = 123;

const RED: Rgba<u8> = Rgba([220, 40, 40, 255]);
const BLUE: Rgba<u8> = Rgba([40, 80, 220, 255]);
const DARK_GREEN: Rgba<u8> = Rgba([30, 120, 40, 255]);
const GREEN: Rgba<u8> = Rgba([40, 200, 60, 255]);

/// Catalog with building and product icons on top of the population tiers.
/// Spices and indigo share one icon.
fn overlay_catalog() -> Catalog {
    let mut catalog = catalog();
    for (guid, color) in [(FISHERY, RED), (SHEEP_FARM, DARK_GREEN), (WEAVER, BLUE)] {
        catalog.insert_icon(IconCategory::Buildings, guid, RgbaImage::from_pixel(16, 16, color));
    }
    for (guid, color) in [(FISH, RED), (WOOL, BLUE), (SPICES, GREEN), (INDIGO, GREEN)] {
        catalog.insert_icon(IconCategory::Products, guid, RgbaImage::from_pixel(16, 16, color));
    }
    catalog.link_product(FISH, [FISHERY]);
    catalog.link_product(WOOL, [SHEEP_FARM, WEAVER]);
    catalog.link_product(SPICES, [SPICE_FARM]);
    catalog.link_product(INDIGO, [INDIGO_FARM]);
    catalog
}

fn blank_screenshot() -> Screenshot {
    Screenshot::from_image(RgbaImage::from_pixel(1920, 1080, BACKGROUND_BROWN_LIGHT))
}

/// Full HD screenshot with the HUD population list at x 245, y 796,
/// 104 x 265 pixels: rows of 37 pixels separated by 3 pixel lines
fn hud_screenshot() -> Screenshot {
    let mut image = RgbaImage::from_pixel(1920, 1080, BACKGROUND_BROWN_LIGHT);
    let (pane_x, pane_y) = (245, 796);

    for row in 0..6 {
        let top = pane_y + 40 * row;
        draw_filled_rect_mut(&mut image, Rect::at(0, top + 37).of_size(1920, 3), SEPARATOR);
        if let Some((_, color)) = DRAWN_TIERS.get(row as usize) {
            draw_filled_rect_mut(&mut image, Rect::at(pane_x, top).of_size(37, 37), *color);
        }
    }
    Screenshot::from_image(image)
}

/// Full HD screenshot of the statistics overlay
///
/// The production pane (x 503, y 404, 361 x 470) holds three framed
/// buildings of 56 x 55 pixels: fishery and weaver side by side in the
/// first row, a sheep farm so low that its count label is cut off. The
/// productivity pane (x 1053, same rows) lists fish, wool and the shared
/// spices/indigo icon in rows of 37 pixels separated by 3 pixel lines.
fn overlay_screenshot() -> Screenshot {
    let mut image = RgbaImage::from_pixel(1920, 1080, BACKGROUND_BROWN_LIGHT);
    let frame = pane_region((1920, 1080), &overlay::SIZE_FRAMED_ICON).unwrap();
    let production = pane_region((1920, 1080), &overlay::PANE_PRODUCTION_LEFT).unwrap();
    let list = pane_region((1920, 1080), &overlay::PANE_PRODUCTIVITY).unwrap();

    for (dx, dy, color) in [(20, 20, RED), (100, 20, BLUE), (20, 400, DARK_GREEN)] {
        let rect = Rect::at((production.x + dx) as i32, (production.y + dy) as i32).of_size(frame.width, frame.height);
        draw_filled_rect_mut(&mut image, rect, color);
    }

    let (list_x, list_y) = (list.x as i32, list.y as i32);
    for row in 0..11 {
        let top = list_y + 40 * row;
        draw_filled_rect_mut(&mut image, Rect::at(list_x - 50, top + 37).of_size(list.width + 100, 3), SEPARATOR);
        if let Some(color) = [RED, BLUE, GREEN].get(row as usize) {
            draw_filled_rect_mut(&mut image, Rect::at(list_x, top).of_size(34, 37), *color);
        }
    }
    Screenshot::from_image(image)
}

#[test]
fn test_hud_when_title_does_not_match() {
    let catalog = catalog();
    let mut reader = reader(&catalog, &["1,234"]);

    let state = reader.update("english", &blank_screenshot());
    assert_eq!(state, ScreenState::OverlayClosed);
    assert_eq!(reader.state(), ScreenState::OverlayClosed);
    assert_eq!(reader.selected_island(), ALL_ISLANDS);
    assert!(reader.is_all_islands_selected());
    assert!(reader.existing_buildings().is_empty());
    assert!(reader.average_productivities().is_empty());

    // Nothing readable, every tier of the dictionary reported as 0
    let population = reader.population_amount();
    assert_eq!(population.len(), 4);
    assert!(population.values().all(|&n| n == 0));
}

#[test]
fn test_overlay_open() {
    let catalog = catalog();
    let mut reader = reader(&catalog, &["Statistics", "Nova Kilon"]);

    let state = reader.update("english", &blank_screenshot());
    assert_eq!(state, ScreenState::OverlayOpen);
    assert_eq!(reader.selected_island(), "Nova Kilon");
    // Cached for the rest of the update cycle
    assert_eq!(reader.selected_island(), "Nova Kilon");
    assert!(!reader.is_all_islands_selected());

    assert!(reader.existing_buildings().is_empty());
    assert!(reader.average_productivities().is_empty());
    let population = reader.population_amount();
    assert_eq!(population.len(), 4);
    assert!(population.values().all(|&n| n == 0));
}

#[test]
fn test_overlay_world_view() {
    let catalog = catalog();
    let mut reader = reader(&catalog, &["Statistics", "World"]);

    reader.update("english", &blank_screenshot());
    assert_eq!(reader.selected_island(), ALL_ISLANDS);
    assert!(reader.is_all_islands_selected());
}

#[test]
fn test_overlay_closes_again() {
    let catalog = catalog();
    let mut reader = reader(&catalog, &["Statistics", "Hello"]);

    assert_eq!(reader.update("english", &blank_screenshot()), ScreenState::OverlayOpen);
    assert_eq!(reader.update("english", &blank_screenshot()), ScreenState::OverlayClosed);
    assert_eq!(reader.selected_island(), ALL_ISLANDS);
}

#[test]
fn test_unsupported_language_falls_back() {
    let catalog = catalog();
    let mut reader = reader(&catalog, &["1,234"]);

    assert!(!reader.has_language("klingon"));
    reader.update("klingon", &blank_screenshot());
    assert_eq!(reader.session().language(), "english");
}

#[test]
fn test_hud_population() {
    let catalog = catalog();
    let mut reader = reader(&catalog, &["1,234"]);

    assert_eq!(reader.update("english", &hud_screenshot()), ScreenState::OverlayClosed);
    let population = reader.population_amount();

    let expected: Statistics = [
        (BEGGARS, 1234),
        (PEASANTS, 1234),
        (CITIZENS, 1234),
        (NOMADS, 0),
        (ENVOYS, 1234),
    ]
    .into_iter()
    .collect();
    assert_eq!(population, expected);
}

#[test]
fn test_empty_screenshot() {
    let catalog = catalog();
    let mut reader = reader(&catalog, &["Statistics"]);

    let state = reader.update("english", &Screenshot::from_image(RgbaImage::new(0, 0)));
    assert_eq!(state, ScreenState::OverlayClosed);
    assert!(reader.existing_buildings().is_empty());
    assert_eq!(reader.population_amount().len(), 4);
}

#[test]
fn test_overlay_building_counts() {
    let catalog = overlay_catalog();
    let debug_dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        verbose: true,
        debug_image_dir: debug_dir.path().to_path_buf(),
        ..Settings::default()
    };
    // Count labels are read left to right
    let mut reader = reader_with(&catalog, &["Statistics", "12", "7"], &settings);

    assert_eq!(reader.update("english", &overlay_screenshot()), ScreenState::OverlayOpen);
    let buildings = reader.existing_buildings();

    let expected: Statistics = [(FISHERY, 12), (WEAVER, 7)].into_iter().collect();
    assert_eq!(buildings, expected);
    assert!(debug_dir.path().join("boxes.png").is_file());
}

#[test]
fn test_overlay_productivities() {
    let catalog = overlay_catalog();
    // "9000" is 90% with the percent sign read as "00"
    let mut reader = reader(&catalog, &["Statistics", "85", "9000", "42"]);

    assert_eq!(reader.update("english", &overlay_screenshot()), ScreenState::OverlayOpen);
    let productivities = reader.average_productivities();

    let expected: Statistics = [
        (FISHERY, 85),
        (SHEEP_FARM, 90),
        (WEAVER, 90),
        (SPICE_FARM, 42),
        (INDIGO_FARM, 42),
    ]
    .into_iter()
    .collect();
    assert_eq!(productivities, expected);
}

#[test]
fn test_overlay_closed_ignores_production() {
    let catalog = overlay_catalog();
    let mut reader = reader(&catalog, &["1,234"]);

    assert_eq!(reader.update("english", &overlay_screenshot()), ScreenState::OverlayClosed);
    assert!(reader.existing_buildings().is_empty());
    assert!(reader.average_productivities().is_empty());
}

#[test]
fn test_open_overlay_answers_population() {
    let catalog = catalog();
    // The HUD in the screenshot would read 1234 for four tiers
    let mut reader = reader(&catalog, &["Statistics", "1,234"]);

    assert_eq!(reader.update("english", &hud_screenshot()), ScreenState::OverlayOpen);
    let population = reader.population_amount();

    let expected: Statistics = [(BEGGARS, 0), (PEASANTS, 0), (CITIZENS, 0), (NOMADS, 0)]
        .into_iter()
        .collect();
    assert_eq!(population, expected);
}
