use std::fs;
use std::path::Path;

use anno_reader::catalog::{IconCategory, TextCategory};
use anno_reader::{load_catalog, CatalogError};
use image::{Rgba, RgbaImage};

const PARAMS: &str = r#"{
    "languages": ["english", "german"],
    "icons": ["atlas.png"],
    "factories": [
        {
            "guid": 1010,
            "icon": { "path": "atlas.png", "x": 0, "y": 0, "width": 8, "height": 8 },
            "locaText": { "english": "Fishery", "german": "Fischerei" }
        }
    ],
    "products": [
        {
            "guid": 120,
            "icon": { "path": "atlas.png", "x": 8, "y": 0, "width": 8, "height": 8 },
            "locaText": { "english": "Fish", "german": "Fisch" },
            "producers": [1010]
        },
        {
            "guid": 121,
            "locaText": { "english": "Gold" }
        }
    ],
    "populationLevels": [
        {
            "guid": 15000000,
            "icon": { "path": "atlas.png", "x": 0, "y": 8, "width": 8, "height": 8 },
            "locaText": { "english": "Beggars", "german": "Bettler" }
        }
    ]
}"#;

const UI_TEXTS: &str = r#"{
    "english": { "20022": "Statistics", "20013": "World" },
    "german": { "20022": "Statistiken" }
}"#;

fn write_data_dir(dir: &Path, params: &str, ui_texts: Option<&str>) {
    fs::create_dir_all(dir.join("texts")).unwrap();
    fs::create_dir_all(dir.join("icons")).unwrap();
    fs::write(dir.join("texts").join("params.json"), params).unwrap();
    if let Some(ui_texts) = ui_texts {
        fs::write(dir.join("texts").join("ui_texts.json"), ui_texts).unwrap();
    }

    let atlas = RgbaImage::from_fn(16, 16, |x, y| match (x / 8, y / 8) {
        (0, 0) => Rgba([200, 30, 30, 255]),
        (1, 0) => Rgba([30, 30, 200, 255]),
        _ => Rgba([30, 200, 30, 255]),
    });
    atlas.save(dir.join("icons").join("atlas.png")).unwrap();
}

#[test]
fn test_load_catalog() {
    let dir = tempfile::tempdir().unwrap();
    write_data_dir(dir.path(), PARAMS, Some(UI_TEXTS));

    let catalog = load_catalog(dir.path()).unwrap();
    assert_eq!(catalog.languages().collect::<Vec<_>>(), vec!["english", "german"]);

    let english = catalog.dictionary("english").unwrap();
    assert_eq!(english.name_of(1010), Some("Fishery"));
    assert_eq!(english.name_of(120), Some("Fish"));
    assert_eq!(english.category(TextCategory::PopulationLevels).len(), 1);
    assert_eq!(english.category(TextCategory::UiTexts)[&20022], "Statistics");
    // Products nobody produces are skipped
    assert_eq!(english.name_of(121), None);

    let german = catalog.dictionary("german").unwrap();
    assert_eq!(german.name_of(1010), Some("Fischerei"));
    assert!(!german.category(TextCategory::UiTexts).contains_key(&20013));

    let fishery = &catalog.icons().category(IconCategory::Buildings)[&1010];
    assert_eq!(fishery.dimensions(), (8, 8));
    assert_eq!(*fishery.get_pixel(3, 3), Rgba([200, 30, 30, 255]));
    let fish = &catalog.icons().category(IconCategory::Products)[&120];
    assert_eq!(*fish.get_pixel(0, 0), Rgba([30, 30, 200, 255]));
    assert!(catalog
        .icons()
        .category(IconCategory::PopulationLevels)
        .contains_key(&15000000));

    assert_eq!(catalog.factories_for(120).collect::<Vec<_>>(), vec![1010]);
}

#[test]
fn test_missing_ui_texts_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_data_dir(dir.path(), PARAMS, None);

    let result = load_catalog(dir.path());
    assert!(matches!(result, Err(CatalogError::UiTextsMissing(_))));
}

#[test]
fn test_undeclared_atlas() {
    let dir = tempfile::tempdir().unwrap();
    let params = PARAMS.replace(r#""icons": ["atlas.png"],"#, r#""icons": [],"#);
    write_data_dir(dir.path(), &params, Some(UI_TEXTS));

    match load_catalog(dir.path()) {
        Err(CatalogError::UnknownAtlas(name)) => assert_eq!(name, "atlas.png"),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_ui_text_with_invalid_key() {
    let dir = tempfile::tempdir().unwrap();
    write_data_dir(dir.path(), PARAMS, Some(r#"{ "english": { "title": "Statistics" } }"#));

    assert!(matches!(
        load_catalog(dir.path()),
        Err(CatalogError::InvalidGuid(key)) if key == "title"
    ));
}
