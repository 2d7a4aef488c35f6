//! Catalog loading from the data directory
//!
//! Layout of the data directory:
//!
//! ```text
//! texts/params.json     languages, icon atlases and assets with localized names
//! texts/ui_texts.json   {language: {guid: text}}
//! icons/<atlas>         icon atlases referenced by params.json
//! ```
//!
//! Every failure here is fatal for the reader, so the loader returns errors
//! instead of skipping entries.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::Deserialize;
use thiserror::Error;

use super::{Catalog, Guid, IconCategory, TextCategory};

/// Startup data that is missing or unusable
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to load icon atlas {}: {source}", .path.display())]
    Atlas {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Icon atlas {0} is not declared in params.json")]
    UnknownAtlas(String),
    #[error("Icon of asset {guid} lies outside atlas {atlas}")]
    IconOutOfBounds { guid: Guid, atlas: String },
    #[error("Language {0} is used but not declared")]
    UnknownLanguage(String),
    #[error("UI text key {0} is not a GUID")]
    InvalidGuid(String),
    #[error("UI texts not found at {}", .0.display())]
    UiTextsMissing(PathBuf),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    languages: Vec<String>,
    #[serde(default)]
    icons: Vec<String>,
    #[serde(default)]
    factories: Vec<Asset>,
    #[serde(default)]
    residence_buildings: Vec<Asset>,
    #[serde(default)]
    public_buildings: Vec<Asset>,
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    population_levels: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Asset {
    guid: Guid,
    icon: Option<IconRef>,
    #[serde(default)]
    loca_text: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Product {
    guid: Guid,
    icon: Option<IconRef>,
    #[serde(default)]
    loca_text: BTreeMap<String, String>,
    producers: Option<Vec<Guid>>,
}

#[derive(Debug, Deserialize)]
struct IconRef {
    path: String,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

type UiTexts = BTreeMap<String, BTreeMap<String, String>>;

/// Load the catalog from `data_dir`
pub fn load_catalog(data_dir: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let data_dir = data_dir.as_ref();
    let params: Params = read_json(&data_dir.join("texts").join("params.json"))?;

    let mut catalog = Catalog::new();
    for language in &params.languages {
        catalog.add_language(language);
    }

    let mut atlases = BTreeMap::new();
    for name in &params.icons {
        let path = data_dir.join("icons").join(name);
        let atlas = image::open(&path)
            .map_err(|source| CatalogError::Atlas { path, source })?
            .to_rgba8();
        atlases.insert(name.clone(), atlas);
    }

    log::debug!("Loading buildings");
    for asset in params
        .factories
        .iter()
        .chain(&params.residence_buildings)
        .chain(&params.public_buildings)
    {
        add_icon(&mut catalog, &atlases, IconCategory::Buildings, asset.guid, asset.icon.as_ref())?;
        add_texts(&mut catalog, TextCategory::Buildings, asset.guid, &asset.loca_text)?;
    }

    log::debug!("Loading products");
    for product in &params.products {
        let Some(producers) = &product.producers else {
            continue;
        };
        catalog.link_product(product.guid, producers.iter().copied());
        add_texts(&mut catalog, TextCategory::Products, product.guid, &product.loca_text)?;
        add_icon(&mut catalog, &atlases, IconCategory::Products, product.guid, product.icon.as_ref())?;
    }

    log::debug!("Loading population levels");
    for level in &params.population_levels {
        add_icon(&mut catalog, &atlases, IconCategory::PopulationLevels, level.guid, level.icon.as_ref())?;
        add_texts(&mut catalog, TextCategory::PopulationLevels, level.guid, &level.loca_text)?;
    }

    log::debug!("Loading UI texts");
    let ui_texts_path = data_dir.join("texts").join("ui_texts.json");
    if !ui_texts_path.is_file() {
        return Err(CatalogError::UiTextsMissing(ui_texts_path));
    }
    let ui_texts: UiTexts = read_json(&ui_texts_path)?;
    for (language, entries) in &ui_texts {
        ensure_language(&catalog, language)?;
        for (key, text) in entries {
            let guid = key
                .trim()
                .parse::<Guid>()
                .map_err(|_| CatalogError::InvalidGuid(key.clone()))?;
            catalog.insert_text(language, TextCategory::UiTexts, guid, text.as_str());
        }
    }

    log::info!(
        "Catalog loaded: {} languages, {} building icons, {} product icons, {} population icons",
        params.languages.len(),
        catalog.icons().buildings.len(),
        catalog.icons().products.len(),
        catalog.icons().population_levels.len()
    );
    Ok(catalog)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CatalogError> {
    let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_language(catalog: &Catalog, language: &str) -> Result<(), CatalogError> {
    if catalog.has_dictionary(language) {
        Ok(())
    } else {
        Err(CatalogError::UnknownLanguage(language.to_string()))
    }
}

fn add_texts(
    catalog: &mut Catalog,
    category: TextCategory,
    guid: Guid,
    loca_text: &BTreeMap<String, String>,
) -> Result<(), CatalogError> {
    for (language, text) in loca_text {
        ensure_language(catalog, language)?;
        catalog.insert_text(language, category, guid, text.as_str());
    }
    Ok(())
}

fn add_icon(
    catalog: &mut Catalog,
    atlases: &BTreeMap<String, RgbaImage>,
    category: IconCategory,
    guid: Guid,
    icon: Option<&IconRef>,
) -> Result<(), CatalogError> {
    let Some(icon) = icon else {
        return Ok(());
    };
    let atlas = atlases
        .get(&icon.path)
        .ok_or_else(|| CatalogError::UnknownAtlas(icon.path.clone()))?;

    let fits = icon.width > 0
        && icon.height > 0
        && icon.x.checked_add(icon.width).is_some_and(|right| right <= atlas.width())
        && icon.y.checked_add(icon.height).is_some_and(|bottom| bottom <= atlas.height());
    if !fits {
        return Err(CatalogError::IconOutOfBounds {
            guid,
            atlas: icon.path.clone(),
        });
    }

    // The first icon registered for a GUID wins
    if !catalog.icons().category(category).contains_key(&guid) {
        let cropped = image::imageops::crop_imm(atlas, icon.x, icon.y, icon.width, icon.height);
        catalog.insert_icon(category, guid, cropped.to_image());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_deserialize() {
        let params: Params = serde_json::from_str(
            r#"{
                "languages": ["english"],
                "products": [
                    { "guid": 120, "locaText": { "english": "Fish" }, "producers": [1010] },
                    { "guid": 121, "locaText": { "english": "Ore" } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(params.products.len(), 2);
        assert_eq!(params.products[0].producers.as_deref(), Some(&[1010][..]));
        assert!(params.products[1].producers.is_none());
        assert!(params.factories.is_empty());
    }

    #[test]
    fn test_missing_data_dir() {
        let err = load_catalog("/nonexistent/anno-data").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_icon_out_of_bounds() {
        let mut catalog = Catalog::new();
        let mut atlases = BTreeMap::new();
        atlases.insert("atlas.png".to_string(), RgbaImage::new(16, 16));
        let icon = IconRef {
            path: "atlas.png".to_string(),
            x: 8,
            y: 8,
            width: 16,
            height: 4,
        };

        let err = add_icon(&mut catalog, &atlases, IconCategory::Buildings, 1, Some(&icon));
        assert!(matches!(err, Err(CatalogError::IconOutOfBounds { guid: 1, .. })));
    }

    #[test]
    fn test_unknown_language() {
        let mut catalog = Catalog::new();
        catalog.add_language("english");
        let texts = BTreeMap::from([("klingon".to_string(), "tlhIngan".to_string())]);

        let err = add_texts(&mut catalog, TextCategory::Buildings, 1, &texts);
        assert!(matches!(err, Err(CatalogError::UnknownLanguage(l)) if l == "klingon"));
    }
}
