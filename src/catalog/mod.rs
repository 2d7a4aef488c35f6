//! Static reference data
//!
//! Keyword dictionaries, icon catalogs and product to factory links. The
//! catalog is built once at startup and then shared read-only by every
//! recognizer; nothing in it changes while screenshots are processed.

pub mod loader;

use std::collections::{BTreeMap, BTreeSet};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

pub use loader::{load_catalog, CatalogError};

/// Stable asset identifier shared by dictionaries, icons and production links
pub type Guid = u32;

/// GUID keyed display names of one category
pub type Keywords = BTreeMap<Guid, String>;

/// GUID keyed reference icons of one category
pub type IconSet = BTreeMap<Guid, RgbaImage>;

/// Product GUID to the GUIDs of the factories producing it
pub type ProductionLinks = BTreeMap<Guid, BTreeSet<Guid>>;

/// Keyword categories of a dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextCategory {
    Buildings,
    Products,
    PopulationLevels,
    UiTexts,
}

/// Icon categories of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IconCategory {
    Buildings,
    Products,
    PopulationLevels,
}

/// Display names of one UI language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordDictionary {
    pub buildings: Keywords,
    pub products: Keywords,
    pub population_levels: Keywords,
    pub ui_texts: Keywords,
}

impl KeywordDictionary {
    /// Names of one category
    pub fn category(&self, category: TextCategory) -> &Keywords {
        match category {
            TextCategory::Buildings => &self.buildings,
            TextCategory::Products => &self.products,
            TextCategory::PopulationLevels => &self.population_levels,
            TextCategory::UiTexts => &self.ui_texts,
        }
    }

    fn category_mut(&mut self, category: TextCategory) -> &mut Keywords {
        match category {
            TextCategory::Buildings => &mut self.buildings,
            TextCategory::Products => &mut self.products,
            TextCategory::PopulationLevels => &mut self.population_levels,
            TextCategory::UiTexts => &mut self.ui_texts,
        }
    }

    /// Sub-dictionary of the given UI phrases. Unknown GUIDs are skipped.
    pub fn phrases(&self, guids: &[Guid]) -> Keywords {
        guids
            .iter()
            .filter_map(|guid| {
                let text = self.ui_texts.get(guid);
                if text.is_none() {
                    log::warn!("UI text {} missing from dictionary", guid);
                }
                text.map(|text| (*guid, text.clone()))
            })
            .collect()
    }

    /// Display name of a GUID in any category
    pub fn name_of(&self, guid: Guid) -> Option<&str> {
        [
            &self.buildings,
            &self.products,
            &self.population_levels,
            &self.ui_texts,
        ]
        .into_iter()
        .find_map(|keywords| keywords.get(&guid))
        .map(String::as_str)
    }
}

/// Reference icons, independent of the UI language
#[derive(Debug, Clone, Default)]
pub struct IconCatalog {
    pub buildings: IconSet,
    pub products: IconSet,
    pub population_levels: IconSet,
}

impl IconCatalog {
    /// Reference icons of one category
    pub fn category(&self, category: IconCategory) -> &IconSet {
        match category {
            IconCategory::Buildings => &self.buildings,
            IconCategory::Products => &self.products,
            IconCategory::PopulationLevels => &self.population_levels,
        }
    }

    fn category_mut(&mut self, category: IconCategory) -> &mut IconSet {
        match category {
            IconCategory::Buildings => &mut self.buildings,
            IconCategory::Products => &mut self.products,
            IconCategory::PopulationLevels => &mut self.population_levels,
        }
    }
}

/// Everything the reader knows about the game before seeing a screenshot
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    dictionaries: BTreeMap<String, KeywordDictionary>,
    icons: IconCatalog,
    production: ProductionLinks,
}

impl Catalog {
    /// Empty catalog without languages
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a language. Declaring it twice keeps the existing entries.
    pub fn add_language(&mut self, language: &str) -> &mut KeywordDictionary {
        self.dictionaries.entry(language.to_string()).or_default()
    }

    /// Add a display name, declaring `language` if needed
    pub fn insert_text(
        &mut self,
        language: &str,
        category: TextCategory,
        guid: Guid,
        text: impl Into<String>,
    ) {
        self.add_language(language)
            .category_mut(category)
            .insert(guid, text.into());
    }

    /// Add a reference icon; a later icon for the same GUID replaces it
    pub fn insert_icon(&mut self, category: IconCategory, guid: Guid, icon: RgbaImage) {
        self.icons.category_mut(category).insert(guid, icon);
    }

    /// Record that `factories` produce `product`
    pub fn link_product(&mut self, product: Guid, factories: impl IntoIterator<Item = Guid>) {
        self.production
            .entry(product)
            .or_default()
            .extend(factories);
    }

    /// True if names exist for `language`
    pub fn has_dictionary(&self, language: &str) -> bool {
        self.dictionaries.contains_key(language)
    }

    /// Names in `language`
    pub fn dictionary(&self, language: &str) -> Option<&KeywordDictionary> {
        self.dictionaries.get(language)
    }

    /// Declared languages in alphabetical order
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.dictionaries.keys().map(String::as_str)
    }

    /// Language independent reference icons
    pub fn icons(&self) -> &IconCatalog {
        &self.icons
    }

    /// Factories producing `product`; empty for unknown products
    pub fn factories_for(&self, product: Guid) -> impl Iterator<Item = Guid> + '_ {
        self.production
            .get(&product)
            .into_iter()
            .flat_map(|factories| factories.iter().copied())
    }
}
