//! Declarative per-retailer extraction profiles.
//!
//! A [`RetailerProfile`] tells the shared normalizer which source keys feed
//! each canonical [`crate::Product`] field, and tells the strategy chain which
//! site-verified markers and selectors to try before the generic ones. Adding
//! a retailer is a data change: either a built-in profile here or an entry in
//! the YAML file named by `SHELFSCAN_RETAILERS_PATH`.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::products::Retailer;
use crate::ConfigError;

/// Where a serialized page-state blob lives in an HTML page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMarker {
    /// `<script id="...">{json}</script>`
    ScriptId(String),
    /// `<name> = {json};` inside any script, e.g. `window.__INITIAL_STATE__`.
    Assignment(String),
}

/// Ordered candidate key paths for each canonical product field.
///
/// Paths are dot-separated (`pricing.now`, `imageUris.0.uri`). The first
/// candidate that resolves to a non-null scalar wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    pub name: Vec<String>,
    pub price: Vec<String>,
    pub was_price: Vec<String>,
    /// Boolean "is on special" style flags. Informative only.
    pub on_sale_flag: Vec<String>,
    pub promotion_type: Vec<String>,
    pub unit_price: Vec<String>,
    pub unit_label: Vec<String>,
    pub brand: Vec<String>,
    pub size: Vec<String>,
    pub description: Vec<String>,
    pub image: Vec<String>,
    pub product_url: Vec<String>,
    pub source_id: Vec<String>,
    pub category: Vec<String>,
}

/// Candidate lists as written in a profile: every list is optional and is
/// placed ahead of the generic candidates for the same field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldOverrides {
    pub name: Vec<String>,
    pub price: Vec<String>,
    pub was_price: Vec<String>,
    pub on_sale_flag: Vec<String>,
    pub promotion_type: Vec<String>,
    pub unit_price: Vec<String>,
    pub unit_label: Vec<String>,
    pub brand: Vec<String>,
    pub size: Vec<String>,
    pub description: Vec<String>,
    pub image: Vec<String>,
    pub product_url: Vec<String>,
    pub source_id: Vec<String>,
    pub category: Vec<String>,
}

fn owned(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| (*p).to_string()).collect()
}

/// Puts `preferred` ahead of `base`, dropping later duplicates.
fn prefer(preferred: &[String], base: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    preferred
        .iter()
        .chain(base)
        .filter(|p| seen.insert(p.as_str()))
        .cloned()
        .collect()
}

impl FieldMap {
    /// Candidates that cover the shapes seen across Next.js state, JSON-LD,
    /// JSON search APIs and records built from markup tiles.
    #[must_use]
    pub fn generic() -> Self {
        Self {
            name: owned(&[
                "name",
                "Name",
                "DisplayName",
                "title",
                "productName",
                "itemOffered.name",
            ]),
            price: owned(&[
                "pricing.now",
                "price.now",
                "Price",
                "price",
                "offers.price",
                "offers.lowPrice",
                "currentPrice",
            ]),
            was_price: owned(&["pricing.was", "price.was", "WasPrice", "wasPrice", "was_price"]),
            on_sale_flag: owned(&["IsOnSpecial", "isOnSpecial", "onSale", "on_sale"]),
            promotion_type: owned(&["pricing.promotionType", "promotionType"]),
            unit_price: owned(&["pricing.unit.price", "CupPrice", "unitPrice", "unit_price"]),
            unit_label: owned(&[
                "pricing.unit.ofMeasureUnits",
                "CupMeasure",
                "unitOfMeasure",
                "unit",
            ]),
            brand: owned(&["brand.name", "brand", "Brand"]),
            size: owned(&["size", "Size", "PackageSize", "packageSize"]),
            description: owned(&["description", "Description"]),
            image: owned(&[
                "imageUrl",
                "image_url",
                "image.url",
                "image",
                "image.0",
                "MediumImageFile",
                "imageUris.0.uri",
                "thumbnail",
            ]),
            product_url: owned(&["url", "productUrl", "product_url", "link"]),
            source_id: owned(&[
                "productId",
                "productID",
                "product_id",
                "Stockcode",
                "sku",
                "id",
            ]),
            category: owned(&["category", "Category", "categoryName"]),
        }
    }

    /// The generic map with `overrides` tried first for every field.
    #[must_use]
    pub fn with_overrides(overrides: &FieldOverrides) -> Self {
        let generic = Self::generic();
        Self {
            name: prefer(&overrides.name, &generic.name),
            price: prefer(&overrides.price, &generic.price),
            was_price: prefer(&overrides.was_price, &generic.was_price),
            on_sale_flag: prefer(&overrides.on_sale_flag, &generic.on_sale_flag),
            promotion_type: prefer(&overrides.promotion_type, &generic.promotion_type),
            unit_price: prefer(&overrides.unit_price, &generic.unit_price),
            unit_label: prefer(&overrides.unit_label, &generic.unit_label),
            brand: prefer(&overrides.brand, &generic.brand),
            size: prefer(&overrides.size, &generic.size),
            description: prefer(&overrides.description, &generic.description),
            image: prefer(&overrides.image, &generic.image),
            product_url: prefer(&overrides.product_url, &generic.product_url),
            source_id: prefer(&overrides.source_id, &generic.source_id),
            category: prefer(&overrides.category, &generic.category),
        }
    }

    fn all_paths(&self) -> impl Iterator<Item = &String> {
        [
            &self.name,
            &self.price,
            &self.was_price,
            &self.on_sale_flag,
            &self.promotion_type,
            &self.unit_price,
            &self.unit_label,
            &self.brand,
            &self.size,
            &self.description,
            &self.image,
            &self.product_url,
            &self.source_id,
            &self.category,
        ]
        .into_iter()
        .flatten()
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self::generic()
    }
}

/// Everything the engine needs to know about one retailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetailerProfile {
    pub retailer: Retailer,
    pub display_name: String,
    /// Origin used to resolve relative product links.
    pub base_url: Option<String>,
    /// Origin used to resolve relative image paths. Falls back to `base_url`.
    pub image_base_url: Option<String>,
    /// Product URL built from record fields, e.g. `https://shop/product/{id}`.
    pub product_url_template: Option<String>,
    pub default_brand: Option<String>,
    pub default_category: Option<String>,
    /// Page-state markers tried before the generic ones.
    pub state_markers: Vec<StateMarker>,
    /// Site-verified tile selectors tried before the generic ones.
    pub selectors: Vec<String>,
    pub fields: FieldMap,
}

impl RetailerProfile {
    /// Profile used for any retailer without its own entry.
    #[must_use]
    pub fn generic(retailer: Retailer) -> Self {
        let display_name = retailer.id().to_string();
        Self {
            retailer,
            display_name,
            base_url: None,
            image_base_url: None,
            product_url_template: None,
            default_brand: None,
            default_category: None,
            state_markers: vec![],
            selectors: vec![],
            fields: FieldMap::generic(),
        }
    }

    /// Woolworths' public search API (`/apis/ui/Search/products`): products
    /// are grouped as `Products[].Products[]` with PascalCase keys.
    #[must_use]
    pub fn woolworths() -> Self {
        Self {
            display_name: "Woolworths".to_string(),
            base_url: Some("https://www.woolworths.com.au".to_string()),
            product_url_template: Some(
                "https://www.woolworths.com.au/shop/productdetails/{Stockcode}/{UrlFriendlyName}"
                    .to_string(),
            ),
            fields: FieldMap::with_overrides(&FieldOverrides {
                name: owned(&["DisplayName", "Name"]),
                price: owned(&["Price", "InstorePrice"]),
                was_price: owned(&["WasPrice", "InstoreWasPrice"]),
                on_sale_flag: owned(&["IsOnSpecial", "IsHalfPrice"]),
                unit_price: owned(&["CupPrice", "InstoreCupPrice"]),
                unit_label: owned(&["CupMeasure"]),
                brand: owned(&["Brand"]),
                size: owned(&["PackageSize"]),
                description: owned(&["Description"]),
                image: owned(&["MediumImageFile", "SmallImageFile", "LargeImageFile"]),
                source_id: owned(&["Stockcode"]),
                ..FieldOverrides::default()
            }),
            ..Self::generic(Retailer::Woolworths)
        }
    }

    /// Coles search and browse pages, served from Next.js `__NEXT_DATA__`.
    #[must_use]
    pub fn coles() -> Self {
        Self {
            display_name: "Coles".to_string(),
            base_url: Some("https://www.coles.com.au".to_string()),
            image_base_url: Some("https://productimages.coles.com.au/productimages".to_string()),
            product_url_template: Some("https://www.coles.com.au/product/{id}".to_string()),
            state_markers: vec![StateMarker::ScriptId("__NEXT_DATA__".to_string())],
            selectors: owned(&[r#"[data-testid="product-tile"]"#]),
            fields: FieldMap::with_overrides(&FieldOverrides {
                name: owned(&["name"]),
                price: owned(&["pricing.now"]),
                was_price: owned(&["pricing.was"]),
                promotion_type: owned(&["pricing.promotionType"]),
                unit_price: owned(&["pricing.unit.price"]),
                unit_label: owned(&["pricing.unit.ofMeasureUnits"]),
                image: owned(&["imageUris.0.uri"]),
                source_id: owned(&["id"]),
                ..FieldOverrides::default()
            }),
            ..Self::generic(Retailer::Coles)
        }
    }

    /// ALDI category pages: server-rendered `.product-tile` elements whose
    /// price text reads like `"($1.49 per 1 each)"`.
    #[must_use]
    pub fn aldi() -> Self {
        Self {
            display_name: "ALDI".to_string(),
            base_url: Some("https://www.aldi.com.au".to_string()),
            default_brand: Some("ALDI".to_string()),
            selectors: owned(&[".product-tile"]),
            ..Self::generic(Retailer::Aldi)
        }
    }
}

/// One profile entry in the retailers YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetailerProfileConfig {
    pub id: String,
    pub display_name: Option<String>,
    pub base_url: Option<String>,
    pub image_base_url: Option<String>,
    pub product_url_template: Option<String>,
    pub default_brand: Option<String>,
    pub default_category: Option<String>,
    /// Written as single-key maps, e.g. `- script_id: __NEXT_DATA__`.
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub state_markers: Vec<StateMarker>,
    #[serde(default)]
    pub selectors: Vec<String>,
    #[serde(default)]
    pub fields: FieldOverrides,
}

impl RetailerProfileConfig {
    /// Converts the entry into a full profile, filling unspecified fields
    /// from the generic defaults.
    #[must_use]
    pub fn into_profile(self) -> RetailerProfile {
        let retailer = Retailer::from(self.id.as_str());
        let display_name = self
            .display_name
            .unwrap_or_else(|| retailer.id().to_string());
        RetailerProfile {
            retailer,
            display_name,
            base_url: self.base_url,
            image_base_url: self.image_base_url,
            product_url_template: self.product_url_template,
            default_brand: self.default_brand,
            default_category: self.default_category,
            state_markers: self.state_markers,
            selectors: self.selectors,
            fields: FieldMap::with_overrides(&self.fields),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RetailersFile {
    pub retailers: Vec<RetailerProfileConfig>,
}

/// Read-only set of retailer profiles, built once at start-up.
#[derive(Debug, Clone)]
pub struct RetailerProfiles {
    profiles: BTreeMap<Retailer, RetailerProfile>,
    fallback: RetailerProfile,
}

impl RetailerProfiles {
    /// The built-in Woolworths, Coles and ALDI profiles.
    #[must_use]
    pub fn builtin() -> Self {
        let profiles = [
            RetailerProfile::woolworths(),
            RetailerProfile::coles(),
            RetailerProfile::aldi(),
        ]
        .into_iter()
        .map(|p| (p.retailer.clone(), p))
        .collect();
        Self {
            profiles,
            fallback: RetailerProfile::generic(Retailer::Other("generic".to_string())),
        }
    }

    /// Built-ins with every entry of `file` layered on top. An entry whose id
    /// matches a built-in replaces it.
    #[must_use]
    pub fn with_file(file: RetailersFile) -> Self {
        let mut profiles = Self::builtin();
        for entry in file.retailers {
            profiles.insert(entry.into_profile());
        }
        profiles
    }

    pub fn insert(&mut self, profile: RetailerProfile) {
        self.profiles.insert(profile.retailer.clone(), profile);
    }

    /// The profile for `retailer`, or the generic profile when none is registered.
    #[must_use]
    pub fn get(&self, retailer: &Retailer) -> &RetailerProfile {
        self.profiles.get(retailer).unwrap_or(&self.fallback)
    }

    #[must_use]
    pub fn contains(&self, retailer: &Retailer) -> bool {
        self.profiles.contains_key(retailer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RetailerProfile> {
        self.profiles.values()
    }
}

impl Default for RetailerProfiles {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Load and validate retailer profiles from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_retailer_profiles(path: &Path) -> Result<RetailersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RetailersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_retailer_profiles(&content)
}

/// Parse and validate retailer profiles from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text cannot be parsed or fails validation.
pub fn parse_retailer_profiles(content: &str) -> Result<RetailersFile, ConfigError> {
    let file: RetailersFile =
        serde_yaml::from_str(content).map_err(ConfigError::RetailersFileParse)?;
    validate_retailers(&file)?;
    Ok(file)
}

fn validate_retailers(file: &RetailersFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for entry in &file.retailers {
        let id = entry.id.trim().to_lowercase();
        if id.is_empty() {
            return Err(ConfigError::Validation(
                "retailer id must be non-empty".to_string(),
            ));
        }

        if !seen_ids.insert(Retailer::from(id.as_str())) {
            return Err(ConfigError::Validation(format!(
                "duplicate retailer id: '{}'",
                entry.id
            )));
        }

        if entry.selectors.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "retailer '{id}' has a blank selector"
            )));
        }

        let blank_marker = entry.state_markers.iter().any(|m| match m {
            StateMarker::ScriptId(name) | StateMarker::Assignment(name) => name.trim().is_empty(),
        });
        if blank_marker {
            return Err(ConfigError::Validation(format!(
                "retailer '{id}' has a blank state marker"
            )));
        }

        let fields = FieldMap::with_overrides(&entry.fields);
        if fields.all_paths().any(|p| p.trim().is_empty() || p.split('.').any(str::is_empty)) {
            return Err(ConfigError::Validation(format!(
                "retailer '{id}' has an empty key path segment"
            )));
        }

        if let Some(template) = &entry.product_url_template {
            if template.matches('{').count() != template.matches('}').count() {
                return Err(ConfigError::Validation(format!(
                    "retailer '{id}' has unbalanced braces in product_url_template"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "retailers_test.rs"]
mod tests;
