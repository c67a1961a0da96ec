use std::path::Path;

use super::*;

#[test]
fn builtin_profiles_cover_known_retailers() {
    let profiles = RetailerProfiles::builtin();
    for retailer in [Retailer::Woolworths, Retailer::Coles, Retailer::Aldi] {
        assert!(profiles.contains(&retailer), "missing profile for {retailer}");
        assert_eq!(profiles.get(&retailer).retailer, retailer);
    }
}

#[test]
fn unknown_retailer_falls_back_to_generic_fields() {
    let profiles = RetailerProfiles::builtin();
    let profile = profiles.get(&Retailer::Other("iga".to_string()));
    assert_eq!(profile.fields, FieldMap::generic());
    assert!(profile.selectors.is_empty());
}

#[test]
fn overrides_are_tried_before_generic_candidates() {
    let fields = FieldMap::with_overrides(&FieldOverrides {
        price: vec!["priceNumeric".to_string(), "price".to_string()],
        ..FieldOverrides::default()
    });
    assert_eq!(fields.price[0], "priceNumeric");
    assert_eq!(fields.price[1], "price");
    // "price" is not repeated further down the list.
    assert_eq!(fields.price.iter().filter(|p| *p == "price").count(), 1);
    assert_eq!(fields.name, FieldMap::generic().name);
}

#[test]
fn coles_profile_reads_pricing_block_first() {
    let coles = RetailerProfile::coles();
    assert_eq!(coles.fields.price[0], "pricing.now");
    assert_eq!(coles.fields.was_price[0], "pricing.was");
    assert_eq!(
        coles.state_markers,
        vec![StateMarker::ScriptId("__NEXT_DATA__".to_string())]
    );
}

#[test]
fn woolworths_profile_builds_product_urls_from_stockcode() {
    let woolworths = RetailerProfile::woolworths();
    assert!(woolworths
        .product_url_template
        .as_deref()
        .is_some_and(|t| t.contains("{Stockcode}")));
    assert_eq!(woolworths.fields.source_id[0], "Stockcode");
}

#[test]
fn parse_profiles_from_yaml() {
    let yaml = r"
retailers:
  - id: IGA
    base_url: https://www.igashop.com.au
    state_markers:
      - assignment: window.__PRELOADED_STATE__
      - script_id: __NEXT_DATA__
    selectors: ['.product-card']
    fields:
      price: [priceNumeric]
";
    let file = parse_retailer_profiles(yaml).unwrap();
    assert_eq!(file.retailers.len(), 1);
    let profile = file.retailers[0].clone().into_profile();
    assert_eq!(profile.retailer, Retailer::Other("iga".to_string()));
    assert_eq!(profile.display_name, "iga");
    assert_eq!(
        profile.state_markers,
        vec![
            StateMarker::Assignment("window.__PRELOADED_STATE__".to_string()),
            StateMarker::ScriptId("__NEXT_DATA__".to_string()),
        ]
    );
    assert_eq!(profile.fields.price[0], "priceNumeric");
}

#[test]
fn yaml_entry_replaces_builtin_with_same_id() {
    let yaml = r"
retailers:
  - id: aldi
    selectors: ['.tile']
";
    let profiles = RetailerProfiles::with_file(parse_retailer_profiles(yaml).unwrap());
    let aldi = profiles.get(&Retailer::Aldi);
    assert_eq!(aldi.selectors, vec![".tile".to_string()]);
    assert!(aldi.default_brand.is_none());
    assert!(profiles.contains(&Retailer::Coles));
}

#[test]
fn rejects_duplicate_ids() {
    let yaml = r"
retailers:
  - id: iga
  - id: IGA
";
    let err = parse_retailer_profiles(yaml).unwrap_err();
    assert!(
        matches!(err, ConfigError::Validation(ref msg) if msg.contains("duplicate")),
        "unexpected error: {err:?}"
    );
}

#[test]
fn rejects_alias_of_an_earlier_id() {
    let yaml = r"
retailers:
  - id: woolworths
  - id: woolies
";
    let err = parse_retailer_profiles(yaml).unwrap_err();
    assert!(
        matches!(err, ConfigError::Validation(ref msg) if msg.contains("woolies")),
        "unexpected error: {err:?}"
    );
}

#[test]
fn rejects_blank_id() {
    let yaml = "retailers:\n  - id: '  '\n";
    let err = parse_retailer_profiles(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn rejects_blank_selector() {
    let yaml = "retailers:\n  - id: iga\n    selectors: ['']\n";
    let err = parse_retailer_profiles(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("selector")));
}

#[test]
fn rejects_empty_path_segment() {
    let yaml = "retailers:\n  - id: iga\n    fields:\n      price: ['pricing..now']\n";
    let err = parse_retailer_profiles(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("key path")));
}

#[test]
fn rejects_unbalanced_template() {
    let yaml = "retailers:\n  - id: iga\n    product_url_template: 'https://x/{id'\n";
    let err = parse_retailer_profiles(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("template")));
}

#[test]
fn rejects_unknown_field_keys() {
    let yaml = "retailers:\n  - id: iga\n    fields:\n      cost: [price]\n";
    let err = parse_retailer_profiles(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::RetailersFileParse(_)));
}

#[test]
fn missing_file_reports_path() {
    let err = load_retailer_profiles(Path::new("/nonexistent/retailers.yaml")).unwrap_err();
    assert!(
        matches!(err, ConfigError::RetailersFileIo { ref path, .. } if path.contains("retailers.yaml"))
    );
}

#[test]
fn load_real_retailers_yaml() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/retailers.yaml");
    assert!(
        path.exists(),
        "retailers.yaml missing at {path:?}"
    );
    let result = load_retailer_profiles(&path);
    assert!(result.is_ok(), "failed to load retailers.yaml: {result:?}");
    let profiles = RetailerProfiles::with_file(result.unwrap());
    assert!(profiles.contains(&Retailer::Other("iga".to_string())));
    assert!(profiles.contains(&Retailer::Other("harris-farm".to_string())));
}
