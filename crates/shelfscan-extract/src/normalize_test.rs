use rust_decimal::Decimal;
use serde_json::json;
use shelfscan_core::StrategyKind;

use super::*;

fn record(strategy: StrategyKind, value: &Value) -> SourceRecord {
    SourceRecord::from_value(strategy, value).expect("non-empty object")
}

fn generic(value: &Value) -> Result<Product, RejectionReason> {
    let retailer = Retailer::Other("iga".to_string());
    let profile = RetailerProfile::generic(retailer.clone());
    normalize_record(&record(StrategyKind::AppState, value), &retailer, &profile)
}

fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal")
}

// -----------------------------------------------------------------------
// derive_sale
// -----------------------------------------------------------------------

#[test]
fn was_above_current_is_a_sale() {
    let sale = derive_sale(dec("7.50"), Some(dec("10.00")), None);
    assert!(sale.on_sale);
    assert_eq!(sale.savings, dec("2.50"));
    assert_eq!(sale.discount_percent, dec("25.0"));
    assert_eq!(sale.discount_percent.to_string(), "25.0");
}

#[test]
fn discount_rounds_half_away_from_zero() {
    assert_eq!(
        derive_sale(dec("7.90"), Some(dec("8.00")), None).discount_percent,
        dec("1.3")
    );
    assert_eq!(
        derive_sale(dec("1.99"), Some(dec("2.99")), None).discount_percent,
        dec("33.4")
    );
}

#[test]
fn was_not_above_current_is_no_sale() {
    let sale = derive_sale(dec("5.00"), Some(dec("5.00")), Some("SPECIAL"));
    assert_eq!(sale, SaleFigures::NONE);
}

#[test]
fn promotion_without_was_price_is_a_zero_savings_sale() {
    let sale = derive_sale(dec("4.00"), None, Some("SPECIAL"));
    assert!(sale.on_sale);
    assert_eq!(sale.savings, Decimal::ZERO);
    assert_eq!(sale.discount_percent, Decimal::ZERO);
}

#[test]
fn blank_promotion_is_ignored() {
    assert!(!derive_sale(dec("4.00"), None, Some("  ")).on_sale);
}

// -----------------------------------------------------------------------
// normalize_record: mandatory fields
// -----------------------------------------------------------------------

#[test]
fn empty_name_is_rejected() {
    let err = generic(&json!({"name": "", "price": 3})).unwrap_err();
    assert_eq!(err, RejectionReason::MissingName);
    let err = generic(&json!({"name": "   ", "price": 3})).unwrap_err();
    assert_eq!(err, RejectionReason::MissingName);
}

#[test]
fn missing_price_is_rejected() {
    let err = generic(&json!({"name": "Bread"})).unwrap_err();
    assert_eq!(err, RejectionReason::MissingPrice);
}

#[test]
fn unparseable_price_is_rejected() {
    let err = generic(&json!({"name": "Bread", "price": "Price unavailable"})).unwrap_err();
    assert_eq!(err, RejectionReason::UnparseablePrice);
}

#[test]
fn blank_price_falls_back_to_offer_price() {
    let product = generic(&json!({
        "name": "Bread",
        "price": "",
        "offers": {"price": "3.40"}
    }))
    .unwrap();
    assert_eq!(product.current_price, Some(dec("3.40")));
}

#[test]
fn blank_price_alone_is_missing() {
    let err = generic(&json!({"name": "Bread", "price": " "})).unwrap_err();
    assert_eq!(err, RejectionReason::MissingPrice);
}

#[test]
fn negative_price_is_rejected() {
    let err = generic(&json!({"name": "Bread", "price": -1.5})).unwrap_err();
    assert_eq!(err, RejectionReason::NegativePrice);
}

#[test]
fn zero_price_is_accepted() {
    let product = generic(&json!({"name": "Free sample", "price": 0})).unwrap();
    assert_eq!(product.current_price, Some(Decimal::ZERO));
}

// -----------------------------------------------------------------------
// normalize_record: pricing
// -----------------------------------------------------------------------

#[test]
fn sale_figures_come_from_prices() {
    let product = generic(&json!({"name": "Coffee", "price": "7.50", "wasPrice": "10.00"})).unwrap();
    assert_eq!(product.current_price, Some(dec("7.50")));
    assert_eq!(product.was_price, Some(dec("10.00")));
    assert!(product.on_sale);
    assert_eq!(product.savings, dec("2.50"));
    assert_eq!(product.discount_percent, dec("25.0"));
}

#[test]
fn source_flag_without_was_price_does_not_make_a_sale() {
    let product = generic(&json!({"name": "Tea", "Price": 4.0, "IsOnSpecial": true})).unwrap();
    assert!(!product.on_sale);
    assert_eq!(product.savings, Decimal::ZERO);
    assert_eq!(product.discount_percent, Decimal::ZERO);
}

#[test]
fn source_flag_does_not_override_price_derived_sale() {
    let product = generic(&json!({
        "name": "Tea", "Price": 4.0, "WasPrice": 5.0, "IsOnSpecial": false
    }))
    .unwrap();
    assert!(product.on_sale);
    assert_eq!(product.savings, dec("1.0"));
}

#[test]
fn zero_was_price_is_treated_as_absent() {
    let product = generic(&json!({
        "name": "Carrots",
        "pricing": {"now": 2.0, "was": 0, "promotionType": "SPECIAL"}
    }))
    .unwrap();
    assert_eq!(product.was_price, None);
    assert!(product.on_sale);
    assert_eq!(product.savings, Decimal::ZERO);
    assert_eq!(product.promotion_type.as_deref(), Some("SPECIAL"));
}

#[test]
fn price_text_with_unit_quantity_one() {
    let product = generic(&json!({"name": "Bananas", "price": "($1.49 per 1 each)"})).unwrap();
    assert_eq!(product.current_price, Some(dec("1.49")));
    assert_eq!(product.unit_label.as_deref(), Some("each"));
    assert_eq!(product.unit_price, Some(dec("1.49")));
}

#[test]
fn price_text_with_unit_quantity_derives_base_price() {
    let product = generic(&json!({"name": "Mince", "price": "$5.99 per 2 kg"})).unwrap();
    assert_eq!(product.current_price, Some(dec("5.99")));
    assert_eq!(product.unit_label.as_deref(), Some("kg"));
    assert_eq!(product.unit_price, Some(dec("2.995")));
}

#[test]
fn mapped_unit_fields_win_over_price_text() {
    let product = generic(&json!({
        "name": "Milk 2L", "price": "$3.10 per 2 L", "unitPrice": 1.55, "unitOfMeasure": "1L"
    }))
    .unwrap();
    assert_eq!(product.unit_price, Some(dec("1.55")));
    assert_eq!(product.unit_label.as_deref(), Some("1L"));
}

#[test]
fn plain_price_has_no_unit_price() {
    let product = generic(&json!({"name": "Eggs", "price": 6.5})).unwrap();
    assert_eq!(product.unit_price, None);
    assert_eq!(product.unit_label, None);
}

#[test]
fn linked_data_offer_price_is_found() {
    let retailer = Retailer::Other("iga".to_string());
    let profile = RetailerProfile::generic(retailer.clone());
    let r = record(
        StrategyKind::LinkedData,
        &json!({
            "@type": "Product",
            "name": "Butter 250g",
            "brand": {"@type": "Brand", "name": "Western Star"},
            "image": ["https://cdn.example.com/butter.jpg"],
            "offers": [{"@type": "Offer", "price": "4.20"}]
        }),
    );
    let product = normalize_record(&r, &retailer, &profile).unwrap();
    assert_eq!(product.current_price, Some(dec("4.20")));
    assert_eq!(product.brand.as_deref(), Some("Western Star"));
    assert_eq!(
        product.image_url.as_deref(),
        Some("https://cdn.example.com/butter.jpg")
    );
    assert_eq!(product.extraction_strategy, StrategyKind::LinkedData);
}

// -----------------------------------------------------------------------
// normalize_record: retailer profiles
// -----------------------------------------------------------------------

#[test]
fn coles_record_maps_pricing_block_and_images() {
    let profile = RetailerProfile::coles();
    let r = record(
        StrategyKind::AppState,
        &json!({
            "_type": "PRODUCT",
            "id": 2_511_791,
            "name": "Carrots Prepacked",
            "brand": "Coles",
            "size": "1kg",
            "pricing": {
                "now": 2.0,
                "was": 2.5,
                "unit": {"price": 2.0, "ofMeasureUnits": "kg"},
                "promotionType": "SPECIAL"
            },
            "imageUris": [{"uri": "/2/2511791.jpg"}]
        }),
    );
    let product = normalize_record(&r, &Retailer::Coles, &profile).unwrap();
    assert_eq!(product.source_id.as_deref(), Some("2511791"));
    assert_eq!(product.discount_percent, dec("20.0"));
    assert_eq!(product.unit_price, Some(dec("2.0")));
    assert_eq!(product.unit_label.as_deref(), Some("kg"));
    assert_eq!(
        product.image_url.as_deref(),
        Some("https://productimages.coles.com.au/productimages/2/2511791.jpg")
    );
    assert_eq!(
        product.product_url.as_deref(),
        Some("https://www.coles.com.au/product/2511791")
    );
}

#[test]
fn woolworths_record_fills_url_template() {
    let profile = RetailerProfile::woolworths();
    let r = record(
        StrategyKind::AppState,
        &json!({
            "Stockcode": 144_607,
            "DisplayName": "Woolworths Brown Onions 1kg",
            "UrlFriendlyName": "woolworths-brown-onions-1kg",
            "Price": 3.5,
            "WasPrice": 3.5,
            "IsOnSpecial": false,
            "CupPrice": 3.5,
            "CupMeasure": "1KG",
            "MediumImageFile": "https://cdn0.woolworths.media/content/wowproductimages/medium/144607.jpg"
        }),
    );
    let product = normalize_record(&r, &Retailer::Woolworths, &profile).unwrap();
    assert!(!product.on_sale);
    assert_eq!(product.unit_label.as_deref(), Some("1KG"));
    assert_eq!(
        product.product_url.as_deref(),
        Some("https://www.woolworths.com.au/shop/productdetails/144607/woolworths-brown-onions-1kg")
    );
}

#[test]
fn template_with_unresolved_placeholders_only_is_dropped() {
    let profile = RetailerProfile::woolworths();
    let r = record(StrategyKind::AppState, &json!({"Name": "Onions", "Price": 3}));
    let product = normalize_record(&r, &Retailer::Woolworths, &profile).unwrap();
    assert_eq!(product.product_url, None);
}

#[test]
fn template_values_are_percent_encoded() {
    let r = record(StrategyKind::AppState, &json!({"id": "a b/c"}));
    assert_eq!(
        fill_template("https://shop.example/p/{id}", &r).as_deref(),
        Some("https://shop.example/p/a%20b%2Fc")
    );
}

#[test]
fn aldi_markup_record_resolves_relative_links_and_default_brand() {
    let profile = RetailerProfile::aldi();
    let r = record(
        StrategyKind::Markup,
        &json!({
            "name": "Bananas per kg",
            "price": "$3.90",
            "image": "//dm.cms.aldi.cx/bananas.png",
            "url": "/product/bananas-000000000000054321",
            "id": "bananas-000000000000054321"
        }),
    );
    let product = normalize_record(&r, &Retailer::Aldi, &profile).unwrap();
    assert_eq!(product.brand.as_deref(), Some("ALDI"));
    assert_eq!(
        product.product_url.as_deref(),
        Some("https://www.aldi.com.au/product/bananas-000000000000054321")
    );
    assert_eq!(
        product.image_url.as_deref(),
        Some("https://dm.cms.aldi.cx/bananas.png")
    );
    assert_eq!(product.extraction_strategy, StrategyKind::Markup);
}

#[test]
fn relative_link_without_base_is_dropped() {
    let product = generic(&json!({"name": "Rice", "price": 2, "url": "/p/rice"})).unwrap();
    assert_eq!(product.product_url, None);
}

#[test]
fn rejection_reasons_serialize_as_snake_case() {
    assert_eq!(
        serde_json::to_value(RejectionReason::MissingName).unwrap(),
        json!("missing_name")
    );
}
