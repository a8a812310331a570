use super::*;

// -----------------------------------------------------------------------
// normalize_price
// -----------------------------------------------------------------------

#[test]
fn normalize_price_strips_symbol_and_thousands_separator() {
    assert_eq!(normalize_price("$1,234.5").as_deref(), Some("1234.50"));
}

#[test]
fn normalize_price_rejects_non_numeric() {
    assert_eq!(normalize_price("free"), None);
    assert_eq!(normalize_price(""), None);
    assert_eq!(normalize_price("."), None);
}

#[test]
fn normalize_price_rejects_multiple_decimal_points() {
    assert_eq!(normalize_price("1.2.3"), None);
}

#[test]
fn normalize_price_rounds_half_up() {
    assert_eq!(normalize_price("19.995").as_deref(), Some("20.00"));
    assert_eq!(normalize_price("0.125").as_deref(), Some("0.13"));
    assert_eq!(normalize_price("0.124").as_deref(), Some("0.12"));
}

#[test]
fn normalize_price_pads_integers_and_bare_points() {
    assert_eq!(normalize_price("USD 45").as_deref(), Some("45.00"));
    assert_eq!(normalize_price(".5").as_deref(), Some("0.50"));
    assert_eq!(normalize_price("7.").as_deref(), Some("7.00"));
}

#[test]
fn normalize_price_ignores_trailing_words() {
    assert_eq!(normalize_price("$9.99 shipping").as_deref(), Some("9.99"));
}

#[test]
fn normalize_price_is_idempotent() {
    for raw in ["$1,234.5", "€ 0.999", "12", "£3.10 each", "99.995"] {
        let once = normalize_price(raw).unwrap();
        assert_eq!(normalize_price(&once).as_deref(), Some(once.as_str()), "raw {raw}");
    }
}

#[test]
fn normalize_price_value_accepts_numbers_and_strings() {
    assert_eq!(
        normalize_price_value(&serde_json::json!(19.99)).as_deref(),
        Some("19.99")
    );
    assert_eq!(
        normalize_price_value(&serde_json::json!(30)).as_deref(),
        Some("30.00")
    );
    assert_eq!(
        normalize_price_value(&serde_json::json!("29.9")).as_deref(),
        Some("29.90")
    );
    assert_eq!(normalize_price_value(&serde_json::json!(null)), None);
}

// -----------------------------------------------------------------------
// infer_currency / canonical_currency
// -----------------------------------------------------------------------

#[test]
fn infer_currency_first_matching_candidate_wins() {
    assert_eq!(infer_currency(["no price here", "€12,00", "$5"]), Some("EUR"));
}

#[test]
fn infer_currency_is_case_insensitive() {
    assert_eq!(infer_currency(["Price: 12 GBP"]), Some("GBP"));
    assert_eq!(infer_currency(["cad 40"]), Some("CAD"));
}

#[test]
fn infer_currency_dollar_symbol_maps_to_usd() {
    assert_eq!(infer_currency(["$19.99"]), Some("USD"));
}

#[test]
fn infer_currency_none_when_nothing_matches() {
    assert_eq!(infer_currency(["19.99", ""]), None);
    assert_eq!(infer_currency(Vec::<String>::new()), None);
}

#[test]
fn canonical_currency_uppercases_codes() {
    assert_eq!(canonical_currency(" usd ").as_deref(), Some("USD"));
    assert_eq!(canonical_currency("chf").as_deref(), Some("CHF"));
}

#[test]
fn canonical_currency_maps_symbols() {
    assert_eq!(canonical_currency("£").as_deref(), Some("GBP"));
    assert_eq!(canonical_currency("n/a"), None);
}
