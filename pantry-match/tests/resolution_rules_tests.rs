//! End-to-end checks of the normalize -> query -> score path.

use pantry_core::{Product, SizeUnit, Store, TargetSize};
use pantry_match::*;

#[test]
fn taxonomy_keys_normalize_to_search_names() {
    assert_eq!(clean_name("egg_whole_chicken"), "eggs");
    assert_eq!(clean_name("milk_regular_cow"), "full cream milk");
}

#[test]
fn whole_food_classification() {
    assert!(is_whole_food(&clean_name("fresh garlic")));
    assert!(!is_whole_food(&clean_name("banana yoghurt")));
}

#[test]
fn garlic_search_picks_the_bulb() {
    let spec = build_spec("garlic");
    let queries = build_query_set(&spec, Store::Coles);
    assert_eq!(queries.normal_query, "coles garlic");

    let results = vec![
        Product::named("Garlic Prawns Marinade"),
        Product::named("Garlic Bulb 3 Pack"),
    ];
    let scored = score_products(&results, &spec);
    assert!(!scored[0].result.pass);
    assert_eq!(scored[0].result.score, 0.0);
    assert!(scored[1].result.pass);

    let best = best_match(&results, &spec).map(|b| b.product.name);
    assert_eq!(best.as_deref(), Some("Garlic Bulb 3 Pack"));
}

#[test]
fn milk_with_target_size() {
    let spec = build_spec("milk_regular_cow").with_target_size(TargetSize::new(2.0, SizeUnit::L));
    let queries = build_query_set(&spec, Store::Woolworths);
    assert_eq!(queries.tight_query, "woolworths full cream milk 2l");
    assert_eq!(queries.wide_query, "woolworths milk");

    let results = vec![
        Product::named("Pauls Smarter White Milk 3L").with_category("Dairy, Eggs & Fridge"),
        Product::named("Woolworths Full Cream Milk 2L").with_category("Dairy, Eggs & Fridge"),
        Product::named("Milk Arrowroot Biscuits 250g").with_category("Pantry"),
    ];
    let best = best_match(&results, &spec).map(|b| b.product.name);
    assert_eq!(best.as_deref(), Some("Woolworths Full Cream Milk 2L"));
}
