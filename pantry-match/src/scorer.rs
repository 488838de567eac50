//! Product validation and scoring
//!
//! Hard-fail checks run in a fixed order and short-circuit with a score of
//! exactly 0:
//!
//! 1. banned or non-food term in the product name
//! 2. ingredient-specific negative keyword
//! 3. missing required word
//! 4. category outside the allowed list
//! 5. prepared-product marker on a whole-food ingredient
//! 6. pack size outside the tolerance band (skipped for produce)
//!
//! A passing product starts at [`BASE_SCORE`] and gains word-coverage,
//! name-length and prefix bonuses before being clamped to [0, 1].

use serde::{Deserialize, Serialize};
use tracing::trace;

use pantry_core::{IngredientSpec, MatchResult, Product, Rejection, Store};

use crate::size::product_quantity;
use crate::vocab::{find_banned, find_prepared_marker, is_pantry_category, is_produce_category};
use crate::whole_food::classify;

pub const BASE_SCORE: f64 = 0.65;
pub const COVERAGE_WEIGHT: f64 = 0.15;
pub const LENGTH_BONUS: f64 = 0.10;
pub const LENGTH_PENALTY_PER_WORD: f64 = 0.12;
pub const PREFIX_BONUS: f64 = 0.10;

/// Size band for shelf-stable categories.
pub const PANTRY_SIZE_BAND: (f64, f64) = (0.5, 3.0);
/// Size band for everything else.
pub const DEFAULT_SIZE_BAND: (f64, f64) = (0.5, 2.0);

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether two tokens are equal up to a trailing "s" or "es".
fn plural_eq(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };
    match long.strip_prefix(short) {
        Some("s") | Some("es") => !short.is_empty(),
        _ => false,
    }
}

/// Word-boundary, case-insensitive, plural-tolerant containment.
fn contains_word(name_tokens: &[String], word: &str) -> bool {
    let needle = tokens(word);
    match needle.as_slice() {
        [] => true,
        [single] => name_tokens.iter().any(|t| plural_eq(t, single)),
        phrase => name_tokens.windows(phrase.len()).any(|window| {
            window
                .iter()
                .zip(phrase.iter())
                .all(|(t, w)| plural_eq(t, w))
        }),
    }
}

fn category_allowed(category: &str, allowed: &[String]) -> bool {
    let category = category.trim().to_lowercase();
    allowed.iter().any(|a| {
        let a = a.trim().to_lowercase();
        !a.is_empty() && (category == a || category.contains(&a) || a.contains(&category))
    })
}

fn is_produce(product: &Product, spec: &IngredientSpec) -> bool {
    let category_is_produce = product
        .category
        .as_deref()
        .map(is_produce_category)
        .unwrap_or(false);
    let allowed_is_produce = spec.allowed_categories.iter().any(|c| is_produce_category(c));
    let noun_is_produce = classify(&spec.clean_name)
        .map(|kind| kind.is_produce())
        .unwrap_or(false);
    category_is_produce || allowed_is_produce || noun_is_produce
}

fn size_band(product: &Product, spec: &IngredientSpec) -> (f64, f64) {
    let pantry = product
        .category
        .as_deref()
        .map(is_pantry_category)
        .unwrap_or(false)
        || spec.allowed_categories.iter().any(|c| is_pantry_category(c));
    if pantry {
        PANTRY_SIZE_BAND
    } else {
        DEFAULT_SIZE_BAND
    }
}

/// Whether the product's size sits inside the band around the target.
///
/// Missing targets, unparseable sizes and mass/volume mismatches pass.
fn size_within_band(product: &Product, spec: &IngredientSpec) -> bool {
    let Some(target) = spec.target_size.and_then(|t| t.to_base()) else {
        return true;
    };
    let Some(actual) = product_quantity(product) else {
        return true;
    };
    let Some(ratio) = actual.ratio_to(&target) else {
        return true;
    };
    let (low, high) = size_band(product, spec);
    (low..=high).contains(&ratio)
}

fn strip_store_brand(name_tokens: &[String]) -> &[String] {
    match name_tokens.first() {
        Some(first)
            if Store::ALL
                .iter()
                .any(|store| store.brand_tokens().contains(&first.as_str())) =>
        {
            &name_tokens[1..]
        }
        _ => name_tokens,
    }
}

fn hard_fail(product: &Product, spec: &IngredientSpec, name_tokens: &[String]) -> Option<Rejection> {
    let lowered = product.name.to_lowercase();

    if let Some(term) = find_banned(&product.name) {
        trace!(product = %product.name, term = %term, "Banned term");
        return Some(Rejection::BannedTerm);
    }

    if let Some(term) = spec
        .negative_keywords
        .iter()
        .map(|n| n.trim().to_lowercase())
        .find(|n| !n.is_empty() && lowered.contains(n.as_str()))
    {
        trace!(product = %product.name, term = %term, "Negative keyword");
        return Some(Rejection::NegativeKeyword);
    }

    if let Some(word) = spec
        .required_words
        .iter()
        .find(|w| !contains_word(name_tokens, w))
    {
        trace!(product = %product.name, word = %word, "Missing required word");
        return Some(Rejection::MissingRequiredWord);
    }

    if let Some(category) = product.category.as_deref() {
        if !spec.allowed_categories.is_empty()
            && !category_allowed(category, &spec.allowed_categories)
        {
            trace!(product = %product.name, category = %category, "Category not allowed");
            return Some(Rejection::CategoryMismatch);
        }
    }

    if spec.is_whole_food {
        if let Some(marker) = find_prepared_marker(&product.name) {
            trace!(product = %product.name, marker = %marker, "Prepared product");
            return Some(Rejection::PreparedProduct);
        }
    }

    if !is_produce(product, spec) && !size_within_band(product, spec) {
        trace!(product = %product.name, size = ?product.size_string, "Size out of range");
        return Some(Rejection::SizeOutOfRange);
    }

    None
}

fn soft_score(spec: &IngredientSpec, name_tokens: &[String]) -> f64 {
    let ingredient_tokens = tokens(&spec.clean_name);

    let significant: Vec<&String> = ingredient_tokens.iter().filter(|w| w.len() > 2).collect();
    let coverage = if significant.is_empty() {
        0.0
    } else {
        let found = significant
            .iter()
            .filter(|w| contains_word(name_tokens, w))
            .count();
        found as f64 / significant.len() as f64
    };

    let ideal = ingredient_tokens.len() + 2;
    let excess = name_tokens.len().saturating_sub(ideal);
    let length_term = LENGTH_BONUS - LENGTH_PENALTY_PER_WORD * excess as f64;

    let stripped = strip_store_brand(name_tokens);
    let prefix = !ingredient_tokens.is_empty()
        && stripped.len() >= ingredient_tokens.len()
        && stripped
            .iter()
            .zip(ingredient_tokens.iter())
            .all(|(t, w)| plural_eq(t, w));

    BASE_SCORE
        + COVERAGE_WEIGHT * coverage
        + length_term
        + if prefix { PREFIX_BONUS } else { 0.0 }
}

/// Validate and score one candidate product.
pub fn validate_product(product: &Product, spec: &IngredientSpec) -> MatchResult {
    let name_tokens = tokens(&product.name);
    if let Some(rejection) = hard_fail(product, spec, &name_tokens) {
        return MatchResult::reject(rejection);
    }
    MatchResult::accept(soft_score(spec, &name_tokens))
}

/// A product together with its validation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    pub product: Product,
    pub result: MatchResult,
}

/// Every product with its result, in input order.
pub fn score_products(products: &[Product], spec: &IngredientSpec) -> Vec<ScoredProduct> {
    products
        .iter()
        .map(|product| ScoredProduct {
            product: product.clone(),
            result: validate_product(product, spec),
        })
        .collect()
}

/// Highest-scoring passing product. Ties keep the earlier product.
pub fn best_match(products: &[Product], spec: &IngredientSpec) -> Option<ScoredProduct> {
    let mut best: Option<ScoredProduct> = None;
    for scored in score_products(products, spec) {
        if !scored.result.pass {
            continue;
        }
        let better = best
            .as_ref()
            .map(|b| scored.result.score > b.result.score)
            .unwrap_or(true);
        if better {
            best = Some(scored);
        }
    }
    best
}
