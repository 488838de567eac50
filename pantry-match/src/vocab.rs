//! Fixed vocabularies shared by the normalizer and the scorer.

use once_cell::sync::Lazy;
use regex::Regex;

/// Non-food and pet products that never match an ingredient.
pub const BANNED_TERMS: &[&str] = &[
    "dog food",
    "cat food",
    "dog treats",
    "cat litter",
    "kitty litter",
    "pet food",
    "bird seed",
    "gift card",
    "candle",
    "detergent",
    "dishwashing",
    "cleaner",
    "bleach",
    "shampoo",
    "conditioner",
    "toothpaste",
    "nappies",
    "tissues",
    "deodorant",
    "fertiliser",
    "potting mix",
    "toy",
];

/// Markers of prepared or compound products.
///
/// A whole-food ingredient rejects any product whose name matches one of
/// these as a whole word.
pub const PREPARED_MARKERS: &[&str] = &[
    "burger",
    "burgers",
    "marinade",
    "marinades",
    "marinated",
    "snack",
    "snacks",
    "snack pack",
    "baby food",
    "ready meal",
    "ready meals",
    "meal kit",
    "nuggets",
    "dumplings",
    "chips",
    "crisps",
    "soup",
    "soups",
    "flavoured",
    "seasoning",
    "pouch",
];

/// Prepared-product terms turned into negative keywords for whole foods.
pub const PREPARED_NEGATIVES: &[&str] = &[
    "burger",
    "marinade",
    "marinated",
    "snack",
    "baby food",
    "ready meal",
    "meal kit",
    "chips",
    "crisps",
    "soup",
    "flavoured",
    "seasoning",
    "paste",
    "powder",
    "pouch",
];

/// Extra negatives for aromatics: protein, bread and sauce products.
pub const AROMATIC_NEGATIVES: &[&str] = &[
    "chicken", "beef", "pork", "lamb", "prawn", "prawns", "fish", "salmon", "bread", "naan",
    "sauce", "aioli", "butter", "mayo", "dressing",
];

/// Extra negatives for cheeses: burger, wrap and cracker products.
pub const CHEESE_NEGATIVES: &[&str] = &[
    "burger", "wrap", "wraps", "cracker", "crackers", "sandwich", "pizza",
];

/// Extra negatives for eggs.
pub const EGG_NEGATIVES: &[&str] = &["noodle", "noodles", "custard", "mayo", "pasta"];

/// Category fragments of shelf-stable goods, which get the wide size band.
pub const PANTRY_CATEGORY_HINTS: &[&str] = &[
    "pantry",
    "canned",
    "tinned",
    "pasta",
    "rice",
    "baking",
    "spices",
    "condiments",
    "sauces",
    "oil",
    "cereal",
    "breakfast",
    "health food",
    "international",
];

/// Category fragments of fresh produce, which skip the size check.
pub const PRODUCE_CATEGORY_HINTS: &[&str] =
    &["produce", "fruit", "veg", "vegetables", "salad", "herbs"];

fn word_alternation(terms: &[&str]) -> Option<Regex> {
    let mut sorted: Vec<&str> = terms.to_vec();
    sorted.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let body = sorted
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", body)).ok()
}

static BANNED_RE: Lazy<Option<Regex>> = Lazy::new(|| word_alternation(BANNED_TERMS));
static PREPARED_RE: Lazy<Option<Regex>> = Lazy::new(|| word_alternation(PREPARED_MARKERS));

/// First banned term found in `text`, matched on word boundaries.
pub fn find_banned(text: &str) -> Option<String> {
    BANNED_RE
        .as_ref()
        .and_then(|re| re.find(text))
        .map(|m| m.as_str().to_lowercase())
}

/// First prepared-product marker found in `text`.
pub fn find_prepared_marker(text: &str) -> Option<String> {
    PREPARED_RE
        .as_ref()
        .and_then(|re| re.find(text))
        .map(|m| m.as_str().to_lowercase())
}

fn category_has_hint(category: &str, hints: &[&str]) -> bool {
    let category = category.to_lowercase();
    hints.iter().any(|hint| category.contains(hint))
}

pub fn is_pantry_category(category: &str) -> bool {
    category_has_hint(category, PANTRY_CATEGORY_HINTS)
}

pub fn is_produce_category(category: &str) -> bool {
    category_has_hint(category, PRODUCE_CATEGORY_HINTS)
}
