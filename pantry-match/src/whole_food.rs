//! Whole-food classification and derived negative keywords.

use serde::{Deserialize, Serialize};

use crate::vocab::{AROMATIC_NEGATIVES, CHEESE_NEGATIVES, EGG_NEGATIVES, PREPARED_NEGATIVES};

/// Qualifiers ignored when deciding whether a name is a single whole food.
pub const QUALIFIERS: &[&str] = &[
    "fresh", "raw", "whole", "dried", "ground", "baby", "large", "small",
];

/// Family of a whole-food noun; drives the extra negative keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WholeFoodKind {
    Aromatic,
    Produce,
    Cheese,
    Egg,
}

impl WholeFoodKind {
    /// Fresh produce has no meaningful pack size.
    pub fn is_produce(&self) -> bool {
        matches!(self, Self::Aromatic | Self::Produce)
    }
}

const WHOLE_FOODS: &[(&str, WholeFoodKind)] = &[
    ("garlic", WholeFoodKind::Aromatic),
    ("onion", WholeFoodKind::Aromatic),
    ("ginger", WholeFoodKind::Aromatic),
    ("shallot", WholeFoodKind::Aromatic),
    ("chilli", WholeFoodKind::Aromatic),
    ("leek", WholeFoodKind::Aromatic),
    ("apple", WholeFoodKind::Produce),
    ("avocado", WholeFoodKind::Produce),
    ("banana", WholeFoodKind::Produce),
    ("broccoli", WholeFoodKind::Produce),
    ("capsicum", WholeFoodKind::Produce),
    ("carrot", WholeFoodKind::Produce),
    ("cauliflower", WholeFoodKind::Produce),
    ("celery", WholeFoodKind::Produce),
    ("cucumber", WholeFoodKind::Produce),
    ("kale", WholeFoodKind::Produce),
    ("lemon", WholeFoodKind::Produce),
    ("lettuce", WholeFoodKind::Produce),
    ("lime", WholeFoodKind::Produce),
    ("mushroom", WholeFoodKind::Produce),
    ("orange", WholeFoodKind::Produce),
    ("potato", WholeFoodKind::Produce),
    ("pumpkin", WholeFoodKind::Produce),
    ("spinach", WholeFoodKind::Produce),
    ("tomato", WholeFoodKind::Produce),
    ("zucchini", WholeFoodKind::Produce),
    ("cheddar", WholeFoodKind::Cheese),
    ("feta", WholeFoodKind::Cheese),
    ("haloumi", WholeFoodKind::Cheese),
    ("mozzarella", WholeFoodKind::Cheese),
    ("parmesan", WholeFoodKind::Cheese),
    ("ricotta", WholeFoodKind::Cheese),
    ("egg", WholeFoodKind::Egg),
];

fn singular(token: &str) -> &str {
    if let Some(stem) = token.strip_suffix("oes") {
        if stem.len() > 2 {
            return &token[..token.len() - 2];
        }
    }
    token.strip_suffix('s').unwrap_or(token)
}

/// Whole-food family of a cleaned name, if it is a single whole food.
pub fn classify(name: &str) -> Option<WholeFoodKind> {
    let lowered = name.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !QUALIFIERS.contains(t))
        .collect();
    let [token] = tokens.as_slice() else {
        return None;
    };
    WHOLE_FOODS
        .iter()
        .find(|(noun, _)| *noun == *token || *noun == singular(token))
        .map(|(_, kind)| *kind)
}

pub fn is_whole_food(name: &str) -> bool {
    classify(name).is_some()
}

/// Negative keywords for a whole-food ingredient.
///
/// Empty for anything that is not a whole food. Terms that occur in the
/// ingredient name itself are skipped.
pub fn derive_negative_keywords(name: &str) -> Vec<String> {
    let Some(kind) = classify(name) else {
        return Vec::new();
    };
    let lowered = name.to_lowercase();
    let extras: &[&str] = match kind {
        WholeFoodKind::Aromatic => AROMATIC_NEGATIVES,
        WholeFoodKind::Cheese => CHEESE_NEGATIVES,
        WholeFoodKind::Egg => EGG_NEGATIVES,
        WholeFoodKind::Produce => &[],
    };

    let mut out: Vec<String> = Vec::new();
    for term in PREPARED_NEGATIVES.iter().chain(extras.iter()) {
        if lowered.contains(term) || out.iter().any(|t| t == term) {
            continue;
        }
        out.push((*term).to_string());
    }
    out
}
