//! Ingredient specification, query set and match result types.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SIZES
// ============================================================================

/// Unit attached to a target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    #[serde(alias = "grams", alias = "gram")]
    G,
    #[serde(alias = "kilograms", alias = "kilogram")]
    Kg,
    #[serde(alias = "millilitres", alias = "milliliters")]
    Ml,
    #[serde(alias = "litres", alias = "liters", alias = "litre", alias = "liter")]
    L,
    #[serde(alias = "ea", alias = "unit", alias = "units")]
    Each,
}

impl SizeUnit {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "g" | "gm" | "gram" | "grams" => Some(Self::G),
            "kg" | "kilo" | "kilogram" | "kilograms" => Some(Self::Kg),
            "ml" | "millilitre" | "millilitres" | "milliliter" | "milliliters" => Some(Self::Ml),
            "l" | "lt" | "litre" | "litres" | "liter" | "liters" => Some(Self::L),
            "ea" | "each" | "unit" | "units" | "pk" | "pack" => Some(Self::Each),
            _ => None,
        }
    }

    /// Convert an amount in this unit to grams or millilitres.
    pub fn to_base(&self, value: f64) -> Option<Quantity> {
        match self {
            Self::G => Some(Quantity::grams(value)),
            Self::Kg => Some(Quantity::grams(value * 1000.0)),
            Self::Ml => Some(Quantity::millilitres(value)),
            Self::L => Some(Quantity::millilitres(value * 1000.0)),
            Self::Each => None,
        }
    }
}

/// Physical dimension of a base quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Mass,
    Volume,
}

/// An amount expressed in grams (mass) or millilitres (volume).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: f64,
    pub dimension: Dimension,
}

impl Quantity {
    pub fn grams(amount: f64) -> Self {
        Self {
            amount,
            dimension: Dimension::Mass,
        }
    }

    pub fn millilitres(amount: f64) -> Self {
        Self {
            amount,
            dimension: Dimension::Volume,
        }
    }

    /// Ratio of `self` to `target`, or None if the dimensions differ.
    pub fn ratio_to(&self, target: &Quantity) -> Option<f64> {
        if self.dimension != target.dimension || target.amount <= 0.0 {
            return None;
        }
        Some(self.amount / target.amount)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dimension {
            Dimension::Mass => write!(f, "{}g", self.amount),
            Dimension::Volume => write!(f, "{}ml", self.amount),
        }
    }
}

/// Pack size an ingredient should ideally be bought in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TargetSize {
    pub value: f64,
    pub unit: SizeUnit,
}

impl TargetSize {
    pub fn new(value: f64, unit: SizeUnit) -> Self {
        Self { value, unit }
    }

    pub fn to_base(&self) -> Option<Quantity> {
        self.unit.to_base(self.value)
    }

    /// Compact form used in tight search queries, e.g. `500g` or `2l`.
    pub fn query_fragment(&self) -> Option<String> {
        let unit = match self.unit {
            SizeUnit::G => "g",
            SizeUnit::Kg => "kg",
            SizeUnit::Ml => "ml",
            SizeUnit::L => "l",
            SizeUnit::Each => return None,
        };
        if self.value.fract() == 0.0 {
            Some(format!("{}{}", self.value as i64, unit))
        } else {
            Some(format!("{}{}", self.value, unit))
        }
    }
}

// ============================================================================
// INGREDIENT SPEC
// ============================================================================

/// Everything the validator needs to know about one ingredient.
///
/// Produced either by the external query-generation stage or by the
/// deterministic builder in `pantry-match`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct IngredientSpec {
    #[serde(default)]
    pub original_key: String,
    pub clean_name: String,
    #[serde(default)]
    pub core_noun: String,
    #[serde(default)]
    pub is_whole_food: bool,
    #[serde(default)]
    pub required_words: Vec<String>,
    #[serde(default)]
    pub negative_keywords: Vec<String>,
    #[serde(default)]
    pub target_size: Option<TargetSize>,
    #[serde(default)]
    pub allowed_categories: Vec<String>,
    #[serde(default)]
    pub total_grams_required: Option<f64>,
    #[serde(default)]
    pub quantity_units: Option<f64>,
}

impl IngredientSpec {
    /// Minimal spec keyed on a clean name; core noun is the last word.
    pub fn named(clean_name: impl Into<String>) -> Self {
        let clean_name = clean_name.into();
        let core_noun = clean_name
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .to_string();
        Self {
            original_key: clean_name.clone(),
            clean_name,
            core_noun,
            ..Self::default()
        }
    }

    pub fn with_required_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_negative_keywords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.negative_keywords = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_allowed_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target_size(mut self, size: TargetSize) -> Self {
        self.target_size = Some(size);
        self
    }

    pub fn whole_food(mut self, is_whole_food: bool) -> Self {
        self.is_whole_food = is_whole_food;
        self
    }
}

// ============================================================================
// QUERY SET
// ============================================================================

/// Search queries for one ingredient, from most to least specific.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct QuerySet {
    pub tight_query: String,
    pub normal_query: String,
    pub wide_query: String,
    #[serde(default)]
    pub fallback: Vec<String>,
}

impl QuerySet {
    /// All queries in resolution order, blank and repeated entries removed.
    pub fn ordered(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let tiers = [&self.tight_query, &self.normal_query, &self.wide_query];
        for query in tiers.into_iter().chain(self.fallback.iter()) {
            let query = query.trim();
            if query.is_empty() || out.iter().any(|q| q == query) {
                continue;
            }
            out.push(query.to_string());
        }
        out
    }
}

// ============================================================================
// MATCH RESULT
// ============================================================================

/// Hard-fail check that rejected a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    BannedTerm,
    NegativeKeyword,
    MissingRequiredWord,
    CategoryMismatch,
    PreparedProduct,
    SizeOutOfRange,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BannedTerm => "banned_term",
            Self::NegativeKeyword => "negative_keyword",
            Self::MissingRequiredWord => "missing_required_word",
            Self::CategoryMismatch => "category_mismatch",
            Self::PreparedProduct => "prepared_product",
            Self::SizeOutOfRange => "size_out_of_range",
        }
    }
}

/// Outcome of validating one product against one ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MatchResult {
    pub pass: bool,
    /// Always within [0, 1]; exactly 0 when a hard-fail check fired.
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl MatchResult {
    pub fn accept(score: f64) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self {
            pass: true,
            score,
            rejection: None,
        }
    }

    pub fn reject(rejection: Rejection) -> Self {
        Self {
            pass: false,
            score: 0.0,
            rejection: Some(rejection),
        }
    }
}
