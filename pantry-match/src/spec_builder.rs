//! Deterministic ingredient specs for keys that arrive without one.

use tracing::debug;

use pantry_core::IngredientSpec;

use crate::normalize::{clean_name, core_noun};
use crate::whole_food::{derive_negative_keywords, is_whole_food};

/// Build an [`IngredientSpec`] from a raw ingredient key.
///
/// The core noun becomes the only required word. Whole foods also get the
/// derived negative keywords. Size and category constraints are left to
/// the caller.
pub fn build_spec(raw_key: &str) -> IngredientSpec {
    let clean = clean_name(raw_key);
    let noun = core_noun(&clean);
    let whole_food = is_whole_food(&clean);

    let spec = IngredientSpec {
        original_key: raw_key.to_string(),
        core_noun: noun.clone(),
        is_whole_food: whole_food,
        required_words: if noun.is_empty() { Vec::new() } else { vec![noun] },
        negative_keywords: derive_negative_keywords(&clean),
        clean_name: clean,
        ..IngredientSpec::default()
    };

    debug!(
        raw_key = %raw_key,
        clean_name = %spec.clean_name,
        whole_food = spec.is_whole_food,
        negatives = spec.negative_keywords.len(),
        "Built ingredient spec"
    );
    spec
}
