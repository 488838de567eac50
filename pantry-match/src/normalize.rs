//! Ingredient key normalization
//!
//! Raw keys arrive either as taxonomy slugs (`milk_regular_cow`) or as free
//! text (`Fresh Garlic, minced`). Both are slugged, checked against an
//! ordered rule table, and otherwise cleaned by stripping descriptor words.

use once_cell::sync::Lazy;
use regex::Regex;

/// One first-match-wins normalization rule.
pub struct NormalizeRule {
    pub pattern: Regex,
    pub canonical: &'static str,
}

/// Pattern source and canonical name, most specific first.
const RULE_TABLE: &[(&str, &str)] = &[
    // eggs
    (r"^eggs?(_|$)", "eggs"),
    (r"^egg_", "eggs"),
    // milk
    (r"^milk_(skim|skinny|no_fat)", "skim milk"),
    (r"^milk_(reduced_fat|lite|light|low_fat)", "reduced fat milk"),
    (r"^(almond_milk|milk_almond)", "almond milk"),
    (r"^(soy_milk|milk_soy)", "soy milk"),
    (r"^(oat_milk|milk_oat)", "oat milk"),
    (r"^coconut_milk", "coconut milk"),
    (r"^milk_(regular|full_cream|whole|cow)", "full cream milk"),
    (r"^milk$", "full cream milk"),
    // spreads and dairy
    (r"^peanut_butter", "peanut butter"),
    (r"^butter(_|$)", "butter"),
    (r"^yog(h)?urt_greek|^greek_yog(h)?urt", "greek yoghurt"),
    (r"^yog(h)?urt(_|$)", "natural yoghurt"),
    (r"^cheese_cheddar|^cheddar", "cheddar cheese"),
    (r"^cheese_parmesan|^parmesan", "parmesan cheese"),
    (r"^cheese_feta|^feta", "feta cheese"),
    (r"^cheese_mozzarella|^mozzarella", "mozzarella cheese"),
    (r"^cream_sour|^sour_cream", "sour cream"),
    (r"^cream_(thickened|whipping)|^thickened_cream", "thickened cream"),
    // proteins
    (r"^chicken_breast", "chicken breast"),
    (r"^chicken_thigh", "chicken thigh"),
    (r"^chicken_(whole|roast)", "whole chicken"),
    (r"^(beef_mince|mince_beef|ground_beef|beef_ground)", "beef mince"),
    (r"^(pork_mince|mince_pork)", "pork mince"),
    (r"^(salmon_fillet|fish_salmon)", "salmon fillet"),
    (r"^tuna_(canned|tin|tinned)|^canned_tuna", "canned tuna"),
    // aromatics
    (r"^garlic(_(fresh|clove|cloves|bulb|whole|raw))*$", "garlic"),
    (r"^onion_(brown|yellow)|^brown_onion", "brown onion"),
    (r"^onion_red|^red_onion", "red onion"),
    (r"^onion_(spring|green)|^spring_onion|^scallion", "spring onion"),
    (r"^ginger(_(fresh|root|raw))*$", "ginger"),
    // grains and pantry
    (r"^rice_(white|long_grain)|^white_rice", "white rice"),
    (r"^rice_brown|^brown_rice", "brown rice"),
    (r"^oats?(_(rolled|whole))*$|^rolled_oats", "rolled oats"),
    (r"^flour_(plain|all_purpose)|^plain_flour", "plain flour"),
    (r"^flour_self_raising|^self_raising_flour", "self raising flour"),
    (r"^oil_olive|^olive_oil|^extra_virgin_olive_oil", "olive oil"),
    (r"^tomato(es)?_(canned|tinned|diced)|^canned_tomato", "diced tomatoes"),
];

/// Compiled rule table in evaluation order.
pub static RULES: Lazy<Vec<NormalizeRule>> = Lazy::new(|| {
    RULE_TABLE
        .iter()
        .filter_map(|(pattern, canonical)| {
            Regex::new(pattern)
                .ok()
                .map(|pattern| NormalizeRule { pattern, canonical })
        })
        .collect()
});

/// Descriptor words and phrases stripped from free-text names.
const DESCRIPTORS: &[&str] = &[
    // fat and sugar modifiers
    "reduced fat",
    "low fat",
    "full fat",
    "fat free",
    "no added sugar",
    "sugar free",
    "low sugar",
    "unsweetened",
    "lite",
    "light",
    // texture
    "smooth",
    "crunchy",
    "chunky",
    "fine",
    "coarse",
    // preparation state
    "chopped",
    "finely chopped",
    "diced",
    "sliced",
    "minced",
    "crushed",
    "grated",
    "shredded",
    "peeled",
    "trimmed",
    "cooked",
    "uncooked",
    "raw",
    "fresh",
    "frozen",
    "whole",
    // origin and quality
    "organic",
    "free range",
    "australian",
    "premium",
    "natural",
    "homebrand",
    "imported",
    "local",
    // size words
    "extra large",
    "large",
    "medium",
    "small",
];

static DESCRIPTOR_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let mut sorted: Vec<&str> = DESCRIPTORS.to_vec();
    sorted.sort_by_key(|d| std::cmp::Reverse(d.len()));
    sorted
        .into_iter()
        .filter_map(|d| Regex::new(&format!(r"\b{}\b", regex::escape(d))).ok())
        .collect()
});

/// Lowercase ASCII slug with every other run collapsed to one underscore.
pub fn slug(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Canonical name from the rule table, if any rule matches the slug.
pub fn canonical_name(raw: &str) -> Option<&'static str> {
    let slug = slug(raw);
    RULES
        .iter()
        .find(|rule| rule.pattern.is_match(&slug))
        .map(|rule| rule.canonical)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove descriptor vocabulary, longest phrase first.
pub fn strip_descriptors(name: &str) -> String {
    let mut out = name.to_string();
    for pattern in DESCRIPTOR_PATTERNS.iter() {
        out = pattern.replace_all(&out, " ").into_owned();
    }
    collapse_whitespace(&out)
}

/// Clean search name for a raw ingredient key.
pub fn clean_name(raw: &str) -> String {
    if let Some(canonical) = canonical_name(raw) {
        return canonical.to_string();
    }

    let spaced = slug(raw).replace('_', " ");
    let stripped = strip_descriptors(&spaced);
    if stripped.is_empty() {
        // Nothing but descriptors, keep what we had.
        spaced
    } else {
        stripped
    }
}

/// Head noun of a clean name: its last word.
pub fn core_noun(clean_name: &str) -> String {
    clean_name
        .split_whitespace()
        .last()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("  Fresh Garlic, minced "), "fresh_garlic_minced");
        assert_eq!(slug("milk__regular--cow"), "milk_regular_cow");
        assert_eq!(slug("!!!"), "");
    }

    #[test]
    fn test_rule_table_compiles_completely() {
        assert_eq!(RULES.len(), RULE_TABLE.len());
        assert_eq!(DESCRIPTOR_PATTERNS.len(), DESCRIPTORS.len());
    }

    #[test]
    fn test_taxonomy_keys() {
        assert_eq!(clean_name("egg_whole_chicken"), "eggs");
        assert_eq!(clean_name("milk_regular_cow"), "full cream milk");
        assert_eq!(clean_name("milk_skim"), "skim milk");
        assert_eq!(clean_name("peanut_butter_smooth"), "peanut butter");
        assert_eq!(clean_name("butter_salted"), "butter");
        assert_eq!(clean_name("garlic_fresh"), "garlic");
    }

    #[test]
    fn test_first_match_wins() {
        // peanut butter must not fall through to the butter rule
        assert_eq!(canonical_name("peanut_butter"), Some("peanut butter"));
        assert_eq!(canonical_name("garlic_bread"), None);
    }

    #[test]
    fn test_free_text_descriptor_removal() {
        assert_eq!(clean_name("fresh garlic"), "garlic");
        assert_eq!(clean_name("Organic Free Range Chicken Drumsticks"), "chicken drumsticks");
        assert_eq!(clean_name("finely chopped flat leaf parsley"), "flat leaf parsley");
        assert_eq!(clean_name("banana yoghurt"), "banana yoghurt");
    }

    #[test]
    fn test_descriptor_only_input_kept() {
        assert_eq!(clean_name("fresh"), "fresh");
    }

    #[test]
    fn test_core_noun() {
        assert_eq!(core_noun("full cream milk"), "milk");
        assert_eq!(core_noun(""), "");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_clean_name_has_no_extra_whitespace(raw in ".{0,40}") {
            let cleaned = clean_name(&raw);
            prop_assert_eq!(cleaned.trim(), cleaned.as_str());
            prop_assert!(!cleaned.contains("  "));
        }

        #[test]
        fn prop_slug_is_idempotent(raw in ".{0,40}") {
            let once = slug(&raw);
            prop_assert_eq!(slug(&once), once);
        }
    }
}
