//! Store-prefixed search queries for an ingredient.

use pantry_core::{IngredientSpec, QuerySet, Store};

use crate::normalize::core_noun;

fn push_unique(out: &mut Vec<String>, query: String) {
    if !query.trim().is_empty() && !out.contains(&query) {
        out.push(query);
    }
}

/// Progressively broader queries: core noun, first two words, first word.
pub fn fallback_ladder(clean_name: &str, store: Store) -> Vec<String> {
    let words: Vec<&str> = clean_name.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(3);
    push_unique(&mut out, store.prefix_query(&core_noun(clean_name)));
    push_unique(&mut out, store.prefix_query(&words[..words.len().min(2)].join(" ")));
    push_unique(&mut out, store.prefix_query(words[0]));
    out
}

/// Tight, normal and wide queries plus the fallback ladder.
///
/// The tight query adds the target pack size when it has one; the wide
/// query is the core noun alone.
pub fn build_query_set(spec: &IngredientSpec, store: Store) -> QuerySet {
    let clean = spec.clean_name.trim();
    let noun = if spec.core_noun.trim().is_empty() {
        core_noun(clean)
    } else {
        spec.core_noun.trim().to_string()
    };

    let tight = match spec.target_size.and_then(|s| s.query_fragment()) {
        Some(fragment) => format!("{} {}", clean, fragment),
        None => clean.to_string(),
    };

    QuerySet {
        tight_query: store.prefix_query(&tight),
        normal_query: store.prefix_query(clean),
        wide_query: store.prefix_query(&noun),
        fallback: fallback_ladder(clean, store),
    }
}
