//! PANTRY Match - ingredient normalization and product scoring
//!
//! Pure, synchronous logic with no I/O:
//! - [`normalize`]: raw key to clean search name
//! - [`whole_food`]: whole-food classification and derived negatives
//! - [`queries`]: store-prefixed query tiers and the fallback ladder
//! - [`scorer`]: hard-fail checks and ranking score

pub mod normalize;
pub mod queries;
pub mod scorer;
pub mod size;
pub mod spec_builder;
pub mod vocab;
pub mod whole_food;

pub use normalize::{canonical_name, clean_name, core_noun, slug};
pub use queries::{build_query_set, fallback_ladder};
pub use scorer::{best_match, score_products, validate_product, ScoredProduct};
pub use size::{parse_size, product_quantity};
pub use spec_builder::build_spec;
pub use whole_food::{classify, derive_negative_keywords, is_whole_food, WholeFoodKind};
