//! Pack size parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use pantry_core::{Product, Quantity, SizeUnit};

static SIZE_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:(\d+)\s*[x×]\s*)?(\d+(?:\.\d+)?)\s*(kilograms?|kgs?|grams?|g|millilitres?|milliliters?|ml|litres?|liters?|l)\b",
    )
    .ok()
});

fn unit_for(raw: &str) -> Option<SizeUnit> {
    let raw = raw.to_ascii_lowercase();
    if raw.starts_with("kilo") || raw.starts_with("kg") {
        Some(SizeUnit::Kg)
    } else if raw.starts_with("milli") || raw == "ml" {
        Some(SizeUnit::Ml)
    } else if raw.starts_with('g') {
        Some(SizeUnit::G)
    } else if raw.starts_with('l') {
        Some(SizeUnit::L)
    } else {
        None
    }
}

/// Parse the first size in `text` into grams or millilitres.
///
/// Multipacks such as `6 x 100g` are multiplied out.
pub fn parse_size(text: &str) -> Option<Quantity> {
    let re = SIZE_RE.as_ref()?;
    let caps = re.captures(text)?;
    let count: f64 = match caps.get(1) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1.0,
    };
    let value: f64 = caps.get(2)?.as_str().parse().ok()?;
    let unit = unit_for(caps.get(3)?.as_str())?;
    let quantity = unit.to_base(value * count)?;
    (quantity.amount > 0.0).then_some(quantity)
}

/// Size of a product, from its size string and then its name.
pub fn product_quantity(product: &Product) -> Option<Quantity> {
    product
        .size_string
        .as_deref()
        .and_then(parse_size)
        .or_else(|| parse_size(&product.name))
}
