//! Store, product and search page types.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// ============================================================================
// STORE
// ============================================================================

/// Grocery store served by the upstream product-search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Woolworths,
    Coles,
}

impl Store {
    pub const ALL: [Store; 2] = [Store::Woolworths, Store::Coles];

    /// Lowercase key used in cache keys, metrics labels and env variables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Woolworths => "woolworths",
            Self::Coles => "coles",
        }
    }

    /// Store name as it appears at the front of store-brand product names.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Woolworths => "Woolworths",
            Self::Coles => "Coles",
        }
    }

    /// Lowercase brand tokens that lead store-brand product names.
    pub fn brand_tokens(&self) -> &'static [&'static str] {
        match self {
            Self::Woolworths => &["woolworths", "woolies", "macro"],
            Self::Coles => &["coles"],
        }
    }

    /// Default upstream endpoint for this store.
    pub fn default_endpoint(&self) -> StoreEndpoint {
        match self {
            Self::Woolworths => StoreEndpoint {
                host: "woolworths-products-api.p.rapidapi.com".to_string(),
                path: "/woolworths/product-search/".to_string(),
            },
            Self::Coles => StoreEndpoint {
                host: "coles-product-price-api.p.rapidapi.com".to_string(),
                path: "/coles/product-search/".to_string(),
            },
        }
    }

    /// Prefix a search query with the store name.
    pub fn prefix_query(&self, query: &str) -> String {
        let query = query.trim();
        if query.is_empty() {
            return self.as_str().to_string();
        }
        format!("{} {}", self.as_str(), query)
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Store {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "woolworths" | "woolies" => Ok(Self::Woolworths),
            "coles" => Ok(Self::Coles),
            other => Err(ValidationError::UnsupportedStore {
                store: other.to_string(),
            }),
        }
    }
}

/// Host and path of one store's product-search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEndpoint {
    pub host: String,
    pub path: String,
}

impl StoreEndpoint {
    /// Full URL. Hosts without a scheme are served over https.
    pub fn url(&self) -> String {
        if self.host.contains("://") {
            format!("{}{}", self.host, self.path)
        } else {
            format!("https://{}{}", self.host, self.path)
        }
    }

    /// Host name without any scheme, as sent in the API host header.
    pub fn host_header(&self) -> &str {
        self.host
            .split_once("://")
            .map(|(_, host)| host)
            .unwrap_or(&self.host)
    }
}

// ============================================================================
// PRODUCT
// ============================================================================

/// A candidate product returned by the upstream search.
///
/// Field aliases cover the naming used by the different store APIs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "product_name")]
    pub name: String,

    #[serde(default, alias = "product_category")]
    pub category: Option<String>,

    #[serde(default, alias = "product_size", alias = "size", alias = "size_string")]
    pub size_string: Option<String>,

    #[serde(
        default,
        alias = "current_price",
        alias = "product_price",
        deserialize_with = "deserialize_price"
    )]
    pub price: Option<f64>,

    #[serde(default, alias = "product_url", alias = "link")]
    pub url: Option<String>,
}

impl Product {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size_string = Some(size.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Number(f64),
    Text(String),
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<PriceRepr>::deserialize(deserializer)?;
    Ok(match raw {
        Some(PriceRepr::Number(value)) => Some(value),
        Some(PriceRepr::Text(text)) => parse_price_text(&text),
        None => None,
    })
}

/// Parse a price string such as `"$4.50"` or `"1,299.00"`.
pub fn parse_price_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok()
}

// ============================================================================
// SEARCH
// ============================================================================

/// One page of upstream search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchPage {
    #[serde(default)]
    pub results: Vec<Product>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub current_page: u32,
}

impl SearchPage {
    pub fn from_products(results: Vec<Product>) -> Self {
        Self {
            results,
            total_pages: 1,
            current_page: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// A validated product-search request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchRequest {
    pub store: Store,
    pub query: String,
    pub page: u32,
    pub page_size: u32,
}

impl SearchRequest {
    /// Build a request, rejecting blank queries and page zero.
    pub fn new(
        store: Store,
        query: impl Into<String>,
        page: u32,
        page_size: u32,
    ) -> Result<Self, ValidationError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "query".to_string(),
            });
        }
        if page == 0 {
            return Err(ValidationError::InvalidValue {
                field: "page".to_string(),
                reason: "page numbers start at 1".to_string(),
            });
        }
        if page_size == 0 {
            return Err(ValidationError::InvalidValue {
                field: "page_size".to_string(),
                reason: "page_size must be greater than 0".to_string(),
            });
        }
        Ok(Self {
            store,
            query: query.trim().to_string(),
            page,
            page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_parse_is_case_insensitive() {
        assert_eq!("Coles".parse::<Store>(), Ok(Store::Coles));
        assert_eq!(" WOOLWORTHS ".parse::<Store>(), Ok(Store::Woolworths));
        assert!(matches!(
            "aldi".parse::<Store>(),
            Err(ValidationError::UnsupportedStore { .. })
        ));
    }

    #[test]
    fn test_endpoint_url_and_host_header() {
        let endpoint = Store::Coles.default_endpoint();
        assert_eq!(
            endpoint.url(),
            "https://coles-product-price-api.p.rapidapi.com/coles/product-search/"
        );
        assert_eq!(endpoint.host_header(), "coles-product-price-api.p.rapidapi.com");

        let local = StoreEndpoint {
            host: "http://127.0.0.1:8080".to_string(),
            path: "/search".to_string(),
        };
        assert_eq!(local.url(), "http://127.0.0.1:8080/search");
        assert_eq!(local.host_header(), "127.0.0.1:8080");
    }

    #[test]
    fn test_prefix_query() {
        assert_eq!(Store::Coles.prefix_query(" garlic "), "coles garlic");
        assert_eq!(Store::Woolworths.prefix_query(""), "woolworths");
    }

    #[test]
    fn test_product_accepts_upstream_aliases() -> Result<(), serde_json::Error> {
        let json = serde_json::json!({
            "product_name": "Woolworths Garlic Bulb 3 Pack",
            "product_size": "3 pack",
            "current_price": "$2.50",
            "url": "https://example.test/garlic"
        });
        let product: Product = serde_json::from_value(json)?;
        assert_eq!(product.name, "Woolworths Garlic Bulb 3 Pack");
        assert_eq!(product.size_string.as_deref(), Some("3 pack"));
        assert_eq!(product.price, Some(2.5));
        assert_eq!(product.category, None);
        Ok(())
    }

    #[test]
    fn test_product_price_number_and_null() -> Result<(), serde_json::Error> {
        let numeric: Product =
            serde_json::from_value(serde_json::json!({ "name": "Milk", "price": 3.1 }))?;
        assert_eq!(numeric.price, Some(3.1));

        let missing: Product =
            serde_json::from_value(serde_json::json!({ "name": "Milk", "price": null }))?;
        assert_eq!(missing.price, None);
        Ok(())
    }

    #[test]
    fn test_parse_price_text() {
        assert_eq!(parse_price_text("$4.50"), Some(4.5));
        assert_eq!(parse_price_text("1,299.00"), Some(1299.0));
        assert_eq!(parse_price_text("n/a"), None);
    }

    #[test]
    fn test_search_page_defaults() -> Result<(), serde_json::Error> {
        let page: SearchPage = serde_json::from_str(r#"{"results": []}"#)?;
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 0);
        Ok(())
    }

    #[test]
    fn test_search_request_validation() {
        assert!(SearchRequest::new(Store::Coles, "  ", 1, 20).is_err());
        assert!(SearchRequest::new(Store::Coles, "milk", 0, 20).is_err());
        let request = SearchRequest::new(Store::Coles, " milk ", 2, 20);
        assert_eq!(request.map(|r| r.query), Ok("milk".to_string()));
    }
}
