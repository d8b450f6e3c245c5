//! Wire types shared between the vitrine runtime and the storefront endpoints.
//!
//! Every collection item is lenient on input: fields default when absent so a
//! single sparse record never fails a whole response, and fields of the wrong
//! type decode as empty. Whether an item is usable is decided by the consumer
//! through [`Identified::identifier`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

mod lenient;

/// Items that must carry a non-empty identifier to be rendered.
pub trait Identified {
    fn raw_identifier(&self) -> Option<&str>;

    fn identifier(&self) -> Option<&str> {
        self.raw_identifier()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub discount_price: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub category_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub seller_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub in_stock: Option<bool>,
}

impl Identified for Product {
    fn raw_identifier(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub image_url: Option<String>,
}

impl Identified for Category {
    fn raw_identifier(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Seller {
    #[serde(alias = "_id", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub logo_url: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f32")]
    pub rating: Option<f32>,
}

impl Identified for Seller {
    fn raw_identifier(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComboOffer {
    #[serde(alias = "_id", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub product_ids: Vec<String>,
    #[serde(
        deserialize_with = "lenient::opt_datetime",
        serialize_with = "time::serde::rfc3339::option::serialize"
    )]
    pub ends_at: Option<OffsetDateTime>,
}

impl Identified for ComboOffer {
    fn raw_identifier(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// One advertisement image as delivered by the ads endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdImage {
    #[serde(alias = "_id", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(alias = "url", alias = "image", deserialize_with = "lenient::opt_string")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub link: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub alt: Option<String>,
    #[serde(alias = "isDisabled", deserialize_with = "lenient::flag")]
    pub disabled: bool,
}

/// Declared grouping of an advertisement collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdLayout {
    Single,
    Double,
    Triple,
}

impl AdLayout {
    pub const ALL: [AdLayout; 3] = [AdLayout::Single, AdLayout::Double, AdLayout::Triple];

    pub fn as_str(self) -> &'static str {
        match self {
            AdLayout::Single => "single",
            AdLayout::Double => "double",
            AdLayout::Triple => "triple",
        }
    }

    /// Number of images shown side by side on one carousel page.
    pub fn group_size(self) -> usize {
        match self {
            AdLayout::Single => 1,
            AdLayout::Double => 2,
            AdLayout::Triple => 3,
        }
    }
}

/// Server-supplied layout instruction: a unit kind name plus opaque parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    #[serde(alias = "component", alias = "type")]
    pub name: String,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl LayoutDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: Map::new(),
        }
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub request_id: Uuid,
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistToggleRequest {
    pub request_id: Uuid,
    pub product_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSearchRequest {
    pub request_id: Uuid,
    pub query: String,
}

/// Acknowledgement body returned by mutation endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationAck {
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn product_accepts_mongo_style_id() {
        let product: Product =
            serde_json::from_value(json!({"_id": "p1", "name": "Lamp", "price": 12.5}))
                .expect("product decodes");
        assert_eq!(product.identifier(), Some("p1"));
        assert_eq!(product.price, Some(12.5));
    }

    #[test]
    fn blank_identifier_is_treated_as_missing() {
        let category: Category =
            serde_json::from_value(json!({"id": "  ", "name": "Toys"})).expect("category decodes");
        assert_eq!(category.identifier(), None);
    }

    #[test]
    fn ad_image_reads_url_alias() {
        let image: AdImage = serde_json::from_value(json!({"url": "http://cdn/x.png"}))
            .expect("ad image decodes");
        assert_eq!(image.image_url.as_deref(), Some("http://cdn/x.png"));
        assert!(!image.disabled);
    }

    #[test]
    fn descriptor_props_default_to_empty() {
        let descriptor: LayoutDescriptor =
            serde_json::from_value(json!({"name": "ProductGrid"})).expect("descriptor decodes");
        assert_eq!(descriptor.name, "ProductGrid");
        assert!(descriptor.props.is_empty());
    }

    #[test]
    fn combo_end_date_is_optional() {
        let combo: ComboOffer = serde_json::from_value(json!({
            "id": "c1",
            "title": "Breakfast set",
            "endsAt": "2026-01-01T00:00:00Z"
        }))
        .expect("combo decodes");
        assert!(combo.ends_at.is_some());

        let open: ComboOffer =
            serde_json::from_value(json!({"id": "c2"})).expect("combo without end decodes");
        assert!(open.ends_at.is_none());
    }

    #[test]
    fn mistyped_fields_decode_as_empty() {
        let product: Product = serde_json::from_value(json!({
            "id": 7,
            "name": null,
            "price": "12.50",
            "discountPrice": {"amount": 10},
            "inStock": "yes",
            "categoryId": 3
        }))
        .expect("product decodes");
        assert_eq!(product.identifier(), Some("7"));
        assert_eq!(product.name, "");
        assert_eq!(product.price, Some(12.5));
        assert_eq!(product.discount_price, None);
        assert_eq!(product.in_stock, None);
        assert_eq!(product.category_id.as_deref(), Some("3"));

        let seller: Seller = serde_json::from_value(json!({"_id": "s1", "name": ["x"], "rating": "4.5"}))
            .expect("seller decodes");
        assert_eq!(seller.identifier(), Some("s1"));
        assert_eq!(seller.rating, Some(4.5));
    }

    #[test]
    fn combo_accepts_date_only_and_drops_garbage() {
        let combo: ComboOffer = serde_json::from_value(json!({
            "id": "c1",
            "title": null,
            "productIds": ["p1", 2, null],
            "endsAt": "2026-01-01"
        }))
        .expect("combo decodes");
        assert_eq!(combo.ends_at, Some(time::macros::datetime!(2026-01-01 00:00:00 UTC)));
        assert_eq!(combo.product_ids, vec!["p1".to_string(), "2".to_string()]);

        let unreadable: ComboOffer = serde_json::from_value(json!({"id": "c2", "endsAt": "soon"}))
            .expect("combo with unreadable end decodes");
        assert_eq!(unreadable.identifier(), Some("c2"));
        assert!(unreadable.ends_at.is_none());
    }

    #[test]
    fn combo_end_date_serializes_as_rfc3339() {
        let combo: ComboOffer =
            serde_json::from_value(json!({"id": "c1", "endsAt": "2026-01-01T08:30:00Z"}))
                .expect("combo decodes");
        let json = serde_json::to_value(&combo).expect("serialize combo");
        assert_eq!(json["endsAt"], json!("2026-01-01T08:30:00Z"));
    }
}
