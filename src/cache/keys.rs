//! Collection keys.
//!
//! Every cached collection is named by a [`CollectionKey`]. The key also knows
//! which endpoint feeds it and under which payload field the collection lives.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use vitrine_api_types::AdLayout;

/// Identifies one independently cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKey {
    /// Full product catalogue
    Products,
    /// Ordered layout descriptors for the home page
    Layout,
    Sellers,
    Categories,
    /// Combo offers currently active
    Combos,
    /// Sponsored products
    Sponsored,
    /// Advertisement images of one declared grouping
    Ads(AdLayout),
}

impl CollectionKey {
    /// Every key known to the runtime, in a stable order.
    pub const ALL: [CollectionKey; 9] = [
        CollectionKey::Products,
        CollectionKey::Layout,
        CollectionKey::Sellers,
        CollectionKey::Categories,
        CollectionKey::Combos,
        CollectionKey::Sponsored,
        CollectionKey::Ads(AdLayout::Single),
        CollectionKey::Ads(AdLayout::Double),
        CollectionKey::Ads(AdLayout::Triple),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKey::Products => "products",
            CollectionKey::Layout => "layout",
            CollectionKey::Sellers => "sellers",
            CollectionKey::Categories => "categories",
            CollectionKey::Combos => "combos",
            CollectionKey::Sponsored => "sponsored",
            CollectionKey::Ads(AdLayout::Single) => "ads:single",
            CollectionKey::Ads(AdLayout::Double) => "ads:double",
            CollectionKey::Ads(AdLayout::Triple) => "ads:triple",
        }
    }

    /// Endpoint path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            CollectionKey::Products => "products",
            CollectionKey::Layout => "layout",
            CollectionKey::Sellers => "sellers",
            CollectionKey::Categories => "categories",
            CollectionKey::Combos => "combos/active",
            CollectionKey::Sponsored => "products/sponsored",
            CollectionKey::Ads(_) => "ads",
        }
    }

    pub fn query(&self) -> Option<(&'static str, &'static str)> {
        match self {
            CollectionKey::Ads(layout) => Some(("type", layout.as_str())),
            _ => None,
        }
    }

    /// Response field holding the collection. A missing field means "empty".
    pub fn payload_field(&self) -> &'static str {
        match self {
            CollectionKey::Products | CollectionKey::Sponsored => "products",
            CollectionKey::Layout => "layout",
            CollectionKey::Sellers => "sellers",
            CollectionKey::Categories => "categories",
            CollectionKey::Combos => "combos",
            CollectionKey::Ads(_) => "ads",
        }
    }

    /// Failures of cosmetic collections degrade silently, without a toast.
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, CollectionKey::Ads(_))
    }

    /// Human-facing collection label used in notifications.
    pub fn label(&self) -> &'static str {
        match self {
            CollectionKey::Products => "products",
            CollectionKey::Layout => "page layout",
            CollectionKey::Sellers => "sellers",
            CollectionKey::Categories => "categories",
            CollectionKey::Combos => "combo offers",
            CollectionKey::Sponsored => "sponsored products",
            CollectionKey::Ads(_) => "promotions",
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown collection key `{0}`")]
pub struct UnknownCollectionKey(pub String);

impl FromStr for CollectionKey {
    type Err = UnknownCollectionKey;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        CollectionKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized || key.as_str().replace(':', "_") == normalized)
            .ok_or_else(|| UnknownCollectionKey(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_their_names() {
        for key in CollectionKey::ALL {
            assert_eq!(key.as_str().parse::<CollectionKey>(), Ok(key));
        }
    }

    #[test]
    fn underscore_spelling_is_accepted_for_env_overrides() {
        assert_eq!(
            "ads_double".parse::<CollectionKey>(),
            Ok(CollectionKey::Ads(AdLayout::Double))
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = "banners".parse::<CollectionKey>().expect_err("unknown key");
        assert_eq!(err, UnknownCollectionKey("banners".to_string()));
    }

    #[test]
    fn ads_share_one_endpoint_and_differ_by_query() {
        let single = CollectionKey::Ads(AdLayout::Single);
        let triple = CollectionKey::Ads(AdLayout::Triple);
        assert_eq!(single.path(), triple.path());
        assert_eq!(single.query(), Some(("type", "single")));
        assert_eq!(triple.query(), Some(("type", "triple")));
        assert_eq!(CollectionKey::Products.query(), None);
    }

    #[test]
    fn sponsored_payload_lives_under_products_field() {
        assert_eq!(CollectionKey::Sponsored.payload_field(), "products");
    }
}
