//! Closed set of renderable unit kinds.

use serde::{Serialize, Serializer};
use vitrine_api_types::AdLayout;

use crate::cache::CollectionKey;

/// Every kind the composer knows how to render. Names that match none of
/// them parse into [`UnitKind::Unknown`] so the offending value survives into
/// the diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnitKind {
    HeroCarousel,
    DoubleAdRail,
    TripleAdRail,
    CategoryStrip,
    CategoryRail,
    ProductGrid,
    SponsoredRail,
    ComboOffers,
    SellerRail,
    Unknown(String),
}

impl UnitKind {
    pub const KNOWN: [UnitKind; 9] = [
        UnitKind::HeroCarousel,
        UnitKind::DoubleAdRail,
        UnitKind::TripleAdRail,
        UnitKind::CategoryStrip,
        UnitKind::CategoryRail,
        UnitKind::ProductGrid,
        UnitKind::SponsoredRail,
        UnitKind::ComboOffers,
        UnitKind::SellerRail,
    ];

    /// Parse a descriptor name. Matching ignores case and `-`, `_` or space
    /// separators, so `category-rail` and `CategoryRail` are the same kind.
    pub fn parse(name: &str) -> Self {
        let wanted = normalize(name);
        UnitKind::KNOWN
            .into_iter()
            .find(|kind| normalize(kind.name()) == wanted)
            .unwrap_or_else(|| UnitKind::Unknown(name.to_string()))
    }

    pub fn name(&self) -> &str {
        match self {
            UnitKind::HeroCarousel => "HeroCarousel",
            UnitKind::DoubleAdRail => "DoubleAdRail",
            UnitKind::TripleAdRail => "TripleAdRail",
            UnitKind::CategoryStrip => "CategoryStrip",
            UnitKind::CategoryRail => "CategoryRail",
            UnitKind::ProductGrid => "ProductGrid",
            UnitKind::SponsoredRail => "SponsoredRail",
            UnitKind::ComboOffers => "ComboOffers",
            UnitKind::SellerRail => "SellerRail",
            UnitKind::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, UnitKind::Unknown(_))
    }

    /// Cache collections this kind reads during prop derivation.
    pub fn required_keys(&self) -> &'static [CollectionKey] {
        match self {
            UnitKind::HeroCarousel => &[CollectionKey::Ads(AdLayout::Single)],
            UnitKind::DoubleAdRail => &[CollectionKey::Ads(AdLayout::Double)],
            UnitKind::TripleAdRail => &[CollectionKey::Ads(AdLayout::Triple)],
            UnitKind::CategoryStrip => &[CollectionKey::Categories],
            UnitKind::CategoryRail => &[CollectionKey::Categories, CollectionKey::Products],
            UnitKind::ProductGrid => &[CollectionKey::Products],
            UnitKind::SponsoredRail => &[CollectionKey::Sponsored],
            UnitKind::ComboOffers => &[CollectionKey::Combos],
            UnitKind::SellerRail => &[CollectionKey::Sellers],
            UnitKind::Unknown(_) => &[],
        }
    }
}

impl Serialize for UnitKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !matches!(*c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}
