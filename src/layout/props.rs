//! Composer output types.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use vitrine_api_types::{AdLayout, Category, ComboOffer, Identified, Product, Seller};

use crate::carousel::NormalizedImage;

use super::kind::UnitKind;
use super::window::ProductWindow;

/// Why a unit could not be resolved. Rendered inline in place of the unit.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("kind not found: `{name}`")]
    KindNotFound { name: String },
    #[error("{entity} not available")]
    EntityNotFound {
        entity: &'static str,
        reference: Option<String>,
    },
    #[error("invalid prop `{prop}`: {detail}")]
    InvalidProp { prop: &'static str, detail: String },
}

impl Diagnostic {
    /// Stable label used for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Diagnostic::KindNotFound { .. } => "kind_not_found",
            Diagnostic::EntityNotFound { .. } => "entity_not_found",
            Diagnostic::InvalidProp { .. } => "invalid_prop",
        }
    }
}

/// One collection item as rendered: either decoded, or a placeholder at the
/// item's position when it could not be decoded or lacks an identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Card<T> {
    Valid(T),
    Invalid { position: usize },
}

impl<T> Card<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Card::Valid(item) => Some(item),
            Card::Invalid { .. } => None,
        }
    }
}

/// Decode every raw item independently.
pub fn decode_cards<T>(items: &[Value]) -> Vec<Card<T>>
where
    T: DeserializeOwned + Identified,
{
    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            match serde_json::from_value::<T>(item.clone()) {
                Ok(decoded) if decoded.identifier().is_some() => Card::Valid(decoded),
                _ => Card::Invalid { position },
            }
        })
        .collect()
}

/// Concrete properties a known kind's renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolvedProps {
    AdCarousel {
        layout: AdLayout,
        group_size: usize,
        images: Vec<NormalizedImage>,
    },
    CategoryStrip {
        title: Option<String>,
        categories: Vec<Card<Category>>,
    },
    CategoryRail {
        title: Option<String>,
        category: Category,
        products: Vec<Product>,
    },
    ProductGrid {
        title: Option<String>,
        window: ProductWindow,
        products: Vec<Card<Product>>,
    },
    SponsoredRail {
        title: Option<String>,
        products: Vec<Card<Product>>,
    },
    ComboOffers {
        title: Option<String>,
        combos: Vec<Card<ComboOffer>>,
    },
    SellerRail {
        title: Option<String>,
        sellers: Vec<Card<Seller>>,
    },
}

/// One entry of the render plan. Exactly one of `props` and `diagnostic` is
/// set; `position` is the descriptor's index in the input sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderUnit {
    pub position: usize,
    pub kind: UnitKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<ResolvedProps>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Diagnostic>,
}

impl RenderUnit {
    pub fn resolved(position: usize, kind: UnitKind, props: ResolvedProps) -> Self {
        Self {
            position,
            kind,
            props: Some(props),
            diagnostic: None,
        }
    }

    pub fn failed(position: usize, kind: UnitKind, diagnostic: Diagnostic) -> Self {
        Self {
            position,
            kind,
            props: None,
            diagnostic: Some(diagnostic),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.props.is_some()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn items_without_identifier_become_placeholders() {
        let items = vec![
            json!({"id": "p1", "name": "Kettle"}),
            json!({"name": "No id"}),
            json!("garbage"),
            json!({"_id": "p4", "name": "Mug"}),
        ];

        let cards = decode_cards::<Product>(&items);
        assert!(matches!(cards[0], Card::Valid(_)));
        assert_eq!(cards[1], Card::Invalid { position: 1 });
        assert_eq!(cards[2], Card::Invalid { position: 2 });
        assert_eq!(cards[3].valid().and_then(|p| p.id.as_deref()), Some("p4"));
    }

    #[test]
    fn items_with_identifier_survive_mistyped_fields() {
        let items = vec![
            json!({"id": "p1", "name": null}),
            json!({"id": "p2", "price": "12.50"}),
            json!({"id": 7}),
        ];

        let cards = decode_cards::<Product>(&items);
        assert!(cards.iter().all(|card| card.valid().is_some()));
        assert_eq!(cards[1].valid().and_then(|p| p.price), Some(12.5));
        assert_eq!(cards[2].valid().and_then(|p| p.identifier()), Some("7"));

        let categories = decode_cards::<Category>(&[json!({"_id": "c1", "name": null})]);
        assert!(categories[0].valid().is_some());

        let combos = decode_cards::<ComboOffer>(&[json!({"id": "k1", "endsAt": "2026-01-01"})]);
        assert!(combos[0].valid().is_some());
    }

    #[test]
    fn diagnostic_message_names_the_entity() {
        let diagnostic = Diagnostic::EntityNotFound {
            entity: "category",
            reference: None,
        };
        assert_eq!(diagnostic.to_string(), "category not available");
        assert_eq!(diagnostic.reason(), "entity_not_found");
    }

    #[test]
    fn failed_unit_serializes_without_props() {
        let unit = RenderUnit::failed(
            3,
            UnitKind::Unknown("Banner".into()),
            Diagnostic::KindNotFound {
                name: "Banner".into(),
            },
        );

        let json = serde_json::to_value(&unit).expect("serialize unit");
        assert_eq!(
            json,
            json!({
                "position": 3,
                "kind": "Banner",
                "diagnostic": {"reason": "kind_not_found", "name": "Banner"}
            })
        );
    }
}
