//! Per-kind prop derivation. Each function is a pure mapping from the cache
//! snapshot and the descriptor's props to the kind's resolved props.

use serde_json::{Map, Value};
use vitrine_api_types::{AdLayout, Category, Identified, Product};

use crate::cache::{CacheSnapshot, CollectionKey};
use crate::carousel::{decode_ad_images, normalize_images};

use super::props::{Card, Diagnostic, ResolvedProps, decode_cards};
use super::window::ProductWindow;

type Props = Map<String, Value>;
type Derived = Result<ResolvedProps, Diagnostic>;

pub(super) fn ad_carousel(snapshot: &CacheSnapshot, layout: AdLayout) -> Derived {
    let raw = decode_ad_images(snapshot.items(CollectionKey::Ads(layout)));
    Ok(ResolvedProps::AdCarousel {
        layout,
        group_size: layout.group_size(),
        images: normalize_images(&raw),
    })
}

pub(super) fn category_strip(snapshot: &CacheSnapshot, props: &Props) -> Derived {
    Ok(ResolvedProps::CategoryStrip {
        title: text_prop(props, &["title"]),
        categories: decode_cards(snapshot.items(CollectionKey::Categories)),
    })
}

pub(super) fn category_rail(snapshot: &CacheSnapshot, props: &Props, default_limit: usize) -> Derived {
    let limit = count_prop(props, "limit")?.unwrap_or(default_limit);
    let id = text_prop(props, &["categoryId", "category_id"]);
    let name = text_prop(props, &["categoryName", "category_name", "category"]);

    let categories: Vec<Category> = decode_cards(snapshot.items(CollectionKey::Categories))
        .into_iter()
        .filter_map(|card| match card {
            Card::Valid(category) => Some(category),
            Card::Invalid { .. } => None,
        })
        .collect();

    let category = find_category(&categories, id.as_deref(), name.as_deref())
        .cloned()
        .ok_or_else(|| Diagnostic::EntityNotFound {
            entity: "category",
            reference: id.clone().or_else(|| name.clone()),
        })?;

    let category_id = category.identifier().unwrap_or_default();
    let products: Vec<Product> = decode_cards::<Product>(snapshot.items(CollectionKey::Products))
        .into_iter()
        .filter_map(|card| match card {
            Card::Valid(product)
                if product.category_id.as_deref().map(str::trim) == Some(category_id) =>
            {
                Some(product)
            }
            _ => None,
        })
        .take(limit)
        .collect();

    Ok(ResolvedProps::CategoryRail {
        title: text_prop(props, &["title"]).or_else(|| {
            let name = category.name.trim();
            (!name.is_empty()).then(|| name.to_string())
        }),
        category,
        products,
    })
}

pub(super) fn product_grid(snapshot: &CacheSnapshot, props: &Props, per_page: usize) -> Derived {
    let page = count_prop(props, "page")?.unwrap_or(1);
    let items = snapshot.items(CollectionKey::Products);
    let window = ProductWindow::new(items.len(), page, per_page);

    Ok(ResolvedProps::ProductGrid {
        title: text_prop(props, &["title"]),
        window,
        products: decode_cards(&items[window.range()]),
    })
}

pub(super) fn sponsored_rail(snapshot: &CacheSnapshot, props: &Props) -> Derived {
    Ok(ResolvedProps::SponsoredRail {
        title: text_prop(props, &["title"]),
        products: decode_cards(snapshot.items(CollectionKey::Sponsored)),
    })
}

pub(super) fn combo_offers(snapshot: &CacheSnapshot, props: &Props) -> Derived {
    Ok(ResolvedProps::ComboOffers {
        title: text_prop(props, &["title"]),
        combos: decode_cards(snapshot.items(CollectionKey::Combos)),
    })
}

pub(super) fn seller_rail(snapshot: &CacheSnapshot, props: &Props) -> Derived {
    Ok(ResolvedProps::SellerRail {
        title: text_prop(props, &["title"]),
        sellers: decode_cards(snapshot.items(CollectionKey::Sellers)),
    })
}

/// Id match first; only when that fails, a case-insensitive name match.
fn find_category<'a>(
    categories: &'a [Category],
    id: Option<&str>,
    name: Option<&str>,
) -> Option<&'a Category> {
    let by_id = id.and_then(|id| {
        categories
            .iter()
            .find(|category| category.identifier() == Some(id))
    });
    by_id.or_else(|| {
        let wanted = name?.to_lowercase();
        categories
            .iter()
            .find(|category| category.name.trim().to_lowercase() == wanted)
    })
}

/// First non-blank string (or number) among `keys`.
fn text_prop(props: &Props, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match props.get(*key)? {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// Positive integer prop; accepts numeric strings. Absent or null is `None`.
fn count_prop(props: &Props, key: &'static str) -> Result<Option<usize>, Diagnostic> {
    let invalid = |detail: String| Diagnostic::InvalidProp { prop: key, detail };
    let parsed = match props.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number
            .as_u64()
            .ok_or_else(|| invalid(format!("expected a positive integer, got {number}")))?,
        Some(Value::String(text)) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| invalid(format!("expected a positive integer, got `{text}`")))?,
        Some(other) => return Err(invalid(format!("expected a positive integer, got {other}"))),
    };
    if parsed == 0 {
        return Err(invalid("must be at least 1".to_string()));
    }
    usize::try_from(parsed)
        .map(Some)
        .map_err(|_| invalid(format!("{parsed} is out of range")))
}
