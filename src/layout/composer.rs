//! Descriptor sequence to render plan.

use std::collections::BTreeSet;

use metrics::counter;
use serde_json::Value;
use tracing::debug;
use vitrine_api_types::{AdLayout, LayoutDescriptor};

use crate::cache::{CacheSnapshot, CollectionKey};

use super::derive;
use super::kind::UnitKind;
use super::props::{Diagnostic, RenderUnit};

const METRIC_LAYOUT_DIAGNOSTICS: &str = "vitrine_layout_diagnostics_total";

const DEFAULT_ITEMS_PER_PAGE: usize = 50;
const DEFAULT_RAIL_LIMIT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Products added to the grid per "load more" page.
    pub items_per_page: usize,
    /// Products shown by a category rail without an explicit `limit`.
    pub rail_limit: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            rail_limit: DEFAULT_RAIL_LIMIT,
        }
    }
}

impl From<&crate::config::CatalogSettings> for LayoutConfig {
    fn from(settings: &crate::config::CatalogSettings) -> Self {
        Self {
            items_per_page: settings.items_per_page,
            rail_limit: settings.rail_limit,
        }
    }
}

/// Resolves layout descriptors against a cache snapshot. Holds configuration
/// only; resolution is a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct LayoutComposer {
    config: LayoutConfig,
}

impl LayoutComposer {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// One render unit per descriptor, in input order. An empty sequence
    /// resolves the default layout instead.
    pub fn resolve(&self, descriptors: &[LayoutDescriptor], snapshot: &CacheSnapshot) -> Vec<RenderUnit> {
        if descriptors.is_empty() {
            debug!("Layout empty, using default");
            return self.resolve(&default_layout(), snapshot);
        }

        descriptors
            .iter()
            .enumerate()
            .map(|(position, descriptor)| self.resolve_one(position, descriptor, snapshot))
            .collect()
    }

    /// Resolve whatever layout configuration the snapshot holds.
    pub fn resolve_from_cache(&self, snapshot: &CacheSnapshot) -> Vec<RenderUnit> {
        self.resolve(&layout_descriptors(snapshot), snapshot)
    }

    fn resolve_one(
        &self,
        position: usize,
        descriptor: &LayoutDescriptor,
        snapshot: &CacheSnapshot,
    ) -> RenderUnit {
        let kind = UnitKind::parse(&descriptor.name);
        let props = &descriptor.props;

        let derived = match &kind {
            UnitKind::HeroCarousel => derive::ad_carousel(snapshot, AdLayout::Single),
            UnitKind::DoubleAdRail => derive::ad_carousel(snapshot, AdLayout::Double),
            UnitKind::TripleAdRail => derive::ad_carousel(snapshot, AdLayout::Triple),
            UnitKind::CategoryStrip => derive::category_strip(snapshot, props),
            UnitKind::CategoryRail => derive::category_rail(snapshot, props, self.config.rail_limit),
            UnitKind::ProductGrid => derive::product_grid(snapshot, props, self.config.items_per_page),
            UnitKind::SponsoredRail => derive::sponsored_rail(snapshot, props),
            UnitKind::ComboOffers => derive::combo_offers(snapshot, props),
            UnitKind::SellerRail => derive::seller_rail(snapshot, props),
            UnitKind::Unknown(name) => Err(Diagnostic::KindNotFound { name: name.clone() }),
        };

        match derived {
            Ok(props) => RenderUnit::resolved(position, kind, props),
            Err(diagnostic) => {
                debug!(
                    position,
                    kind = kind.name(),
                    reason = diagnostic.reason(),
                    detail = %diagnostic,
                    "Layout unit degraded"
                );
                counter!(METRIC_LAYOUT_DIAGNOSTICS, "reason" => diagnostic.reason()).increment(1);
                RenderUnit::failed(position, kind, diagnostic)
            }
        }
    }
}

/// Minimal layout rendered when no configuration is available.
pub fn default_layout() -> Vec<LayoutDescriptor> {
    [
        UnitKind::HeroCarousel,
        UnitKind::CategoryStrip,
        UnitKind::SponsoredRail,
        UnitKind::ProductGrid,
    ]
    .iter()
    .map(|kind| LayoutDescriptor::new(kind.name()))
    .collect()
}

/// Decode the cached layout configuration. Entries that are not descriptor
/// objects keep their position as descriptors named after the raw value, so
/// they surface as "kind not found" units. A bare string is taken as a name.
pub fn layout_descriptors(snapshot: &CacheSnapshot) -> Vec<LayoutDescriptor> {
    snapshot
        .items(CollectionKey::Layout)
        .iter()
        .map(|item| match item {
            Value::String(name) => LayoutDescriptor::new(name.clone()),
            other => serde_json::from_value(other.clone())
                .unwrap_or_else(|_| LayoutDescriptor::new(other.to_string())),
        })
        .collect()
}

/// Collections the given layout reads, sorted. An empty layout needs what the
/// default layout needs.
pub fn required_keys(descriptors: &[LayoutDescriptor]) -> Vec<CollectionKey> {
    let fallback;
    let descriptors = if descriptors.is_empty() {
        fallback = default_layout();
        &fallback
    } else {
        descriptors
    };

    descriptors
        .iter()
        .flat_map(|descriptor| UnitKind::parse(&descriptor.name).required_keys())
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
