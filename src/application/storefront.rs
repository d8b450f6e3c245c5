//! Home page assembly: refresh the layout, refresh what it needs, compose.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};
use vitrine_api_types::{AdLayout, LayoutDescriptor};

use crate::cache::CollectionKey;
use crate::carousel::CarouselController;
use crate::fetch::{FetchError, FetchOrchestrator, RefreshReport};
use crate::layout::{
    LayoutComposer, RenderUnit, ResolvedProps, UnitKind, default_layout, layout_descriptors,
    required_keys,
};
use crate::notify::{Notifier, Toast};
use crate::session::AuthSession;

/// Everything a view needs to draw the home page once.
#[derive(Debug, Clone, Serialize)]
pub struct RenderPlan {
    pub units: Vec<RenderUnit>,
    pub carousels: Vec<CarouselState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<KeyFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub toasts: Vec<Toast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_redirect: Option<&'static str>,
}

/// Initial carousel state for an ad unit of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarouselState {
    pub position: usize,
    pub layout: AdLayout,
    pub pages: usize,
    pub autoplay: bool,
    pub display_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyFailure {
    pub key: &'static str,
    pub kind: &'static str,
    pub error: String,
}

impl KeyFailure {
    fn new(key: CollectionKey, error: &FetchError) -> Self {
        Self {
            key: key.as_str(),
            kind: error.kind(),
            error: error.to_string(),
        }
    }
}

pub struct Storefront {
    orchestrator: Arc<FetchOrchestrator>,
    composer: LayoutComposer,
    session: Arc<AuthSession>,
    notifier: Arc<Notifier>,
}

impl Storefront {
    pub fn new(
        orchestrator: Arc<FetchOrchestrator>,
        composer: LayoutComposer,
        session: Arc<AuthSession>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            orchestrator,
            composer,
            session,
            notifier,
        }
    }

    pub fn orchestrator(&self) -> &Arc<FetchOrchestrator> {
        &self.orchestrator
    }

    /// Build the render plan. `grid_page` overrides the page of every
    /// product grid in the layout.
    ///
    /// The layout itself is refreshed first, since it decides which other
    /// collections are needed. Fetch failures never abort the plan: they
    /// show up as degraded units, `failures` and toasts.
    #[instrument(skip(self))]
    pub async fn plan(&self, grid_page: Option<usize>) -> RenderPlan {
        let layout_report = self.orchestrator.refresh([CollectionKey::Layout]).await;

        let mut descriptors = layout_descriptors(&self.orchestrator.store().snapshot());
        if descriptors.is_empty() {
            descriptors = default_layout();
        }
        if let Some(page) = grid_page {
            set_grid_page(&mut descriptors, page);
        }

        let collections_report = self
            .orchestrator
            .refresh(required_keys(&descriptors))
            .await;

        let snapshot = self.orchestrator.store().snapshot();
        let units = self.composer.resolve(&descriptors, &snapshot);
        let carousels = units.iter().filter_map(carousel_state).collect();
        let failures = failures(&[layout_report, collections_report]);

        info!(
            units = units.len(),
            degraded = units.iter().filter(|unit| !unit.is_resolved()).count(),
            failures = failures.len(),
            "Render plan composed"
        );

        RenderPlan {
            units,
            carousels,
            failures,
            toasts: self.notifier.drain(),
            login_redirect: self.session.take_login_redirect(),
        }
    }
}

fn set_grid_page(descriptors: &mut [LayoutDescriptor], page: usize) {
    for descriptor in descriptors
        .iter_mut()
        .filter(|descriptor| UnitKind::parse(&descriptor.name) == UnitKind::ProductGrid)
    {
        descriptor
            .props
            .insert("page".to_string(), Value::from(page as u64));
    }
}

fn carousel_state(unit: &RenderUnit) -> Option<CarouselState> {
    let Some(ResolvedProps::AdCarousel { layout, images, .. }) = &unit.props else {
        return None;
    };
    let controller = CarouselController::from_normalized(images.clone(), *layout);
    Some(CarouselState {
        position: unit.position,
        layout: *layout,
        pages: controller.page_count(),
        autoplay: controller.should_autoplay(),
        display_index: controller.current_display_index(),
    })
}

fn failures(reports: &[RefreshReport]) -> Vec<KeyFailure> {
    reports
        .iter()
        .flat_map(|report| report.failed.iter())
        .map(|(key, error)| KeyFailure::new(*key, error))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::cache::CacheStore;
    use crate::fetch::{CollectionSource, FetchConfig};
    use crate::layout::{Diagnostic, LayoutConfig};
    use crate::notify::ToastKind;
    use crate::session::{AuthToken, LOGIN_PATH};

    #[derive(Default)]
    struct FixtureSource {
        bodies: HashMap<CollectionKey, Result<Value, FetchError>>,
        requested: Mutex<Vec<CollectionKey>>,
    }

    impl FixtureSource {
        fn with(mut self, key: CollectionKey, body: Result<Value, FetchError>) -> Self {
            self.bodies.insert(key, body);
            self
        }
    }

    #[async_trait]
    impl CollectionSource for FixtureSource {
        async fn fetch(
            &self,
            key: CollectionKey,
            _token: Option<&AuthToken>,
        ) -> Result<Value, FetchError> {
            self.requested.lock().expect("requested lock").push(key);
            self.bodies.get(&key).cloned().unwrap_or_else(|| Ok(json!({})))
        }
    }

    fn storefront(source: Arc<FixtureSource>, session: AuthSession) -> Storefront {
        let session = Arc::new(session);
        let notifier = Arc::new(Notifier::new());
        let orchestrator = Arc::new(FetchOrchestrator::new(
            FetchConfig::default(),
            Arc::new(CacheStore::new()),
            source,
            session.clone(),
            notifier.clone(),
        ));
        Storefront::new(
            orchestrator,
            LayoutComposer::new(LayoutConfig {
                items_per_page: 2,
                rail_limit: 12,
            }),
            session,
            notifier,
        )
    }

    fn products(count: usize) -> Value {
        let items: Vec<Value> = (0..count)
            .map(|n| json!({"id": format!("p{n}"), "name": format!("Item {n}")}))
            .collect();
        json!({ "products": items })
    }

    #[tokio::test]
    async fn layout_decides_which_collections_are_fetched() {
        let source = Arc::new(
            FixtureSource::default()
                .with(
                    CollectionKey::Layout,
                    Ok(json!({"layout": [
                        {"name": "DoubleAdRail"},
                        {"name": "ProductGrid", "props": {"title": "All"}},
                    ]})),
                )
                .with(CollectionKey::Products, Ok(products(5)))
                .with(
                    CollectionKey::Ads(AdLayout::Double),
                    Ok(json!({"ads": [
                        {"imageUrl": "https://cdn/1.png"},
                        {"imageUrl": "https://cdn/2.png"},
                        {"imageUrl": "https://cdn/3.png"},
                    ]})),
                ),
        );
        let front = storefront(source.clone(), AuthSession::guest());

        let plan = front.plan(Some(2)).await;

        let mut requested = source.requested.lock().expect("requested lock").clone();
        requested.sort();
        assert_eq!(
            requested,
            vec![
                CollectionKey::Products,
                CollectionKey::Layout,
                CollectionKey::Ads(AdLayout::Double),
            ]
        );

        assert_eq!(plan.units.len(), 2);
        assert!(plan.units.iter().all(RenderUnit::is_resolved));
        let Some(ResolvedProps::ProductGrid { window, products, .. }) = &plan.units[1].props else {
            panic!("expected product grid, got {:?}", plan.units[1]);
        };
        assert_eq!(window.visible, 4);
        assert!(window.has_more);
        assert_eq!(products.len(), 4);

        assert_eq!(
            plan.carousels,
            vec![CarouselState {
                position: 0,
                layout: AdLayout::Double,
                pages: 2,
                autoplay: true,
                display_index: 1,
            }]
        );
        assert!(plan.failures.is_empty());
        assert!(plan.toasts.is_empty());
    }

    #[tokio::test]
    async fn missing_layout_falls_back_to_default_units() {
        let source = Arc::new(
            FixtureSource::default()
                .with(CollectionKey::Layout, Err(FetchError::Status { status: 500 })),
        );
        let front = storefront(source, AuthSession::guest());

        let plan = front.plan(None).await;

        let kinds: Vec<_> = plan.units.iter().map(|unit| unit.kind.name()).collect();
        assert_eq!(kinds, default_layout().iter().map(|d| d.name.as_str()).collect::<Vec<_>>());
        assert_eq!(
            plan.failures,
            vec![KeyFailure {
                key: "layout",
                kind: "status",
                error: FetchError::Status { status: 500 }.to_string(),
            }]
        );
        assert!(plan.toasts.iter().any(|toast| toast.kind == ToastKind::Error));
    }

    #[tokio::test]
    async fn unknown_unit_degrades_without_failing_neighbours() {
        let source = Arc::new(
            FixtureSource::default()
                .with(
                    CollectionKey::Layout,
                    Ok(json!({"layout": ["SellerRail", {"name": "Testimonials"}]})),
                )
                .with(CollectionKey::Sellers, Ok(json!({"sellers": [{"id": "s1"}]}))),
        );
        let front = storefront(source, AuthSession::guest());

        let plan = front.plan(None).await;

        assert!(plan.units[0].is_resolved());
        assert_eq!(
            plan.units[1].diagnostic,
            Some(Diagnostic::KindNotFound {
                name: "Testimonials".to_string()
            })
        );
    }

    #[tokio::test]
    async fn expired_session_surfaces_login_redirect() {
        let source = Arc::new(
            FixtureSource::default().with(CollectionKey::Layout, Err(FetchError::Unauthorized)),
        );
        let front = storefront(source, AuthSession::new(AuthToken::new("stale")));

        let plan = front.plan(None).await;

        assert_eq!(plan.login_redirect, Some(LOGIN_PATH));
        let serialized = serde_json::to_value(&plan).expect("serialize plan");
        assert_eq!(serialized["login_redirect"], json!(LOGIN_PATH));
    }
}
