use std::sync::Arc;
use std::time::Duration;

use httpmock::MockServer;
use serde_json::json;
use url::Url;
use vitrine::application::{CarouselState, Storefront};
use vitrine::cache::CacheStore;
use vitrine::fetch::{FetchConfig, FetchOrchestrator};
use vitrine::infra::http::ApiClient;
use vitrine::layout::{Diagnostic, LayoutComposer, LayoutConfig, ResolvedProps};
use vitrine::notify::Notifier;
use vitrine::session::{AuthSession, AuthToken};
use vitrine_api_types::AdLayout;

fn storefront(server: &MockServer, token: Option<&str>) -> Storefront {
    let base = Url::parse(&format!("{}/api/", server.base_url())).expect("base url");
    let client = Arc::new(ApiClient::new(base, Duration::from_secs(5)).expect("client"));
    let session = Arc::new(AuthSession::new(token.and_then(AuthToken::new)));
    let notifier = Arc::new(Notifier::new());
    let orchestrator = Arc::new(FetchOrchestrator::new(
        FetchConfig::default(),
        Arc::new(CacheStore::new()),
        client,
        session.clone(),
        notifier.clone(),
    ));
    Storefront::new(
        orchestrator,
        LayoutComposer::new(LayoutConfig::default()),
        session,
        notifier,
    )
}

#[tokio::test]
async fn plan_resolves_layout_against_live_endpoints() {
    let server = MockServer::start_async().await;
    let layout = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/api/layout")
                .header("authorization", "Bearer shopper");
            then.status(200).json_body(json!({
                "layout": [
                    {"name": "HeroCarousel"},
                    {"name": "CategoryRail", "props": {"categoryName": "kitchen"}},
                    {"name": "category-rail", "props": {"categoryId": "c-missing"}},
                    {"name": "ProductGrid", "props": {"title": "Everything"}},
                ]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/ads").query_param("type", "single");
            then.status(500);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/categories");
            then.status(200).json_body(json!({
                "categories": [{"id": "c1", "name": "Kitchen"}, {"id": "c2", "name": "Garden"}]
            }));
        })
        .await;
    let products = server
        .mock_async(|when, then| {
            when.method("GET").path("/api/products");
            then.status(200).json_body(json!({
                "products": [
                    {"id": "p1", "name": "Kettle", "categoryId": "c1"},
                    {"id": "p2", "name": "Rake", "categoryId": "c2"},
                    {"id": "p3", "name": "Mug", "categoryId": "c1"},
                ]
            }));
        })
        .await;

    let front = storefront(&server, Some("shopper"));
    let plan = front.plan(None).await;

    layout.assert_async().await;
    products.assert_async().await;
    assert_eq!(plan.units.len(), 4);

    // Promotions failed; the hero still renders, just without images.
    let Some(ResolvedProps::AdCarousel { images, .. }) = &plan.units[0].props else {
        panic!("expected hero carousel, got {:?}", plan.units[0]);
    };
    assert!(images.is_empty());
    assert_eq!(
        plan.carousels,
        vec![CarouselState {
            position: 0,
            layout: AdLayout::Single,
            pages: 0,
            autoplay: false,
            display_index: 0,
        }]
    );

    let Some(ResolvedProps::CategoryRail {
        category, products, ..
    }) = &plan.units[1].props
    else {
        panic!("expected category rail, got {:?}", plan.units[1]);
    };
    assert_eq!(category.id.as_deref(), Some("c1"));
    let ids: Vec<_> = products.iter().filter_map(|p| p.id.as_deref()).collect();
    assert_eq!(ids, vec!["p1", "p3"]);

    assert_eq!(
        plan.units[2].diagnostic,
        Some(Diagnostic::EntityNotFound {
            entity: "category",
            reference: Some("c-missing".to_string()),
        })
    );
    assert!(plan.units[3].is_resolved());

    assert_eq!(plan.failures.len(), 1);
    assert_eq!(plan.failures[0].key, "ads:single");
    assert!(plan.toasts.is_empty(), "ad failures stay silent: {:?}", plan.toasts);
    assert_eq!(plan.login_redirect, None);
}

#[tokio::test]
async fn fresh_collections_are_not_requested_twice() {
    let server = MockServer::start_async().await;
    let layout = server
        .mock_async(|when, then| {
            when.method("GET").path("/api/layout");
            then.status(200)
                .json_body(json!({"layout": [{"name": "SellerRail"}]}));
        })
        .await;
    let sellers = server
        .mock_async(|when, then| {
            when.method("GET").path("/api/sellers");
            then.status(200)
                .json_body(json!({"sellers": [{"id": "s1", "name": "Acme"}]}));
        })
        .await;

    let front = storefront(&server, None);
    let first = front.plan(None).await;
    let second = front.plan(None).await;

    layout.assert_hits_async(1).await;
    sellers.assert_hits_async(1).await;
    assert_eq!(first.units, second.units);
}

#[tokio::test]
async fn unauthorized_layout_expires_session() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/layout");
            then.status(401);
        })
        .await;

    let front = storefront(&server, Some("expired"));
    let plan = front.plan(None).await;

    assert_eq!(plan.login_redirect, Some(vitrine::session::LOGIN_PATH));
    assert_eq!(plan.failures[0].kind, "unauthorized");
    assert!(
        plan.toasts
            .iter()
            .any(|toast| toast.text == vitrine::session::SESSION_EXPIRED_MESSAGE)
    );
}
