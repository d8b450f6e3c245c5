//! Mutation intents forwarded from rendered units.
//!
//! The runtime never owns the outcome of a mutation: it sends the request,
//! raises a toast for the result and moves on. Every intent needs a signed-in
//! session; guests get a "please log in" toast and nothing is sent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;
use vitrine_api_types::{AddToCartRequest, MutationAck, RecentSearchRequest, WishlistToggleRequest};

use crate::fetch::FetchError;
use crate::notify::Notifier;
use crate::session::{AuthSession, AuthToken, SESSION_EXPIRED_MESSAGE};
use crate::util::Debouncer;

const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to continue.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    AddToCart(AddToCartRequest),
    ToggleWishlist(WishlistToggleRequest),
    SaveRecentSearch(RecentSearchRequest),
    ClearRecentSearches,
}

impl Mutation {
    pub fn add_to_cart(product_id: impl Into<String>, quantity: u32) -> Self {
        Mutation::AddToCart(AddToCartRequest {
            request_id: Uuid::new_v4(),
            product_id: product_id.into(),
            quantity: quantity.max(1),
        })
    }

    pub fn toggle_wishlist(product_id: impl Into<String>) -> Self {
        Mutation::ToggleWishlist(WishlistToggleRequest {
            request_id: Uuid::new_v4(),
            product_id: product_id.into(),
        })
    }

    pub fn save_recent_search(query: impl Into<String>) -> Self {
        Mutation::SaveRecentSearch(RecentSearchRequest {
            request_id: Uuid::new_v4(),
            query: query.into(),
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mutation::AddToCart(_) => "add_to_cart",
            Mutation::ToggleWishlist(_) => "toggle_wishlist",
            Mutation::SaveRecentSearch(_) => "save_recent_search",
            Mutation::ClearRecentSearches => "clear_recent_searches",
        }
    }

    fn success_text(&self) -> &'static str {
        match self {
            Mutation::AddToCart(_) => "Added to cart.",
            Mutation::ToggleWishlist(_) => "Wishlist updated.",
            Mutation::SaveRecentSearch(_) => "Search saved.",
            Mutation::ClearRecentSearches => "Recent searches cleared.",
        }
    }

    fn failure_text(&self) -> &'static str {
        match self {
            Mutation::AddToCart(_) => "Couldn't add the item to your cart.",
            Mutation::ToggleWishlist(_) => "Couldn't update your wishlist.",
            Mutation::SaveRecentSearch(_) => "Couldn't save your search.",
            Mutation::ClearRecentSearches => "Couldn't clear your recent searches.",
        }
    }

    /// Recent-search bookkeeping succeeds quietly.
    fn announces_success(&self) -> bool {
        !matches!(self, Mutation::SaveRecentSearch(_))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("login required")]
    LoginRequired,
    #[error(transparent)]
    Request(#[from] FetchError),
}

/// Transport for mutation intents.
#[async_trait]
pub trait MutationSink: Send + Sync {
    async fn submit(&self, mutation: &Mutation, token: &AuthToken) -> Result<MutationAck, FetchError>;
}

struct Dispatch {
    sink: Arc<dyn MutationSink>,
    session: Arc<AuthSession>,
    notifier: Arc<Notifier>,
}

impl Dispatch {
    async fn submit(&self, mutation: Mutation) -> Result<MutationAck, MutationError> {
        let Some(token) = self.session.token() else {
            info!(mutation = mutation.label(), "Mutation skipped: not signed in");
            self.notifier.info(LOGIN_REQUIRED_MESSAGE);
            return Err(MutationError::LoginRequired);
        };

        match self.sink.submit(&mutation, &token).await {
            Ok(ack) => {
                info!(mutation = mutation.label(), "Mutation accepted");
                if mutation.announces_success() {
                    let text = ack
                        .message
                        .clone()
                        .unwrap_or_else(|| mutation.success_text().to_string());
                    self.notifier.success(text);
                }
                Ok(ack)
            }
            Err(FetchError::Unauthorized) => {
                warn!(mutation = mutation.label(), "Mutation rejected: session expired");
                self.session.expire();
                self.notifier.error(SESSION_EXPIRED_MESSAGE);
                Err(FetchError::Unauthorized.into())
            }
            Err(err) => {
                warn!(mutation = mutation.label(), error = %err, "Mutation failed");
                self.notifier.error(mutation.failure_text());
                Err(err.into())
            }
        }
    }
}

/// Entry point for rendered units. Cloning is not needed; share it by `Arc`.
pub struct ActionDispatcher {
    dispatch: Arc<Dispatch>,
    search: Debouncer<String>,
}

impl ActionDispatcher {
    pub fn new(
        sink: Arc<dyn MutationSink>,
        session: Arc<AuthSession>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self::with_search_debounce(sink, session, notifier, DEFAULT_SEARCH_DEBOUNCE)
    }

    pub fn with_search_debounce(
        sink: Arc<dyn MutationSink>,
        session: Arc<AuthSession>,
        notifier: Arc<Notifier>,
        delay: Duration,
    ) -> Self {
        let dispatch = Arc::new(Dispatch {
            sink,
            session,
            notifier,
        });

        let for_search = Arc::clone(&dispatch);
        let search = Debouncer::new(delay, move |query: String| {
            let dispatch = Arc::clone(&for_search);
            tokio::spawn(async move {
                let _ = dispatch.submit(Mutation::save_recent_search(query)).await;
            });
        });

        Self { dispatch, search }
    }

    pub async fn add_to_cart(&self, product_id: &str, quantity: u32) -> Result<MutationAck, MutationError> {
        self.dispatch
            .submit(Mutation::add_to_cart(product_id, quantity))
            .await
    }

    pub async fn toggle_wishlist(&self, product_id: &str) -> Result<MutationAck, MutationError> {
        self.dispatch.submit(Mutation::toggle_wishlist(product_id)).await
    }

    /// Record a search once typing pauses. Blank queries are ignored.
    pub fn save_recent_search(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.search.call(query.to_string());
    }

    /// Clearing supersedes any search still waiting to be saved.
    pub async fn clear_recent_searches(&self) -> Result<MutationAck, MutationError> {
        self.search.cancel();
        self.dispatch.submit(Mutation::ClearRecentSearches).await
    }

    /// Drop a pending debounced search, e.g. when the search box unmounts.
    pub fn cancel_pending_search(&self) -> bool {
        self.search.cancel()
    }
}
