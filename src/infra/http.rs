//! reqwest-backed storefront API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, instrument};
use vitrine_api_types::MutationAck;

use crate::actions::{Mutation, MutationSink};
use crate::cache::CollectionKey;
use crate::config::ApiSettings;
use crate::fetch::{CollectionSource, FetchError};
use crate::session::AuthToken;

use super::error::InfraError;

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl ApiClient {
    /// `base` must end with `/` for relative endpoint paths to nest under it.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    pub fn from_settings(api: &ApiSettings) -> Result<Self, InfraError> {
        Self::new(api.base_url.clone(), api.request_timeout)
    }

    pub fn user_agent() -> &'static str {
        concat!("vitrine/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|err| FetchError::transport(format!("invalid endpoint `{path}`: {err}")))
    }

    /// Collection endpoint, with the ad grouping as query string where needed.
    fn collection_url(&self, key: CollectionKey) -> Result<Url, FetchError> {
        let mut url = self.url(key.path())?;
        if let Some((name, value)) = key.query() {
            url.query_pairs_mut().append_pair(name, value);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, token: Option<&AuthToken>) -> RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose());
        }
        request
    }

    /// Send and read the body. Non-success statuses become errors; 401 is
    /// reported as [`FetchError::Unauthorized`].
    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, FetchError> {
        let response = request.send().await.map_err(|err| self.map_send_error(err))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(FetchError::Unauthorized);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| self.map_send_error(err))?;
        Ok(body.to_vec())
    }

    fn map_send_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::transport(err)
        }
    }
}

#[async_trait]
impl CollectionSource for ApiClient {
    #[instrument(skip(self, token), fields(key = %key))]
    async fn fetch(&self, key: CollectionKey, token: Option<&AuthToken>) -> Result<Value, FetchError> {
        let request = self.request(Method::GET, self.collection_url(key)?, token);
        let body = self.send(request).await?;
        debug!(bytes = body.len(), "Collection response received");
        serde_json::from_slice(&body).map_err(FetchError::decode)
    }
}

#[async_trait]
impl MutationSink for ApiClient {
    #[instrument(skip_all, fields(mutation = mutation.label()))]
    async fn submit(&self, mutation: &Mutation, token: &AuthToken) -> Result<MutationAck, FetchError> {
        let token = Some(token);
        let request = match mutation {
            Mutation::AddToCart(body) => self
                .request(Method::POST, self.url("cart")?, token)
                .json(body),
            Mutation::ToggleWishlist(body) => self
                .request(Method::POST, self.url("wishlist/toggle")?, token)
                .json(body),
            Mutation::SaveRecentSearch(body) => self
                .request(Method::POST, self.url("search/recent")?, token)
                .json(body),
            Mutation::ClearRecentSearches => {
                self.request(Method::DELETE, self.url("search/recent")?, token)
            }
        };

        let body = self.send(request).await?;
        // The acknowledgement body is informational; an empty or foreign
        // body still means the mutation went through.
        Ok(serde_json::from_slice(&body).unwrap_or_default())
    }
}
