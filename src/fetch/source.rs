use async_trait::async_trait;
use serde_json::Value;

use crate::cache::CollectionKey;
use crate::session::AuthToken;

use super::error::FetchError;

/// Read endpoint feeding the collection cache.
///
/// Implementations return the whole response body; the orchestrator pulls the
/// collection out of [`CollectionKey::payload_field`].
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn fetch(
        &self,
        key: CollectionKey,
        token: Option<&AuthToken>,
    ) -> Result<Value, FetchError>;
}
