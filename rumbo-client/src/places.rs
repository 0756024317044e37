use async_trait::async_trait;
use tracing::debug;

use rumbo_core::{BackendResult, Place, PlaceDirectory, RequestContext};

use crate::http::ApiClient;

/// Place lookup over the REST backend. Best effort; callers fall back on
/// failure rather than blocking.
#[derive(Clone)]
pub struct HttpPlaceDirectory {
    api: ApiClient,
}

impl HttpPlaceDirectory {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PlaceDirectory for HttpPlaceDirectory {
    async fn place_details(&self, ctx: &RequestContext, place_id: &str) -> BackendResult<Place> {
        debug!(place_id, "fetching place details");
        self.api
            .get_json(ctx, "/place-details", &[("place_id", place_id)])
            .await
    }
}
