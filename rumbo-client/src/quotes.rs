use async_trait::async_trait;
use tracing::debug;

use rumbo_core::{BackendResult, PriceBreakdown, QuoteRequest, QuoteService, RequestContext};

use crate::http::ApiClient;

/// Price computation over the REST backend.
#[derive(Clone)]
pub struct HttpQuoteService {
    api: ApiClient,
}

impl HttpQuoteService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl QuoteService for HttpQuoteService {
    async fn price_quote(
        &self,
        ctx: &RequestContext,
        request: &QuoteRequest,
    ) -> BackendResult<PriceBreakdown> {
        debug!(vehicle_id = %request.vehicle_id, "requesting price quote");
        self.api.post_json(ctx, "/price-quotes", request).await
    }
}
