use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use rumbo_core::{BackendResult, BookingData, BookingSession, RequestContext, SessionStore};

use crate::http::ApiClient;

/// Booking-session access over the REST backend.
#[derive(Clone)]
pub struct HttpSessionStore {
    api: ApiClient,
}

impl HttpSessionStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSessionBody<'a> {
    booking_data: &'a BookingData,
    current_step: &'a str,
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn fetch(&self, ctx: &RequestContext, session_id: &str) -> BackendResult<BookingSession> {
        debug!(session_id, "fetching booking session");
        self.api
            .get_json(ctx, &format!("/booking-sessions/{}", session_id), &[])
            .await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        session_id: &str,
        booking_data: &BookingData,
        current_step: &str,
    ) -> BackendResult<BookingSession> {
        debug!(session_id, current_step, "updating booking session");
        let body = UpdateSessionBody {
            booking_data,
            current_step,
        };
        self.api
            .put_json(ctx, &format!("/booking-sessions/{}", session_id), &body)
            .await
    }
}
