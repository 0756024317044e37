use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::payment::{PaymentIntent, PaymentStatus};
use crate::place::{Place, TripType};
use crate::pricing::PriceBreakdown;
use crate::session::{BookingData, BookingSession};
use crate::vehicle::Vehicle;

/// Failure of a backend or gateway call.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("backend returned {code}: {message}")]
    Status { code: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("client not configured: {0}")]
    NotConfigured(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Trip parameters for a price computation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub vehicle_id: String,
    pub trip_type: TripType,
    pub from_place_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_place_id: Option<String>,
    pub date: String,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
}

/// Finalized booking returned by confirm-booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub payment_status: PaymentStatus,
}

/// Remote store of booking sessions, keyed by opaque session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn fetch(&self, ctx: &RequestContext, session_id: &str) -> BackendResult<BookingSession>;

    /// Full replace of the session's data record and step pointer.
    async fn update(
        &self,
        ctx: &RequestContext,
        session_id: &str,
        booking_data: &BookingData,
        current_step: &str,
    ) -> BackendResult<BookingSession>;
}

/// Price computation for a set of trip parameters.
#[async_trait]
pub trait QuoteService: Send + Sync {
    async fn price_quote(
        &self,
        ctx: &RequestContext,
        request: &QuoteRequest,
    ) -> BackendResult<PriceBreakdown>;
}

/// Payment-intent lifecycle and booking finalization.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Create an authorization handle sized to `amount`.
    async fn create_intent(
        &self,
        ctx: &RequestContext,
        amount: f64,
        currency: &str,
        session_id: &str,
    ) -> BackendResult<PaymentIntent>;

    /// Record the payment method actually charged against an intent.
    async fn update_payment_method(
        &self,
        ctx: &RequestContext,
        payment_intent_id: &str,
        payment_method_id: &str,
    ) -> BackendResult<()>;

    /// Finalize the booking for a confirmed payment. Idempotent per
    /// `gateway_transaction_id` on the backend side.
    async fn confirm_booking(
        &self,
        ctx: &RequestContext,
        session_id: &str,
        gateway_transaction_id: &str,
    ) -> BackendResult<BookingConfirmation>;
}

/// Catalog of offerable vehicles.
#[async_trait]
pub trait VehicleCatalog: Send + Sync {
    async fn list_vehicles(&self, ctx: &RequestContext) -> BackendResult<Vec<Vehicle>>;
}

/// Place lookup, best effort and display only.
#[async_trait]
pub trait PlaceDirectory: Send + Sync {
    async fn place_details(&self, ctx: &RequestContext, place_id: &str) -> BackendResult<Place>;
}
