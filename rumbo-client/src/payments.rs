use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use rumbo_core::{
    BackendResult, BookingConfirmation, PaymentIntent, PaymentService, RequestContext,
};

use crate::http::ApiClient;

/// Payment-intent lifecycle and booking finalization over the REST backend.
#[derive(Clone)]
pub struct HttpPaymentService {
    api: ApiClient,
}

impl HttpPaymentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateIntentBody<'a> {
    amount: f64,
    currency: &'a str,
    session_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePaymentMethodBody<'a> {
    payment_intent_id: &'a str,
    payment_method_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmBookingBody<'a> {
    session_id: &'a str,
    gateway_transaction_id: &'a str,
}

#[async_trait]
impl PaymentService for HttpPaymentService {
    async fn create_intent(
        &self,
        ctx: &RequestContext,
        amount: f64,
        currency: &str,
        session_id: &str,
    ) -> BackendResult<PaymentIntent> {
        debug!(session_id, amount, "creating payment intent");
        let body = CreateIntentBody {
            amount,
            currency,
            session_id,
        };
        self.api.post_json(ctx, "/payment-intents", &body).await
    }

    async fn update_payment_method(
        &self,
        ctx: &RequestContext,
        payment_intent_id: &str,
        payment_method_id: &str,
    ) -> BackendResult<()> {
        debug!(payment_intent_id, "recording payment method");
        let body = UpdatePaymentMethodBody {
            payment_intent_id,
            payment_method_id,
        };
        self.api.post_unit(ctx, "/payment-method-update", &body).await
    }

    async fn confirm_booking(
        &self,
        ctx: &RequestContext,
        session_id: &str,
        gateway_transaction_id: &str,
    ) -> BackendResult<BookingConfirmation> {
        let body = ConfirmBookingBody {
            session_id,
            gateway_transaction_id,
        };
        let confirmation: BookingConfirmation =
            self.api.post_json(ctx, "/confirm-booking", &body).await?;
        info!(
            session_id,
            booking_id = %confirmation.booking_id,
            "booking confirmed"
        );
        Ok(confirmation)
    }
}
