use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::BackendResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    RequiresAction,
    Processing,
    Succeeded,
    Canceled,
    Failed,
}

/// Authorization handle issued by the backend for one concrete amount and
/// session. Recreated whenever the resolved total changes; never reused
/// across sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: f64,
    pub currency: String,
}

/// Payment record merged into the session once the gateway confirms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentOutcome {
    /// Payment method identifier actually charged.
    pub method: String,
    pub status: PaymentStatus,
    pub amount: f64,
    pub currency: String,
    /// Gateway transaction id; the confirmation step finalizes the
    /// booking server-side keyed by this.
    pub transaction_id: String,
}

/// Result of a card confirmation attempt against the gateway.
///
/// A missing transaction id is not a success, whatever the status says:
/// the confirmation step cannot finalize without it.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfirmation {
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
}

/// Card-payment gateway used by the payment step.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Confirm a payment method against the intent named by `client_secret`.
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        payment_method_id: &str,
    ) -> BackendResult<GatewayConfirmation>;
}
