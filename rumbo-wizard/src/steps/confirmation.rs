use std::sync::Arc;

use tracing::{error, info, warn};

use rumbo_core::{
    BookingConfirmation, BookingData, BookingSession, PaymentOutcome, PaymentService,
    PaymentStatus, QuoteService, RequestContext,
};

use crate::steps::{parse_pickup, quote_request_for, RouteEstimate};

#[derive(Debug, thiserror::Error)]
pub enum ConfirmationError {
    #[error("no gateway transaction id available")]
    MissingTransactionId,
    /// The likely cause is a transient gateway/backend disagreement, so
    /// this is surfaced as a retry-payment affordance, not a dead end.
    #[error("booking could not be finalized: {0}")]
    FinalizeFailed(String),
}

/// What the confirmation step shows once the booking is finalized.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ConfirmationView {
    pub booking_id: String,
    pub payment_status: PaymentStatus,
    /// Display-only re-estimate for two-point trips. Never re-prices.
    pub estimate: Option<RouteEstimate>,
}

/// Final step: finalize the booking for the confirmed payment.
///
/// Safe to re-enter (browser back/refresh): the backend contract is
/// idempotent per transaction id, and a confirmed result already held in
/// memory short-circuits any further finalize call.
pub struct ConfirmationStep {
    payments: Arc<dyn PaymentService>,
    quotes: Arc<dyn QuoteService>,
    confirmed: Option<(String, BookingConfirmation)>,
}

impl ConfirmationStep {
    pub fn new(payments: Arc<dyn PaymentService>, quotes: Arc<dyn QuoteService>) -> Self {
        Self {
            payments,
            quotes,
            confirmed: None,
        }
    }

    /// Resolve the gateway transaction id and finalize the booking.
    ///
    /// A transaction id carried in the redirect URL wins over the
    /// session's recorded outcome: a redirect implies the most recent
    /// authoritative confirmation.
    pub async fn mount(
        &mut self,
        ctx: &RequestContext,
        session: &BookingSession,
        redirect_transaction_id: Option<&str>,
    ) -> Result<ConfirmationView, ConfirmationError> {
        let data = session.booking_data.as_ref();
        let outcome = data.and_then(|d| d.payment.as_ref());

        let transaction_id = redirect_transaction_id
            .map(str::to_string)
            .or_else(|| outcome.map(|o| o.transaction_id.clone()))
            .ok_or(ConfirmationError::MissingTransactionId)?;

        let confirmation = self
            .finalize(ctx, &session.session_id, &transaction_id, outcome)
            .await?;

        let estimate = match data {
            Some(data) if data.trip_type.map(|t| t.is_two_point()).unwrap_or(false) => {
                self.display_estimate(ctx, data).await
            }
            _ => None,
        };

        Ok(ConfirmationView {
            booking_id: confirmation.booking_id,
            payment_status: confirmation.payment_status,
            estimate,
        })
    }

    /// Resubmission path after a finalize failure.
    pub async fn retry(
        &mut self,
        ctx: &RequestContext,
        session: &BookingSession,
        redirect_transaction_id: Option<&str>,
    ) -> Result<ConfirmationView, ConfirmationError> {
        self.mount(ctx, session, redirect_transaction_id).await
    }

    async fn finalize(
        &mut self,
        ctx: &RequestContext,
        session_id: &str,
        transaction_id: &str,
        outcome: Option<&PaymentOutcome>,
    ) -> Result<BookingConfirmation, ConfirmationError> {
        if let Some((confirmed_txn, confirmation)) = &self.confirmed {
            if confirmed_txn == transaction_id {
                return Ok(confirmation.clone());
            }
        }

        // Record the payment method actually charged before finalizing;
        // a failure here must not block the booking itself.
        if let Some(outcome) = outcome {
            if let Err(e) = self
                .payments
                .update_payment_method(ctx, transaction_id, &outcome.method)
                .await
            {
                warn!(error = %e, "payment method notification failed");
            }
        }

        match self
            .payments
            .confirm_booking(ctx, session_id, transaction_id)
            .await
        {
            Ok(confirmation) => {
                info!(
                    booking_id = %confirmation.booking_id,
                    transaction_id,
                    "booking finalized"
                );
                self.confirmed = Some((transaction_id.to_string(), confirmation.clone()));
                Ok(confirmation)
            }
            Err(e) => {
                error!(error = %e, transaction_id, "finalize failed");
                Err(ConfirmationError::FinalizeFailed(e.to_string()))
            }
        }
    }

    /// Recompute distance/arrival for display. Best effort; never
    /// affects the already-charged price.
    async fn display_estimate(
        &self,
        ctx: &RequestContext,
        data: &BookingData,
    ) -> Option<RouteEstimate> {
        let pickup = parse_pickup(data);
        let vehicle_id = data.vehicle.as_ref()?.id.clone();
        let request = quote_request_for(data, &vehicle_id)?;
        match self.quotes.price_quote(ctx, &request).await {
            Ok(quote) => Some(match quote.estimated_duration_hours {
                Some(hours) => {
                    RouteEstimate::from_duration_hours(pickup, hours, quote.estimated_distance_km)
                }
                None => RouteEstimate::fallback(pickup),
            }),
            Err(e) => {
                warn!(error = %e, "display re-estimate failed");
                Some(RouteEstimate::fallback(pickup))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use rumbo_core::{
        BackendError, BackendResult, BookingData, PaymentIntent, PlaceRef, PriceBreakdown,
        QuoteRequest, SelectedVehicle, TripType,
    };

    struct ScriptedPayments {
        confirm_calls: AtomicUsize,
        method_calls: AtomicUsize,
        fail_confirm: AtomicBool,
        fail_method_update: bool,
        confirmed_with: Mutex<Vec<String>>,
    }

    impl ScriptedPayments {
        fn new() -> Self {
            Self {
                confirm_calls: AtomicUsize::new(0),
                method_calls: AtomicUsize::new(0),
                fail_confirm: AtomicBool::new(false),
                fail_method_update: false,
                confirmed_with: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaymentService for ScriptedPayments {
        async fn create_intent(
            &self,
            _ctx: &RequestContext,
            _amount: f64,
            _currency: &str,
            _session_id: &str,
        ) -> BackendResult<PaymentIntent> {
            unimplemented!("not exercised by the confirmation step")
        }

        async fn update_payment_method(
            &self,
            _ctx: &RequestContext,
            _payment_intent_id: &str,
            _payment_method_id: &str,
        ) -> BackendResult<()> {
            self.method_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_method_update {
                return Err(BackendError::Status {
                    code: 500,
                    message: "method update failed".to_string(),
                });
            }
            Ok(())
        }

        async fn confirm_booking(
            &self,
            _ctx: &RequestContext,
            _session_id: &str,
            gateway_transaction_id: &str,
        ) -> BackendResult<BookingConfirmation> {
            self.confirm_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_confirm.load(Ordering::SeqCst) {
                return Err(BackendError::Status {
                    code: 409,
                    message: "payment not settled".to_string(),
                });
            }
            self.confirmed_with
                .lock()
                .unwrap()
                .push(gateway_transaction_id.to_string());
            // Idempotent backend: the booking id is derived from the
            // transaction id, so repeats return the same booking
            Ok(BookingConfirmation {
                booking_id: format!("b-{}", gateway_transaction_id),
                payment_status: PaymentStatus::Succeeded,
            })
        }
    }

    struct DownQuotes;

    #[async_trait]
    impl QuoteService for DownQuotes {
        async fn price_quote(
            &self,
            _ctx: &RequestContext,
            _request: &QuoteRequest,
        ) -> BackendResult<PriceBreakdown> {
            Err(BackendError::Transport("quote service unreachable".to_string()))
        }
    }

    fn paid_session() -> BookingSession {
        BookingSession {
            session_id: "s-1".to_string(),
            current_step: "payment_confirmation".to_string(),
            booking_data: Some(BookingData {
                trip_type: Some(TripType::OneWay),
                from: Some(PlaceRef {
                    place_id: Some("pl-a".to_string()),
                    description: Some("Airport".to_string()),
                }),
                to: Some(PlaceRef {
                    place_id: Some("pl-b".to_string()),
                    description: Some("Hotel".to_string()),
                }),
                date: Some("2025-05-10".to_string()),
                time: Some("10:32".to_string()),
                vehicle: Some(SelectedVehicle {
                    id: "v1".to_string(),
                    name: "Sedan".to_string(),
                    price: 65.0,
                }),
                payment: Some(PaymentOutcome {
                    method: "pm_card_visa".to_string(),
                    status: PaymentStatus::Succeeded,
                    amount: 65.0,
                    currency: "EUR".to_string(),
                    transaction_id: "pi_tx_1".to_string(),
                }),
                ..BookingData::default()
            }),
        }
    }

    #[tokio::test]
    async fn test_reentry_does_not_duplicate_booking() {
        let payments = Arc::new(ScriptedPayments::new());
        let mut step = ConfirmationStep::new(payments.clone(), Arc::new(DownQuotes));
        let session = paid_session();

        let first = step
            .mount(&RequestContext::anonymous(), &session, None)
            .await
            .unwrap();
        // Reloaded after a successful first confirmation, same transaction
        let second = step
            .mount(&RequestContext::anonymous(), &session, None)
            .await
            .unwrap();

        assert_eq!(first.booking_id, second.booking_id);
        assert_eq!(payments.confirm_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_redirect_transaction_id_takes_precedence() {
        let payments = Arc::new(ScriptedPayments::new());
        let mut step = ConfirmationStep::new(payments.clone(), Arc::new(DownQuotes));

        step.mount(&RequestContext::anonymous(), &paid_session(), Some("pi_tx_2"))
            .await
            .unwrap();

        let confirmed = payments.confirmed_with.lock().unwrap();
        assert_eq!(confirmed.as_slice(), ["pi_tx_2"]);
    }

    #[tokio::test]
    async fn test_missing_transaction_id_everywhere_is_an_error() {
        let payments = Arc::new(ScriptedPayments::new());
        let mut step = ConfirmationStep::new(payments, Arc::new(DownQuotes));

        let mut session = paid_session();
        if let Some(data) = session.booking_data.as_mut() {
            data.payment = None;
        }

        let err = step
            .mount(&RequestContext::anonymous(), &session, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ConfirmationError::MissingTransactionId));
    }

    #[tokio::test]
    async fn test_finalize_failure_then_retry_succeeds() {
        let payments = Arc::new(ScriptedPayments::new());
        payments.fail_confirm.store(true, Ordering::SeqCst);
        let mut step = ConfirmationStep::new(payments.clone(), Arc::new(DownQuotes));
        let session = paid_session();

        let err = step
            .mount(&RequestContext::anonymous(), &session, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ConfirmationError::FinalizeFailed(_)));

        payments.fail_confirm.store(false, Ordering::SeqCst);
        let view = step
            .retry(&RequestContext::anonymous(), &session, None)
            .await
            .unwrap();
        assert_eq!(view.booking_id, "b-pi_tx_1");
        assert_eq!(payments.confirm_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_method_notification_failure_does_not_block_finalize() {
        let mut payments = ScriptedPayments::new();
        payments.fail_method_update = true;
        let payments = Arc::new(payments);
        let mut step = ConfirmationStep::new(payments.clone(), Arc::new(DownQuotes));

        let view = step
            .mount(&RequestContext::anonymous(), &paid_session(), None)
            .await
            .unwrap();
        assert_eq!(view.booking_id, "b-pi_tx_1");
        assert_eq!(payments.method_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_two_point_trip_gets_display_estimate() {
        let payments = Arc::new(ScriptedPayments::new());
        let mut step = ConfirmationStep::new(payments, Arc::new(DownQuotes));

        let view = step
            .mount(&RequestContext::anonymous(), &paid_session(), None)
            .await
            .unwrap();

        // Quote service is down, so the estimate is the fixed fallback
        let estimate = view.estimate.unwrap();
        assert_eq!(
            estimate.arrival_time.unwrap().format("%H:%M").to_string(),
            "11:07"
        );
    }

    #[tokio::test]
    async fn test_hourly_trip_has_no_estimate() {
        let payments = Arc::new(ScriptedPayments::new());
        let mut step = ConfirmationStep::new(payments, Arc::new(DownQuotes));

        let mut session = paid_session();
        if let Some(data) = session.booking_data.as_mut() {
            data.trip_type = Some(TripType::Hourly);
            data.to = None;
        }

        let view = step
            .mount(&RequestContext::anonymous(), &session, None)
            .await
            .unwrap();
        assert!(view.estimate.is_none());
    }
}
