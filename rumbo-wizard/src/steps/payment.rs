use std::sync::Arc;

use tracing::{info, warn};

use rumbo_core::{
    fallback_vehicle, pricing, BookingData, BookingStep, PaymentGateway, PaymentIntent,
    PaymentOutcome, PaymentService, PaymentStatus, PriceBreakdown, QuoteService, RequestContext,
    SelectedVehicle, VehicleCatalog,
};

use crate::steps::quote_request_for;
use crate::wizard::WizardEvent;

#[derive(Debug, thiserror::Error)]
pub enum PaymentStepError {
    /// Gateway not configured. Fatal; there is nothing to retry.
    #[error("payment gateway is not configured: {0}")]
    Configuration(String),
    /// Quote or intent setup failed. Retryable via an explicit retry.
    #[error("payment initialization failed: {0}")]
    Initialization(String),
    /// The resolved vehicle cannot size an authorization. Terminal for
    /// this step.
    #[error("vehicle data is unusable: {0}")]
    VehicleData(String),
    /// Confirmation rejected by the gateway. Surfaced verbatim;
    /// resubmission is allowed.
    #[error("gateway confirmation failed: {0}")]
    Gateway(String),
    #[error("gateway confirmation returned no transaction id")]
    MissingTransactionId,
}

/// Payment-collection surface bound to one authorization handle.
///
/// `generation` changes whenever the handle does; a consumer must
/// discard the previous surface then, so no stale card state survives a
/// price change.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PaymentSurface {
    pub intent: PaymentIntent,
    pub generation: u64,
}

/// Third step: resolve the true price, hold an authorization sized to
/// it, and collect the card confirmation.
pub struct PaymentStep {
    quotes: Arc<dyn QuoteService>,
    payments: Arc<dyn PaymentService>,
    catalog: Arc<dyn VehicleCatalog>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    session_id: Option<String>,
    vehicle: Option<SelectedVehicle>,
    price: Option<PriceBreakdown>,
    quote_degraded: bool,
    intent: Option<PaymentIntent>,
    last_requested_minor: Option<i64>,
    surface_generation: u64,
}

impl PaymentStep {
    /// `gateway` is `None` when the publishable key is missing; mounting
    /// then fails with a configuration error instead of crashing.
    pub fn new(
        quotes: Arc<dyn QuoteService>,
        payments: Arc<dyn PaymentService>,
        catalog: Arc<dyn VehicleCatalog>,
        gateway: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        Self {
            quotes,
            payments,
            catalog,
            gateway,
            session_id: None,
            vehicle: None,
            price: None,
            quote_degraded: false,
            intent: None,
            last_requested_minor: None,
            surface_generation: 0,
        }
    }

    /// Resolve vehicle, then price, then the authorization handle, in
    /// that order. Re-entrant: an unchanged resolved total keeps the
    /// existing handle, a changed one replaces it.
    pub async fn mount(
        &mut self,
        ctx: &RequestContext,
        session_id: &str,
        data: &BookingData,
    ) -> Result<PaymentSurface, PaymentStepError> {
        if self.gateway.is_none() {
            return Err(PaymentStepError::Configuration(
                "publishable key is not set".to_string(),
            ));
        }

        // Handles are never reused across sessions
        if self.session_id.as_deref() != Some(session_id) {
            self.intent = None;
            self.last_requested_minor = None;
            self.session_id = Some(session_id.to_string());
        }

        let vehicle = self.resolve_vehicle(ctx, data).await;
        if vehicle.price <= 0.0 {
            return Err(PaymentStepError::VehicleData(format!(
                "vehicle {} has no usable price",
                vehicle.id
            )));
        }

        let price = self.resolve_price(ctx, data, &vehicle).await;
        self.vehicle = Some(vehicle);
        self.price = Some(price);

        self.ensure_intent(ctx).await?;
        self.surface().ok_or_else(|| {
            PaymentStepError::Initialization("no payment authorization held".to_string())
        })
    }

    /// Explicit retry after an initialization failure.
    pub async fn retry(
        &mut self,
        ctx: &RequestContext,
        session_id: &str,
        data: &BookingData,
    ) -> Result<PaymentSurface, PaymentStepError> {
        self.mount(ctx, session_id, data).await
    }

    /// Session vehicle if present, else a best-effort catalog lookup by
    /// the auxiliary identifier, else the fixed fallback. Degrades
    /// instead of failing: the authoritative total still comes from the
    /// quote whenever that call succeeds.
    async fn resolve_vehicle(&self, ctx: &RequestContext, data: &BookingData) -> SelectedVehicle {
        if let Some(vehicle) = &data.vehicle {
            return vehicle.clone();
        }

        let aux_id = data
            .extra
            .get("vehicle_id")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        if let Some(aux_id) = aux_id {
            match self.catalog.list_vehicles(ctx).await {
                Ok(vehicles) => {
                    if let Some(found) = vehicles.into_iter().find(|v| v.id == aux_id) {
                        warn!(vehicle_id = %aux_id, "session had no vehicle, recovered from catalog");
                        return found.selected();
                    }
                }
                Err(e) => {
                    warn!(error = %e, "vehicle lookup failed");
                }
            }
        }

        warn!("substituting fallback vehicle");
        fallback_vehicle()
    }

    /// Quote the trip; on failure fall back to the vehicle list price
    /// with the flat default tax, so payment is never blocked purely by
    /// quote-service unavailability.
    async fn resolve_price(
        &mut self,
        ctx: &RequestContext,
        data: &BookingData,
        vehicle: &SelectedVehicle,
    ) -> PriceBreakdown {
        let request = quote_request_for(data, &vehicle.id);
        if let Some(request) = request {
            match self.quotes.price_quote(ctx, &request).await {
                Ok(price) => {
                    self.quote_degraded = false;
                    return price;
                }
                Err(e) => {
                    warn!(error = %e, "price quote failed, falling back to list price");
                }
            }
        } else {
            warn!("trip parameters incomplete, falling back to list price");
        }
        self.quote_degraded = true;
        PriceBreakdown::fallback_from_list_price(vehicle.price)
    }

    /// Create the authorization handle for the resolved total, or keep
    /// the current one when the total has not changed by value.
    async fn ensure_intent(&mut self, ctx: &RequestContext) -> Result<(), PaymentStepError> {
        let price = self
            .price
            .as_ref()
            .ok_or_else(|| PaymentStepError::Initialization("no resolved price".to_string()))?;
        let session_id = self
            .session_id
            .clone()
            .ok_or_else(|| PaymentStepError::Initialization("no session bound".to_string()))?;

        let minor = pricing::minor_units(price.total);
        if self.intent.is_some() && self.last_requested_minor == Some(minor) {
            return Ok(());
        }

        let intent = self
            .payments
            .create_intent(ctx, price.total, &price.currency, &session_id)
            .await
            .map_err(|e| PaymentStepError::Initialization(e.to_string()))?;
        info!(intent_id = %intent.id, amount = price.total, "payment intent created");

        self.intent = Some(intent);
        self.last_requested_minor = Some(minor);
        // New handle: the collection surface must be remounted
        self.surface_generation += 1;
        Ok(())
    }

    pub fn surface(&self) -> Option<PaymentSurface> {
        self.intent.as_ref().map(|intent| PaymentSurface {
            intent: intent.clone(),
            generation: self.surface_generation,
        })
    }

    pub fn price(&self) -> Option<&PriceBreakdown> {
        self.price.as_ref()
    }

    pub fn vehicle(&self) -> Option<&SelectedVehicle> {
        self.vehicle.as_ref()
    }

    /// Whether the shown price is the degraded list-price fallback.
    pub fn quote_degraded(&self) -> bool {
        self.quote_degraded
    }

    /// Confirm the payment method against the current handle. Advancing
    /// without a resolvable gateway transaction id is not allowed: the
    /// confirmation step finalizes the booking keyed by it.
    ///
    /// The gateway authenticates with the publishable key, so no request
    /// context is involved here.
    pub async fn confirm(
        &mut self,
        payment_method_id: &str,
    ) -> Result<WizardEvent, PaymentStepError> {
        let gateway = self.gateway.as_ref().ok_or_else(|| {
            PaymentStepError::Configuration("publishable key is not set".to_string())
        })?;
        let intent = self.intent.as_ref().ok_or_else(|| {
            PaymentStepError::Initialization("no payment authorization held".to_string())
        })?;

        let confirmation = gateway
            .confirm_card_payment(&intent.client_secret, payment_method_id)
            .await
            .map_err(|e| PaymentStepError::Gateway(e.to_string()))?;

        if confirmation.status != PaymentStatus::Succeeded {
            return Err(PaymentStepError::Gateway(format!(
                "payment not completed: {:?}",
                confirmation.status
            )));
        }
        let transaction_id = confirmation
            .transaction_id
            .ok_or(PaymentStepError::MissingTransactionId)?;

        info!(transaction_id = %transaction_id, "card payment confirmed");
        let update = BookingData {
            payment: Some(PaymentOutcome {
                method: payment_method_id.to_string(),
                status: confirmation.status,
                amount: intent.amount,
                currency: intent.currency.clone(),
                transaction_id,
            }),
            ..BookingData::default()
        };
        Ok(WizardEvent::StepCompleted {
            update,
            next: BookingStep::PaymentConfirmation,
        })
    }
}
