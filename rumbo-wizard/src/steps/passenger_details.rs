use std::sync::Arc;

use tracing::warn;

use rumbo_core::{
    BookingData, BookingFor, BookingStep, PassengerDetails, Place, PlaceDirectory, QuoteService,
    RequestContext,
};

use crate::steps::{parse_pickup, quote_request_for, RouteEstimate};
use crate::wizard::WizardEvent;

#[derive(Debug, thiserror::Error)]
pub enum PassengerValidationError {
    #[error("pickup sign is required when booking for someone else")]
    PickupSignRequired,
}

/// Form captured by the passenger-details step.
#[derive(Debug, Clone, Default)]
pub struct PassengerForm {
    pub booking_for: BookingFor,
    pub flight_number: String,
    pub pickup_sign: String,
    pub notes: String,
    pub reference: String,
}

impl PassengerForm {
    fn into_details(self) -> PassengerDetails {
        PassengerDetails {
            booking_for: self.booking_for,
            flight_number: self.flight_number,
            pickup_sign: self.pickup_sign,
            notes: self.notes,
            reference: self.reference,
        }
    }
}

/// Route context shown alongside the form. Produced by best-effort
/// enrichment and safe to display even when every lookup failed.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TripPreview {
    pub from_place: Option<Place>,
    pub to_place: Option<Place>,
    pub estimate: RouteEstimate,
}

/// Second step: who the trip is for, plus display-only route enrichment.
pub struct PassengerDetailsStep {
    places: Arc<dyn PlaceDirectory>,
    quotes: Arc<dyn QuoteService>,
}

impl PassengerDetailsStep {
    pub fn new(places: Arc<dyn PlaceDirectory>, quotes: Arc<dyn QuoteService>) -> Self {
        Self { places, quotes }
    }

    /// Best-effort enrichment. Never fails and never blocks submission:
    /// any lookup error degrades to the fixed 35-minute arrival fallback.
    pub async fn enrich(&self, ctx: &RequestContext, data: &BookingData) -> TripPreview {
        let pickup = parse_pickup(data);
        let mut preview = TripPreview {
            from_place: None,
            to_place: None,
            estimate: RouteEstimate::fallback(pickup),
        };

        let two_point = data.trip_type.map(|t| t.is_two_point()).unwrap_or(false);
        if !two_point {
            return preview;
        }

        if let Some(place_id) = data.from.as_ref().and_then(|p| p.place_id.as_deref()) {
            preview.from_place = self.places.place_details(ctx, place_id).await.ok();
        }
        if let Some(place_id) = data.to.as_ref().and_then(|p| p.place_id.as_deref()) {
            preview.to_place = self.places.place_details(ctx, place_id).await.ok();
        }

        let vehicle_id = match data.vehicle.as_ref() {
            Some(v) => v.id.clone(),
            None => return preview,
        };
        let Some(request) = quote_request_for(data, &vehicle_id) else {
            return preview;
        };
        match self.quotes.price_quote(ctx, &request).await {
            Ok(quote) => {
                if let Some(hours) = quote.estimated_duration_hours {
                    preview.estimate = RouteEstimate::from_duration_hours(
                        pickup,
                        hours,
                        quote.estimated_distance_km,
                    );
                } else {
                    preview.estimate.distance_km = quote.estimated_distance_km;
                }
            }
            Err(e) => {
                warn!(error = %e, "price preview failed, keeping default arrival estimate");
            }
        }

        preview
    }

    /// The pickup sign is required when booking for someone else; this is
    /// validated locally, not delegated to the backend.
    pub fn validate(&self, form: &PassengerForm) -> Result<(), PassengerValidationError> {
        if form.booking_for == BookingFor::Other && form.pickup_sign.trim().is_empty() {
            return Err(PassengerValidationError::PickupSignRequired);
        }
        Ok(())
    }

    pub fn complete(&self, form: PassengerForm) -> Result<WizardEvent, PassengerValidationError> {
        self.validate(&form)?;
        let update = BookingData {
            passenger_details: Some(form.into_details()),
            ..BookingData::default()
        };
        Ok(WizardEvent::StepCompleted {
            update,
            next: BookingStep::Payment,
        })
    }
}
