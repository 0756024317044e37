use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::payment::PaymentOutcome;
use crate::place::{PlaceRef, TripType};
use crate::vehicle::SelectedVehicle;

/// Wizard position within the checkout flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    VehicleSelection,
    PassengerDetails,
    Payment,
    PaymentConfirmation,
}

/// Fixed forward order of the checkout steps. Transitions only ever move
/// one position to the right.
pub const STEP_ORDER: [BookingStep; 4] = [
    BookingStep::VehicleSelection,
    BookingStep::PassengerDetails,
    BookingStep::Payment,
    BookingStep::PaymentConfirmation,
];

impl BookingStep {
    /// Parse a wire step name. Unrecognized names are `None`, never a
    /// default: the orchestrator treats them as a terminal error.
    pub fn parse(name: &str) -> Option<BookingStep> {
        match name {
            "vehicle_selection" => Some(BookingStep::VehicleSelection),
            "passenger_details" => Some(BookingStep::PassengerDetails),
            "payment" => Some(BookingStep::Payment),
            "payment_confirmation" => Some(BookingStep::PaymentConfirmation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStep::VehicleSelection => "vehicle_selection",
            BookingStep::PassengerDetails => "passenger_details",
            BookingStep::Payment => "payment",
            BookingStep::PaymentConfirmation => "payment_confirmation",
        }
    }

    /// Zero-based position in [`STEP_ORDER`].
    pub fn index(&self) -> usize {
        match self {
            BookingStep::VehicleSelection => 0,
            BookingStep::PassengerDetails => 1,
            BookingStep::Payment => 2,
            BookingStep::PaymentConfirmation => 3,
        }
    }

    /// One-based position for the step indicator.
    pub fn ordinal(&self) -> usize {
        self.index() + 1
    }
}

impl std::fmt::Display for BookingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who the trip is for, as captured by the passenger-details step.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingFor {
    #[default]
    #[serde(rename = "self")]
    Self_,
    Other,
}

/// Passenger record persisted into the session data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PassengerDetails {
    pub booking_for: BookingFor,
    #[serde(default)]
    pub flight_number: String,
    /// Name shown on the driver's sign. Required when booking for
    /// someone else.
    #[serde(default)]
    pub pickup_sign: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub reference: String,
}

/// The accreting data record carried across steps.
///
/// Fields are only ever added or replaced by [`BookingData::merge`];
/// no step can clear what an earlier step wrote. Unknown fields from
/// other clients are preserved in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingData {
    #[serde(
        rename = "tripType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub trip_type: Option<TripType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PlaceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PlaceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<SelectedVehicle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_details: Option<PassengerDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentOutcome>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BookingData {
    /// Shallow overlay of `patch`: set fields replace, unset fields leave
    /// the existing value untouched. `extra` keys are overlaid per key.
    pub fn merge(&mut self, patch: BookingData) {
        if patch.trip_type.is_some() {
            self.trip_type = patch.trip_type;
        }
        if patch.from.is_some() {
            self.from = patch.from;
        }
        if patch.to.is_some() {
            self.to = patch.to;
        }
        if patch.date.is_some() {
            self.date = patch.date;
        }
        if patch.time.is_some() {
            self.time = patch.time;
        }
        if patch.duration_hours.is_some() {
            self.duration_hours = patch.duration_hours;
        }
        if patch.vehicle.is_some() {
            self.vehicle = patch.vehicle;
        }
        if patch.passenger_details.is_some() {
            self.passenger_details = patch.passenger_details;
        }
        if patch.payment.is_some() {
            self.payment = patch.payment;
        }
        for (key, value) in patch.extra {
            self.extra.insert(key, value);
        }
    }
}

/// The unit of continuity across steps, stored by the backend.
///
/// `current_step` is kept as the raw wire name; the orchestrator parses
/// it so an unrecognized step surfaces as its own error rather than a
/// decode failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingSession {
    pub session_id: String,
    pub current_step: String,
    #[serde(default)]
    pub booking_data: Option<BookingData>,
}
