use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use rumbo_core::{BookingData, QuoteRequest, TripType};

pub mod confirmation;
pub mod passenger_details;
pub mod payment;
pub mod vehicle_selection;

/// Arrival estimate shown when route enrichment is unavailable:
/// pickup time plus this many minutes.
pub const DEFAULT_ARRIVAL_ESTIMATE_MINUTES: i64 = 35;

/// Display-only arrival/distance estimate. Never feeds a price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEstimate {
    pub arrival_time: Option<NaiveDateTime>,
    pub distance_km: Option<f64>,
}

impl RouteEstimate {
    /// The fixed fallback: pickup plus 35 minutes, no distance.
    pub fn fallback(pickup: Option<NaiveDateTime>) -> Self {
        Self {
            arrival_time: pickup
                .map(|p| p + Duration::minutes(DEFAULT_ARRIVAL_ESTIMATE_MINUTES)),
            distance_km: None,
        }
    }

    pub fn from_duration_hours(
        pickup: Option<NaiveDateTime>,
        hours: f64,
        distance_km: Option<f64>,
    ) -> Self {
        Self {
            arrival_time: pickup.map(|p| p + Duration::seconds((hours * 3600.0).round() as i64)),
            distance_km,
        }
    }
}

/// Pickup date/time from the session's `date` + `time` fields.
pub(crate) fn parse_pickup(data: &BookingData) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(data.date.as_deref()?, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(data.time.as_deref()?, "%H:%M").ok()?;
    Some(date.and_time(time))
}

/// Build the quote parameters this session's trip describes, if it has
/// enough of them. Two-point trips need both place ids; hourly trips get
/// the booked duration instead of a destination.
pub(crate) fn quote_request_for(data: &BookingData, vehicle_id: &str) -> Option<QuoteRequest> {
    let trip_type = data.trip_type?;
    let from_place_id = data.from.as_ref()?.place_id.clone()?;
    let to_place_id = match trip_type {
        TripType::OneWay => Some(data.to.as_ref()?.place_id.clone()?),
        TripType::Hourly => None,
    };
    Some(QuoteRequest {
        vehicle_id: vehicle_id.to_string(),
        trip_type,
        from_place_id,
        to_place_id,
        date: data.date.clone()?,
        time: data.time.clone()?,
        duration_hours: match trip_type {
            TripType::Hourly => data.duration_hours,
            TripType::OneWay => None,
        },
    })
}
