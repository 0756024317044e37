use serde::{Deserialize, Serialize};

/// Trip shape selected before the wizard mounts.
///
/// Sessions written by older clients carry the Spanish literals; those are
/// accepted on read and canonicalized on write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    #[serde(alias = "ida")]
    OneWay,
    #[serde(alias = "por_horas")]
    Hourly,
}

impl TripType {
    /// Two-point trips have a destination and therefore a route worth
    /// estimating; hourly dispositions do not.
    pub fn is_two_point(&self) -> bool {
        matches!(self, TripType::OneWay)
    }
}

/// Origin/destination descriptor as stored in the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaceRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Richer place descriptor returned by the place directory (display only).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_type_canonical_names() {
        let one_way: TripType = serde_json::from_str("\"one_way\"").unwrap();
        assert_eq!(one_way, TripType::OneWay);
        assert_eq!(serde_json::to_string(&one_way).unwrap(), "\"one_way\"");

        let hourly: TripType = serde_json::from_str("\"hourly\"").unwrap();
        assert_eq!(hourly, TripType::Hourly);
    }

    #[test]
    fn test_trip_type_legacy_aliases() {
        let one_way: TripType = serde_json::from_str("\"ida\"").unwrap();
        assert_eq!(one_way, TripType::OneWay);
        // Writes are always canonical, even for sessions read with aliases
        assert_eq!(serde_json::to_string(&one_way).unwrap(), "\"one_way\"");

        let hourly: TripType = serde_json::from_str("\"por_horas\"").unwrap();
        assert_eq!(hourly, TripType::Hourly);
    }

    #[test]
    fn test_two_point() {
        assert!(TripType::OneWay.is_two_point());
        assert!(!TripType::Hourly.is_two_point());
    }
}
