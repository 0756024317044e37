use serde::{Deserialize, Serialize};

/// Flat tax rate shown when the quote service cannot be reached and the
/// breakdown is rebuilt from the vehicle list price.
pub const DEFAULT_TAX_RATE: f64 = 0.21;

/// Currency assumed for list prices, which carry no currency of their own.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// One itemized line of a price breakdown. Display only; the charged
/// amount is always [`PriceBreakdown::total`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PriceComponent {
    BaseFare { amount: f64 },
    DistanceCharge { amount: f64 },
    TimeCharge { amount: f64 },
    Extras { amount: f64 },
    Surcharge { amount: f64, reason: String },
    Tax { amount: f64, rate: f64 },
}

impl PriceComponent {
    pub fn amount(&self) -> f64 {
        match self {
            PriceComponent::BaseFare { amount }
            | PriceComponent::DistanceCharge { amount }
            | PriceComponent::TimeCharge { amount }
            | PriceComponent::Extras { amount }
            | PriceComponent::Surcharge { amount, .. }
            | PriceComponent::Tax { amount, .. } => *amount,
        }
    }
}

/// Price computed for a set of trip parameters. Ephemeral: recomputed on
/// every visit to the payment step, never persisted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBreakdown {
    pub total: f64,
    pub currency: String,
    #[serde(default)]
    pub components: Vec<PriceComponent>,
    #[serde(default)]
    pub estimated_distance_km: Option<f64>,
    #[serde(default)]
    pub estimated_duration_hours: Option<f64>,
}

impl PriceBreakdown {
    /// Sum of the itemized lines.
    pub fn components_total(&self) -> f64 {
        self.components.iter().map(PriceComponent::amount).sum()
    }

    /// Itemized lines may round but must never exceed the charged total
    /// by more than a cent.
    pub fn is_itemization_consistent(&self) -> bool {
        self.components_total() <= self.total + 0.01
    }

    /// Tax line amount, if the breakdown carries one.
    pub fn tax_amount(&self) -> Option<f64> {
        self.components.iter().find_map(|c| match c {
            PriceComponent::Tax { amount, .. } => Some(*amount),
            _ => None,
        })
    }

    /// Best-effort breakdown built from the vehicle list price when the
    /// quote service is unavailable. The list price is tax-inclusive, so
    /// the total stays at the list price and the tax line is carved out
    /// of it at [`DEFAULT_TAX_RATE`].
    pub fn fallback_from_list_price(list_price: f64) -> Self {
        let tax = round_cents(list_price * DEFAULT_TAX_RATE);
        Self {
            total: list_price,
            currency: DEFAULT_CURRENCY.to_string(),
            components: vec![
                PriceComponent::BaseFare {
                    amount: round_cents(list_price - tax),
                },
                PriceComponent::Tax {
                    amount: tax,
                    rate: DEFAULT_TAX_RATE,
                },
            ],
            estimated_distance_km: None,
            estimated_duration_hours: None,
        }
    }

    /// Total formatted for display, e.g. `65.00 €`.
    pub fn display_total(&self) -> String {
        format!("{:.2} {}", self.total, currency_symbol(&self.currency))
    }
}

fn currency_symbol(currency: &str) -> &str {
    match currency {
        "EUR" => "€",
        "USD" => "$",
        "GBP" => "£",
        other => other,
    }
}

/// Round to the nearest cent.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Amount in integer minor units. Payment-intent amounts are compared in
/// this form so float noise can never look like a price change.
pub fn minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
