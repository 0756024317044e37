pub mod backend;
pub mod context;
pub mod payment;
pub mod place;
pub mod pricing;
pub mod session;
pub mod vehicle;

pub use backend::{
    BackendError, BackendResult, BookingConfirmation, PaymentService, PlaceDirectory,
    QuoteRequest, QuoteService, SessionStore, VehicleCatalog,
};
pub use context::RequestContext;
pub use payment::{GatewayConfirmation, PaymentGateway, PaymentIntent, PaymentOutcome, PaymentStatus};
pub use place::{Place, PlaceRef, TripType};
pub use pricing::{PriceBreakdown, PriceComponent, DEFAULT_CURRENCY, DEFAULT_TAX_RATE};
pub use session::{BookingData, BookingFor, BookingSession, BookingStep, PassengerDetails, STEP_ORDER};
pub use vehicle::{fallback_vehicle, SelectedVehicle, Vehicle};
