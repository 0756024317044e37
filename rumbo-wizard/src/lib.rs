pub mod steps;
pub mod wizard;

pub use steps::confirmation::{ConfirmationError, ConfirmationStep, ConfirmationView};
pub use steps::passenger_details::{
    PassengerDetailsStep, PassengerForm, PassengerValidationError, TripPreview,
};
pub use steps::payment::{PaymentStep, PaymentStepError, PaymentSurface};
pub use steps::vehicle_selection::{VehicleSelectionError, VehicleSelectionStep};
pub use steps::{RouteEstimate, DEFAULT_ARRIVAL_ESTIMATE_MINUTES};
pub use wizard::{BookingWizard, StepIndicator, WizardError, WizardEvent, WizardView};
