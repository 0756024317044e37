use std::sync::Arc;

use tracing::{error, info};

use rumbo_core::{BookingData, BookingStep, RequestContext, Vehicle, VehicleCatalog};

use crate::wizard::WizardEvent;

#[derive(Debug, thiserror::Error)]
pub enum VehicleSelectionError {
    #[error("vehicle list is not available: {0}")]
    ListUnavailable(String),
    #[error("no vehicle selected")]
    NothingSelected,
    #[error("unknown vehicle: {0}")]
    UnknownVehicle(String),
}

#[derive(Debug, Clone, PartialEq)]
enum ListState {
    NotLoaded,
    Loaded(Vec<Vehicle>),
    /// Terminal for this step; `retry` is the only way out.
    Failed(String),
}

/// First step: pick one of the offerable vehicles.
///
/// The list is fetched once on mount; selection itself is local and
/// causes no network call until the step completes. There is no default
/// vehicle here: a failed fetch blocks completion until a manual retry.
pub struct VehicleSelectionStep {
    catalog: Arc<dyn VehicleCatalog>,
    list: ListState,
    selected: Option<Vehicle>,
}

impl VehicleSelectionStep {
    pub fn new(catalog: Arc<dyn VehicleCatalog>) -> Self {
        Self {
            catalog,
            list: ListState::NotLoaded,
            selected: None,
        }
    }

    /// Fetch the offerable vehicles once.
    pub async fn mount(&mut self, ctx: &RequestContext) -> Result<&[Vehicle], VehicleSelectionError> {
        if matches!(self.list, ListState::NotLoaded) {
            match self.catalog.list_vehicles(ctx).await {
                Ok(vehicles) => {
                    info!(count = vehicles.len(), "vehicle options loaded");
                    self.list = ListState::Loaded(vehicles);
                }
                Err(e) => {
                    error!(error = %e, "vehicle options fetch failed");
                    self.list = ListState::Failed(e.to_string());
                }
            }
        }
        match &self.list {
            ListState::Loaded(vehicles) => Ok(vehicles),
            ListState::Failed(message) => {
                Err(VehicleSelectionError::ListUnavailable(message.clone()))
            }
            ListState::NotLoaded => Err(VehicleSelectionError::ListUnavailable(
                "vehicle list not loaded".to_string(),
            )),
        }
    }

    /// Explicit user retry after a failed fetch.
    pub async fn retry(&mut self, ctx: &RequestContext) -> Result<&[Vehicle], VehicleSelectionError> {
        self.list = ListState::NotLoaded;
        self.mount(ctx).await
    }

    pub fn vehicles(&self) -> Option<&[Vehicle]> {
        match &self.list {
            ListState::Loaded(vehicles) => Some(vehicles),
            _ => None,
        }
    }

    /// Local selection; no network call.
    pub fn select(&mut self, vehicle_id: &str) -> Result<(), VehicleSelectionError> {
        let vehicles = match &self.list {
            ListState::Loaded(vehicles) => vehicles,
            ListState::Failed(message) => {
                return Err(VehicleSelectionError::ListUnavailable(message.clone()))
            }
            ListState::NotLoaded => {
                return Err(VehicleSelectionError::ListUnavailable(
                    "vehicle list not loaded".to_string(),
                ))
            }
        };
        let vehicle = vehicles
            .iter()
            .find(|v| v.id == vehicle_id)
            .ok_or_else(|| VehicleSelectionError::UnknownVehicle(vehicle_id.to_string()))?;
        self.selected = Some(vehicle.clone());
        Ok(())
    }

    pub fn selected(&self) -> Option<&Vehicle> {
        self.selected.as_ref()
    }

    /// Completion requires a non-null selection. Copies the `{id, name,
    /// price}` projection into the update.
    pub fn complete(&self) -> Result<WizardEvent, VehicleSelectionError> {
        if let ListState::Failed(message) = &self.list {
            return Err(VehicleSelectionError::ListUnavailable(message.clone()));
        }
        let vehicle = self
            .selected
            .as_ref()
            .ok_or(VehicleSelectionError::NothingSelected)?;

        let update = BookingData {
            vehicle: Some(vehicle.selected()),
            ..BookingData::default()
        };
        Ok(WizardEvent::StepCompleted {
            update,
            next: BookingStep::PassengerDetails,
        })
    }
}
