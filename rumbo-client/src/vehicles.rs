use async_trait::async_trait;
use tracing::debug;

use rumbo_core::{BackendResult, RequestContext, Vehicle, VehicleCatalog};

use crate::http::ApiClient;

/// Offerable-vehicle catalog over the REST backend.
#[derive(Clone)]
pub struct HttpVehicleCatalog {
    api: ApiClient,
}

impl HttpVehicleCatalog {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl VehicleCatalog for HttpVehicleCatalog {
    async fn list_vehicles(&self, ctx: &RequestContext) -> BackendResult<Vec<Vehicle>> {
        debug!("fetching vehicle options");
        self.api.get_json(ctx, "/vehicle-options", &[]).await
    }
}
