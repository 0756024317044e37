pub mod config;
pub mod gateway;
pub mod http;
pub mod payments;
pub mod places;
pub mod quotes;
pub mod sessions;
pub mod vehicles;

pub use config::{ApiConfig, Config, GatewayConfig};
pub use gateway::HttpPaymentGateway;
pub use http::ApiClient;
pub use payments::HttpPaymentService;
pub use places::HttpPlaceDirectory;
pub use quotes::HttpQuoteService;
pub use sessions::HttpSessionStore;
pub use vehicles::HttpVehicleCatalog;
