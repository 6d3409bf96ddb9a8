pub mod api;
pub mod config;
pub mod crypto;
pub mod error;
pub mod factory;
pub mod influx;
pub mod loader;
pub mod sql;
pub mod traits;
pub mod transport;

pub use api::{ApiConnection, ApiQueryRequest, ApiQueryResponse, ApiTransport, HttpApiTransport};
pub use config::{ApiConfig, ConnectionConfig, DatabaseConfig, InfluxConfig};
pub use crypto::{CredentialEncryptor, PlaintextEncryptor};
pub use error::{ConnectionError, Result};
pub use factory::ConnectionFactory;
pub use influx::InfluxConnection;
pub use loader::ConfigLoader;
pub use sql::SqlConnection;
pub use traits::{DataSourceConnection, SupportsAggregation, SupportsRawTables};
pub use transport::{FluxTransport, HttpFluxTransport};
