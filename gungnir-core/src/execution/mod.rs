//! Execution - transport abstraction and the order routing pipeline

pub mod error;
pub mod router;
pub mod transport;
pub mod types;

pub use error::RoutingError;
pub use router::{OrderRouter, RouterConfig};
pub use transport::{ConfigurationError, ExchangeTransport, TransportConfig};
pub use types::{ExchangeResponse, Fill, TransportError};
