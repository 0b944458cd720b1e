//! Read-only HTTP query surface.
//!
//! ## Endpoints
//!
//! - `GET /api/stock` - In-stock items for every source
//! - `GET /api/stock/:source` - In-stock items for one source (display name or slug)
//! - `GET /health` - Service health and ledger summary

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::request_logging;
pub use routes::{create_router, ServiceError};
pub use state::ServiceState;
