//! Shared HTTP API types
//!
//! Used on both sides of the wire: the storefront's remote service clients
//! decode [`ServiceEnvelope`], and the local API encodes [`ErrorResponse`].
//! No HTTP framework dependencies here.

pub mod types;

pub use types::{error_codes, ErrorBody, ErrorResponse, ServiceEnvelope};
