//! Infrastructure layer: validation boundary, wire format and DI container
//!
//! This layer implements the remote validation boundary and wires up sessions.

pub mod di;
pub mod error;
pub mod traits;
pub mod wire;

pub use error::{InfraError, InfraResult, TransportError};
pub use traits::{EndpointValidator, RemoteValidator, TimeoutValidator, ValidationEndpoint};
