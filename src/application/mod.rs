//! Application layer: edit dispatching and form sessions
//!
//! This layer drives the domain model over time and depends on the validation boundary traits.

pub mod dispatcher;
pub mod error;
pub mod session;

pub use dispatcher::{ChangeDispatcher, DispatchEvent, DispatchPhase, DEFAULT_QUIET_PERIOD};
pub use error::{ApplicationError, ApplicationResult};
pub use session::{FieldView, FormCommand, FormHandle, FormSession, FormView};
