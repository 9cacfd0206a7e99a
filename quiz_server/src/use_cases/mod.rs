// Use cases layer: application workflows for the quiz coordinator.

pub mod gateway;
pub mod results;
pub mod session_registry;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

pub use gateway::{Connection, Gateway};
pub use results::{ClearResultsUseCase, ListResultsUseCase, SubmitResultUseCase};
pub use session_registry::SessionRegistry;
pub use types::{Binding, InboundEvent, RoomEvent, StartOutcome};
