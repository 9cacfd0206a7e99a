// Domain layer: session identities, quiz results and the ports they depend on.

pub mod errors;
pub mod ports;
pub mod results;
pub mod session;

pub use errors::{ResultError, SessionError};
pub use ports::{Clock, ResultStore};
pub use results::{NewResult, QuizResult};
pub use session::{Identity, SessionId};
