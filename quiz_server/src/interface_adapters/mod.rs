// Interface adapters: wire protocol, HTTP routes and socket handling.

pub mod handlers;
pub mod http;
pub mod net;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod utils;
