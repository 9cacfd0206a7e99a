// Network adapter for realtime client sockets.

pub mod client;

pub use client::ws_handler;
