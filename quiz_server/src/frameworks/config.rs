use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

// Runtime/server settings read from the environment (and `.env` when present).

pub fn http_addr() -> SocketAddr {
    let host = env::var("QUIZ_SERVER_HOST")
        .ok()
        .and_then(|v| v.parse::<IpAddr>().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
    let port = env::var("QUIZ_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001);
    SocketAddr::new(host, port)
}

pub fn database_url() -> String {
    env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://quiz.sqlite?mode=rwc".to_string())
}

pub fn database_max_connections() -> u32 {
    env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|max| *max > 0)
        .unwrap_or(5)
}

pub fn admin_identity() -> String {
    env::var("QUIZ_ADMIN_IDENTITY")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "admin".to_string())
}

pub fn enforce_active() -> bool {
    matches!(
        env::var("QUIZ_ENFORCE_ACTIVE").as_deref(),
        Ok("1" | "true" | "TRUE" | "yes")
    )
}

pub fn room_broadcast_capacity() -> usize {
    env::var("ROOM_BROADCAST_CAPACITY")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|capacity| *capacity > 0)
        .unwrap_or(DEFAULT_ROOM_BROADCAST_CAPACITY)
}

pub const DEFAULT_ROOM_BROADCAST_CAPACITY: usize = 64;

/// Everything `run` needs to build application state.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub admin_identity: String,
    pub enforce_active: bool,
    pub room_broadcast_capacity: usize,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: database_url(),
            database_max_connections: database_max_connections(),
            admin_identity: admin_identity(),
            enforce_active: enforce_active(),
            room_broadcast_capacity: room_broadcast_capacity(),
        }
    }

    /// Isolated settings backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            admin_identity: "admin".to_string(),
            enforce_active: false,
            room_broadcast_capacity: DEFAULT_ROOM_BROADCAST_CAPACITY,
        }
    }
}
