use std::env;

/// Roster the clinic's front desk picks from when booking.
pub const DEFAULT_PRACTITIONERS: [&str; 5] = [
    "Carlos Mendoza",
    "María González",
    "Juan Pérez",
    "Ana Rodríguez",
    "Luis Martínez",
];

#[derive(Clone, Debug)]
pub struct Config {
    /// `None` runs the server on the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub practitioners: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(5);
        let db_acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(5);
        let practitioners = parse_roster(env::var("PRACTITIONERS").ok().as_deref());

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections,
            db_acquire_timeout_secs,
            practitioners,
        })
    }
}

/// Comma-separated list; blank or missing falls back to the default roster.
pub fn parse_roster(raw: Option<&str>) -> Vec<String> {
    let names: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if names.is_empty() {
        DEFAULT_PRACTITIONERS.iter().map(|s| s.to_string()).collect()
    } else {
        names
    }
}
