use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// SHA-256 hex of the admin dashboard passkey (see src/bin/hashkey.rs).
    pub admin_passkey_hash: String,
    pub session_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let admin_passkey_hash = env::var("ADMIN_PASSKEY_HASH")?;
        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(24);

        Ok(Self {
            database_url,
            bind_addr,
            admin_passkey_hash,
            session_ttl_hours,
        })
    }
}
