use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

use envision_db::DEFAULT_READER_POOL_SIZE;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub db_readers: usize,
    pub jwt_secret: String,
    pub team_path: Option<PathBuf>,
}

impl Config {
    /// Read `ENVISION_*` variables, falling back to development defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let host = var_or("ENVISION_HOST", "0.0.0.0");
        let port: u16 = var_or("ENVISION_PORT", "5000")
            .parse()
            .context("ENVISION_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("ENVISION_HOST must be an IP address")?;

        let db_readers: usize = match std::env::var("ENVISION_DB_READERS") {
            Ok(raw) => raw
                .parse()
                .context("ENVISION_DB_READERS must be a positive integer")?,
            Err(_) => DEFAULT_READER_POOL_SIZE,
        };

        let jwt_secret = std::env::var("ENVISION_JWT_SECRET").unwrap_or_else(|_| {
            warn!("ENVISION_JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.into()
        });

        Ok(Self {
            addr,
            db_path: PathBuf::from(var_or("ENVISION_DB_PATH", "database.db")),
            db_readers,
            jwt_secret,
            team_path: std::env::var("ENVISION_TEAM_PATH").ok().map(PathBuf::from),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}
