use anyhow::{Context, Result};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Config {
    /// Reads the process environment. A `database_url` given on the command line wins
    /// over `DATABASE_URL`.
    pub fn from_env(database_url: Option<String>) -> Result<Self> {
        Self::from_lookup(|name| match name {
            "DATABASE_URL" => database_url.clone().or_else(|| std::env::var(name).ok()),
            _ => std::env::var(name).ok(),
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive number")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        if max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be a positive number");
        }

        let run_migrations = match lookup("RUN_MIGRATIONS") {
            Some(raw) => parse_flag(&raw).context("RUN_MIGRATIONS must be true or false")?,
            None => true,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").context("Cannot load DATABASE_URL env variable")?,
            max_connections,
            run_migrations,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
