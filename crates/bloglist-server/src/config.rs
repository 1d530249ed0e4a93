use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "secret", "changeme"];

/// Server configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite file, or `:memory:`.
    pub db_path: String,
    pub host: String,
    pub port: u16,
    /// Token signing secret.
    pub secret: String,
    /// Built frontend to serve for non-API paths.
    pub static_dir: Option<PathBuf>,
    pub argon2: Option<Argon2Cost>,
}

#[derive(Debug, Clone, Copy)]
pub struct Argon2Cost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Config {
    /// Required: `SECRET`.
    ///
    /// Optional: `BLOGLIST_DB_PATH` (default `bloglist.db`), `BLOGLIST_HOST`
    /// (default `0.0.0.0`), `PORT` (default `3003`), `BLOGLIST_STATIC_DIR`,
    /// and the Argon2 cost trio `BLOGLIST_ARGON2_MEMORY_KIB`,
    /// `BLOGLIST_ARGON2_ITERATIONS`, `BLOGLIST_ARGON2_PARALLELISM`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret = var("SECRET").unwrap_or_default();
        if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
            bail!("SECRET is unset or still a placeholder");
        }

        let port = match var("PORT") {
            Some(p) => p.parse::<u16>().with_context(|| format!("PORT is not a port number: {}", p))?,
            None => 3003,
        };

        let argon2 = match (
            var("BLOGLIST_ARGON2_MEMORY_KIB"),
            var("BLOGLIST_ARGON2_ITERATIONS"),
            var("BLOGLIST_ARGON2_PARALLELISM"),
        ) {
            (None, None, None) => None,
            (Some(m), Some(t), Some(p)) => Some(Argon2Cost {
                memory_kib: m.parse().context("BLOGLIST_ARGON2_MEMORY_KIB")?,
                iterations: t.parse().context("BLOGLIST_ARGON2_ITERATIONS")?,
                parallelism: p.parse().context("BLOGLIST_ARGON2_PARALLELISM")?,
            }),
            _ => bail!("Argon2 cost needs all of memory, iterations and parallelism"),
        };

        Ok(Self {
            db_path: var("BLOGLIST_DB_PATH").unwrap_or_else(|| "bloglist.db".into()),
            host: var("BLOGLIST_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            secret,
            static_dir: var("BLOGLIST_STATIC_DIR").map(PathBuf::from),
            argon2,
        })
    }
}
