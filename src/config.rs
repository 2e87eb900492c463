//! Runtime configuration read from environment variables at launch.

use std::env;
use std::str::FromStr;

use crate::threading::CollapsePolicy;

fn env_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_parsed<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("ignoring {key}: {err}");
                default
            }
        },
        Err(_) => default,
    }
}

/// Which [`crate::store::DocumentStore`] backend the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    /// Uses Rocket's `databases.concept_db` pool.
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            other => Err(format!(
                "invalid store backend '{other}'; expected 'memory' or 'postgres'"
            )),
        }
    }
}

/// Collection names for each concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    pub threads: String,
    pub journals: String,
    pub permissions: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            threads: "threads".to_string(),
            journals: "journals".to_string(),
            permissions: "permissions".to_string(),
        }
    }
}

impl CollectionNames {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            threads: env_string("THREADS_COLLECTION", &defaults.threads),
            journals: env_string("JOURNALS_COLLECTION", &defaults.journals),
            permissions: env_string("PERMISSIONS_COLLECTION", &defaults.permissions),
        }
    }
}

/// Tuning for the threading concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadingConfig {
    pub collapse: CollapsePolicy,
    /// How many times a mutation that lost a version race is replayed.
    pub conflict_retries: usize,
    pub lock_stripes: usize,
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self {
            collapse: CollapsePolicy::Dissolve,
            conflict_retries: 3,
            lock_stripes: 64,
        }
    }
}

impl ThreadingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            collapse: env_parsed("THREADING_COLLAPSE", defaults.collapse),
            conflict_retries: env_usize("THREADING_CONFLICT_RETRIES", defaults.conflict_retries),
            lock_stripes: env_usize("THREADING_LOCK_STRIPES", defaults.lock_stripes).max(1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub store_backend: StoreBackend,
    pub collections: CollectionNames,
    pub threading: ThreadingConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            store_backend: env_parsed("CONCEPT_STORE", StoreBackend::Memory),
            collections: CollectionNames::from_env(),
            threading: ThreadingConfig::from_env(),
        }
    }
}
