//! Environment-driven configuration with sensible defaults.

use crate::calc::CalcConfig;
use crate::store::Strategy;
use std::env;

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Bearer token for the remote API; unauthenticated when absent.
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// Attempts per remote operation, retries included.
    pub max_attempts: usize,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout_secs: 30,
            max_attempts: 3,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn from_env() -> Self {
        Self {
            base_url: env::var("OXIVO_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string()),
            token: env::var("OXIVO_API_TOKEN").ok(),
            timeout_secs: env::var("OXIVO_HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            max_attempts: env::var("OXIVO_HTTP_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CoreConfig {
    pub storage_dir: String,
    pub strategy: Strategy,
    pub remote: RemoteConfig,
    pub calc: CalcConfig,
    /// Soft byte budget for the local store; unbounded when absent.
    pub local_capacity_bytes: Option<usize>,
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self {
            storage_dir: env::var("OXIVO_STORAGE_DIR")
                .unwrap_or_else(|_| "./oxivo-data".to_string()),
            strategy: env::var("OXIVO_STORAGE_STRATEGY")
                .ok()
                .and_then(|s| Strategy::from_str(&s))
                .unwrap_or(Strategy::LocalFirst),
            remote: RemoteConfig::from_env(),
            calc: CalcConfig::default(),
            local_capacity_bytes: env::var("OXIVO_LOCAL_CAPACITY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}
