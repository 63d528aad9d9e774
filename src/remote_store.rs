//! HTTP adapter for the remote storage API. JSON REST with bearer-token auth
//! and a `{ success, data?, error? }` response envelope; every operation gets
//! a bounded retry with exponential backoff.

use crate::backoff::{default_schedule, Backoff};
use crate::config::RemoteConfig;
use crate::store::KeyValueStore;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .build()
        .expect("reqwest client")
});

static RUNTIME: Lazy<tokio::runtime::Runtime> =
    Lazy::new(|| tokio::runtime::Runtime::new().expect("tokio runtime"));

#[derive(Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct RemoteStore {
    config: RemoteConfig,
    /// Flipped on network failures; purely informational.
    online: AtomicBool,
}

impl RemoteStore {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            online: AtomicBool::new(true),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn key_url(&self, key: &str) -> String {
        format!(
            "{}/api/storage/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(key)
        )
    }

    fn collection_url(&self) -> String {
        format!("{}/api/storage", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Run a remote operation with the configured attempt budget. Only
    /// network-shaped and rate-limit errors are retried; envelope errors
    /// surface immediately.
    fn with_retry<T>(
        &self,
        what: &str,
        mut op: impl FnMut() -> Result<T, String>,
    ) -> Result<T, String> {
        let mut backoff = Backoff::new(default_schedule());
        let attempts = self.config.max_attempts.max(1);
        let mut last_err = String::new();
        for attempt in 1..=attempts {
            match op() {
                Ok(v) => {
                    self.online.store(true, Ordering::Relaxed);
                    return Ok(v);
                }
                Err(e) => {
                    let retryable = is_network_error(&e) || is_rate_limited(&e);
                    if retryable {
                        self.online.store(false, Ordering::Relaxed);
                    }
                    last_err = e;
                    if !retryable || attempt == attempts {
                        break;
                    }
                    let delay = backoff.on_failure();
                    log::debug!(
                        "remote_store: {} attempt {}/{} failed ({}), retrying in {}ms",
                        what,
                        attempt,
                        attempts,
                        last_err,
                        delay.as_millis()
                    );
                    std::thread::sleep(delay);
                }
            }
        }
        Err(last_err)
    }

    /// Parse a response body as the API envelope and extract its data.
    fn read_envelope(status: reqwest::StatusCode, text: &str) -> Result<Option<Value>, String> {
        if !status.is_success() {
            return Err(format!("{} {}", status, text));
        }
        let envelope: ApiEnvelope = serde_json::from_str(text).map_err(|e| e.to_string())?;
        if !envelope.success {
            return Err(envelope.error.unwrap_or_else(|| "remote error".to_string()));
        }
        Ok(envelope.data)
    }
}

impl KeyValueStore for RemoteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, String> {
        let url = self.key_url(key);
        self.with_retry("get", || {
            RUNTIME.block_on(async {
                let req = self.authorize(CLIENT.get(&url)).timeout(self.timeout());
                let resp = req.send().await.map_err(|e| e.to_string())?;
                let status = resp.status();
                if status.as_u16() == 404 {
                    return Ok(None);
                }
                let text = resp.text().await.map_err(|e| e.to_string())?;
                Self::read_envelope(status, &text)
            })
        })
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), String> {
        let url = self.key_url(key);
        self.with_retry("set", || {
            RUNTIME.block_on(async {
                let req = self
                    .authorize(CLIENT.put(&url))
                    .timeout(self.timeout())
                    .json(value);
                let resp = req.send().await.map_err(|e| e.to_string())?;
                let status = resp.status();
                let text = resp.text().await.map_err(|e| e.to_string())?;
                Self::read_envelope(status, &text).map(|_| ())
            })
        })
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        let url = self.key_url(key);
        self.with_retry("remove", || {
            RUNTIME.block_on(async {
                let req = self.authorize(CLIENT.delete(&url)).timeout(self.timeout());
                let resp = req.send().await.map_err(|e| e.to_string())?;
                let status = resp.status();
                if status.as_u16() == 404 {
                    return Ok(());
                }
                let text = resp.text().await.map_err(|e| e.to_string())?;
                Self::read_envelope(status, &text).map(|_| ())
            })
        })
    }

    fn clear(&self) -> Result<(), String> {
        let url = self.collection_url();
        self.with_retry("clear", || {
            RUNTIME.block_on(async {
                let req = self.authorize(CLIENT.delete(&url)).timeout(self.timeout());
                let resp = req.send().await.map_err(|e| e.to_string())?;
                let status = resp.status();
                let text = resp.text().await.map_err(|e| e.to_string())?;
                Self::read_envelope(status, &text).map(|_| ())
            })
        })
    }

    fn keys(&self) -> Result<Vec<String>, String> {
        let url = self.collection_url();
        let data = self.with_retry("keys", || {
            RUNTIME.block_on(async {
                let req = self.authorize(CLIENT.get(&url)).timeout(self.timeout());
                let resp = req.send().await.map_err(|e| e.to_string())?;
                let status = resp.status();
                let text = resp.text().await.map_err(|e| e.to_string())?;
                Self::read_envelope(status, &text)
            })
        })?;
        let keys = data
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
        Ok(keys)
    }

    fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, String> {
        let url = self.collection_url();
        let data = self.with_retry("get_by_prefix", || {
            RUNTIME.block_on(async {
                let req = self
                    .authorize(CLIENT.get(&url))
                    .query(&[("prefix", prefix)])
                    .timeout(self.timeout());
                let resp = req.send().await.map_err(|e| e.to_string())?;
                let status = resp.status();
                let text = resp.text().await.map_err(|e| e.to_string())?;
                Self::read_envelope(status, &text)
            })
        })?;
        let mut out: Vec<(String, Value)> = match data {
            Some(Value::Object(map)) => map.into_iter().collect(),
            _ => Vec::new(),
        };
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn is_healthy(&self) -> bool {
        let url = format!("{}/api/health", self.config.base_url.trim_end_matches('/'));
        let ok = RUNTIME.block_on(async {
            match CLIENT
                .get(&url)
                .timeout(Duration::from_secs(5))
                .send()
                .await
            {
                Ok(resp) => resp.status().is_success(),
                Err(_) => false,
            }
        });
        self.online.store(ok, Ordering::Relaxed);
        ok
    }
}

fn is_network_error(err: &str) -> bool {
    let s = err.to_lowercase();
    s.contains("error sending request")
        || s.contains("connection refused")
        || s.contains("network is unreachable")
        || s.contains("timed out")
        || s.contains("connection timed out")
        || s.contains("connection reset")
        || s.contains("host is down")
}

fn is_rate_limited(err: &str) -> bool {
    let s = err.to_lowercase();
    s.contains("429") || s.contains("too many requests")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_url_encodes_keys() {
        let store = RemoteStore::new(RemoteConfig::new("http://example.test/"));
        assert_eq!(
            store.key_url("bankPFRecords"),
            "http://example.test/api/storage/bankPFRecords"
        );
        assert_eq!(
            store.key_url("cache:report 1"),
            "http://example.test/api/storage/cache%3Areport%201"
        );
    }

    #[test]
    fn envelope_errors_are_not_retryable() {
        assert!(!is_network_error("record rejected by server"));
        assert!(is_network_error("error sending request for url"));
        assert!(is_rate_limited("429 Too Many Requests"));
    }

    #[test]
    fn read_envelope_maps_failure_to_error_message() {
        let err = RemoteStore::read_envelope(
            reqwest::StatusCode::OK,
            r#"{"success": false, "error": "key not writable"}"#,
        )
        .expect_err("envelope failure");
        assert_eq!(err, "key not writable");
    }

    #[test]
    fn read_envelope_extracts_data() {
        let data = RemoteStore::read_envelope(
            reqwest::StatusCode::OK,
            r#"{"success": true, "data": [1, 2]}"#,
        )
        .expect("envelope");
        assert_eq!(data, Some(serde_json::json!([1, 2])));
    }
}
