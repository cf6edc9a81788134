use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub watch: WatchConfig,
    pub webhook: WebhookConfig,
    pub upload: UploadConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Polling rhythm for the long-poll endpoints. Both values are injectable so
/// tests can run the full schedule without waiting a minute of wall time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub interval_secs: u64,
    pub deadline_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Target the generation workflow listens on. Deliveries stay queued
    /// until this is set.
    pub url: Option<String>,
    /// Shared secret the workflow must echo on its callback.
    pub callback_token: Option<String>,
    pub sweep_interval_secs: u64,
    pub batch_size: u64,
    pub max_attempts: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_size_bytes: usize,
    pub jpeg_quality: u8,
    pub conversion_retries: usize,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3110,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            deadline_secs: 60,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            callback_token: None,
            sweep_interval_secs: 5,
            batch_size: 10,
            max_attempts: 5,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 10 * 1024 * 1024,
            jpeg_quality: 80,
            conversion_retries: 2,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_secs: 2 * 60 * 60 }
    }
}

impl Config {
    pub fn from_raw(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Invalid config file, using defaults: {}", err);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = Config::from_raw(r#"{"server": {"port": 8080}}"#);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.watch.interval_secs, 10);
        assert_eq!(config.watch.deadline_secs, 60);
        assert_eq!(config.session.ttl_secs, 7200);
    }

    #[test]
    fn garbage_input_yields_defaults() {
        let config = Config::from_raw("not json");
        assert!(config.webhook.url.is_none());
        assert_eq!(config.upload.jpeg_quality, 80);
    }
}
