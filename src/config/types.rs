use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "2016-04-01";
pub const DEFAULT_INGESTION_DOMAIN: &str = "ods.opinsights.azure.com";
pub const DEFAULT_MAX_CHUNK_MB: usize = 28;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Credentials and addressing for the target workspace
#[derive(Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub id: String,
    /// Base64-encoded primary or secondary workspace key
    pub shared_key: String,
    /// Custom log table name, sent as `Log-Type`
    pub log_type: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default = "default_ingestion_domain")]
    pub ingestion_domain: String,
    /// Replaces `https://{id}.{ingestion_domain}` when set
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl WorkspaceConfig {
    pub fn new(
        id: impl Into<String>,
        shared_key: impl Into<String>,
        log_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            shared_key: shared_key.into(),
            log_type: log_type.into(),
            api_version: default_api_version(),
            resource_id: None,
            ingestion_domain: default_ingestion_domain(),
            endpoint: None,
        }
    }

    /// Base URL requests are sent to, without a trailing slash
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.{}", self.id, self.ingestion_domain),
        }
    }
}

impl std::fmt::Debug for WorkspaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceConfig")
            .field("id", &self.id)
            .field("shared_key", &"<redacted>")
            .field("log_type", &self.log_type)
            .field("api_version", &self.api_version)
            .field("resource_id", &self.resource_id)
            .field("ingestion_domain", &self.ingestion_domain)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_ingestion_domain() -> String {
    DEFAULT_INGESTION_DOMAIN.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_max_chunk_mb")]
    pub max_chunk_mb: usize,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl DeliveryConfig {
    pub fn max_chunk_bytes(&self) -> usize {
        self.max_chunk_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_chunk_mb: default_max_chunk_mb(),
            timeout: default_timeout(),
        }
    }
}

fn default_max_chunk_mb() -> usize {
    DEFAULT_MAX_CHUNK_MB
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let yaml = r#"
workspace:
  id: ws-1
  shared_key: c2VjcmV0
  log_type: EdgeLogs
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.workspace.api_version, "2016-04-01");
        assert_eq!(config.workspace.ingestion_domain, "ods.opinsights.azure.com");
        assert!(config.workspace.resource_id.is_none());
        assert_eq!(config.delivery.max_chunk_mb, 28);
        assert_eq!(config.delivery.max_chunk_bytes(), 28 * 1024 * 1024);
        assert_eq!(config.delivery.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_base_url() {
        let mut workspace = WorkspaceConfig::new("ws-1", "c2VjcmV0", "EdgeLogs");
        assert_eq!(workspace.base_url(), "https://ws-1.ods.opinsights.azure.com");

        workspace.endpoint = Some("http://127.0.0.1:8080/".to_string());
        assert_eq!(workspace.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_debug_redacts_shared_key() {
        let workspace = WorkspaceConfig::new("ws-1", "c2VjcmV0", "EdgeLogs");
        let rendered = format!("{:?}", workspace);
        assert!(!rendered.contains("c2VjcmV0"));
        assert!(rendered.contains("ws-1"));
    }

    #[test]
    fn test_timeout_humantime() {
        let yaml = r#"
max_chunk_mb: 4
timeout: 1m 30s
"#;
        let delivery: DeliveryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(delivery.max_chunk_mb, 4);
        assert_eq!(delivery.timeout, Duration::from_secs(90));
    }
}
