use super::env_var_pattern;
use super::expand_env_vars;
use super::types::*;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}

/// Environment variable names read when no config file is present
pub mod env_keys {
    pub const WORKSPACE_ID: &str = "WorkspaceId";
    pub const WORKSPACE_KEY: &str = "WorkspaceKey";
    pub const API_VERSION: &str = "WorkspaceApiVersion";
    pub const LOG_TYPE: &str = "LogType";
    pub const MAX_SIZE_MB: &str = "LogsMaxSizeMB";
    pub const RESOURCE_ID: &str = "ResourceId";
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    load_config_str(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(e) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        )),
        other => other,
    })
}

/// Parse and validate config from YAML text
pub fn load_config_str(yaml: &str) -> Result<Config, ConfigError> {
    let yaml = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml)?;

    let config: Config = serde_yaml::from_str(&yaml)?;
    validate_config(&config)?;
    Ok(config)
}

/// Build config from the process environment
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    load_config_from_lookup(|key| std::env::var(key).ok())
}

/// Build config from `WorkspaceId`, `WorkspaceKey`, `LogType` and friends,
/// resolved through `lookup`. Empty values count as unset.
pub fn load_config_from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let require = |key: &'static str| get(key).ok_or(ConfigError::MissingEnv(key));

    let mut workspace = WorkspaceConfig::new(
        require(env_keys::WORKSPACE_ID)?,
        require(env_keys::WORKSPACE_KEY)?,
        require(env_keys::LOG_TYPE)?,
    );
    if let Some(api_version) = get(env_keys::API_VERSION) {
        workspace.api_version = api_version;
    }
    workspace.resource_id = get(env_keys::RESOURCE_ID);

    let mut delivery = DeliveryConfig::default();
    if let Some(mb) = get(env_keys::MAX_SIZE_MB) {
        delivery.max_chunk_mb = mb.trim().parse().map_err(|_| {
            ConfigError::Validation(format!(
                "{} must be a whole number of megabytes, got '{}'",
                env_keys::MAX_SIZE_MB,
                mb
            ))
        })?;
    }

    let config = Config {
        workspace,
        delivery,
    };
    validate_config(&config)?;
    Ok(config)
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let mut unexpanded_vars: Vec<String> = env_var_pattern()
        .captures_iter(yaml_string)
        .map(|cap| cap[1].to_string())
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    let error_msg = if unexpanded_vars.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=...\n\
             2. Replace $env{{{0}}} in the config file with the actual value",
            unexpanded_vars[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables\n\
             2. Replace the variables in the config file with actual values",
            unexpanded_vars.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();
    let workspace = &config.workspace;

    if workspace.id.trim().is_empty() {
        errors.push("workspace.id cannot be empty".to_string());
    }

    if workspace.log_type.trim().is_empty() {
        errors.push("workspace.log_type cannot be empty".to_string());
    }

    if workspace.api_version.trim().is_empty() {
        errors.push("workspace.api_version cannot be empty".to_string());
    }

    if workspace.shared_key.trim().is_empty() {
        errors.push("workspace.shared_key cannot be empty".to_string());
    } else if STANDARD.decode(workspace.shared_key.trim()).is_err() {
        errors.push("workspace.shared_key must be base64-encoded".to_string());
    }

    if let Some(endpoint) = &workspace.endpoint {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            errors.push(format!(
                "workspace.endpoint must start with http:// or https://, got '{}'",
                endpoint
            ));
        }
    }

    if config.delivery.max_chunk_mb == 0 {
        errors.push("delivery.max_chunk_mb must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const VALID: &str = r#"
workspace:
  id: ws-1
  shared_key: c2VjcmV0LWtleQ==
  log_type: IoTEdgeLogs
"#;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_valid_minimal_config() {
        let config = load_config_str(VALID).unwrap();
        assert_eq!(config.workspace.id, "ws-1");
        assert_eq!(config.workspace.log_type, "IoTEdgeLogs");
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let yaml = r#"
workspace:
  id: ""
  shared_key: "***"
  log_type: ""
  endpoint: ftp://example.com
delivery:
  max_chunk_mb: 0
"#;
        match load_config_str(yaml) {
            Err(ConfigError::ValidationList(errors)) => {
                assert_eq!(errors.len(), 5, "{:?}", errors);
                assert!(errors.iter().any(|e| e.contains("base64")));
                assert!(errors.iter().any(|e| e.contains("max_chunk_mb")));
            }
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpanded_env_var_is_reported() {
        let yaml = VALID.replace("ws-1", "$env{LOGLIFT_UNSET_WORKSPACE}");
        match load_config_str(&yaml) {
            Err(ConfigError::Validation(msg)) => {
                assert!(msg.contains("LOGLIFT_UNSET_WORKSPACE"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_env_lookup_config() {
        let config = load_config_from_lookup(lookup(&[
            ("WorkspaceId", "ws-env"),
            ("WorkspaceKey", "c2VjcmV0LWtleQ=="),
            ("LogType", "EdgeLogs"),
            ("WorkspaceApiVersion", "2016-04-01"),
            ("LogsMaxSizeMB", "10"),
        ]))
        .unwrap();

        assert_eq!(config.workspace.id, "ws-env");
        assert_eq!(config.workspace.log_type, "EdgeLogs");
        assert_eq!(config.delivery.max_chunk_mb, 10);
        assert!(config.workspace.resource_id.is_none());
    }

    #[test]
    fn test_env_lookup_defaults_and_resource() {
        let config = load_config_from_lookup(lookup(&[
            ("WorkspaceId", "ws-env"),
            ("WorkspaceKey", "c2VjcmV0LWtleQ=="),
            ("LogType", "EdgeLogs"),
            ("WorkspaceApiVersion", ""),
            ("ResourceId", "/subscriptions/s/resourceGroups/rg"),
        ]))
        .unwrap();

        assert_eq!(config.workspace.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.delivery.max_chunk_mb, DEFAULT_MAX_CHUNK_MB);
        assert_eq!(
            config.workspace.resource_id.as_deref(),
            Some("/subscriptions/s/resourceGroups/rg")
        );
    }

    #[test]
    fn test_env_lookup_missing_key() {
        let result = load_config_from_lookup(lookup(&[
            ("WorkspaceId", "ws-env"),
            ("LogType", "EdgeLogs"),
        ]));
        assert!(matches!(result, Err(ConfigError::MissingEnv("WorkspaceKey"))));
    }

    #[test]
    fn test_env_lookup_bad_size() {
        let result = load_config_from_lookup(lookup(&[
            ("WorkspaceId", "ws-env"),
            ("WorkspaceKey", "c2VjcmV0LWtleQ=="),
            ("LogType", "EdgeLogs"),
            ("LogsMaxSizeMB", "lots"),
        ]));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
