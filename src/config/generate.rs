pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# LOGLIFT CONFIGURATION
# =============================================================================
# Ships edge module logs to a Log Analytics workspace through the HTTP data
# collector API.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/loglift/config.yml
#   3. /etc/loglift/config.yml
#
# When no file is found, the WorkspaceId, WorkspaceKey, LogType,
# WorkspaceApiVersion, LogsMaxSizeMB and ResourceId environment variables are
# used instead.
#
# Any value may reference an environment variable with $env{NAME}.

# =============================================================================
# WORKSPACE
# =============================================================================
workspace:
  # Workspace (customer) ID
  id: $env{WorkspaceId}

  # Primary or secondary key, base64-encoded as shown in the portal
  shared_key: $env{WorkspaceKey}

  # Custom log table name. The workspace appends _CL.
  log_type: IoTEdgeLogs

  api_version: "2016-04-01"

  # Optional owning resource. When set, every record is stamped with it and
  # the x-ms-AzureResourceId header is sent.
  # resource_id: /subscriptions/<sub>/resourceGroups/<rg>/providers/Microsoft.Devices/IotHubs/<hub>

  ingestion_domain: ods.opinsights.azure.com

  # Send to this base URL instead of https://<id>.<ingestion_domain>
  # endpoint: http://127.0.0.1:8080

# =============================================================================
# DELIVERY
# =============================================================================
delivery:
  # Upper bound for a single request body. The endpoint accepts up to 30MB.
  max_chunk_mb: 28

  # Per-request timeout
  timeout: 30s
"#
    .to_string()
}
