use std::collections::HashSet;
use std::path::Path;
use crate::agents::BUILTIN_AGENT_TYPES;
use crate::errors::AgentrailError;
use super::env::resolve_env;
use super::types::AgentrailConfig;
use super::security::validate_security_patterns;
use super::schema::CONFIG_SCHEMA;
use tracing::{debug, warn};

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<AgentrailConfig, AgentrailError> {
    if !path.exists() {
        return Err(AgentrailError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(AgentrailError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let mut config = parse_config_str(&content)?;
    config.database.path = resolve_env(&config.database.path);
    config.server.api_token = config.server.api_token.as_deref().map(resolve_env);
    debug!(path = %path.display(), chains = config.chains.len(), "Config loaded");
    Ok(config)
}

/// Parse config text: pattern scan, advisory schema check, typed parse, conflict check.
pub fn parse_config_str(content: &str) -> Result<AgentrailConfig, AgentrailError> {
    // An empty document is an all-defaults config
    if content.trim().is_empty() {
        return Ok(AgentrailConfig::default());
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    if yaml.is_null() {
        return Ok(AgentrailConfig::default());
    }

    validate_security_patterns(&yaml)?;
    validate_schema(&yaml)?;

    let config: AgentrailConfig = serde_yaml::from_value(yaml)?;
    validate_conflicts(&config)?;
    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), AgentrailError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| AgentrailError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| AgentrailError::Config(format!("Schema compilation error: {}", e)))?;

    if let Err(errors) = compiled.validate(&json_value) {
        // Advisory only; the typed parse decides what is fatal
        for e in errors {
            warn!(validation_error = %e, path = %e.instance_path, "Config schema warning");
        }
    }

    Ok(())
}

/// Detect semantic conflicts in the parsed configuration.
fn validate_conflicts(config: &AgentrailConfig) -> Result<(), AgentrailError> {
    if let Some(enabled) = &config.agents.enabled {
        if let Some(unknown) = enabled.iter().find(|t| !BUILTIN_AGENT_TYPES.contains(&t.as_str())) {
            return Err(AgentrailError::Config(format!(
                "agents.enabled lists unknown agent type '{}'",
                unknown
            )));
        }
        for chain in &config.chains {
            if let Some(step) = chain.steps.iter().find(|s| !enabled.contains(&s.agent_type)) {
                warn!(
                    chain = %chain.name,
                    agent_type = %step.agent_type,
                    "Chain step uses an agent that is not enabled"
                );
            }
        }
    }

    let mut seen = HashSet::new();
    for chain in config.chains.iter().filter(|c| !c.id.is_empty()) {
        if !seen.insert(chain.id.as_str()) {
            return Err(AgentrailError::Config(format!("Duplicate chain id '{}'", chain.id)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
database:
  path: ./runs.db
server:
  host: 0.0.0.0
  port: 9090
agents:
  enabled: [document, design, code-gen]
chains:
  - id: docs-to-code
    name: Docs to code
    steps:
      - order: 0
        agent_type: document
        parameters:
          sections: [Goals, API]
      - order: 1
        agent_type: code-gen
        input_mapping:
          title: step_0_title
        parameters:
          language: rust
        continue_on_fail: true
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config_str(SAMPLE).unwrap();
        assert_eq!(config.database.path, "./runs.db");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.agents.enabled.as_ref().unwrap().len(), 3);
        let chain = &config.chains[0];
        assert_eq!(chain.id, "docs-to-code");
        assert_eq!(chain.steps[1].input_mapping["title"], "step_0_title");
        assert_eq!(chain.steps[1].parameters["language"], "rust");
        assert!(chain.steps[1].continue_on_fail);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config.database.path, "./data/agentrail.db");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.agents.enabled.is_none());
        assert!(config.chains.is_empty());
    }

    #[test]
    fn test_unknown_enabled_agent_rejected() {
        let err = parse_config_str("agents:\n  enabled: [document, mailer]\n").unwrap_err();
        assert!(matches!(err, AgentrailError::Config(_)));
        assert!(err.to_string().contains("mailer"));
    }

    #[test]
    fn test_duplicate_chain_ids_rejected() {
        let yaml = "chains:\n  - id: a\n    name: A\n    steps: []\n  - id: a\n    name: B\n    steps: []\n";
        assert!(matches!(parse_config_str(yaml), Err(AgentrailError::Config(_))));
    }

    #[test]
    fn test_dangerous_value_rejected() {
        let yaml = "database:\n  path: ../../etc/agentrail.db\n";
        assert!(matches!(parse_config_str(yaml), Err(AgentrailError::Config(_))));
    }

    #[test]
    fn test_type_mismatch_is_yaml_error() {
        assert!(matches!(parse_config_str("server:\n  port: not-a-port\n"), Err(AgentrailError::Yaml(_))));
    }

    #[tokio::test]
    async fn test_parse_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = parse_config(file.path()).await.unwrap();
        assert_eq!(config.chains.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = parse_config(&dir.path().join("absent.yaml")).await;
        assert!(matches!(result, Err(AgentrailError::Config(_))));
    }

    #[tokio::test]
    async fn test_oversized_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let padding = format!("# {}\n", "x".repeat(1_100_000));
        file.write_all(padding.as_bytes()).unwrap();
        let result = parse_config(file.path()).await;
        assert!(matches!(result, Err(AgentrailError::Config(_))));
    }
}
