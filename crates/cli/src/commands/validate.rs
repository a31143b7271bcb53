use clap::Args;
use common::config::read_config;
use common::error::ValidatorError;
use components::connectors::CONNECTOR_CLASS;
use components::{ConfigMap, ConnectionValidator, ConnectorRegistry, RegisteredConnector, ValidationReport};
use serde_json::Value;
use shared_clients::default_registry;
use shared_clients::validation::ValidationClient;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Connector alias; defaults to the type named by `connector.class`
    #[arg(long)]
    pub connector: Option<String>,
    /// JSON object holding the connector configuration
    #[arg(long, short = 'f')]
    pub file: PathBuf,
    /// Base URL of a running validator, e.g. http://localhost:8083/debezium
    #[arg(long)]
    pub remote: Option<String>,
    /// Probe deadline in milliseconds, overrides `probe.timeout_ms`
    #[arg(long = "probe-timeout-ms")]
    pub probe_timeout_ms: Option<u64>,
}

pub async fn handle_validate(
    args: ValidateArgs,
    config_path: Option<&Path>,
) -> Result<ValidationReport, ValidatorError> {
    let config = load_config_map(&args.file)?;

    if let Some(url) = &args.remote {
        let client = ValidationClient::new(url);
        let report = match args.connector.as_deref() {
            Some(alias) => client.validate_connection(alias, &config).await,
            None => client.validate(&config).await,
        };
        return report.map_err(|e| ValidatorError::Validate(Box::new(e)));
    }

    let settings = read_config(config_path)
        .map_err(|e| ValidatorError::Init(Box::new(e)))?
        .with_overrides(None, args.probe_timeout_ms);
    settings
        .validate()
        .map_err(|e| ValidatorError::Init(Box::new(e)))?;

    let registry = default_registry().map_err(|e| ValidatorError::Init(Box::new(e)))?;
    let connector = select_connector(&registry, args.connector.as_deref(), &config)?;
    tracing::info!(
        connector = connector.definition().alias(),
        file = %args.file.display(),
        "validating connector configuration"
    );

    let validator = ConnectionValidator::new(settings.probe.timeout());
    Ok(validator
        .validate(connector.definition(), connector.probe(), &config)
        .await)
}

pub fn load_config_map(path: &Path) -> Result<ConfigMap, ValidatorError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        ValidatorError::Validate(format!("cannot read '{}': {e}", path.display()).into())
    })?;
    let json: Value = serde_json::from_str(&raw).map_err(|e| {
        ValidatorError::Validate(format!("'{}' is not valid JSON: {e}", path.display()).into())
    })?;
    ConfigMap::try_from(json).map_err(|e| ValidatorError::Validate(Box::new(e)))
}

pub fn select_connector<'a>(
    registry: &'a ConnectorRegistry,
    alias: Option<&str>,
    config: &ConfigMap,
) -> Result<&'a RegisteredConnector, ValidatorError> {
    match alias {
        Some(alias) => registry
            .get(alias)
            .ok_or_else(|| ValidatorError::Validate(format!("unknown connector type '{alias}'").into())),
        None => {
            let class = config.value(CONNECTOR_CLASS).ok_or_else(|| {
                ValidatorError::Validate(
                    format!("pass --connector or set '{CONNECTOR_CLASS}' in the file").into(),
                )
            })?;
            registry.by_class(class).ok_or_else(|| {
                ValidatorError::Validate(
                    format!("no connector type registered for class '{class}'").into(),
                )
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_json(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write json");
        file
    }

    #[test]
    fn loads_flat_json_objects() {
        let file = write_json(r#"{"database.port": 5432, "database.hostname": "pg", "slot.name": null}"#);
        let config = load_config_map(file.path()).expect("config");
        assert_eq!(config.get("database.port"), Some("5432"));
        assert_eq!(config.get("database.hostname"), Some("pg"));
        assert!(config.get("slot.name").is_none());
    }

    #[test]
    fn rejects_nested_values_and_bad_json() {
        let nested = write_json(r#"{"tasks.max": {"value": 1}}"#);
        assert!(matches!(
            load_config_map(nested.path()),
            Err(ValidatorError::Validate(_))
        ));

        let broken = write_json("{");
        assert!(load_config_map(broken.path()).is_err());
    }

    #[test]
    fn selects_by_alias_or_class() {
        let registry = default_registry().expect("registry");
        let config = ConfigMap::new().with(
            CONNECTOR_CLASS,
            "io.debezium.connector.postgresql.PostgresConnector",
        );

        let by_class = select_connector(&registry, None, &config).expect("by class");
        assert_eq!(by_class.definition().alias(), "postgres");

        let by_alias = select_connector(&registry, Some("mongodb"), &config).expect("by alias");
        assert_eq!(by_alias.definition().alias(), "mongodb");

        assert!(select_connector(&registry, Some("oracle"), &config).is_err());
        assert!(select_connector(&registry, None, &ConfigMap::new()).is_err());
    }

    #[tokio::test]
    async fn invalid_fields_are_reported_without_network() {
        let file = write_json(r#"{"connector.class": "io.debezium.connector.mongodb.MongoDbConnector"}"#);
        let args = ValidateArgs {
            connector: None,
            file: file.path().to_path_buf(),
            remote: None,
            probe_timeout_ms: Some(500),
        };

        let report = handle_validate(args, None).await.expect("report");
        assert!(!report.is_valid());
        assert_eq!(report.errors()[0].property, "mongodb.connection.string");
    }
}
