use crate::config_map::ConfigMap;
use crate::connectors::{
    already_specified, common_fields, exclude_list, include_list, topic_prefix,
    ConnectorDefinition,
};
use crate::fields::{FieldSpec, FieldType};

pub const ALIAS: &str = "postgres";
pub const CONNECTOR_CLASS_NAME: &str = "io.debezium.connector.postgresql.PostgresConnector";

pub const HOSTNAME: &str = "database.hostname";
pub const PORT: &str = "database.port";
pub const USER: &str = "database.user";
pub const PASSWORD: &str = "database.password";
pub const DBNAME: &str = "database.dbname";
pub const SSLMODE: &str = "database.sslmode";
pub const SSLROOTCERT: &str = "database.sslrootcert";
pub const CONNECT_TIMEOUT_MS: &str = "database.connect.timeout.ms";
pub const PLUGIN_NAME: &str = "plugin.name";
pub const SLOT_NAME: &str = "slot.name";
pub const PUBLICATION_AUTOCREATE_MODE: &str = "publication.autocreate.mode";
pub const SNAPSHOT_MODE: &str = "snapshot.mode";
pub const SCHEMA_INCLUDE_LIST: &str = "schema.include.list";
pub const SCHEMA_EXCLUDE_LIST: &str = "schema.exclude.list";
pub const TABLE_INCLUDE_LIST: &str = "table.include.list";
pub const TABLE_EXCLUDE_LIST: &str = "table.exclude.list";

pub const DEFAULT_PORT: &str = "5432";
pub const DEFAULT_SSLMODE: &str = "prefer";
pub const DEFAULT_CONNECT_TIMEOUT_MS: &str = "30000";
pub const MAX_SLOT_NAME_LEN: usize = 63;

/// sslmode values that refuse to fall back to plain text.
pub const TLS_REQUIRED_SSLMODES: &[&str] = &["require", "verify-ca", "verify-full"];

const SSLMODES: &[&str] = &["disable", "prefer", "allow", "require", "verify-ca", "verify-full"];
const PLUGINS: &[&str] = &["decoderbufs", "pgoutput"];
const PUBLICATION_MODES: &[&str] = &["all_tables", "disabled", "filtered", "no_tables"];
const SNAPSHOT_MODES: &[&str] = &[
    "always",
    "initial",
    "initial_only",
    "no_data",
    "never",
    "when_needed",
    "configuration_based",
    "custom",
];

/// Field table of the Debezium Postgres source connector.
pub fn definition() -> ConnectorDefinition {
    ConnectorDefinition::new(ALIAS, CONNECTOR_CLASS_NAME, HOSTNAME)
        .fields(common_fields(CONNECTOR_CLASS_NAME))
        /* ---------------------- CONNECTION --------------------- */
        .field(
            FieldSpec::new(HOSTNAME)
                .required()
                .with_validator(validate_hostname)
                .with_description("IP address or hostname of the PostgreSQL server."),
        )
        .field(
            FieldSpec::new(PORT)
                .with_type(FieldType::Int { min: 1, max: 65535 })
                .with_default(DEFAULT_PORT),
        )
        .field(FieldSpec::new(USER).required())
        .field(FieldSpec::new(PASSWORD))
        .field(FieldSpec::new(DBNAME).required())
        .field(
            FieldSpec::new(SSLMODE)
                .with_type(FieldType::Enum(SSLMODES))
                .with_default(DEFAULT_SSLMODE),
        )
        .field(FieldSpec::new(SSLROOTCERT).with_description(
            "PEM file of the CAs trusted under verify-ca and verify-full. Defaults to the Mozilla roots.",
        ))
        .field(
            FieldSpec::new(CONNECT_TIMEOUT_MS)
                .with_type(FieldType::positive_int())
                .with_default(DEFAULT_CONNECT_TIMEOUT_MS),
        )
        /* ---------------------- TOPICS AND REPLICATION --------------------- */
        .field(topic_prefix())
        .field(
            FieldSpec::new(PLUGIN_NAME)
                .with_type(FieldType::Enum(PLUGINS))
                .with_default("decoderbufs"),
        )
        .field(
            FieldSpec::new(SLOT_NAME)
                .with_default("debezium")
                .with_validator(validate_slot_name)
                .with_description("Logical decoding slot used for streaming changes."),
        )
        .field(
            FieldSpec::new(PUBLICATION_AUTOCREATE_MODE)
                .with_type(FieldType::Enum(PUBLICATION_MODES))
                .with_default("all_tables"),
        )
        .field(
            FieldSpec::new(SNAPSHOT_MODE)
                .with_type(FieldType::Enum(SNAPSHOT_MODES))
                .with_default("initial"),
        )
        /* ---------------------- FILTERING --------------------- */
        .field(include_list(SCHEMA_INCLUDE_LIST))
        .field(exclude_list(SCHEMA_EXCLUDE_LIST, validate_schema_exclude))
        .field(include_list(TABLE_INCLUDE_LIST))
        .field(exclude_list(TABLE_EXCLUDE_LIST, validate_table_exclude))
        .connection_dependencies(&[
            PORT,
            USER,
            PASSWORD,
            DBNAME,
            SSLMODE,
            SSLROOTCERT,
            CONNECT_TIMEOUT_MS,
        ])
}

fn validate_hostname(spec: &FieldSpec, config: &ConfigMap) -> Option<String> {
    let host = config.value(spec.name())?;
    if host.contains("://") {
        Some("Expected a host name, not a URL".to_string())
    } else if host.chars().any(char::is_whitespace) {
        Some("Host name must not contain whitespace".to_string())
    } else {
        None
    }
}

fn validate_slot_name(spec: &FieldSpec, config: &ConfigMap) -> Option<String> {
    let slot = spec.value(config)?;
    if slot.len() > MAX_SLOT_NAME_LEN {
        return Some(format!(
            "Slot name must be at most {MAX_SLOT_NAME_LEN} characters"
        ));
    }
    let legal = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_';
    if slot.chars().all(legal) {
        None
    } else {
        Some(format!(
            "Slot name '{slot}' may only contain lower case letters, digits and underscores"
        ))
    }
}

fn validate_schema_exclude(spec: &FieldSpec, config: &ConfigMap) -> Option<String> {
    already_specified(spec, config, SCHEMA_INCLUDE_LIST)
}

fn validate_table_exclude(spec: &FieldSpec, config: &ConfigMap) -> Option<String> {
    already_specified(spec, config, TABLE_INCLUDE_LIST)
}
