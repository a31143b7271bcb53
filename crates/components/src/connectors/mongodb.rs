use crate::config_map::ConfigMap;
use crate::connectors::{
    already_specified, common_fields, exclude_list, include_list, topic_prefix,
    ConnectorDefinition,
};
use crate::fields::{FieldSpec, FieldType};

pub const ALIAS: &str = "mongodb";
pub const CONNECTOR_CLASS_NAME: &str = "io.debezium.connector.mongodb.MongoDbConnector";

pub const CONNECTION_STRING: &str = "mongodb.connection.string";
pub const USER: &str = "mongodb.user";
pub const PASSWORD: &str = "mongodb.password";
pub const AUTH_SOURCE: &str = "mongodb.authsource";
pub const SSL_ENABLED: &str = "mongodb.ssl.enabled";
pub const SSL_INVALID_HOSTNAME_ALLOWED: &str = "mongodb.ssl.invalid.hostname.allowed";
pub const SERVER_SELECTION_TIMEOUT_MS: &str = "mongodb.server.selection.timeout.ms";
pub const CONNECT_TIMEOUT_MS: &str = "mongodb.connect.timeout.ms";
pub const CAPTURE_MODE: &str = "capture.mode";
pub const SNAPSHOT_MODE: &str = "snapshot.mode";
pub const DATABASE_INCLUDE_LIST: &str = "database.include.list";
pub const DATABASE_EXCLUDE_LIST: &str = "database.exclude.list";
pub const COLLECTION_INCLUDE_LIST: &str = "collection.include.list";
pub const COLLECTION_EXCLUDE_LIST: &str = "collection.exclude.list";

pub const DEFAULT_AUTH_SOURCE: &str = "admin";
pub const DEFAULT_SERVER_SELECTION_TIMEOUT_MS: &str = "30000";
pub const DEFAULT_CONNECT_TIMEOUT_MS: &str = "10000";

const CAPTURE_MODES: &[&str] = &[
    "change_streams",
    "change_streams_update_full",
    "change_streams_with_pre_image",
    "change_streams_update_full_with_pre_image",
];

const SNAPSHOT_MODES: &[&str] = &["initial", "initial_only", "no_data", "never", "when_needed"];

/// Field table of the Debezium MongoDB source connector.
pub fn definition() -> ConnectorDefinition {
    ConnectorDefinition::new(ALIAS, CONNECTOR_CLASS_NAME, CONNECTION_STRING)
        .fields(common_fields(CONNECTOR_CLASS_NAME))
        /* ---------------------- CONNECTION --------------------- */
        .field(
            FieldSpec::new(CONNECTION_STRING)
                .with_validator(validate_connection_string)
                .with_description("Connection string of the replica set or sharded cluster."),
        )
        .field(FieldSpec::new(USER).with_description("Database user for authentication."))
        .field(
            FieldSpec::new(PASSWORD)
                .with_validator(validate_password)
                .with_description("Password for the database user."),
        )
        .field(
            FieldSpec::new(AUTH_SOURCE)
                .with_default(DEFAULT_AUTH_SOURCE)
                .with_description("Database holding the user's credentials."),
        )
        .field(
            FieldSpec::new(SSL_ENABLED)
                .with_type(FieldType::Boolean)
                .with_default("false")
                .with_description("Connect over TLS."),
        )
        .field(
            FieldSpec::new(SSL_INVALID_HOSTNAME_ALLOWED)
                .with_type(FieldType::Boolean)
                .with_default("false")
                .with_description("Skip hostname verification of the server certificate."),
        )
        .field(
            FieldSpec::new(SERVER_SELECTION_TIMEOUT_MS)
                .with_type(FieldType::positive_int())
                .with_default(DEFAULT_SERVER_SELECTION_TIMEOUT_MS)
                .with_description("How long the driver waits to find a suitable server."),
        )
        .field(
            FieldSpec::new(CONNECT_TIMEOUT_MS)
                .with_type(FieldType::positive_int())
                .with_default(DEFAULT_CONNECT_TIMEOUT_MS)
                .with_description("Socket connect timeout."),
        )
        /* ---------------------- TOPICS AND MODES --------------------- */
        .field(topic_prefix())
        .field(
            FieldSpec::new(CAPTURE_MODE)
                .with_type(FieldType::Enum(CAPTURE_MODES))
                .with_default("change_streams_update_full"),
        )
        .field(
            FieldSpec::new(SNAPSHOT_MODE)
                .with_type(FieldType::Enum(SNAPSHOT_MODES))
                .with_default("initial"),
        )
        /* ---------------------- FILTERING --------------------- */
        .field(include_list(DATABASE_INCLUDE_LIST))
        .field(exclude_list(DATABASE_EXCLUDE_LIST, validate_database_exclude))
        .field(include_list(COLLECTION_INCLUDE_LIST))
        .field(exclude_list(COLLECTION_EXCLUDE_LIST, validate_collection_exclude))
        .connection_dependencies(&[
            USER,
            PASSWORD,
            AUTH_SOURCE,
            SSL_ENABLED,
            SSL_INVALID_HOSTNAME_ALLOWED,
            SERVER_SELECTION_TIMEOUT_MS,
            CONNECT_TIMEOUT_MS,
        ])
}

fn validate_connection_string(spec: &FieldSpec, config: &ConfigMap) -> Option<String> {
    match config.value(spec.name()) {
        None => Some("Missing connection string".to_string()),
        Some(raw) => MongoConnectionString::parse(raw).err(),
    }
}

fn validate_password(spec: &FieldSpec, config: &ConfigMap) -> Option<String> {
    (config.has_value(spec.name()) && !config.has_value(USER))
        .then(|| "A user is required when a password is set".to_string())
}

fn validate_database_exclude(spec: &FieldSpec, config: &ConfigMap) -> Option<String> {
    already_specified(spec, config, DATABASE_INCLUDE_LIST)
}

fn validate_collection_exclude(spec: &FieldSpec, config: &ConfigMap) -> Option<String> {
    already_specified(spec, config, COLLECTION_INCLUDE_LIST)
}

/// Structural view of a `mongodb://` or `mongodb+srv://` URI.
///
/// Only what is needed to decide whether the string is usable is parsed;
/// option semantics are left to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConnectionString {
    pub srv: bool,
    pub hosts: Vec<String>,
    pub replica_set: Option<String>,
    pub has_credentials: bool,
}

impl MongoConnectionString {
    /// Parses `raw`, returning the reason text on failure.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let invalid = |why: &str| format!("Invalid connection string: {why}");

        let (srv, rest) = if let Some(rest) = raw.strip_prefix("mongodb+srv://") {
            (true, rest)
        } else if let Some(rest) = raw.strip_prefix("mongodb://") {
            (false, rest)
        } else {
            return Err(invalid("scheme must be mongodb:// or mongodb+srv://"));
        };

        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        let (authority, tail) = rest.split_at(authority_end);
        let query = tail.split_once('?').map(|(_, q)| q).unwrap_or("");

        let (has_credentials, host_list) = match authority.rsplit_once('@') {
            Some((credentials, hosts)) => {
                if credentials.is_empty() {
                    return Err(invalid("empty credentials before '@'"));
                }
                (true, hosts)
            }
            None => (false, authority),
        };

        let hosts: Vec<String> = host_list.split(',').map(|h| h.trim().to_string()).collect();
        if hosts.iter().any(String::is_empty) {
            return Err(invalid("missing host"));
        }
        for host in &hosts {
            check_host(host).map_err(|why| invalid(&why))?;
        }
        if srv && (hosts.len() != 1 || hosts[0].contains(':')) {
            return Err(invalid("mongodb+srv:// requires a single host name without a port"));
        }

        let replica_set = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| key.eq_ignore_ascii_case("replicaSet"))
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            srv,
            hosts,
            replica_set,
            has_credentials,
        })
    }
}

fn check_host(host: &str) -> Result<(), String> {
    let port = if let Some(bracketed) = host.strip_prefix('[') {
        let (_, after) = bracketed
            .split_once(']')
            .ok_or_else(|| format!("unterminated IPv6 address '{host}'"))?;
        after.strip_prefix(':')
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) if !name.is_empty() => Some(port),
            Some(_) => return Err(format!("missing host name in '{host}'")),
            None => None,
        }
    };

    if host.chars().any(char::is_whitespace) {
        return Err(format!("host '{host}' contains whitespace"));
    }
    match port {
        Some(port) => match port.parse::<u16>() {
            Ok(p) if p > 0 => Ok(()),
            _ => Err(format!("invalid port in '{host}'")),
        },
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ConfigMap {
        ConfigMap::new()
            .with("connector.class", CONNECTOR_CLASS_NAME)
            .with(CONNECTION_STRING, "mongodb://mongo1:27017/?replicaSet=rs0")
            .with(USER, "debezium")
            .with(PASSWORD, "dbz")
            .with(SERVER_SELECTION_TIMEOUT_MS, 10000)
            .with(SNAPSHOT_MODE, "never")
            .with("topic.prefix", "mongo1")
    }

    fn errors(config: &ConfigMap) -> Vec<(String, String)> {
        definition()
            .field_specs()
            .iter()
            .filter_map(|f| f.validate(config))
            .map(|e| (e.property, e.message))
            .collect()
    }

    #[test]
    fn definition_is_consistent() {
        let definition = definition();
        assert!(definition.undeclared_or_duplicate_fields().is_empty());
        assert_eq!(definition.connection_field(), CONNECTION_STRING);
    }

    #[test]
    fn tls_flags_gate_the_connection_attempt() {
        let prerequisites: Vec<&str> = definition().probe_prerequisites().collect();
        assert_eq!(
            prerequisites,
            vec![
                CONNECTION_STRING,
                USER,
                PASSWORD,
                AUTH_SOURCE,
                SSL_ENABLED,
                SSL_INVALID_HOSTNAME_ALLOWED,
                SERVER_SELECTION_TIMEOUT_MS,
                CONNECT_TIMEOUT_MS,
            ]
        );
    }

    #[test]
    fn valid_configuration_has_no_field_errors() {
        assert!(errors(&valid_config()).is_empty());
    }

    #[test]
    fn missing_connection_string_and_prefix() {
        let config = ConfigMap::new().with("connector.class", CONNECTOR_CLASS_NAME);
        assert_eq!(
            errors(&config),
            vec![
                (
                    CONNECTION_STRING.to_string(),
                    "The 'mongodb.connection.string' value is invalid: Missing connection string"
                        .to_string()
                ),
                (
                    "topic.prefix".to_string(),
                    "The 'topic.prefix' value is invalid: A value is required".to_string()
                ),
            ]
        );
    }

    #[test]
    fn wrong_connector_class() {
        let config = valid_config().with("connector.class", "io.debezium.connector.postgresql.PostgresConnector");
        let errs = errors(&config);
        assert_eq!(errs.len(), 1);
        assert_eq!(
            errs[0].1,
            "The 'connector.class' value is invalid: Expected 'io.debezium.connector.mongodb.MongoDbConnector'"
        );
    }

    #[test]
    fn password_requires_user() {
        let mut config = valid_config();
        config.remove(USER);
        let errs = errors(&config);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].0, PASSWORD);
    }

    #[test]
    fn include_and_exclude_lists_are_exclusive() {
        let config = valid_config()
            .with(COLLECTION_INCLUDE_LIST, "inventory.orders")
            .with(COLLECTION_EXCLUDE_LIST, "inventory.audit");
        assert_eq!(
            errors(&config),
            vec![(
                COLLECTION_EXCLUDE_LIST.to_string(),
                "The 'collection.exclude.list' value is invalid: \"collection.include.list\" is already specified"
                    .to_string()
            )]
        );
    }

    #[test]
    fn parses_replica_set_strings() {
        let parsed =
            MongoConnectionString::parse("mongodb://192.168.222.222:27017/?replicaSet=zz666")
                .expect("valid");
        assert!(!parsed.srv);
        assert_eq!(parsed.hosts, vec!["192.168.222.222:27017".to_string()]);
        assert_eq!(parsed.replica_set.as_deref(), Some("zz666"));
        assert!(!parsed.has_credentials);
    }

    #[test]
    fn parses_credentials_and_host_lists() {
        let parsed = MongoConnectionString::parse(
            "mongodb://user:p%40ss@a:27017,b:27018,[::1]:27019/db?authSource=admin",
        )
        .expect("valid");
        assert!(parsed.has_credentials);
        assert_eq!(parsed.hosts.len(), 3);
        assert_eq!(parsed.replica_set, None);
    }

    #[test]
    fn rejects_malformed_strings() {
        for raw in [
            "postgres://db:5432",
            "mongodb://",
            "mongodb://a:27017,,b:27017",
            "mongodb://a:notaport",
            "mongodb://a:0",
            "mongodb://:27017",
            "mongodb+srv://cluster.example.com:27017",
            "mongodb+srv://a.example.com,b.example.com",
            "mongodb://@host",
        ] {
            assert!(
                MongoConnectionString::parse(raw).is_err(),
                "{raw} should be rejected"
            );
        }
        assert!(MongoConnectionString::parse("mongodb+srv://cluster0.example.com/?retryWrites=true").is_ok());
    }

    #[test]
    fn malformed_connection_string_is_reported_on_the_field() {
        let config = valid_config().with(CONNECTION_STRING, "localhost:27017");
        let errs = errors(&config);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].0, CONNECTION_STRING);
        assert!(errs[0]
            .1
            .starts_with("The 'mongodb.connection.string' value is invalid: Invalid connection string"));
    }
}
