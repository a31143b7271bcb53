use async_trait::async_trait;
use components::connectors::mongodb::{
    AUTH_SOURCE, CONNECTION_STRING, CONNECT_TIMEOUT_MS, DEFAULT_AUTH_SOURCE,
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_SERVER_SELECTION_TIMEOUT_MS, PASSWORD,
    SERVER_SELECTION_TIMEOUT_MS, SSL_ENABLED, SSL_INVALID_HOSTNAME_ALLOWED, USER,
};
use components::probe::{driver_deadline, most_specific_cause};
use components::{ConfigMap, ConnectivityProbe, ProbeFailure, ProbeOutcome};
use mongodb::bson::doc;
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::{ClientOptions, Credential, Tls, TlsOptions};
use mongodb::Client;
use std::time::Duration;

const APP_NAME: &str = "debezium-config-validator";

/// Connection relevant subset of a MongoDB connector configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoProbeSettings {
    pub connection_string: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub auth_source: String,
    pub ssl_enabled: bool,
    pub ssl_invalid_hostname_allowed: bool,
    pub server_selection_timeout: Duration,
    pub connect_timeout: Duration,
}

impl MongoProbeSettings {
    /// Reads the settings. Driver timeouts are capped below `budget` so a
    /// selection failure surfaces with the driver's own message.
    pub fn from_config(config: &ConfigMap, budget: Duration) -> Result<Self, ProbeFailure> {
        let cap = driver_deadline(budget);
        let connection_string = config
            .value(CONNECTION_STRING)
            .ok_or_else(|| ProbeFailure::other("Missing connection string"))?
            .to_string();

        Ok(Self {
            connection_string,
            user: config.value(USER).map(str::to_string),
            password: config.value(PASSWORD).map(str::to_string),
            auth_source: config
                .value(AUTH_SOURCE)
                .unwrap_or(DEFAULT_AUTH_SOURCE)
                .to_string(),
            ssl_enabled: flag(config, SSL_ENABLED),
            ssl_invalid_hostname_allowed: flag(config, SSL_INVALID_HOSTNAME_ALLOWED),
            server_selection_timeout: millis(
                config,
                SERVER_SELECTION_TIMEOUT_MS,
                DEFAULT_SERVER_SELECTION_TIMEOUT_MS,
            )
            .min(cap),
            connect_timeout: millis(config, CONNECT_TIMEOUT_MS, DEFAULT_CONNECT_TIMEOUT_MS)
                .min(cap),
        })
    }

    pub async fn client_options(&self) -> Result<ClientOptions, MongoError> {
        let mut options = ClientOptions::parse(&self.connection_string).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(self.server_selection_timeout);
        options.connect_timeout = Some(self.connect_timeout);

        if let Some(user) = &self.user {
            let mut credential = Credential::default();
            credential.username = Some(user.clone());
            credential.password = self.password.clone();
            credential.source = Some(self.auth_source.clone());
            options.credential = Some(credential);
        }

        if self.ssl_enabled {
            // the rustls backend can only drop every certificate check at once
            if self.ssl_invalid_hostname_allowed {
                tracing::debug!(
                    "{SSL_INVALID_HOSTNAME_ALLOWED} ignored, the server certificate is still verified"
                );
            }
            options.tls = Some(Tls::Enabled(TlsOptions::default()));
        }
        Ok(options)
    }
}

fn flag(config: &ConfigMap, key: &str) -> bool {
    config
        .value(key)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn millis(config: &ConfigMap, key: &str, default: &str) -> Duration {
    let ms = config
        .value(key)
        .and_then(|v| v.parse::<u64>().ok())
        .or_else(|| default.parse().ok())
        .unwrap_or(30_000);
    Duration::from_millis(ms)
}

/// Hands the client's shutdown to the runtime on every exit path, so
/// closing never eats into the caller's deadline.
struct ClientGuard(Option<Client>);

impl ClientGuard {
    fn client(&self) -> Option<&Client> {
        self.0.as_ref()
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        if let Some(client) = self.0.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(client.shutdown());
            }
        }
    }
}

/// Sends one `ping` to the deployment named by the connection string.
#[derive(Debug, Default, Clone)]
pub struct MongoDbProbe;

impl MongoDbProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectivityProbe for MongoDbProbe {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn probe(&self, config: &ConfigMap, timeout: Duration) -> ProbeOutcome {
        let settings = match MongoProbeSettings::from_config(config, timeout) {
            Ok(settings) => settings,
            Err(failure) => return failure.into(),
        };

        let options = match settings.client_options().await {
            Ok(options) => options,
            Err(err) => return classify(&err).into(),
        };

        let guard = match Client::with_options(options) {
            Ok(client) => ClientGuard(Some(client)),
            Err(err) => return classify(&err).into(),
        };

        let ping = match guard.client() {
            Some(client) => client.database("admin").run_command(doc! { "ping": 1 }, None).await,
            None => return ProbeFailure::other("client already closed").into(),
        };
        drop(guard);

        match ping {
            Ok(_) => ProbeOutcome::Reachable,
            Err(err) => classify(&err).into(),
        }
    }
}

/// Maps a driver error onto the probe taxonomy, keeping the driver's own
/// message as the detail.
pub fn classify(err: &MongoError) -> ProbeFailure {
    match err.kind.as_ref() {
        ErrorKind::Authentication { message, .. } => ProbeFailure::auth_rejected(message.clone()),
        ErrorKind::DnsResolve { message, .. } => ProbeFailure::unreachable(message.clone()),
        ErrorKind::ServerSelection { message, .. } => {
            if reports_set_name_mismatch(message) {
                ProbeFailure::topology_mismatch(format!("Server selection timeout: {message}"))
            } else {
                ProbeFailure::unreachable(format!("Server selection timeout: {message}"))
            }
        }
        ErrorKind::Io(io) => ProbeFailure::unreachable(io.to_string()),
        ErrorKind::InvalidArgument { message, .. } => ProbeFailure::other(message.clone()),
        _ => ProbeFailure::other(most_specific_cause(err)),
    }
}

fn reports_set_name_mismatch(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("setname") || lower.contains("replica set name")
}
