use async_trait::async_trait;
use crate::tls::{client_config, CertificateCheck};
use components::connectors::postgres::{
    CONNECT_TIMEOUT_MS, DBNAME, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_PORT, DEFAULT_SSLMODE,
    HOSTNAME, PASSWORD, PORT, SSLMODE, SSLROOTCERT, TLS_REQUIRED_SSLMODES, USER,
};
use components::probe::{driver_deadline, most_specific_cause};
use components::{ConfigMap, ConnectivityProbe, ProbeFailure, ProbeFailureKind, ProbeOutcome};
use std::error::Error as StdError;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::config::SslMode;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Config, Error};
use tokio_postgres_rustls::MakeRustlsConnect;

const APP_NAME: &str = "debezium-config-validator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresProbeSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
    pub sslmode: String,
    pub root_cert: Option<PathBuf>,
    pub connect_timeout: Duration,
}

impl PostgresProbeSettings {
    /// Reads the settings. The connect timeout ends before `budget` so a
    /// stalled handshake is reported by the adapter itself.
    pub fn from_config(config: &ConfigMap, budget: Duration) -> Result<Self, ProbeFailure> {
        let required = |key: &str| {
            config
                .value(key)
                .map(str::to_string)
                .ok_or_else(|| ProbeFailure::other(format!("Missing {key}")))
        };

        let port = config
            .value(PORT)
            .unwrap_or(DEFAULT_PORT)
            .parse::<u16>()
            .map_err(|_| ProbeFailure::other(format!("Invalid {PORT}")))?;
        let connect_timeout_ms = config
            .value(CONNECT_TIMEOUT_MS)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS)
            .parse::<u64>()
            .map_err(|_| ProbeFailure::other(format!("Invalid {CONNECT_TIMEOUT_MS}")))?;

        Ok(Self {
            host: required(HOSTNAME)?,
            port,
            user: required(USER)?,
            password: config.value(PASSWORD).map(str::to_string),
            dbname: required(DBNAME)?,
            sslmode: config
                .value(SSLMODE)
                .unwrap_or(DEFAULT_SSLMODE)
                .to_ascii_lowercase(),
            root_cert: config.value(SSLROOTCERT).map(PathBuf::from),
            connect_timeout: Duration::from_millis(connect_timeout_ms).min(driver_deadline(budget)),
        })
    }

    /// True when the server must be reached over TLS.
    pub fn requires_tls(&self) -> bool {
        TLS_REQUIRED_SSLMODES.contains(&self.sslmode.as_str())
    }

    pub fn certificate_check(&self) -> CertificateCheck {
        CertificateCheck::for_sslmode(&self.sslmode)
    }

    pub fn pg_config(&self) -> Config {
        let mut config = Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(&self.dbname)
            .application_name(APP_NAME)
            .connect_timeout(self.connect_timeout)
            .ssl_mode(if self.sslmode == "disable" {
                SslMode::Disable
            } else if self.requires_tls() {
                SslMode::Require
            } else {
                SslMode::Prefer
            });
        if let Some(password) = &self.password {
            config.password(password);
        }
        config
    }
}

/// Keeps the connection driver task alive while the client is in use and
/// aborts it as soon as the probe is done with it.
struct DriverGuard(JoinHandle<()>);

impl Drop for DriverGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Completes a Postgres start-up handshake (including authentication) and
/// disconnects.
#[derive(Debug, Default, Clone)]
pub struct PostgresProbe;

impl PostgresProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectivityProbe for PostgresProbe {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn probe(&self, config: &ConfigMap, timeout: Duration) -> ProbeOutcome {
        let settings = match PostgresProbeSettings::from_config(config, timeout) {
            Ok(settings) => settings,
            Err(failure) => return failure.into(),
        };

        let tls = match client_config(settings.certificate_check(), settings.root_cert.as_deref())
        {
            Ok(tls) => MakeRustlsConnect::new(tls),
            Err(failure) => return failure.into(),
        };

        // the driver's own timeout only covers the TCP connect
        let pg_config = settings.pg_config();
        let handshake = pg_config.connect(tls);
        match tokio::time::timeout(settings.connect_timeout, handshake).await {
            Err(_) => no_response(&settings).into(),
            Ok(Ok((client, connection))) => {
                let _driver = DriverGuard(tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::debug!("postgres probe connection closed: {e}");
                    }
                }));
                drop(client);
                ProbeOutcome::Reachable
            }
            Ok(Err(err)) => classify(&err).into(),
        }
    }
}

fn no_response(settings: &PostgresProbeSettings) -> ProbeFailure {
    ProbeFailure::new(
        ProbeFailureKind::Timeout,
        format!(
            "No response from {}:{} within {} ms",
            settings.host,
            settings.port,
            settings.connect_timeout.as_millis()
        ),
    )
}

/// Maps a driver error onto the probe taxonomy.
pub fn classify(err: &Error) -> ProbeFailure {
    if let Some(db) = err.as_db_error() {
        let code = db.code();
        return if code == &SqlState::INVALID_PASSWORD
            || code == &SqlState::INVALID_AUTHORIZATION_SPECIFICATION
        {
            ProbeFailure::auth_rejected(db.message())
        } else {
            ProbeFailure::other(db.message())
        };
    }

    let detail = most_specific_cause(err);
    if let Some(io) = find_io_error(err) {
        // handshake failures come back from the TLS stream wrapped in io errors
        if let Some(tls) = io
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        {
            return ProbeFailure::other(format!("TLS handshake failed: {tls}"));
        }
        return match io.kind() {
            IoErrorKind::TimedOut => ProbeFailure::new(ProbeFailureKind::Timeout, detail),
            _ => ProbeFailure::unreachable(detail),
        };
    }
    if detail.contains("password missing") {
        return ProbeFailure::auth_rejected(detail);
    }
    if detail.contains("does not support TLS") {
        return ProbeFailure::other(format!("TLS required by sslmode: {detail}"));
    }
    ProbeFailure::other(detail)
}

fn find_io_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a std::io::Error> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            return Some(io);
        }
        current = e.source();
    }
    None
}
