//! Throwaway data stores for the live probe tests. Every container is bound
//! to a random host port and removed when its handle is dropped.

use std::collections::HashMap;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

pub const PG_DB: &str = "inventory";
pub const PG_USER: &str = "postgres";
pub const PG_PASSWORD: &str = "password";
pub const PG_PORT: u16 = 5432;

pub const MONGO_USER: &str = "debezium";
pub const MONGO_PASSWORD: &str = "dbz";
pub const MONGO_PORT: u16 = 27017;

pub type ContainerResult<T> = Result<T, Box<dyn std::error::Error>>;

pub struct PgTestContainer {
    pub container: ContainerAsync<GenericImage>,
    pub host: String,
    pub port: u16,
    pub db_name: &'static str,
    pub user: &'static str,
    pub password: &'static str,
}

impl PgTestContainer {
    /// Connection properties of a Postgres connector pointed at this server.
    pub fn connector_properties(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                "connector.class".to_string(),
                "io.debezium.connector.postgresql.PostgresConnector".to_string(),
            ),
            ("database.hostname".to_string(), self.host.clone()),
            ("database.port".to_string(), self.port.to_string()),
            ("database.user".to_string(), self.user.to_string()),
            ("database.password".to_string(), self.password.to_string()),
            ("database.dbname".to_string(), self.db_name.to_string()),
            ("database.sslmode".to_string(), "disable".to_string()),
            ("topic.prefix".to_string(), "postgres".to_string()),
        ])
    }
}

pub struct MongoTestContainer {
    pub container: ContainerAsync<GenericImage>,
    pub host: String,
    pub port: u16,
    pub user: &'static str,
    pub password: &'static str,
}

impl MongoTestContainer {
    pub fn connection_string(&self) -> String {
        format!("mongodb://{}:{}/?directConnection=true", self.host, self.port)
    }

    /// Connection properties of a MongoDB connector pointed at this server.
    pub fn connector_properties(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                "connector.class".to_string(),
                "io.debezium.connector.mongodb.MongoDbConnector".to_string(),
            ),
            ("mongodb.connection.string".to_string(), self.connection_string()),
            ("mongodb.user".to_string(), self.user.to_string()),
            ("mongodb.password".to_string(), self.password.to_string()),
            ("mongodb.server.selection.timeout.ms".to_string(), "5000".to_string()),
            ("topic.prefix".to_string(), "mongo1".to_string()),
        ])
    }
}

pub async fn setup_pg_container() -> ContainerResult<PgTestContainer> {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(PG_PORT.tcp())
        .with_wait_for(WaitFor::message_on_stdout(
            "database system is ready to accept connections",
        ))
        // the init server logs the same line before restarting
        .with_wait_for(WaitFor::seconds(1))
        .with_env_var("POSTGRES_DB", PG_DB)
        .with_env_var("POSTGRES_USER", PG_USER)
        .with_env_var("POSTGRES_PASSWORD", PG_PASSWORD)
        .start()
        .await?;

    let host = container.get_host().await?.to_string();
    let port = container.get_host_port_ipv4(PG_PORT.tcp()).await?;

    Ok(PgTestContainer {
        container,
        host,
        port,
        db_name: PG_DB,
        user: PG_USER,
        password: PG_PASSWORD,
    })
}

pub async fn setup_mongo_container() -> ContainerResult<MongoTestContainer> {
    let container = GenericImage::new("mongo", "7.0")
        .with_exposed_port(MONGO_PORT.tcp())
        .with_wait_for(WaitFor::message_on_stdout("Waiting for connections"))
        .with_wait_for(WaitFor::seconds(2))
        .with_env_var("MONGO_INITDB_ROOT_USERNAME", MONGO_USER)
        .with_env_var("MONGO_INITDB_ROOT_PASSWORD", MONGO_PASSWORD)
        .start()
        .await?;

    let host = container.get_host().await?.to_string();
    let port = container.get_host_port_ipv4(MONGO_PORT.tcp()).await?;

    Ok(MongoTestContainer {
        container,
        host,
        port,
        user: MONGO_USER,
        password: MONGO_PASSWORD,
    })
}
