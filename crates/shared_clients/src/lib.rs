//! Driver backed collaborators of the validation engine: connectivity probes
//! for the supported stores and an HTTP client for a remote validator.

pub mod mongo;
pub mod postgres;
pub mod tls;
pub mod validation;

use crate::mongo::MongoDbProbe;
use crate::postgres::PostgresProbe;
use components::connectors::{mongodb as mongodb_connector, postgres as postgres_connector};
use components::errors::RegistryError;
use components::ConnectorRegistry;
use std::sync::Arc;

/// Every connector type this workspace ships, each bound to its driver
/// probe. Call once at start-up and share the result.
pub fn default_registry() -> Result<ConnectorRegistry, RegistryError> {
    ConnectorRegistry::new()
        .with(mongodb_connector::definition(), Arc::new(MongoDbProbe::new()))?
        .with(postgres_connector::definition(), Arc::new(PostgresProbe::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_shipped_connector() {
        let registry = default_registry().expect("registry");
        let aliases: Vec<&str> = registry.iter().map(|c| c.definition().alias()).collect();
        assert_eq!(aliases, vec!["mongodb", "postgres"]);
        assert_eq!(registry.get("mongodb").map(|c| c.probe().name()), Some("mongodb"));
        assert_eq!(registry.get("postgres").map(|c| c.probe().name()), Some("postgres"));
    }
}
