use crate::connectors::ConnectorDefinition;
use crate::errors::RegistryError;
use crate::probe::ConnectivityProbe;
use common::diag;
use std::fmt;
use std::sync::Arc;

/// A connector definition bound to the probe that can reach its store.
#[derive(Clone)]
pub struct RegisteredConnector {
    definition: ConnectorDefinition,
    probe: Arc<dyn ConnectivityProbe>,
}

impl RegisteredConnector {
    pub fn definition(&self) -> &ConnectorDefinition {
        &self.definition
    }

    pub fn probe(&self) -> &dyn ConnectivityProbe {
        self.probe.as_ref()
    }
}

impl fmt::Debug for RegisteredConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredConnector")
            .field("alias", &self.definition.alias())
            .field("connector_class", &self.definition.connector_class())
            .field("probe", &self.probe.name())
            .finish()
    }
}

/// Connector types known to this process. Built once at start-up and then
/// only read.
#[derive(Clone, Default, Debug)]
pub struct ConnectorRegistry {
    connectors: Vec<RegisteredConnector>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        definition: ConnectorDefinition,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Result<(), RegistryError> {
        let problems = definition.undeclared_or_duplicate_fields();
        if !problems.is_empty() {
            return Err(RegistryError::InvalidDefinition {
                context: diag!(
                    "connector '{}' has undeclared or duplicate fields: {}",
                    definition.alias(),
                    problems.join(", ")
                ),
            });
        }
        if self.get(definition.alias()).is_some()
            || self.by_class(definition.connector_class()).is_some()
        {
            return Err(RegistryError::Duplicate {
                context: diag!(
                    "connector '{}' ({}) is already registered",
                    definition.alias(),
                    definition.connector_class()
                ),
            });
        }
        self.connectors.push(RegisteredConnector { definition, probe });
        Ok(())
    }

    pub fn with(
        mut self,
        definition: ConnectorDefinition,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Result<Self, RegistryError> {
        self.register(definition, probe)?;
        Ok(self)
    }

    pub fn get(&self, alias: &str) -> Option<&RegisteredConnector> {
        self.connectors.iter().find(|c| c.definition.alias() == alias)
    }

    /// Lookup by the `connector.class` discriminator.
    pub fn by_class(&self, connector_class: &str) -> Option<&RegisteredConnector> {
        self.connectors
            .iter()
            .find(|c| c.definition.connector_class() == connector_class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredConnector> {
        self.connectors.iter()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}
