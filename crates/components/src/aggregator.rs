use crate::config_map::ConfigMap;
use crate::connectors::ConnectorDefinition;
use crate::probe::{probe_with_deadline, ConnectivityProbe, ProbeOutcome};
use crate::report::{ValidationError, ValidationReport};
use std::time::Duration;

/// Combines field checks and the connectivity probe into one report.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionValidator {
    probe_timeout: Duration,
}

impl ConnectionValidator {
    pub fn new(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Field checks only, in declaration order. Never touches the network.
    pub fn validate_fields(definition: &ConnectorDefinition, config: &ConfigMap) -> ValidationReport {
        definition
            .field_specs()
            .iter()
            .filter_map(|spec| spec.validate(config))
            .collect()
    }

    /// Full validation.
    ///
    /// The probe only runs when the connection field and its dependencies
    /// passed their own checks, so a structurally broken connection never
    /// produces a second "Unable to connect" entry on top of the first.
    pub async fn validate(
        &self,
        definition: &ConnectorDefinition,
        probe: &dyn ConnectivityProbe,
        config: &ConfigMap,
    ) -> ValidationReport {
        let mut report = Self::validate_fields(definition, config);

        let blocked_by = definition
            .probe_prerequisites()
            .find(|field| report.has_error_for(field));
        if let Some(field) = blocked_by {
            tracing::debug!(
                connector = definition.alias(),
                field,
                "skipping connectivity probe, connection settings are invalid"
            );
            return report;
        }

        tracing::debug!(
            connector = definition.alias(),
            probe = probe.name(),
            timeout_ms = self.probe_timeout.as_millis() as u64,
            "probing data source"
        );
        match probe_with_deadline(probe, config, self.probe_timeout).await {
            ProbeOutcome::Reachable => {}
            ProbeOutcome::Failed(failure) => {
                tracing::warn!(
                    connector = definition.alias(),
                    kind = %failure.kind,
                    detail = %failure.detail,
                    "connectivity probe failed"
                );
                report.push(ValidationError::new(
                    definition.connection_field(),
                    failure.message(),
                ));
            }
        }

        report
    }
}
