//! Validation engine for change-data-capture connector configurations.
//!
//! A connector type is described by a [`ConnectorDefinition`]: an ordered
//! table of [`FieldSpec`]s plus the field that identifies the target store.
//! [`ConnectionValidator`] evaluates a [`ConfigMap`] against that table and,
//! when the connection fields are well formed, runs a [`ConnectivityProbe`]
//! supplied by the caller. The outcome is always a [`ValidationReport`].

pub mod aggregator;
pub mod config_map;
pub mod connectors;
pub mod errors;
pub mod fields;
pub mod probe;
pub mod registry;
pub mod report;

pub use aggregator::ConnectionValidator;
pub use config_map::ConfigMap;
pub use connectors::ConnectorDefinition;
pub use fields::{FieldSpec, FieldType, FieldValidator};
pub use probe::{ConnectivityProbe, ProbeFailure, ProbeFailureKind, ProbeOutcome};
pub use registry::{ConnectorRegistry, RegisteredConnector};
pub use report::{ValidationError, ValidationReport, ValidationStatus};
