pub mod mongodb;
pub mod postgres;

use crate::config_map::ConfigMap;
use crate::fields::{FieldSpec, FieldType, FieldValidator};

/// Property carrying the connector class, the discriminator callers use to
/// pick a definition.
pub const CONNECTOR_CLASS: &str = "connector.class";
pub const TASKS_MAX: &str = "tasks.max";
pub const TOPIC_PREFIX: &str = "topic.prefix";

/// Immutable description of one connector type: its ordered field table and
/// which fields a connectivity probe depends on.
#[derive(Debug, Clone)]
pub struct ConnectorDefinition {
    alias: &'static str,
    connector_class: &'static str,
    fields: Vec<FieldSpec>,
    connection_field: &'static str,
    connection_dependencies: Vec<&'static str>,
}

impl ConnectorDefinition {
    pub fn new(
        alias: &'static str,
        connector_class: &'static str,
        connection_field: &'static str,
    ) -> Self {
        Self {
            alias,
            connector_class,
            fields: Vec::new(),
            connection_field,
            connection_dependencies: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(mut self, specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(specs);
        self
    }

    /// Fields that must also be well formed before the store is probed.
    pub fn connection_dependencies(mut self, names: &[&'static str]) -> Self {
        self.connection_dependencies.extend_from_slice(names);
        self
    }

    pub fn alias(&self) -> &'static str {
        self.alias
    }

    pub fn connector_class(&self) -> &'static str {
        self.connector_class
    }

    /// Fields in declaration order.
    pub fn field_specs(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// The property probe failures are reported against.
    pub fn connection_field(&self) -> &'static str {
        self.connection_field
    }

    /// Connection field followed by its dependencies.
    pub fn probe_prerequisites(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.connection_field).chain(self.connection_dependencies.iter().copied())
    }

    /// Names that are referenced but not declared, or declared twice.
    pub fn undeclared_or_duplicate_fields(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        for name in self.probe_prerequisites() {
            if self.field_spec(name).is_none() {
                problems.push(name);
            }
        }
        for (i, spec) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name() == spec.name()) {
                problems.push(spec.name());
            }
        }
        problems
    }
}

/// Fields every Kafka Connect connector accepts, declared ahead of the
/// connector specific ones.
pub(crate) fn common_fields(connector_class: &'static str) -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(CONNECTOR_CLASS)
            .with_type(FieldType::Exact(connector_class))
            .with_description("Java class of the connector."),
        FieldSpec::new(TASKS_MAX)
            .with_type(FieldType::positive_int())
            .with_default("1")
            .with_description("Maximum number of tasks to create."),
    ]
}

pub(crate) fn topic_prefix() -> FieldSpec {
    FieldSpec::new(TOPIC_PREFIX)
        .required()
        .with_type(FieldType::TopicName)
        .with_description("Namespace prefix for every topic the connector writes to.")
}

/// Reason text when both halves of an include/exclude pair are set.
pub(crate) fn already_specified(spec: &FieldSpec, config: &ConfigMap, other: &str) -> Option<String> {
    (config.has_value(spec.name()) && config.has_value(other))
        .then(|| format!("\"{other}\" is already specified"))
}

/// Builds the exclude side of an include/exclude pair.
pub(crate) fn exclude_list(name: &'static str, validator: FieldValidator) -> FieldSpec {
    FieldSpec::new(name)
        .with_type(FieldType::RegexList)
        .with_validator(validator)
}

pub(crate) fn include_list(name: &'static str) -> FieldSpec {
    FieldSpec::new(name).with_type(FieldType::RegexList)
}
