use common::error::DiagnosticMessage;
use thiserror::Error;

/// Raised when an inbound payload cannot become a [`crate::ConfigMap`].
#[derive(Debug, Error)]
pub enum ConfigMapError {
    #[error("expected a JSON object: {context}")]
    NotAnObject { context: DiagnosticMessage },
    #[error("unsupported value: {context}")]
    UnsupportedValue { context: DiagnosticMessage },
}

impl ConfigMapError {
    /// The message without the call-site suffix, for user facing responses.
    pub fn message(&self) -> &str {
        match self {
            Self::NotAnObject { context } | Self::UnsupportedValue { context } => context.message(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate connector: {context}")]
    Duplicate { context: DiagnosticMessage },
    #[error("Invalid connector definition: {context}")]
    InvalidDefinition { context: DiagnosticMessage },
}
