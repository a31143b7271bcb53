pub mod diagnostics;

pub use diagnostics::DiagnosticMessage;

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Top level failure of a validator process (never a validation outcome).
#[derive(Debug)]
pub enum ValidatorError {
    Init(Box<dyn Error + Send + Sync>), // carries *why* start-up failed
    Serve(Box<dyn Error + Send + Sync>),
    Validate(Box<dyn Error + Send + Sync>),
}

impl Display for ValidatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorError::Init(e) => write!(f, "initialisation failed: {e}"),
            ValidatorError::Serve(e) => write!(f, "server failed: {e}"),
            ValidatorError::Validate(e) => write!(f, "validation run failed: {e}"),
        }
    }
}

impl Error for ValidatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ValidatorError::Init(e) => Some(&**e),
            ValidatorError::Serve(e) => Some(&**e),
            ValidatorError::Validate(e) => Some(&**e),
        }
    }
}
