use std::{borrow::Cow, fmt, panic::Location};

/// Human-friendly error message that records where it was raised.
///
/// Build one with [`DiagnosticMessage::new`] or the [`diag!`] macro. The macro
/// takes `format!` style arguments, e.g. `diag!("unknown connector {}", alias)`.
#[derive(Clone, Debug)]
pub struct DiagnosticMessage {
    message: Cow<'static, str>,
    location: &'static Location<'static>,
}

impl DiagnosticMessage {
    /// Create a message and record the caller location.
    #[track_caller]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
        }
    }

    /// The human readable message, without the location.
    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    /// Where the diagnostic was created.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at {}:{})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

/// Builds a [`DiagnosticMessage`] from `format!` style arguments. The
/// recorded location is the macro's call site.
#[macro_export]
macro_rules! diag {
    ($msg:literal $(,)?) => {
        $crate::error::diagnostics::DiagnosticMessage::new($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::diagnostics::DiagnosticMessage::new(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_the_construction_site() {
        let diag = crate::diag!("unknown connector {}", "oracle");
        assert_eq!(diag.message(), "unknown connector oracle");
        assert!(diag.location().file().ends_with("diagnostics.rs"));
        assert!(diag.to_string().starts_with("unknown connector oracle (at "));
    }
}
