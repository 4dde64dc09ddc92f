//! The handle a wrapped operation uses to shape its completion line.

/// Mutable state exposed to the wrapped operation for the duration of one
/// scope.
///
/// Created at scope entry, passed by mutable reference to the wrapped
/// operation, discarded at scope exit. Carries no identity across
/// invocations; concurrent scopes each own their handle exclusively.
#[derive(Debug, Default)]
pub struct OpHandle {
    message: Option<String>,
    suppressed: bool,
}

impl OpHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record the outcome text for the completion line.
    ///
    /// May be called any number of times; the last value wins. An empty
    /// string renders the same as no message at all.
    pub fn set_message(&mut self, text: impl Into<String>) {
        self.message = Some(text.into());
    }

    /// Disable the automatic completion line for this scope.
    ///
    /// Idempotent: once suppressed, the scope stays suppressed. Has no
    /// effect on the failure line, which is always emitted.
    pub fn suppress_completion(&mut self) {
        self.suppressed = true;
    }

    pub(crate) fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub(crate) fn is_suppressed(&self) -> bool {
        self.suppressed
    }
}
