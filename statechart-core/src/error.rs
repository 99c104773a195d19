use std::fmt;

/// Errors raised while building or validating a statechart.
///
/// The step engine itself is total over a validated chart and never
/// constructs one of these at runtime; they are only raised by
/// `StateChart::add_state`, `StateChart::add_transition`, and
/// `StateChart::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatechartError {
    /// A malformed request unrelated to chart wiring, e.g. a lookup for a
    /// guard/action/entry/exit name the evaluator never registered.
    Domain(String),
    /// A chart-construction violation: duplicate name, dangling reference,
    /// a parent that cannot host the given child kind, and so on.
    Structural(String),
}

impl StatechartError {
    pub fn domain(message: impl Into<String>) -> Self {
        StatechartError::Domain(message.into())
    }

    pub fn structural(message: impl Into<String>) -> Self {
        StatechartError::Structural(message.into())
    }
}

impl fmt::Display for StatechartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatechartError::Domain(message) => write!(f, "{message}"),
            StatechartError::Structural(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for StatechartError {}
