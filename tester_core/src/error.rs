use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TesterError {
    #[error("hardware error: {0}")]
    Hardware(String),
    /// A peripheral raised an event the current phase cannot accept
    /// (e.g. a sample result before the output settled, or a duplicate settle).
    #[error("unexpected {event} event while {phase}")]
    OutOfOrder {
        event: &'static str,
        phase: &'static str,
    },
    #[error("event source disconnected")]
    Disconnected,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing stimulus output")]
    MissingOutput,
    #[error("missing sample input")]
    MissingInput,
    #[error("missing display")]
    MissingDisplay,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
