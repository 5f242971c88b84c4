use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure reported by a classifier collaborator.
///
/// Cloneable so that every caller waiting on the same in-flight lookup can
/// observe the same failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("Search task failed: {0}")]
    Task(String),
}

/// Why a search stopped before producing a value.
///
/// `Cancelled` never reaches the consumer of a run; it only unwinds the
/// task graph.
#[derive(Debug)]
pub(crate) enum Halt {
    Cancelled,
    Failed(EngineError),
}

pub(crate) type SearchResult<T> = std::result::Result<T, Halt>;

impl From<ClassifierError> for Halt {
    fn from(err: ClassifierError) -> Self {
        Self::Failed(EngineError::Classifier(err))
    }
}

impl From<EngineError> for Halt {
    fn from(err: EngineError) -> Self {
        Self::Failed(err)
    }
}

impl From<tokio::task::JoinError> for Halt {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Failed(EngineError::Task(err.to_string()))
        }
    }
}
