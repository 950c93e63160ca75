use std::borrow::Cow;

/// How loudly the client should report an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Errors raised by the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: Cow<'static, str>, id: String },

    #[error("Validation error: {0}")]
    Validation(Cow<'static, str>),

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No data file is open; changes cannot be saved")]
    Detached,
}

/// Conditions reported by the drawing and matching engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Polygon finalize with fewer than three vertices. The session stays open.
    #[error("A zone needs at least 3 points ({count} placed)")]
    InsufficientVertices { count: usize },

    /// Rectangle smaller than the minimum area. The session is discarded.
    #[error("The rectangle is too small ({area:.2e} deg²); drag a larger area")]
    DegenerateShape { area: f64 },

    #[error("No point of interest or service found at this location")]
    NoMatchFound,

    #[error("Coordinate out of range: lat {latitude}, lon {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: Cow<'static, str> },

    #[error("Operation requires {expected}")]
    NotActive { expected: &'static str },

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl EngineError {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::NoMatchFound | Self::InsufficientVertices { .. } | Self::DegenerateShape { .. } => {
                Severity::Warning
            }
            Self::NotActive { .. } => Severity::Info,
            Self::InvalidCoordinate { .. } | Self::InvalidField { .. } | Self::Persistence(_) => {
                Severity::Error
            }
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
pub type StoreResult<T> = Result<T, StoreError>;
