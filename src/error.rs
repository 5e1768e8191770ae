use thiserror::Error;

use crate::domain::Exclusion;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Which remote collaborator a fetch error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    Series,
    Narrative,
    Options,
}

impl std::fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FetchTarget::Series => "series",
            FetchTarget::Narrative => "narrative",
            FetchTarget::Options => "options",
        };
        f.write_str(name)
    }
}

/// Error taxonomy of the aggregation engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid filter: {0}")]
    InvalidFilterSpec(String),
    #[error("not enough data to plot {start_year}-{end_year}: every requested entity has fewer than 2 values in range")]
    InsufficientData {
        start_year: i32,
        end_year: i32,
        excluded: Vec<Exclusion>,
    },
    #[error("{target} fetch failed: {message}")]
    Fetch { target: FetchTarget, message: String },
    #[error("malformed data for {entity}: {message}")]
    Computation { entity: String, message: String },
}

/// Flat discriminant of [`EngineError`], handy for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidFilterSpec,
    InsufficientData,
    FetchError,
    ComputationError,
}

impl EngineError {
    pub fn fetch(target: FetchTarget, message: impl Into<String>) -> Self {
        EngineError::Fetch {
            target,
            message: message.into(),
        }
    }

    pub fn computation(entity: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Computation {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidFilterSpec(_) => ErrorKind::InvalidFilterSpec,
            EngineError::InsufficientData { .. } => ErrorKind::InsufficientData,
            EngineError::Fetch { .. } => ErrorKind::FetchError,
            EngineError::Computation { .. } => ErrorKind::ComputationError,
        }
    }

    /// The user can fix these by adjusting the filter.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidFilterSpec | ErrorKind::InsufficientData
        )
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let exit_code = match err.kind() {
            ErrorKind::InvalidFilterSpec => 2,
            ErrorKind::InsufficientData => 3,
            ErrorKind::FetchError | ErrorKind::ComputationError => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_exit_codes() {
        let invalid: AppError = EngineError::InvalidFilterSpec("empty".to_string()).into();
        assert_eq!(invalid.exit_code(), 2);

        let insufficient: AppError = EngineError::InsufficientData {
            start_year: 2000,
            end_year: 2001,
            excluded: Vec::new(),
        }
        .into();
        assert_eq!(insufficient.exit_code(), 3);

        let fetch: AppError = EngineError::fetch(FetchTarget::Series, "status 500").into();
        assert_eq!(fetch.exit_code(), 4);
        assert_eq!(fetch.to_string(), "series fetch failed: status 500");
    }

    #[test]
    fn only_filter_problems_are_user_recoverable() {
        assert!(EngineError::InvalidFilterSpec("x".to_string()).is_user_recoverable());
        assert!(!EngineError::computation("A", "NaN").is_user_recoverable());
        assert!(!EngineError::fetch(FetchTarget::Narrative, "timeout").is_user_recoverable());
    }
}
