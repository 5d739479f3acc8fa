use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{coordinator::CoordinatorError, repos::RepoError},
    domain::error::DomainError,
    infra::error::InfraError,
};

/// A flattened error chain, outermost message first.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit status for the command line front end.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Coordinator(CoordinatorError::Domain(_)) => 2,
            AppError::Coordinator(CoordinatorError::Store(RepoError::NotFound)) => 3,
            AppError::Coordinator(CoordinatorError::Store(
                RepoError::Unavailable(_) | RepoError::Timeout,
            ))
            | AppError::Infra(InfraError::Database { .. }) => 4,
            AppError::Coordinator(_) | AppError::Infra(_) | AppError::Unexpected(_) => 1,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;

    #[test]
    fn report_walks_the_source_chain() {
        let decode = serde_json::from_str::<u8>("x").unwrap_err();
        let error = AppError::from(CoordinatorError::Cache(CacheError::Decode {
            key: "tags",
            field: "a".into(),
            source: decode,
        }));

        let report = error.report();
        assert!(report.messages.len() >= 2);
        assert!(report.messages[0].starts_with("cache operation failed"));
    }

    #[test]
    fn exit_codes_distinguish_caller_mistakes() {
        assert_eq!(AppError::from(DomainError::validation("x")).exit_code(), 2);
        assert_eq!(
            AppError::from(CoordinatorError::Store(RepoError::NotFound)).exit_code(),
            3
        );
        assert_eq!(
            AppError::from(CoordinatorError::Store(RepoError::Timeout)).exit_code(),
            4
        );
        assert_eq!(AppError::unexpected("boom").exit_code(), 1);
    }
}
