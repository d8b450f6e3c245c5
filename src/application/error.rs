use thiserror::Error;

use crate::{
    actions::MutationError, config::LoadError, infra::error::InfraError, session::StoreError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Short label used in the final log line when the process gives up.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Infra(InfraError::Configuration { .. }) | AppError::Config(_) => {
                "configuration"
            }
            AppError::Infra(InfraError::Telemetry(_)) => "telemetry",
            AppError::Infra(_) | AppError::Store(_) => "io",
            AppError::Mutation(MutationError::LoginRequired) => "login_required",
            AppError::Mutation(MutationError::Request(_)) => "request",
            AppError::Validation(_) => "validation",
            AppError::Unexpected(_) => "unexpected",
        }
    }
}
