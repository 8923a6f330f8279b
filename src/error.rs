//! Error types shared across the mirror

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error (get/list/watch)
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Postgres error (connect, statement, transaction)
    #[error("database error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Invalid or missing configuration
    #[error("configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
