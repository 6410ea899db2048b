use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Address, AddressDraft};

/// Errors that can occur when reading or writing address records
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Address id {0} not found")]
    NotFound(i64),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

/// Owner of persisted addresses and their identifiers
#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// Every address, ordered by id
    async fn list_all(&self) -> Result<Vec<Address>, RepositoryError>;

    async fn get(&self, id: i64) -> Result<Address, RepositoryError>;

    /// Persist a new record and assign its id
    async fn create(&self, draft: AddressDraft) -> Result<Address, RepositoryError>;

    /// Replace every field of an existing record
    async fn update(&self, id: i64, draft: AddressDraft) -> Result<Address, RepositoryError>;

    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;

    async fn health_check(&self) -> Result<bool, RepositoryError>;
}
