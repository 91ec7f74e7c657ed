//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Database: SQLite passenger repository
//! - Storage: In-memory passenger repository

pub mod config;
pub mod database;
pub mod storage;

use std::sync::Arc;

use crate::application::errors::StorageError;
use crate::domain::traits::PassengerRepository;
use config::{StorageBackend, StorageConfig};

/// Build the repository selected by the storage configuration.
pub fn open_repository(
    config: &StorageConfig,
) -> Result<Arc<dyn PassengerRepository>, StorageError> {
    match config.backend {
        StorageBackend::Sqlite => Ok(Arc::new(database::SqliteRepository::open(
            &config.path,
            config.busy_timeout(),
        )?)),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on exit");
            Ok(Arc::new(storage::MemoryStore::new()))
        }
    }
}
