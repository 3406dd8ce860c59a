use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod database;
pub mod store;
pub mod archive;
pub mod gpx_util;
pub mod route;
mod data_manager;

pub use archive::TripArchive;
pub use data_manager::*;
pub use store::{KeyValueStore, MemoryStore};

pub const DEFAULT_DATA_DIR: &str = "data/";
pub const DATABASE_FILE: &str = "database.db";

/// Where the store keeps its files. Passed explicitly to [`DataManager::start`].
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

#[derive(Debug, Error)]
pub enum DataManagerError {
    #[error("database error: {0}")]
    Database(String),
    #[error("could not (de)serialize {key}: {reason}")]
    Serialization { key: String, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} not found")]
    NotFound(String),
    #[error("trip {0} has not finished its session")]
    InvalidTrip(String),
    #[error("trip {0} is already archived")]
    DuplicateTrip(String),
    #[error("gpx error: {0}")]
    Gpx(String),
}
