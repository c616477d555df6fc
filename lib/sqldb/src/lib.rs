//! SQLite catalog of color-keyed images
//!
//! Stores one record per image: the group it belongs to, the path of the
//! source file and the key color and tolerance used to render it. The
//! source files themselves are only referenced, never copied.
//!
//! # Features
//! - Async SQLite operations using `sqlx`
//! - One connection per call, closed before the call returns
//! - Automatic database creation and table management
//! - Serde serialization support for catalog records
//!
//! # Examples
//! ```no_run
//! use sqldb::{CatalogStore, NewImageEntry};
//!
//! #[tokio::main]
//! async fn main() -> sqldb::Result<()> {
//!     let store = CatalogStore::new("/path/to/catalog.db");
//!     store.create_table().await?;
//!
//!     let id = store
//!         .insert(&NewImageEntry {
//!             group_name: "aspirin".to_string(),
//!             image_path: "/images/aspirin.png".to_string(),
//!             target_rgb: [255, 255, 255],
//!             tolerance: 10,
//!         })
//!         .await?;
//!
//!     for entry in store.list_by_group("aspirin").await? {
//!         println!("{} -> {}", entry.id, entry.image_path);
//!     }
//!
//!     store.delete_by_id(id).await?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{
    Connection,
    sqlite::{SqliteConnectOptions, SqliteConnection},
};
use std::path::{Path, PathBuf};

pub mod images;

/// Name of the catalog table
///
/// The table and column names are shared with existing catalog files and
/// must not change.
pub const IMAGES_TABLE: &str = "images";

/// Upper bound for a stored tolerance
pub const MAX_TOLERANCE: u8 = 100;

/// Key color used when a legacy record has no color stored
pub const DEFAULT_TARGET_RGB: [u8; 3] = [255, 255, 255];

/// Tolerance used when a legacy record has no tolerance stored
pub const DEFAULT_TOLERANCE: u8 = 10;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Group name must not be empty")]
    EmptyGroupName,

    #[error("Tolerance {0} is out of range 0..={MAX_TOLERANCE}")]
    InvalidTolerance(u8),
}

/// A persisted catalog record
///
/// `id` is assigned by the store on insert and never changes afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub id: i64,
    pub group_name: String,
    pub image_path: String,
    pub target_rgb: [u8; 3],
    pub tolerance: u8,
}

/// A record that has not been stored yet
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewImageEntry {
    pub group_name: String,
    pub image_path: String,
    pub target_rgb: [u8; 3],
    pub tolerance: u8,
}

/// Handle on a catalog database file
///
/// The handle keeps no open connection. Each operation connects, runs its
/// statements and closes the connection again, so two handles on the same
/// file never hold a lock across calls.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    db_path: PathBuf,
}

impl CatalogStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection scoped to a single operation
    ///
    /// Only `create_table` is allowed to create the database file; every
    /// other operation fails if the file is missing.
    async fn connect(&self, create_if_missing: bool) -> Result<SqliteConnection> {
        let options = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .create_if_missing(create_if_missing);

        Ok(SqliteConnection::connect_with(&options).await?)
    }

    /// Close a scoped connection, logging rather than failing on close errors
    async fn release(&self, conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            log::warn!("close {} failed: {e}", self.db_path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test ImageEntry serialization
    #[test]
    fn test_image_entry_serialization() {
        let entry = ImageEntry {
            id: 7,
            group_name: "aspirin".to_string(),
            image_path: "/tmp/aspirin.png".to_string(),
            target_rgb: [1, 2, 3],
            tolerance: 42,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("aspirin"));
        assert!(json.contains("/tmp/aspirin.png"));

        let deserialized: ImageEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, entry);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::InvalidTolerance(120).to_string(),
            "Tolerance 120 is out of range 0..=100"
        );
        assert_eq!(
            Error::EmptyGroupName.to_string(),
            "Group name must not be empty"
        );
    }

    #[test]
    fn test_store_keeps_path() {
        let store = CatalogStore::new("/tmp/catalog.db");
        assert_eq!(store.db_path(), Path::new("/tmp/catalog.db"));
    }
}
