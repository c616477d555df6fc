//! Operations on the `images` table
//!
//! Column layout:
//! - `id`: INTEGER PRIMARY KEY AUTOINCREMENT
//! - `drug_name`: TEXT NOT NULL (the group name)
//! - `image_path`: TEXT NOT NULL
//! - `target_rgb_r`, `target_rgb_g`, `target_rgb_b`: INTEGER
//! - `tolerance`: INTEGER

use super::{
    CatalogStore, DEFAULT_TARGET_RGB, DEFAULT_TOLERANCE, Error, ImageEntry, MAX_TOLERANCE,
    NewImageEntry, Result,
};

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: i64,
    drug_name: String,
    image_path: String,
    target_rgb_r: Option<i64>,
    target_rgb_g: Option<i64>,
    target_rgb_b: Option<i64>,
    tolerance: Option<i64>,
}

impl From<ImageRow> for ImageEntry {
    fn from(row: ImageRow) -> Self {
        // Older catalogs may hold NULLs or values outside the valid range.
        let channel = |value: Option<i64>, default: u8| {
            value.map_or(default, |v| v.clamp(0, 255) as u8)
        };

        Self {
            id: row.id,
            group_name: row.drug_name,
            image_path: row.image_path,
            target_rgb: [
                channel(row.target_rgb_r, DEFAULT_TARGET_RGB[0]),
                channel(row.target_rgb_g, DEFAULT_TARGET_RGB[1]),
                channel(row.target_rgb_b, DEFAULT_TARGET_RGB[2]),
            ],
            tolerance: row.tolerance.map_or(DEFAULT_TOLERANCE, |v| {
                v.clamp(0, MAX_TOLERANCE as i64) as u8
            }),
        }
    }
}

fn check_tolerance(tolerance: u8) -> Result<()> {
    if tolerance > MAX_TOLERANCE {
        return Err(Error::InvalidTolerance(tolerance));
    }
    Ok(())
}

impl CatalogStore {
    /// Create the database file and the `images` table if they do not exist
    ///
    /// Safe to call any number of times.
    pub async fn create_table(&self) -> Result<()> {
        let mut conn = self.connect(true).await?;

        let result = sqlx::query(
            "CREATE TABLE IF NOT EXISTS images (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 drug_name TEXT NOT NULL,
                 image_path TEXT NOT NULL,
                 target_rgb_r INTEGER,
                 target_rgb_g INTEGER,
                 target_rgb_b INTEGER,
                 tolerance INTEGER
             )",
        )
        .execute(&mut conn)
        .await;

        self.release(conn).await;
        result?;

        log::debug!("table ready in {}", self.db_path().display());
        Ok(())
    }

    /// Insert a record and return the id assigned to it
    ///
    /// # Errors
    /// - `EmptyGroupName` if the group name is blank
    /// - `InvalidTolerance` if the tolerance exceeds 100
    /// - `Sqlx` if the store cannot be opened or written
    pub async fn insert(&self, entry: &NewImageEntry) -> Result<i64> {
        let group_name = entry.group_name.trim();
        if group_name.is_empty() {
            return Err(Error::EmptyGroupName);
        }
        check_tolerance(entry.tolerance)?;

        let mut conn = self.connect(false).await?;

        let result = sqlx::query(
            "INSERT INTO images (drug_name, image_path, target_rgb_r, target_rgb_g, target_rgb_b, tolerance)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(group_name)
        .bind(entry.image_path.as_str())
        .bind(entry.target_rgb[0] as i64)
        .bind(entry.target_rgb[1] as i64)
        .bind(entry.target_rgb[2] as i64)
        .bind(entry.tolerance as i64)
        .execute(&mut conn)
        .await;

        self.release(conn).await;

        let id = result?.last_insert_rowid();
        log::debug!("inserted image {id} into group `{group_name}`");
        Ok(id)
    }

    /// Distinct group names in alphabetical order
    pub async fn list_groups(&self) -> Result<Vec<String>> {
        let mut conn = self.connect(false).await?;

        let result = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT drug_name FROM images ORDER BY drug_name",
        )
        .fetch_all(&mut conn)
        .await;

        self.release(conn).await;
        Ok(result?)
    }

    /// All records of one group, ordered by id ascending
    pub async fn list_by_group(&self, group_name: &str) -> Result<Vec<ImageEntry>> {
        let mut conn = self.connect(false).await?;

        let result = sqlx::query_as::<_, ImageRow>(
            "SELECT id, drug_name, image_path, target_rgb_r, target_rgb_g, target_rgb_b, tolerance
             FROM images WHERE drug_name = ? ORDER BY id",
        )
        .bind(group_name)
        .fetch_all(&mut conn)
        .await;

        self.release(conn).await;
        Ok(result?.into_iter().map(ImageEntry::from).collect())
    }

    /// Remove the record with `id`
    ///
    /// Deleting an id that does not exist succeeds without doing anything.
    pub async fn delete_by_id(&self, id: i64) -> Result<()> {
        let mut conn = self.connect(false).await?;

        let result = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&mut conn)
            .await;

        self.release(conn).await;

        if result?.rows_affected() == 0 {
            log::debug!("image {id} not in catalog, nothing deleted");
        }
        Ok(())
    }

    /// Overwrite the key color and tolerance of an existing record
    ///
    /// Like `delete_by_id`, a missing id is not an error.
    pub async fn update_key(&self, id: i64, target_rgb: [u8; 3], tolerance: u8) -> Result<()> {
        check_tolerance(tolerance)?;

        let mut conn = self.connect(false).await?;

        let result = sqlx::query(
            "UPDATE images SET target_rgb_r = ?, target_rgb_g = ?, target_rgb_b = ?, tolerance = ?
             WHERE id = ?",
        )
        .bind(target_rgb[0] as i64)
        .bind(target_rgb[1] as i64)
        .bind(target_rgb[2] as i64)
        .bind(tolerance as i64)
        .bind(id)
        .execute(&mut conn)
        .await;

        self.release(conn).await;

        if result?.rows_affected() == 0 {
            log::debug!("image {id} not in catalog, nothing updated");
        }
        Ok(())
    }

    /// Total number of records
    pub async fn count(&self) -> Result<i64> {
        let mut conn = self.connect(false).await?;

        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM images")
            .fetch_one(&mut conn)
            .await;

        self.release(conn).await;
        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection;
    use tempfile::{TempDir, tempdir};

    async fn init() -> (TempDir, CatalogStore) {
        let dir = tempdir().expect("temp dir");
        let store = CatalogStore::new(dir.path().join("catalog.db"));
        store.create_table().await.expect("images table failed");
        (dir, store)
    }

    fn new_entry(group: &str, path: &str, rgb: [u8; 3], tolerance: u8) -> NewImageEntry {
        NewImageEntry {
            group_name: group.to_string(),
            image_path: path.to_string(),
            target_rgb: rgb,
            tolerance,
        }
    }

    /// Test table creation is idempotent and creates the file
    #[tokio::test]
    async fn test_create_table_twice() -> Result<()> {
        let (_dir, store) = init().await;
        assert!(store.db_path().exists());

        store.create_table().await?;
        assert_eq!(store.count().await?, 0);

        Ok(())
    }

    /// Test insert then list returns the stored values with a fresh id
    #[tokio::test]
    async fn test_insert_and_list_by_group() -> Result<()> {
        let (_dir, store) = init().await;

        let id = store
            .insert(&new_entry("A", "/img/x.png", [255, 255, 255], 10))
            .await?;

        let entries = store.list_by_group("A").await?;
        assert_eq!(
            entries,
            vec![ImageEntry {
                id,
                group_name: "A".to_string(),
                image_path: "/img/x.png".to_string(),
                target_rgb: [255, 255, 255],
                tolerance: 10,
            }]
        );

        Ok(())
    }

    /// Test ids grow and list_by_group orders by id
    #[tokio::test]
    async fn test_list_by_group_orders_by_id() -> Result<()> {
        let (_dir, store) = init().await;

        let first = store.insert(&new_entry("A", "x.png", [0, 0, 0], 1)).await?;
        store.insert(&new_entry("B", "other.png", [0, 0, 0], 1)).await?;
        let second = store.insert(&new_entry("A", "y.png", [0, 0, 0], 2)).await?;
        assert!(second > first);

        let ids = store
            .list_by_group("A")
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![first, second]);

        assert!(store.list_by_group("missing").await?.is_empty());
        Ok(())
    }

    /// Test groups are distinct and sorted
    #[tokio::test]
    async fn test_list_groups() -> Result<()> {
        let (_dir, store) = init().await;
        assert!(store.list_groups().await?.is_empty());

        for group in ["ibuprofen", "aspirin", "ibuprofen", "codeine"] {
            store.insert(&new_entry(group, "p.png", [1, 1, 1], 0)).await?;
        }

        assert_eq!(
            store.list_groups().await?,
            vec!["aspirin", "codeine", "ibuprofen"]
        );
        Ok(())
    }

    /// Test group names are trimmed and must not be blank
    #[tokio::test]
    async fn test_insert_validation() -> Result<()> {
        let (_dir, store) = init().await;

        assert!(matches!(
            store.insert(&new_entry("   ", "p.png", [0, 0, 0], 0)).await,
            Err(Error::EmptyGroupName)
        ));
        assert!(matches!(
            store.insert(&new_entry("A", "p.png", [0, 0, 0], 101)).await,
            Err(Error::InvalidTolerance(101))
        ));
        assert_eq!(store.count().await?, 0);

        store.insert(&new_entry("  A  ", "p.png", [0, 0, 0], 100)).await?;
        assert_eq!(store.list_groups().await?, vec!["A"]);
        Ok(())
    }

    /// Test deleting removes exactly one record and is idempotent
    #[tokio::test]
    async fn test_delete_by_id() -> Result<()> {
        let (_dir, store) = init().await;

        let keep = store.insert(&new_entry("A", "x.png", [0, 0, 0], 0)).await?;
        let gone = store.insert(&new_entry("A", "y.png", [0, 0, 0], 0)).await?;

        store.delete_by_id(gone).await?;
        store.delete_by_id(gone).await?;
        store.delete_by_id(9999).await?;

        let entries = store.list_by_group("A").await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, keep);
        Ok(())
    }

    /// Test writing an overlay back to the record
    #[tokio::test]
    async fn test_update_key() -> Result<()> {
        let (_dir, store) = init().await;

        let id = store.insert(&new_entry("A", "x.png", [0, 0, 0], 0)).await?;
        store.update_key(id, [10, 20, 30], 55).await?;
        store.update_key(12345, [1, 1, 1], 1).await?;

        let entry = &store.list_by_group("A").await?[0];
        assert_eq!(entry.target_rgb, [10, 20, 30]);
        assert_eq!(entry.tolerance, 55);

        assert!(matches!(
            store.update_key(id, [0, 0, 0], 200).await,
            Err(Error::InvalidTolerance(200))
        ));
        Ok(())
    }

    /// Test records written by older tools with NULL or out of range values
    #[tokio::test]
    async fn test_legacy_rows_are_normalized() -> Result<()> {
        let (_dir, store) = init().await;

        let mut conn = store.connect(false).await?;
        sqlx::query(
            "INSERT INTO images (drug_name, image_path, target_rgb_r, target_rgb_g, target_rgb_b, tolerance)
             VALUES ('old', 'a.png', NULL, NULL, NULL, NULL),
                    ('old', 'b.png', -5, 300, 128, 250)",
        )
        .execute(&mut conn)
        .await?;
        conn.close().await?;

        let entries = store.list_by_group("old").await?;
        assert_eq!(entries[0].target_rgb, DEFAULT_TARGET_RGB);
        assert_eq!(entries[0].tolerance, DEFAULT_TOLERANCE);
        assert_eq!(entries[1].target_rgb, [0, 255, 128]);
        assert_eq!(entries[1].tolerance, MAX_TOLERANCE);
        Ok(())
    }

    /// Test operations on a store that was never created fail instead of creating it
    #[tokio::test]
    async fn test_missing_store_is_an_error() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("absent.db"));

        assert!(matches!(store.list_groups().await, Err(Error::Sqlx(_))));
        assert!(matches!(
            store.insert(&new_entry("A", "x.png", [0, 0, 0], 0)).await,
            Err(Error::Sqlx(_))
        ));
        assert!(!store.db_path().exists());
    }

    /// Test an unwritable location surfaces as an error
    #[tokio::test]
    async fn test_unwritable_location() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("no/such/dir/catalog.db"));
        assert!(store.create_table().await.is_err());
    }
}
