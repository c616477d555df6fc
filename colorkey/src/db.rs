use anyhow::{Context, Result};
use sqldb::CatalogStore;
use std::{fs, path::Path};

/// Open the catalog at `db_path`, creating the file and table when needed
pub async fn init(db_path: &Path) -> Result<CatalogStore> {
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {} failed", dir.display()))?;
    }

    let store = CatalogStore::new(db_path);
    store
        .create_table()
        .await
        .with_context(|| format!("images table failed in {}", db_path.display()))?;

    log::info!(
        "catalog {} holds {} images",
        db_path.display(),
        store.count().await?
    );

    Ok(store)
}
