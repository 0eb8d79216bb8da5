use crate::ingest::PhotoStore;
use crate::utils::{remove_dir_best_effort, remove_file_best_effort, storage_key};
use color_eyre::Result;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// What [`clean_orphans`] deleted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub originals_removed: usize,
    pub thumbnail_dirs_removed: usize,
}

/// Deletes originals and derivative folders that no stored photo refers to.
///
/// Originals are matched on their file stem, derivative folders on their name. Both are
/// compared against the storage keys of the stored photo ids.
#[instrument(skip(store))]
pub async fn clean_orphans(
    store: &dyn PhotoStore,
    media_folder: &Path,
    thumbnail_folder: &Path,
) -> Result<CleanupReport> {
    let keys: HashSet<String> = store
        .list_photo_ids()
        .await?
        .iter()
        .map(|id| storage_key(id))
        .collect();
    let mut report = CleanupReport::default();

    if fs::try_exists(media_folder).await? {
        let mut entries = fs::read_dir(media_folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !keys.contains(&stem) {
                remove_file_best_effort(&path).await;
                report.originals_removed += 1;
            }
        }
    }

    if fs::try_exists(thumbnail_folder).await? {
        let mut entries = fs::read_dir(thumbnail_folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !keys.contains(&name) {
                remove_dir_best_effort(&entry.path()).await;
                report.thumbnail_dirs_removed += 1;
            }
        }
    }

    info!(
        "Removed {} orphaned originals and {} orphaned thumbnail folders",
        report.originals_removed, report.thumbnail_dirs_removed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeStore;
    use std::fs as std_fs;

    #[tokio::test]
    async fn removes_only_unreferenced_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let media = dir.path().join("media");
        let thumbs = dir.path().join("thumbnails");
        std_fs::create_dir_all(thumbs.join("2020_a.jpg"))?;
        std_fs::create_dir_all(thumbs.join("orphan"))?;
        std_fs::create_dir_all(&media)?;
        std_fs::write(media.join("2020_a.jpg.jpg"), b"kept")?;
        std_fs::write(media.join("orphan.png"), b"dropped")?;
        let store = FakeStore::default();
        store.insert_existing("2020/a.jpg");

        let report = clean_orphans(&store, &media, &thumbs).await?;

        assert_eq!(
            report,
            CleanupReport {
                originals_removed: 1,
                thumbnail_dirs_removed: 1,
            }
        );
        assert!(media.join("2020_a.jpg.jpg").exists());
        assert!(!media.join("orphan.png").exists());
        assert!(thumbs.join("2020_a.jpg").exists());
        assert!(!thumbs.join("orphan").exists());
        Ok(())
    }

    #[tokio::test]
    async fn missing_folders_are_fine() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FakeStore::default();

        let report = clean_orphans(&store, &dir.path().join("a"), &dir.path().join("b")).await?;

        assert_eq!(report, CleanupReport::default());
        Ok(())
    }
}
