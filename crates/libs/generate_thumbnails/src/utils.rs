use color_eyre::eyre::Result;
use std::path::Path;
use tokio::fs;

/// Moves the files of one directory into another, creating the destination if needed.
///
/// Falls back to copy and delete when the two directories are on different filesystems.
pub async fn move_dir_contents(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).await?;
    let mut entries = fs::read_dir(src).await?;

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            let dst_path = dst.join(entry.file_name());
            if fs::rename(entry.path(), &dst_path).await.is_err() {
                fs::copy(entry.path(), &dst_path).await?;
                fs::remove_file(entry.path()).await?;
            }
        }
    }

    Ok(())
}
