use std::path::Path;
use tracing::warn;

/// Logs a warning message with an 'ALERT:' prefix.
#[macro_export]
macro_rules! alert {
    ($($arg:tt)*) => {
        tracing::warn!("ALERT: {}", format_args!($($arg)*));
    };
}

/// Turns a source identifier into something safe to use as a file or folder name.
///
/// Identifiers that are already safe are used as is. Any other identifier gets a hash of
/// the raw identifier appended, so two identifiers never share a key.
#[must_use]
pub fn storage_key(id: &str) -> String {
    let sanitized = sanitize_filename::sanitize(id.replace(['/', '\\'], "_"));
    if sanitized == id && !sanitized.is_empty() {
        return sanitized;
    }
    let hash = blake3::hash(id.as_bytes()).to_hex();
    format!("{sanitized}-{}", &hash[..16])
}

/// Removes a file if it exists. Failures are logged, never returned.
pub async fn remove_file_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {}", path.display(), e),
    }
}

/// Removes a directory tree if it exists. Failures are logged, never returned.
pub async fn remove_dir_best_effort(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_ids_are_kept_verbatim() {
        assert_eq!(storage_key("1AbC-xyz_09"), "1AbC-xyz_09");
        assert_eq!(storage_key("a_b.jpg"), "a_b.jpg");
    }

    #[test]
    fn rewritten_ids_get_a_hash_suffix() {
        let nested = storage_key("2020/summer/a.jpg");
        let reserved = storage_key("a:b*c?.jpg");

        assert!(nested.starts_with("2020_summer_a.jpg-"));
        assert_eq!(nested.len(), "2020_summer_a.jpg-".len() + 16);
        assert!(reserved.starts_with("abc.jpg-"));
        assert_eq!(storage_key("2020/summer/a.jpg"), nested);
    }

    #[test]
    fn ids_that_sanitize_alike_get_distinct_keys() {
        let keys = [
            storage_key("a/b.jpg"),
            storage_key("a_b.jpg"),
            storage_key("a\\b.jpg"),
            storage_key("a:b.jpg"),
            storage_key("ab.jpg"),
        ];

        for (i, key) in keys.iter().enumerate() {
            assert!(keys[i + 1..].iter().all(|other| other != key), "{key} repeats");
        }
    }

    #[tokio::test]
    async fn best_effort_removal_ignores_missing_paths() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("original.jpg");
        tokio::fs::write(&file, b"jpeg").await?;

        remove_file_best_effort(&file).await;
        remove_file_best_effort(&file).await;
        remove_dir_best_effort(&dir.path().join("missing")).await;

        assert!(!file.exists());
        Ok(())
    }
}
