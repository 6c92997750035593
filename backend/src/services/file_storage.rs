use std::{
    io,
    path::{Path, PathBuf},
};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Upload bytes on disk, laid out as `<root>/<task id>/<stored filename>`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

/// Keeps the final path component and replaces anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

impl FileStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await?;
        info!(path = %self.root.display(), "upload directory ready");
        Ok(())
    }

    fn path_for(&self, task_id: Uuid, stored_name: &str) -> PathBuf {
        self.root.join(task_id.to_string()).join(stored_name)
    }

    /// Writes the bytes and returns the generated stored filename.
    pub async fn save(&self, task_id: Uuid, original_name: &str, bytes: &[u8]) -> io::Result<String> {
        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_filename(original_name));
        let path = self.path_for(task_id, &stored_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        debug!(%task_id, file = %stored_name, size = bytes.len(), "stored upload");
        Ok(stored_name)
    }

    pub async fn read(&self, task_id: Uuid, stored_name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_for(task_id, stored_name)).await
    }

    /// Missing files count as deleted.
    pub async fn delete(&self, task_id: Uuid, stored_name: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(task_id, stored_name)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Storage under a fresh temp directory, removed on drop.
    pub(crate) struct TempStorage {
        pub storage: FileStorage,
        root: PathBuf,
    }

    impl Drop for TempStorage {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    pub(crate) fn temp_storage() -> TempStorage {
        let root = std::env::temp_dir().join(format!("taskflow-uploads-{}", Uuid::new_v4()));
        TempStorage { storage: FileStorage::new(&root), root }
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("report final.pdf"), "report_final.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\plan.txt"), "plan.txt");
        assert_eq!(sanitize_filename(".."), "file");
    }

    #[tokio::test]
    async fn save_read_delete() {
        let temp = temp_storage();
        let task_id = Uuid::new_v4();

        let stored = temp.storage.save(task_id, "notes.txt", b"hello").await.unwrap();
        assert!(stored.ends_with("-notes.txt"));
        assert_eq!(temp.storage.read(task_id, &stored).await.unwrap(), b"hello");

        temp.storage.delete(task_id, &stored).await.unwrap();
        assert!(temp.storage.read(task_id, &stored).await.is_err());
        temp.storage.delete(task_id, &stored).await.unwrap();
    }
}
