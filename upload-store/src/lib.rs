//! Storage for the single uploaded document.
//!
//! - Every accepted upload overwrites `<data_dir>/uploaded.pdf`.
//! - The data directory is created on first use and never cleaned.
//! - Writes go through `spawn_blocking`; a process-wide lock is held from the
//!   write until the caller drops the returned [`StagedUpload`], so a reader
//!   of the directory never sees another session's half-written file.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{
    sync::{Mutex, MutexGuard},
    task,
};
use tracing::{debug, info, instrument};

pub mod errors;
pub use errors::{Result, UploadError};

/// File name every upload is stored under.
pub const UPLOAD_FILE_NAME: &str = "uploaded.pdf";

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Fixed-path upload store. Clones share the same lock.
#[derive(Clone, Debug)]
pub struct UploadStore {
    data_dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

/// An upload written to disk. The store stays locked while this is alive.
#[derive(Debug)]
pub struct StagedUpload<'a> {
    _guard: MutexGuard<'a, ()>,
    pub path: PathBuf,
    pub size: usize,
}

impl UploadStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of the stored upload.
    pub fn upload_path(&self) -> PathBuf {
        self.data_dir.join(UPLOAD_FILE_NAME)
    }

    /// Writes `bytes` to the fixed path and keeps the store locked until the
    /// returned handle is dropped.
    ///
    /// # Errors
    /// [`UploadError::Io`] if the directory or file cannot be written.
    #[instrument(skip_all, fields(dir = %self.data_dir.display(), bytes = bytes.len()))]
    pub async fn stage(&self, bytes: Vec<u8>) -> Result<StagedUpload<'_>> {
        let guard = self.lock.lock().await;

        let dir = self.data_dir.clone();
        let path = self.upload_path();
        let size = bytes.len();

        let target = path.clone();
        task::spawn_blocking(move || -> Result<()> {
            ensure_dir(&dir)?;
            fs::write(&target, &bytes)?;
            Ok(())
        })
        .await??;

        info!(path = %path.display(), size, "upload stored");
        Ok(StagedUpload {
            _guard: guard,
            path,
            size,
        })
    }
}

/// Hex blake3 digest of the upload bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// True for names with a `.pdf` extension (any case).
pub fn is_pdf_file_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Ensure the data directory exists.
fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        info!(path = %dir.display(), "created data dir");
    } else {
        debug!(path = %dir.display(), "data dir exists");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn creates_dir_and_overwrites_fixed_path() {
        let tmp = tempfile::tempdir().unwrap();
        let store = UploadStore::new(tmp.path().join("data"));

        let first = store.stage(b"first upload".to_vec()).await.unwrap();
        assert_eq!(first.path, tmp.path().join("data").join(UPLOAD_FILE_NAME));
        drop(first);

        let second = store.stage(b"second".to_vec()).await.unwrap();
        assert_eq!(second.size, 6);
        assert_eq!(std::fs::read(&second.path).unwrap(), b"second");

        let entries = std::fs::read_dir(store.data_dir()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn fingerprint_follows_content() {
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
        assert_eq!(fingerprint(b"").len(), 64);
    }

    #[tokio::test]
    async fn second_writer_waits_for_the_first() {
        let tmp = tempfile::tempdir().unwrap();
        let store = UploadStore::new(tmp.path());
        let staged = store.stage(b"held".to_vec()).await.unwrap();

        let other = store.clone();
        let waiter = tokio::spawn(async move {
            other.stage(b"next".to_vec()).await.map(|s| s.size)
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());
        assert_eq!(std::fs::read(&staged.path).unwrap(), b"held");

        drop(staged);
        assert_eq!(waiter.await.unwrap().unwrap(), 4);
        assert_eq!(std::fs::read(store.upload_path()).unwrap(), b"next");
    }

    #[test]
    fn only_pdf_names_are_accepted() {
        assert!(is_pdf_file_name("Report.PDF"));
        assert!(is_pdf_file_name("a.b.pdf"));
        assert!(!is_pdf_file_name("notes.txt"));
        assert!(!is_pdf_file_name("pdf"));
    }
}
