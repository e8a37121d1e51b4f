//! Directory reader: turns every file in a directory into [`Document`]s.
//!
//! - Non-recursive; hidden files (leading `.`) and non-files are skipped.
//! - Files are visited in name order so document ids are stable.
//! - `.pdf` files yield one document per page (text via `pdf-extract`,
//!   parsed on a blocking thread).
//! - Any other file is read as UTF-8 text (lossy).

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::RagError;
use crate::normalize::normalize_extracted;
use crate::record::{Document, DocumentMetadata};

/// Default upper bound for a single input file.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Reads all files of a directory into documents.
#[derive(Clone, Debug)]
pub struct DirectoryReader {
    dir: PathBuf,
    max_file_size: u64,
}

impl DirectoryReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Loads every file in the directory.
    ///
    /// # Errors
    /// - [`RagError::NoDocuments`] if the directory holds no loadable files
    /// - [`RagError::Pdf`] if a PDF cannot be parsed
    /// - [`RagError::Io`] on filesystem errors or oversized files
    pub async fn load_data(&self) -> Result<Vec<Document>, RagError> {
        let files = self.list_files().await?;
        if files.is_empty() {
            return Err(RagError::NoDocuments(self.dir.clone()));
        }

        let mut docs = Vec::new();
        for path in files {
            let loaded = self.load_file(&path).await?;
            debug!(path = %path.display(), documents = loaded.len(), "file loaded");
            docs.extend(loaded);
        }

        info!(dir = %self.dir.display(), documents = docs.len(), "directory loaded");
        Ok(docs)
    }

    async fn list_files(&self) -> Result<Vec<PathBuf>, RagError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }

        files.sort();
        Ok(files)
    }

    async fn load_file(&self, path: &Path) -> Result<Vec<Document>, RagError> {
        let meta = tokio::fs::metadata(path).await?;
        if meta.len() > self.max_file_size {
            return Err(RagError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "{} is {} bytes, limit is {}",
                    path.display(),
                    meta.len(),
                    self.max_file_size
                ),
            )));
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = DocumentMetadata {
            file_name: file_name.clone(),
            file_path: path.display().to_string(),
            page_label: None,
        };

        if is_pdf(path) {
            let pages = extract_pdf_pages(path, bytes).await?;
            let docs: Vec<Document> = pages
                .into_iter()
                .enumerate()
                .filter_map(|(i, raw)| {
                    let text = normalize_extracted(&raw);
                    if text.is_empty() {
                        return None;
                    }
                    let page = (i + 1).to_string();
                    Some(Document {
                        id: format!("{file_name}#page={page}"),
                        text,
                        metadata: DocumentMetadata {
                            page_label: Some(page),
                            ..base.clone()
                        },
                    })
                })
                .collect();
            if docs.is_empty() {
                warn!(path = %path.display(), "PDF has no extractable text");
            }
            Ok(docs)
        } else {
            let text = normalize_extracted(&String::from_utf8_lossy(&bytes));
            if text.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![Document {
                id: file_name,
                text,
                metadata: base,
            }])
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

async fn extract_pdf_pages(path: &Path, bytes: Vec<u8>) -> Result<Vec<String>, RagError> {
    let owned = path.to_path_buf();
    let joined = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| e.to_string())
    })
    .await;

    match joined {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(reason)) => Err(RagError::Pdf {
            path: owned,
            reason,
        }),
        // the parser panics on some malformed inputs
        Err(e) => Err(RagError::Pdf {
            path: owned,
            reason: format!("parser aborted: {e}"),
        }),
    }
}
