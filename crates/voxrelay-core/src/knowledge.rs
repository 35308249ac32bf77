//! Knowledge base — documents loaded once at startup, read-only thereafter.
//!
//! Nothing in the conversation flow queries this yet; it is loaded, counted
//! in `/health`, and held as a hook for future retrieval.

use std::path::Path;

use tracing::{info, warn};

/// One loaded document.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub content: String,
}

/// In-memory document set scanned from a directory at startup.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    documents: Vec<Document>,
}

impl KnowledgeBase {
    /// Scan `dir` (creating it if absent) for `.txt` and `.pdf` files.
    ///
    /// A file that fails to read or parse is logged and skipped; one corrupt
    /// document never aborts loading the rest.
    pub fn load(dir: &Path) -> crate::error::Result<Self> {
        std::fs::create_dir_all(dir)?;

        let mut documents = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(%e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            let filename = entry.file_name().to_string_lossy().into_owned();

            let result = match path.extension().and_then(|e| e.to_str()) {
                Some("txt") => std::fs::read_to_string(&path).map_err(anyhow::Error::from),
                Some("pdf") => extract_pdf_text(&path),
                _ => continue,
            };

            match result {
                Ok(content) => {
                    info!(filename = %filename, bytes = content.len(), "Loaded document");
                    documents.push(Document { filename, content });
                }
                Err(e) => {
                    warn!(filename = %filename, %e, "Failed to load document");
                }
            }
        }

        info!(count = documents.len(), dir = %dir.display(), "Knowledge base loaded");
        Ok(Self { documents })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Extract the text of every page, newline-separated.
fn extract_pdf_text(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(pdf_extract::extract_text_from_mem(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let kb_dir = dir.path().join("kb");
        assert!(!kb_dir.exists());

        let kb = KnowledgeBase::load(&kb_dir).unwrap();
        assert!(kb_dir.is_dir());
        assert!(kb.is_empty());
    }

    #[test]
    fn test_loads_txt_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello world").unwrap();
        std::fs::write(dir.path().join("ignored.md"), "# nope").unwrap();

        let kb = KnowledgeBase::load(dir.path()).unwrap();
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.documents()[0].filename, "notes.txt");
        assert_eq!(kb.documents()[0].content, "hello world");
    }

    #[test]
    fn test_corrupt_pdf_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), "still here").unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"not a real pdf").unwrap();

        let kb = KnowledgeBase::load(dir.path()).unwrap();
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.documents()[0].filename, "good.txt");
    }

    #[test]
    fn test_non_utf8_txt_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("binary.txt"), [0xff, 0xfe, 0x00]).unwrap();

        let kb = KnowledgeBase::load(dir.path()).unwrap();
        assert!(kb.is_empty());
    }
}
