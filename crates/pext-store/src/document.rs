//! JSON document persistence
//!
//! Every logical document (registry files, shard files) is rewritten in
//! full on mutation. Writes go to a temporary sibling path first and are
//! renamed into place, so readers see either the previous document or the
//! new one, never a partial file.

use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::Path;

/// Read a JSON document. A missing file is `Ok(None)`; a file that exists
/// but cannot be decoded is an error.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let value = serde_json::from_str(&content).map_err(|e| StoreError::InvalidDocument {
        path: path.to_string_lossy().to_string(),
        message: e.to_string(),
    })?;

    Ok(Some(value))
}

/// Replace a JSON document atomically: serialize, write `<path>.tmp`,
/// rename over the target.
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(value).map_err(|e| StoreError::InvalidDocument {
        path: path.to_string_lossy().to_string(),
        message: e.to_string(),
    })?;

    let tmp = tmp_path(path);
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;

    Ok(())
}

fn tmp_path(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    std::path::PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        items: Vec<String>,
    }

    #[test]
    fn test_missing_file_reads_none() {
        let dir = TempDir::new().unwrap();
        let read: Option<Doc> = read_document(&dir.path().join("absent.json")).unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        let doc = Doc { items: vec!["a".to_string(), "b".to_string()] };

        write_document(&path, &doc).unwrap();
        let read: Doc = read_document(&path).unwrap().unwrap();
        assert_eq!(read, doc);

        // no temporary file left behind
        assert!(!dir.path().join("doc.json.tmp").exists());
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result: StoreResult<Option<Doc>> = read_document(&path);
        assert!(matches!(result, Err(StoreError::InvalidDocument { .. })));
    }
}
