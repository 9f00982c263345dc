//! JSON output files.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{ExportError, Result};

/// Writes entity collections as pretty-printed JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonSink {
    dir: PathBuf,
}

impl JsonSink {
    /// Sink writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Destination directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `entities` as a JSON array to `file_name`, replacing any
    /// existing file.
    ///
    /// Returns the written path. Callers treat a failure as non-fatal.
    pub async fn write(&self, file_name: &str, entities: &[Value]) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        let json = serde_json::to_string_pretty(entities)?;

        tokio::fs::write(&path, json)
            .await
            .map_err(|e| ExportError::io(&path, e))?;

        Ok(path)
    }
}

/// Create the destination directory, emptying it first when `clean` is set.
pub async fn prepare_destination(dir: &Path, clean: bool) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ExportError::io(dir, e))?;

    if !clean {
        return Ok(());
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ExportError::io(dir, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ExportError::io(dir, e))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| ExportError::io(&path, e))?;

        let removed = if file_type.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        removed.map_err(|e| ExportError::io(&path, e))?;
    }

    tracing::debug!(dir = %dir.display(), "cleaned destination directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonSink::new(dir.path());

        let path = sink
            .write("tags-o1.json", &[json!({"tagId": "t1", "name": "urgent"})])
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[\n  {"));
        let parsed: Vec<Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["name"], "urgent");
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonSink::new(dir.path());

        sink.write("users-o1.json", &[json!(1), json!(2), json!(3)])
            .await
            .unwrap();
        let path = sink.write("users-o1.json", &[]).await.unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonSink::new(dir.path().join("missing"));

        let result = sink.write("organizations.json", &[]).await;
        assert!(matches!(result, Err(ExportError::Io { .. })));
    }

    #[tokio::test]
    async fn test_prepare_destination_cleans() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("export");
        std::fs::create_dir_all(dest.join("attachments-c1")).unwrap();
        std::fs::write(dest.join("attachments-c1/old.txt"), "x").unwrap();
        std::fs::write(dest.join("cards-w1.json"), "[]").unwrap();

        prepare_destination(&dest, false).await.unwrap();
        assert!(dest.join("cards-w1.json").exists());

        prepare_destination(&dest, true).await.unwrap();
        assert!(dest.exists());
        assert_eq!(std::fs::read_dir(&dest).unwrap().count(), 0);
    }
}
