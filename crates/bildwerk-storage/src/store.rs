// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload store — request-scoped batch directories under the upload root.
//
// Layout:
//
//   <root>/<batch-id>/<stored_name>            original upload
//   <root>/<batch-id>/<prefix>_<stored_name>   processed output
//
// Each request writes into its own directory, so concurrent uploads of the
// same file name never overwrite each other.

use std::path::{Path, PathBuf};

use bildwerk_core::error::BildwerkError;
use bildwerk_core::{AcceptedUpload, BatchId};
use tracing::{debug, info, instrument};

use crate::integrity::hash_bytes;

/// Root of all stored uploads.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet.
    pub fn ensure_root(&self) -> Result<(), BildwerkError> {
        std::fs::create_dir_all(&self.root).map_err(|err| {
            BildwerkError::Storage(format!(
                "cannot create upload directory {}: {err}",
                self.root.display()
            ))
        })?;
        debug!(root = %self.root.display(), "Upload directory ready");
        Ok(())
    }

    /// Reserve a fresh batch. Nothing touches the disk until the first write.
    pub fn begin_batch(&self) -> BatchDir {
        let id = BatchId::new();
        BatchDir {
            dir: self.root.join(id.to_string()),
            id,
        }
    }
}

/// Directory holding the files of one upload request.
#[derive(Debug, Clone)]
pub struct BatchDir {
    id: BatchId,
    dir: PathBuf,
}

/// A file written by a [`BatchDir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// `<batch-id>/<file name>`, always with `/` separators.
    pub relative_path: String,
    /// Absolute or root-relative path on disk.
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the written bytes.
    pub sha256: String,
}

impl BatchDir {
    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Store the upload's bytes unchanged under its sanitized name.
    pub fn save_original(&self, upload: &AcceptedUpload) -> Result<StoredFile, BildwerkError> {
        self.write(&upload.stored_name, &upload.bytes)
    }

    /// Store processed bytes as `<prefix>_<stored_name>`.
    pub fn save_output(
        &self,
        prefix: &str,
        stored_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, BildwerkError> {
        self.write(&format!("{prefix}_{stored_name}"), bytes)
    }

    #[instrument(skip(self, bytes), fields(batch = %self.id, len = bytes.len()))]
    fn write(&self, name: &str, bytes: &[u8]) -> Result<StoredFile, BildwerkError> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(BildwerkError::Storage(format!(
                "refusing to store file under name {name:?}"
            )));
        }

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, bytes).map_err(|err| {
            BildwerkError::Storage(format!("failed to write {}: {err}", path.display()))
        })?;

        let sha256 = hash_bytes(bytes);
        info!(file = name, sha256 = %sha256, "File stored");
        Ok(StoredFile {
            relative_path: format!("{}/{name}", self.id),
            path,
            sha256,
        })
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::verify_file;

    fn upload(name: &str, bytes: &[u8]) -> AcceptedUpload {
        AcceptedUpload {
            original_name: name.to_string(),
            stored_name: name.to_string(),
            extension: "png".to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn batch_directory_is_created_lazily() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = UploadStore::new(root.path());
        let batch = store.begin_batch();
        assert!(!batch.path().exists());

        batch.save_original(&upload("a.png", b"png bytes")).expect("save");
        assert!(batch.path().is_dir());
    }

    #[test]
    fn original_and_output_share_the_batch_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let batch = UploadStore::new(root.path()).begin_batch();

        let original = batch.save_original(&upload("cells.png", b"raw")).expect("original");
        let output = batch.save_output("watershed", "cells.png", b"segmented").expect("output");

        assert_eq!(original.relative_path, format!("{}/cells.png", batch.id()));
        assert_eq!(output.relative_path, format!("{}/watershed_cells.png", batch.id()));
        assert_eq!(std::fs::read(&original.path).expect("read"), b"raw");
        assert_eq!(std::fs::read(&output.path).expect("read"), b"segmented");
        verify_file(&output.path, &output.sha256).expect("digest matches");
    }

    #[test]
    fn batches_never_collide() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = UploadStore::new(root.path());
        let first = store.begin_batch();
        let second = store.begin_batch();
        assert_ne!(first.id(), second.id());

        let a = first.save_original(&upload("same.png", b"first")).expect("save");
        let b = second.save_original(&upload("same.png", b"second")).expect("save");
        assert_ne!(a.path, b.path);
        assert_eq!(std::fs::read(&a.path).expect("read"), b"first");
    }

    #[test]
    fn path_like_names_are_refused() {
        let root = tempfile::tempdir().expect("tempdir");
        let batch = UploadStore::new(root.path()).begin_batch();
        for name in ["", "..", "../escape.png", "a\\b.png"] {
            assert!(
                matches!(batch.save_original(&upload(name, b"x")), Err(BildwerkError::Storage(_))),
                "{name:?} was stored"
            );
        }
    }

    #[test]
    fn ensure_root_creates_nested_directories() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = UploadStore::new(root.path().join("static").join("uploads"));
        store.ensure_root().expect("ensure_root");
        assert!(store.root().is_dir());
        // Idempotent.
        store.ensure_root().expect("ensure_root again");
    }
}
