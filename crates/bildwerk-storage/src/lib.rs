// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-storage — Upload screening and on-disk persistence.
//
// Screens uploaded files against the extension allow-list, sanitizes their
// names, and writes originals and outputs into request-scoped batch
// directories with SHA-256 fingerprints.

pub mod integrity;
pub mod intake;
pub mod store;

pub use intake::{Screening, screen_uploads, secure_filename};
pub use store::{BatchDir, StoredFile, UploadStore};
