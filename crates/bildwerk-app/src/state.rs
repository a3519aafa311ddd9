// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared application state handed to every request handler.

use std::sync::Arc;

use bildwerk_core::AppConfig;
use bildwerk_storage::UploadStore;

/// Cheap to clone; handlers receive it through axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Settings fixed at startup.
    pub config: Arc<AppConfig>,
    /// Upload directory shared by all requests.
    pub store: UploadStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = UploadStore::new(config.upload_dir.clone());
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
