// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP routes.
//
//   GET  /               upload form
//   POST /               process with the selected method
//   GET  /region-growing placeholder page
//   GET  /threshold      threshold-only upload form
//   POST /threshold      threshold-only processing
//   GET  /uploads/*      stored originals and outputs

use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use bildwerk_core::{ProcessingMethod, UploadedFile};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::WebError;
use crate::pages;
use crate::services::batch::{process_batch, process_threshold_batch};
use crate::state::AppState;

/// Multipart field carrying the image files.
const IMAGE_FIELD: &str = "image";
/// Multipart field carrying the method selector.
const METHOD_FIELD: &str = "processing_method";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.store.root());
    let body_limit = state.config.max_request_bytes;

    Router::new()
        .route("/", get(upload_form).post(upload))
        .route("/region-growing", get(region_growing))
        .route("/threshold", get(threshold_form).post(threshold_upload))
        .nest_service(pages::UPLOADS_URL, uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn upload_form() -> Html<String> {
    Html(pages::upload_form())
}

async fn threshold_form() -> Html<String> {
    Html(pages::threshold_form())
}

async fn region_growing() -> Html<String> {
    Html(pages::region_growing())
}

/// Fields of a submitted upload form.
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<UploadedFile>,
    method: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, WebError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(IMAGE_FIELD) => {
                let filename = field.file_name().map(str::to_owned);
                let bytes = field.bytes().await?;
                form.files.push(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some(METHOD_FIELD) => form.method = Some(field.text().await?),
            _ => {}
        }
    }
    Ok(form)
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> Result<Response, WebError> {
    let form = read_form(multipart).await?;
    let method = ProcessingMethod::from_form_value(form.method.as_deref());
    tracing::info!(files = form.files.len(), %method, "Upload received");

    let AppState { config, store } = state;
    let report =
        tokio::task::spawn_blocking(move || process_batch(&config, &store, form.files, method))
            .await
            .map_err(|err| WebError::Internal(format!("processing task failed: {err}")))??;

    Ok(match report {
        Some(report) => Html(pages::result_page(&report)).into_response(),
        None => Redirect::to("/").into_response(),
    })
}

async fn threshold_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let form = read_form(multipart).await?;
    tracing::info!(files = form.files.len(), "Threshold upload received");

    let AppState { config, store } = state;
    let report = tokio::task::spawn_blocking(move || {
        process_threshold_batch(&config, &store, form.files)
    })
    .await
    .map_err(|err| WebError::Internal(format!("processing task failed: {err}")))??;

    Ok(match report {
        Some(report) => Html(pages::threshold_result_page(&report)).into_response(),
        None => Redirect::to("/threshold").into_response(),
    })
}

// -- Tests --------------------------------------------------------------------
