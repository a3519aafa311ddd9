// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch pipeline — screen, persist, decode, transform and persist again, one
// file at a time in upload order.
//
// These functions block on disk and CPU; handlers run them on the blocking
// pool. There is no rollback: if a file fails halfway through a batch, the
// files written before it stay on disk.

use bildwerk_core::error::Result;
use bildwerk_core::{
    AcceptedUpload, AppConfig, BatchReport, ProcessingMethod, ProcessingResult, ThresholdResult,
    UploadedFile,
};
use bildwerk_imaging::{ImageProcessor, encode_for_extension};
use bildwerk_storage::{BatchDir, UploadStore, screen_uploads};
use tracing::{info, instrument};

/// Output prefix for the copy of the original on the threshold-only route.
const ORIGINAL_PREFIX: &str = "original";
/// Output prefix for the binarized image on the threshold-only route.
const THRESHOLDED_PREFIX: &str = "thresholded";

/// Process an upload with the selected method.
///
/// Returns `None` when no file survived screening; nothing is written then.
#[instrument(skip_all, fields(files = files.len(), %method))]
pub fn process_batch(
    config: &AppConfig,
    store: &UploadStore,
    files: Vec<UploadedFile>,
    method: ProcessingMethod,
) -> Result<Option<BatchReport<ProcessingResult>>> {
    let screening = screen_uploads(files, &config.allowed_extensions);
    if screening.is_empty() {
        info!(rejected = screening.rejected.len(), "No usable files in upload");
        return Ok(None);
    }

    let batch = store.begin_batch();
    let mut report = BatchReport::new(batch.id(), method);
    report.rejected = screening.rejected;

    for upload in &screening.accepted {
        let original = batch.save_original(upload)?;
        let processed = ImageProcessor::open(&original.path)?
            .apply(method, &config.processing)
            .into_dynamic();
        let bytes = encode_for_extension(&processed, &upload.extension)?;
        let output = batch.save_output(method.name(), &upload.stored_name, &bytes)?;

        report.results.push(ProcessingResult {
            original: original.relative_path,
            processed: output.relative_path,
            method,
            original_sha256: original.sha256,
            processed_sha256: output.sha256,
        });
    }

    info!(
        batch = %report.batch_id,
        processed = report.results.len(),
        skipped = report.rejected.len(),
        "Batch complete"
    );
    Ok(Some(report))
}

/// Threshold-only variant: stores `original_<name>` and `thresholded_<name>`.
#[instrument(skip_all, fields(files = files.len()))]
pub fn process_threshold_batch(
    config: &AppConfig,
    store: &UploadStore,
    files: Vec<UploadedFile>,
) -> Result<Option<BatchReport<ThresholdResult>>> {
    let screening = screen_uploads(files, &config.allowed_extensions);
    if screening.is_empty() {
        info!(rejected = screening.rejected.len(), "No usable files in upload");
        return Ok(None);
    }

    let batch = store.begin_batch();
    let mut report = BatchReport::new(batch.id(), ProcessingMethod::Threshold);
    report.rejected = screening.rejected;

    for upload in &screening.accepted {
        report.results.push(threshold_one(config, &batch, upload)?);
    }

    info!(
        batch = %report.batch_id,
        processed = report.results.len(),
        skipped = report.rejected.len(),
        "Threshold batch complete"
    );
    Ok(Some(report))
}

fn threshold_one(
    config: &AppConfig,
    batch: &BatchDir,
    upload: &AcceptedUpload,
) -> Result<ThresholdResult> {
    let original = batch.save_output(ORIGINAL_PREFIX, &upload.stored_name, &upload.bytes)?;
    let thresholded = ImageProcessor::open(&original.path)?
        .threshold(config.processing.threshold.level)
        .into_dynamic();
    let bytes = encode_for_extension(&thresholded, &upload.extension)?;
    let output = batch.save_output(THRESHOLDED_PREFIX, &upload.stored_name, &bytes)?;

    Ok(ThresholdResult {
        original: original.relative_path,
        thresholded: output.relative_path,
    })
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bildwerk_core::{BildwerkError, RejectionReason};
    use bildwerk_storage::integrity::verify_file;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};

    fn png(img: GrayImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    fn setup() -> (tempfile::TempDir, AppConfig, UploadStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig {
            upload_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let store = UploadStore::new(dir.path());
        (dir, config, store)
    }

    fn entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).expect("read_dir").count()
    }

    #[test]
    fn empty_upload_writes_nothing() {
        let (dir, config, store) = setup();
        let files = vec![UploadedFile::new("notes.txt", b"hello".to_vec())];
        let report = process_batch(&config, &store, files, ProcessingMethod::Threshold)
            .expect("batch");
        assert!(report.is_none());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn threshold_batch_stores_original_and_output() {
        let (dir, config, store) = setup();
        let mut img = GrayImage::from_pixel(10, 10, Luma([0u8]));
        img.put_pixel(2, 8, Luma([255]));
        let files = vec![
            UploadedFile::new("one white.png", png(img)),
            UploadedFile::new("virus.exe", vec![0; 4]),
        ];

        let report = process_batch(&config, &store, files, ProcessingMethod::Threshold)
            .expect("batch")
            .expect("accepted");
        assert_eq!(report.results.len(), 1);
        assert_eq!(
            report.rejected[0].reason,
            RejectionReason::DisallowedExtension("exe".into())
        );

        let result = &report.results[0];
        assert_eq!(result.original, format!("{}/one_white.png", report.batch_id));
        assert_eq!(
            result.processed,
            format!("{}/threshold_one_white.png", report.batch_id)
        );

        let processed_path = dir.path().join(&result.processed);
        verify_file(&processed_path, &result.processed_sha256).expect("digest");
        let out = image::open(&processed_path).expect("decode").to_luma8();
        for (x, y, p) in out.enumerate_pixels() {
            let expected = if (x, y) == (2, 8) { 255 } else { 0 };
            assert_eq!(p.0[0], expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn reprocessing_is_byte_identical() {
        let (_dir, config, store) = setup();
        let img = GrayImage::from_fn(40, 30, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]));
        let bytes = png(img);

        for method in [ProcessingMethod::Threshold, ProcessingMethod::Watershed] {
            let first = process_batch(
                &config,
                &store,
                vec![UploadedFile::new("g.png", bytes.clone())],
                method,
            )
            .expect("batch")
            .expect("accepted");
            let second = process_batch(
                &config,
                &store,
                vec![UploadedFile::new("g.png", bytes.clone())],
                method,
            )
            .expect("batch")
            .expect("accepted");
            assert_ne!(first.batch_id, second.batch_id);
            assert_eq!(
                first.results[0].processed_sha256,
                second.results[0].processed_sha256,
                "{method} output differs between runs"
            );
        }
    }

    #[test]
    fn undecodable_image_fails_after_saving_the_original() {
        let (dir, config, store) = setup();
        let files = vec![UploadedFile::new("broken.png", b"not a png".to_vec())];
        let err = process_batch(&config, &store, files, ProcessingMethod::Watershed)
            .expect_err("decode should fail");
        assert!(matches!(err, BildwerkError::Image(_)));
        // No rollback: the batch directory keeps the original.
        assert_eq!(entries(dir.path()), 1);
    }

    #[test]
    fn threshold_route_uses_fixed_prefixes() {
        let (dir, config, store) = setup();
        let files = vec![UploadedFile::new(
            "cells.png",
            png(GrayImage::from_pixel(8, 8, Luma([200u8]))),
        )];
        let report = process_threshold_batch(&config, &store, files)
            .expect("batch")
            .expect("accepted");
        let result = &report.results[0];
        assert_eq!(result.original, format!("{}/original_cells.png", report.batch_id));
        assert_eq!(
            result.thresholded,
            format!("{}/thresholded_cells.png", report.batch_id)
        );
        let out = image::open(dir.path().join(&result.thresholded)).expect("decode");
        assert!(out.to_luma8().pixels().all(|p| p.0[0] == 255));
    }
}
