// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-imaging — The two transforms Bildwerk offers.
//
// Provides global binary thresholding and marker-based watershed segmentation
// over in-memory images, plus encoding helpers for writing results back out.

pub mod processor;
pub mod segment;

// Re-export the primary structs so callers can use `bildwerk_imaging::ImageProcessor` etc.
pub use processor::{ImageProcessor, encode_for_extension, process, to_gray};
pub use segment::watershed::{Segmentation, WatershedSegmenter};
