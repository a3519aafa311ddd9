// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Segmentation — marker construction and watershed flooding.

pub mod flood;
pub mod watershed;

pub use flood::{BOUNDARY, Markers};
pub use watershed::WatershedSegmenter;
