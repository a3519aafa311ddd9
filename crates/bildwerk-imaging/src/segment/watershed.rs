// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watershed segmentation pipeline — Otsu mask, morphological cleanup,
// distance-based seeds, connected-component markers, then flooding.

use bildwerk_core::WatershedParams;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::{Norm, euclidean_squared_distance_transform};
use imageproc::morphology::{dilate, erode};
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::{debug, info, instrument};

use super::flood::{Markers, flood};
use crate::processor::to_gray;

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// Output of one segmentation run.
pub struct Segmentation {
    /// RGB copy of the input with ridge pixels painted.
    pub image: RgbImage,
    /// Labels after flooding.
    pub markers: Markers,
    /// Number of seed regions before flooding (including the background seed).
    pub seed_regions: usize,
}

/// Marker-based watershed segmentation with fixed parameters.
///
/// ## Pipeline
///
/// 1. Convert to grayscale (BT.601 weights)
/// 2. Inverted Otsu binarization (dark pixels become the mask)
/// 3. Morphological opening to drop small specks
/// 4. Dilate the opening to get the sure-background region
/// 5. Threshold the distance transform of the opening at
///    `foreground_fraction` of its maximum to get sure-foreground seeds
/// 6. Unknown band = sure background minus sure foreground
/// 7. Label the seeds (8-connected), shift by one, clear the unknown band
/// 8. Flood over the colour image and paint ridge pixels
pub struct WatershedSegmenter {
    params: WatershedParams,
}

impl WatershedSegmenter {
    pub fn new(params: WatershedParams) -> Self {
        Self { params }
    }

    /// Run the full pipeline on `image`.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn segment(&self, image: &DynamicImage) -> Segmentation {
        let gray = to_gray(image);
        let mut markers = self.markers(&gray);
        let seed_regions = markers.region_count();

        let mut rgb = image.to_rgb8();
        flood(&rgb, &mut markers);

        let color = Rgb(self.params.boundary_color);
        let mut ridges = 0usize;
        for (x, y) in markers.boundary_pixels() {
            rgb.put_pixel(x, y, color);
            ridges += 1;
        }

        info!(seed_regions, ridges, "Watershed segmentation complete");
        Segmentation {
            image: rgb,
            markers,
            seed_regions,
        }
    }

    /// Build seed markers from a grayscale image (steps 2 to 7).
    pub fn markers(&self, gray: &GrayImage) -> Markers {
        let (mask, level) = inverted_otsu_mask(gray);
        debug!(level, "Otsu level computed");

        let opening = open(&mask, self.params.opening_radius());
        let sure_bg = dilate(&opening, Norm::LInf, self.params.background_radius());
        let sure_fg = sure_foreground(&opening, self.params.foreground_fraction);
        let unknown = subtract(&sure_bg, &sure_fg);

        let components = connected_components(&sure_fg, Connectivity::Eight, Luma([BACKGROUND]));
        Markers::from_components(&components, &unknown)
    }
}

/// Binary mask with pixels at or below the Otsu level set to 255.
pub fn inverted_otsu_mask(gray: &GrayImage) -> (GrayImage, u8) {
    let level = otsu_level(gray);
    let mut mask = gray.clone();
    for pixel in mask.pixels_mut() {
        let value = if pixel.0[0] > level { BACKGROUND } else { FOREGROUND };
        *pixel = Luma([value]);
    }
    (mask, level)
}

/// Square-kernel opening. `radius` is the kernel radius times the number of
/// passes, since repeated 3x3 passes compose into one larger square.
fn open(mask: &GrayImage, radius: u8) -> GrayImage {
    let eroded = erode(mask, Norm::LInf, radius);
    dilate(&eroded, Norm::LInf, radius)
}

/// Pixels whose Euclidean distance to the nearest zero pixel exceeds
/// `fraction` of the largest such distance.
///
/// A mask with no zero pixel at all has no finite distances; every set pixel
/// then counts as foreground.
pub fn sure_foreground(mask: &GrayImage, fraction: f32) -> GrayImage {
    // The distance transform measures distance to non-zero pixels, so the
    // mask's zero pixels are turned into the targets.
    let mut targets = mask.clone();
    image::imageops::invert(&mut targets);
    let dist_sq = euclidean_squared_distance_transform(&targets);

    let max_dist = dist_sq
        .pixels()
        .map(|p| p.0[0])
        .filter(|d| d.is_finite())
        .fold(0.0f64, f64::max)
        .sqrt();
    let cutoff = f64::from(fraction) * max_dist;
    debug!(max_dist, cutoff, "Distance transform computed");

    let mut output = GrayImage::new(mask.width(), mask.height());
    for ((out, dist), set) in output
        .pixels_mut()
        .zip(dist_sq.pixels())
        .zip(mask.pixels())
    {
        let d = dist.0[0];
        let foreground = if d.is_finite() {
            d.sqrt() > cutoff
        } else {
            set.0[0] > 0
        };
        *out = Luma([if foreground { FOREGROUND } else { BACKGROUND }]);
    }
    output
}

/// Saturating per-pixel `a - b`.
fn subtract(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut output = a.clone();
    for (out, sub) in output.pixels_mut().zip(b.pixels()) {
        out.0[0] = out.0[0].saturating_sub(sub.0[0]);
    }
    output
}

// -- Tests --------------------------------------------------------------------
