// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decoding, global thresholding, watershed dispatch and
// encoding. Operates on in-memory images using the `image` and
// `imageproc` crates.

use std::io::Cursor;
use std::path::Path;

use bildwerk_core::error::BildwerkError;
use bildwerk_core::{ProcessingMethod, ProcessingParams, WatershedParams};
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, Luma};
use tracing::{debug, info, instrument};

use crate::segment::watershed::WatershedSegmenter;

/// Processing pipeline operating on a single in-memory image.
///
/// Transforms consume `self` and return a new `ImageProcessor` wrapping the
/// result, so calls chain:
///
/// ```ignore
/// let png = ImageProcessor::open("cells.png")?
///     .watershed(&WatershedParams::default())
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path. The format is sniffed from the file
    /// content, not the extension.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BildwerkError> {
        let img = ImageReader::open(path.as_ref())?
            .with_guessed_format()?
            .decode()
            .map_err(|err| {
                BildwerkError::Image(format!(
                    "failed to open {}: {}",
                    path.as_ref().display(),
                    err
                ))
            })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (PNG, JPEG, GIF).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, BildwerkError> {
        let img = image::load_from_memory(data).map_err(|err| {
            BildwerkError::Image(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Global binary threshold: pixels strictly brighter than `level` become
    /// 255, everything else 0. The result is always L8.
    #[instrument(skip(self))]
    pub fn threshold(self, level: u8) -> Self {
        info!(level, "Applying global threshold");
        let gray = to_gray(&self.image);
        Self {
            image: DynamicImage::ImageLuma8(binarize(&gray, level)),
        }
    }

    /// Marker-based watershed segmentation with ridge lines painted in
    /// `params.boundary_color`. The result is always RGB8.
    #[instrument(skip_all)]
    pub fn watershed(self, params: &WatershedParams) -> Self {
        let segmentation = WatershedSegmenter::new(params.clone()).segment(&self.image);
        Self {
            image: DynamicImage::ImageRgb8(segmentation.image),
        }
    }

    /// Apply the transform selected by `method`.
    pub fn apply(self, method: ProcessingMethod, params: &ProcessingParams) -> Self {
        match method {
            ProcessingMethod::Threshold => self.threshold(params.threshold.level),
            ProcessingMethod::Watershed => self.watershed(&params.watershed),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, BildwerkError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// Apply `method` to `image`, returning the new image.
pub fn process(
    image: DynamicImage,
    method: ProcessingMethod,
    params: &ProcessingParams,
) -> DynamicImage {
    ImageProcessor::from_dynamic(image)
        .apply(method, params)
        .into_dynamic()
}

/// Encode `image` in the format implied by a file extension.
///
/// JPEG cannot carry alpha and GIF frames are RGBA, so the buffer is converted
/// first where the target format needs it.
pub fn encode_for_extension(image: &DynamicImage, ext: &str) -> Result<Vec<u8>, BildwerkError> {
    let format = ImageFormat::from_extension(ext.to_ascii_lowercase()).ok_or_else(|| {
        BildwerkError::Image(format!("no encoder for extension {ext:?}"))
    })?;
    match format {
        ImageFormat::Jpeg if image.color().has_alpha() => {
            encode_to_format(&DynamicImage::ImageRgb8(image.to_rgb8()), format)
        }
        ImageFormat::Gif => encode_to_format(&DynamicImage::ImageRgba8(image.to_rgba8()), format),
        _ => encode_to_format(image, format),
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, BildwerkError> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| BildwerkError::Image(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Grayscale conversion with BT.601 weights in 14-bit fixed point, so colour
/// inputs land on the same gray levels as the usual computer-vision tooling.
///
/// Single-channel inputs pass through unchanged; alpha is dropped.
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => image.to_luma8(),
        _ => {
            let rgb = image.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Luma([bt601(r, g, b)])
            })
        }
    }
}

fn bt601(r: u8, g: u8, b: u8) -> u8 {
    let luma = (u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868 + 8192) >> 14;
    // The weights sum to 1 << 14, so white maps to 255 exactly.
    luma.min(255) as u8
}

fn binarize(gray: &GrayImage, level: u8) -> GrayImage {
    let mut output = gray.clone();
    for pixel in output.pixels_mut() {
        *pixel = Luma([if pixel.0[0] > level { 255 } else { 0 }]);
    }
    output
}

// -- Tests --------------------------------------------------------------------
