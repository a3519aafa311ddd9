// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Bildwerk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one upload request; names its storage directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One file part of a multipart upload, before screening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Name claimed by the client, if any.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: Some(filename.into()),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Suffix after the last `.`, lowercased. `None` when the name has no dot
    /// or ends in one.
    pub fn extension(&self) -> Option<String> {
        let name = self.filename.as_deref()?;
        name.rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /// A part with no name and no content is what a browser sends for an
    /// untouched file input.
    pub fn is_blank(&self) -> bool {
        self.filename.as_deref().is_none_or(str::is_empty) && self.bytes.is_empty()
    }
}

/// An upload that passed screening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    /// Name as claimed by the client.
    pub original_name: String,
    /// Sanitized name used on disk.
    pub stored_name: String,
    /// Lowercased extension of `stored_name`.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Why an upload was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The filename has no `.` suffix at all.
    MissingExtension,
    /// The suffix is not in the allow-list.
    DisallowedExtension(String),
    /// Sanitizing the name left nothing usable (empty or suffix stripped).
    UnusableName,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingExtension => write!(f, "The file name has no extension."),
            Self::DisallowedExtension(ext) => {
                write!(f, "Files ending in .{ext} are not accepted.")
            }
            Self::UnusableName => write!(
                f,
                "The file name could not be made safe; rename it and try again."
            ),
        }
    }
}

/// An upload that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedUpload {
    pub filename: String,
    pub reason: RejectionReason,
}

/// Transform selected on the upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMethod {
    #[default]
    Threshold,
    Watershed,
}

impl ProcessingMethod {
    /// Interpret the `processing_method` form value. Only the exact string
    /// `"watershed"` selects segmentation; anything else, including padded or
    /// differently cased values and no value at all, thresholds.
    pub fn from_form_value(value: Option<&str>) -> Self {
        match value {
            Some("watershed") => Self::Watershed,
            _ => Self::Threshold,
        }
    }

    /// Stable name, also used as the output filename prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::Watershed => "watershed",
        }
    }
}

impl std::fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One original/processed pair for display.
///
/// Paths are relative to the upload directory (`<batch-id>/<file>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub original: String,
    pub processed: String,
    pub method: ProcessingMethod,
    /// SHA-256 of the stored original.
    pub original_sha256: String,
    /// SHA-256 of the stored output.
    pub processed_sha256: String,
}

/// Record produced by the threshold-only route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdResult {
    /// `<batch-id>/original_<name>`
    pub original: String,
    /// `<batch-id>/thresholded_<name>`
    pub thresholded: String,
}

/// Everything a processed upload request produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport<R> {
    pub batch_id: BatchId,
    pub method: ProcessingMethod,
    pub results: Vec<R>,
    pub rejected: Vec<RejectedUpload>,
    pub processed_at: DateTime<Utc>,
}

impl<R> BatchReport<R> {
    pub fn new(batch_id: BatchId, method: ProcessingMethod) -> Self {
        Self {
            batch_id,
            method,
            results: Vec::new(),
            rejected: Vec::new(),
            processed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parsing_defaults_to_threshold() {
        assert_eq!(
            ProcessingMethod::from_form_value(Some("watershed")),
            ProcessingMethod::Watershed
        );
        assert_eq!(
            ProcessingMethod::from_form_value(Some("threshold")),
            ProcessingMethod::Threshold
        );
        assert_eq!(
            ProcessingMethod::from_form_value(Some("region-growing")),
            ProcessingMethod::Threshold
        );
        assert_eq!(ProcessingMethod::from_form_value(None), ProcessingMethod::Threshold);
    }

    #[test]
    fn method_parsing_is_exact() {
        assert_eq!(
            ProcessingMethod::from_form_value(Some(" watershed ")),
            ProcessingMethod::Threshold
        );
        assert_eq!(
            ProcessingMethod::from_form_value(Some("Watershed")),
            ProcessingMethod::Threshold
        );
    }

    #[test]
    fn method_names_are_filename_prefixes() {
        assert_eq!(ProcessingMethod::Threshold.name(), "threshold");
        assert_eq!(ProcessingMethod::Watershed.to_string(), "watershed");
    }

    #[test]
    fn extension_uses_last_dot_and_lowercases() {
        let file = UploadedFile::new("holiday.backup.PNG", vec![1]);
        assert_eq!(file.extension().as_deref(), Some("png"));

        let file = UploadedFile::new("README", vec![1]);
        assert_eq!(file.extension(), None);

        let file = UploadedFile::new("trailing.", vec![1]);
        assert_eq!(file.extension(), None);
    }

    #[test]
    fn blank_part_is_detected() {
        let blank = UploadedFile {
            filename: Some(String::new()),
            bytes: Vec::new(),
        };
        assert!(blank.is_blank());
        assert!(UploadedFile { filename: None, bytes: Vec::new() }.is_blank());
        assert!(!UploadedFile::new("a.png", Vec::new()).is_blank());
    }

    #[test]
    fn rejection_reasons_read_as_sentences() {
        let reason = RejectionReason::DisallowedExtension("bmp".into());
        assert_eq!(reason.to_string(), "Files ending in .bmp are not accepted.");
    }
}
