// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload intake — extension allow-listing and filename sanitizing.

use bildwerk_core::{AcceptedUpload, RejectedUpload, RejectionReason, UploadedFile};
use tracing::{debug, warn};

/// Reserved device names that cannot be used as file names on Windows.
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8", "COM9",
    "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9", "PRN", "NUL",
];

/// Result of screening one upload batch.
#[derive(Debug, Default)]
pub struct Screening {
    /// Files to process, in upload order.
    pub accepted: Vec<AcceptedUpload>,
    /// Files skipped, in upload order.
    pub rejected: Vec<RejectedUpload>,
}

impl Screening {
    /// True when nothing in the batch can be processed.
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Split `files` into accepted and rejected uploads.
///
/// Blank parts (no name, no content) are dropped without a rejection entry.
/// `allowed_extensions` must be lowercase.
pub fn screen_uploads(files: Vec<UploadedFile>, allowed_extensions: &[String]) -> Screening {
    let mut screening = Screening::default();

    for file in files {
        if file.is_blank() {
            continue;
        }
        let size = file.size();
        let original_name = file.filename.clone().unwrap_or_default();

        match screen_one(file, allowed_extensions) {
            Ok(accepted) => {
                debug!(
                    original = %accepted.original_name,
                    stored = %accepted.stored_name,
                    size,
                    "Upload accepted"
                );
                screening.accepted.push(accepted);
            }
            Err(reason) => {
                warn!(filename = %original_name, %reason, "Upload skipped");
                screening.rejected.push(RejectedUpload {
                    filename: original_name,
                    reason,
                });
            }
        }
    }

    screening
}

fn screen_one(
    file: UploadedFile,
    allowed_extensions: &[String],
) -> Result<AcceptedUpload, RejectionReason> {
    let ext = file.extension().ok_or(RejectionReason::MissingExtension)?;
    if !allowed_extensions.contains(&ext) {
        return Err(RejectionReason::DisallowedExtension(ext));
    }

    let original_name = file.filename.unwrap_or_default();
    let stored_name = secure_filename(&original_name);

    // Sanitizing can eat the whole name or the dot before the extension.
    let extension = match stored_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return Err(RejectionReason::UnusableName),
    };
    if !allowed_extensions.contains(&extension) {
        return Err(RejectionReason::UnusableName);
    }

    Ok(AcceptedUpload {
        original_name,
        stored_name,
        extension,
        bytes: file.bytes,
    })
}

/// Reduce a client-supplied file name to a safe, flat ASCII name.
///
/// Non-ASCII characters are dropped, path separators become spaces,
/// whitespace runs become a single `_`, anything outside `[A-Za-z0-9_.-]` is
/// removed, and leading/trailing `.` and `_` are stripped. The result may be
/// empty.
///
/// Windows device names (`CON`, `LPT1`, ...) get a `_` prefix on every host,
/// not only on Windows, so a stored upload keeps the same name wherever the
/// upload directory is later copied.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');

    let stem = trimmed.split('.').next().unwrap_or_default();
    if !trimmed.is_empty() && WINDOWS_DEVICE_NAMES.contains(&stem.to_ascii_uppercase().as_str()) {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

// -- Tests --------------------------------------------------------------------
