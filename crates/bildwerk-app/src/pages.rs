// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML pages. Small enough to build with `format!`; every value that came
// from a client goes through `escape` first.

use std::fmt::Write;

use axum::http::StatusCode;
use bildwerk_core::{BatchReport, ProcessingResult, RejectedUpload, ThresholdResult};

/// URL prefix under which the upload directory is served.
pub const UPLOADS_URL: &str = "/uploads";

const STYLE: &str = r#"
    * { box-sizing: border-box; }
    body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
           max-width: 960px; margin: 0 auto; padding: 24px; color: #1f2933; }
    nav a { margin-right: 16px; }
    form { display: flex; flex-direction: column; gap: 12px; max-width: 420px; }
    button { padding: 10px; font-size: 1rem; cursor: pointer; }
    .pair { display: flex; gap: 16px; margin-bottom: 24px; flex-wrap: wrap; }
    .pair figure { margin: 0; flex: 1 1 300px; }
    .pair img { max-width: 100%; border: 1px solid #cbd2d9; }
    .skipped { color: #8a2c0d; }
"#;

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title} — Bildwerk</title>
  <style>{STYLE}</style>
</head>
<body>
  <nav><a href="/">Upload</a><a href="/threshold">Threshold only</a><a href="/region-growing">Region growing</a></nav>
  <h1>{title}</h1>
{body}
</body>
</html>
"#
    )
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn upload_url(relative_path: &str) -> String {
    escape(&format!("{UPLOADS_URL}/{relative_path}"))
}

pub fn upload_form() -> String {
    layout(
        "Upload images",
        r#"  <form method="post" action="/" enctype="multipart/form-data">
    <input type="file" name="image" accept=".png,.jpg,.jpeg,.gif" multiple required>
    <label>Processing method
      <select name="processing_method">
        <option value="threshold">Thresholding</option>
        <option value="watershed">Watershed segmentation</option>
      </select>
    </label>
    <button type="submit">Process</button>
  </form>"#,
    )
}

pub fn threshold_form() -> String {
    layout(
        "Threshold images",
        r#"  <form method="post" action="/threshold" enctype="multipart/form-data">
    <input type="file" name="image" accept=".png,.jpg,.jpeg,.gif" multiple required>
    <button type="submit">Threshold</button>
  </form>"#,
    )
}

pub fn region_growing() -> String {
    layout(
        "Region growing",
        "  <p>Region growing is not available yet. Use the upload page for thresholding or watershed segmentation.</p>",
    )
}

fn pair(left_label: &str, left: &str, right_label: &str, right: &str) -> String {
    format!(
        r#"  <div class="pair">
    <figure><img src="{}" alt="{left_label}"><figcaption>{left_label}</figcaption></figure>
    <figure><img src="{}" alt="{right_label}"><figcaption>{right_label}</figcaption></figure>
  </div>
"#,
        upload_url(left),
        upload_url(right),
    )
}

fn skipped_list(rejected: &[RejectedUpload]) -> String {
    if rejected.is_empty() {
        return String::new();
    }
    let mut html = String::from("  <h2>Skipped files</h2>\n  <ul class=\"skipped\">\n");
    for file in rejected {
        let _ = writeln!(
            html,
            "    <li><strong>{}</strong>: {}</li>",
            escape(&file.filename),
            escape(&file.reason.to_string())
        );
    }
    html.push_str("  </ul>\n");
    html
}

pub fn result_page(report: &BatchReport<ProcessingResult>) -> String {
    let mut body = format!(
        "  <p>Method: <strong>{}</strong></p>\n",
        escape(report.method.name())
    );
    for result in &report.results {
        body.push_str(&pair("Original", &result.original, "Processed", &result.processed));
    }
    body.push_str(&skipped_list(&report.rejected));
    layout("Results", &body)
}

pub fn threshold_result_page(report: &BatchReport<ThresholdResult>) -> String {
    let mut body = String::new();
    for result in &report.results {
        body.push_str(&pair(
            "Original",
            &result.original,
            "Thresholded",
            &result.thresholded,
        ));
    }
    body.push_str(&skipped_list(&report.rejected));
    layout("Threshold results", &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    layout(
        title,
        &format!(
            "  <p>{}</p>\n  <p><a href=\"/\">Back to the upload form</a></p>",
            escape(message)
        ),
    )
}
