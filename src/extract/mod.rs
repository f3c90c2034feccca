//! Document loading.
//!
//! Knows how to turn a file on disk into one `String` of text: plain text is
//! decoded as-is, PDFs go through [`pdf::extract_pdf_text`]. Anything else is
//! reported as unsupported so the caller can leave its state untouched.

mod pdf;

pub use pdf::{TextItem, extract_pdf_text, group_lines};

use crate::cancellation::CancellationToken;
use crate::document::Document;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;

const PDF_MAGIC: &[u8] = b"%PDF-";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    PlainText,
    Pdf,
}

impl SourceKind {
    /// Classify a file by extension, falling back to the PDF header.
    pub fn detect(path: &Path, bytes: &[u8]) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("txt" | "text") => Some(SourceKind::PlainText),
            Some("pdf") => Some(SourceKind::Pdf),
            _ if bytes.starts_with(PDF_MAGIC) => Some(SourceKind::Pdf),
            _ => None,
        }
    }
}

/// Decode plain text verbatim (lossy UTF-8, BOM stripped, NFC).
pub fn extract_plain_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).nfc().collect()
}

/// Read and extract `path`. `Ok(None)` means the file type is not supported.
pub fn load_document(path: &Path, cancel: Option<&CancellationToken>) -> Result<Option<Document>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if let Some(cancel) = cancel {
        cancel.check_cancelled("read")?;
    }

    let Some(kind) = SourceKind::detect(path, &bytes) else {
        warn!(path = %path.display(), "Unsupported file type; ignoring");
        return Ok(None);
    };

    info!(path = %path.display(), ?kind, bytes = bytes.len(), "Extracting document text");
    let text = match kind {
        SourceKind::PlainText => extract_plain_text(&bytes),
        SourceKind::Pdf => extract_pdf_text(&bytes, cancel)
            .with_context(|| format!("Failed to extract text from {}", path.display()))?,
    };

    let title = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document")
        .to_string();
    info!(
        title = %title,
        total_chars = text.len(),
        "Finished loading document"
    );
    Ok(Some(Document::new(title, text)))
}
