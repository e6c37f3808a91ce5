//! Reading study documents from disk.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

/// Extensions accepted as plain-text study material.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text"];

/// Read a document and derive its display name.
///
/// Returns `(content, file_name)`. Only UTF-8 text formats are handled;
/// anything else (PDF included) needs converting to text first.
pub fn read_document(path: &Path) -> Result<(String, String)> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match extension.as_deref() {
        Some(ext) if TEXT_EXTENSIONS.contains(&ext) => {}
        Some(ext) => bail!(
            "Unsupported file type '.{}'. Convert the document to plain text first.",
            ext
        ),
        None => bail!(
            "Cannot tell the file type of {}. Use a .txt or .md file.",
            path.display()
        ),
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown file")
        .to_string();

    Ok((content, file_name))
}
