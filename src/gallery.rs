//! Generated-image directory: listing, naming rules, content types.

use std::path::Path;
use std::sync::LazyLock;
use std::time::SystemTime;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};

pub const IMAGES_DIR: &str = "generated_images";
pub const UPLOADS_DIR: &str = "uploads";

static IMAGE_GLOB: LazyLock<GlobMatcher> = LazyLock::new(|| {
    GlobBuilder::new("*.{png,jpg,jpeg,gif,webp}")
        .case_insensitive(true)
        .literal_separator(true)
        .build()
        .expect("image glob")
        .compile_matcher()
});

pub fn is_image_filename(name: &str) -> bool {
    IMAGE_GLOB.is_match(name)
}

/// Image filenames in `dir`, most recently modified first.
///
/// A missing directory is an empty gallery.
pub fn list_images(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut out: Vec<(String, SystemTime)> = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.context("read images dir entry")?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !is_image_filename(&name) {
            continue;
        }
        let meta = entry
            .metadata()
            .with_context(|| format!("stat {}", entry.path().display()))?;
        if !meta.is_file() {
            continue;
        }
        let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        out.push((name, mtime));
    }

    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(out.into_iter().map(|(name, _)| name).collect())
}

pub fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

/// Rejects names that could address anything outside the images directory.
pub fn validate_image_filename(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow::anyhow!("image name cannot be empty"));
    }
    if name == "." || name == ".." || name.contains("..") {
        return Err(anyhow::anyhow!("image name cannot contain '..'"));
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(anyhow::anyhow!("image name cannot contain path separators"));
    }
    Ok(())
}

/// Final path component of an uploaded file name, with anything unsafe replaced.
pub fn sanitize_upload_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload.png".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
#[path = "tests/gallery_tests.rs"]
mod tests;
