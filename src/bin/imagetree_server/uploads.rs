use std::collections::HashMap;

use super::*;

#[derive(Debug)]
pub(super) struct UploadedFile {
    pub(super) file_name: String,
    pub(super) bytes: axum::body::Bytes,
}

/// Non-empty parts of a multipart body, keyed by field name.
#[derive(Debug, Default)]
pub(super) struct FormParts {
    pub(super) texts: HashMap<String, String>,
    pub(super) files: HashMap<String, UploadedFile>,
}

impl FormParts {
    pub(super) fn text(&self, name: &str) -> Option<&str> {
        non_blank(self.texts.get(name).map(String::as_str))
    }
}

pub(super) async fn read_form(mut multipart: Multipart) -> Result<FormParts, Response> {
    let mut parts = FormParts::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(anyhow::anyhow!("invalid multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(anyhow::anyhow!("read field {}: {}", name, e)))?;
        if bytes.is_empty() {
            continue;
        }
        match file_name {
            Some(file_name) => {
                parts.files.insert(name, UploadedFile { file_name, bytes });
            }
            None => {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|_| bad_request_msg(&format!("field {} is not UTF-8", name)))?;
                parts.texts.insert(name, text);
            }
        }
    }
    Ok(parts)
}

/// An operation's input image. `selected` is set only for gallery images, which
/// are the ones that have a node to hang results under.
#[derive(Debug)]
pub(super) struct ImageInput {
    pub(super) path: PathBuf,
    pub(super) selected: Option<String>,
}

pub(super) struct SourceFields<'a> {
    pub(super) file: &'a str,
    pub(super) selected: &'a str,
    pub(super) missing: &'a str,
    pub(super) not_found: &'a str,
}

/// Picks the uploaded file when one was sent, otherwise the gallery selection.
pub(super) fn resolve_source(
    state: &AppState,
    form: &FormParts,
    fields: SourceFields<'_>,
) -> Result<ImageInput, Response> {
    if let Some(upload) = form.files.get(fields.file) {
        let path = save_upload(&state.uploads_dir, &upload.file_name, &upload.bytes)
            .map_err(internal_error)?;
        return Ok(ImageInput {
            path,
            selected: None,
        });
    }
    match form.text(fields.selected) {
        Some(name) => {
            let path = selected_image_path(state, name, fields.not_found)?;
            Ok(ImageInput {
                path,
                selected: Some(name.to_string()),
            })
        }
        None => Err(bad_request_msg(fields.missing)),
    }
}

/// Stores an upload as `<stamp>_<name>` under `uploads_dir`.
pub(super) fn save_upload(uploads_dir: &std::path::Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(uploads_dir)
        .with_context(|| format!("create {}", uploads_dir.display()))?;
    let stamp = imagetree::imagegen::batch_stamp()?;
    let name = format!("{}_{}", stamp, gallery::sanitize_upload_name(file_name));
    let path = uploads_dir.join(&name);
    std::fs::write(&path, bytes).with_context(|| format!("write upload {}", path.display()))?;
    tracing::info!(upload = %name, bytes = bytes.len(), "saved upload");
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/bin/imagetree_server/uploads_tests.rs"]
mod tests;
