use tempfile::tempdir;

use super::*;

#[test]
fn save_upload_prefixes_stamp_and_keeps_only_the_file_name() {
    let temp = tempdir().expect("create temp dir");
    let uploads = temp.path().join("uploads");

    let path = save_upload(&uploads, "../../etc/photo.png", b"bytes").expect("save upload");

    assert_eq!(path.parent(), Some(uploads.as_path()));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .expect("utf-8 name");
    assert!(name.ends_with("_photo.png"), "unexpected name {}", name);
    assert_eq!(std::fs::read(&path).expect("read upload"), b"bytes");
}

#[test]
fn form_text_ignores_blank_fields() {
    let mut form = FormParts::default();
    form.texts.insert("preset".to_string(), "blur".to_string());
    form.texts.insert("custom_prompt".to_string(), "  ".to_string());

    assert_eq!(form.text("preset"), Some("blur"));
    assert_eq!(form.text("custom_prompt"), None);
    assert_eq!(form.text("selected_image"), None);
}
