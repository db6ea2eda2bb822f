use tempfile::tempdir;

use super::*;

use imagetree::imagegen::GeneratorConfig;
use imagetree::store::MemoryTreePersistence;

fn state_in(dir: &std::path::Path) -> AppState {
    let images_dir = dir.join("generated_images");
    std::fs::create_dir_all(&images_dir).expect("create images dir");
    let tree = TreeStore::open(Arc::new(MemoryTreePersistence::new()), Vec::new)
        .expect("open tree store");
    let generator = Generator::new(GeneratorConfig::new(images_dir.clone())).expect("generator");
    AppState {
        images_dir,
        uploads_dir: dir.join("uploads"),
        tree: Arc::new(tree),
        generator: Arc::new(generator),
    }
}

#[test]
fn non_blank_trims_and_drops_empty_values() {
    assert_eq!(non_blank(Some("  cat  ")), Some("cat"));
    assert_eq!(non_blank(Some("   ")), None);
    assert_eq!(non_blank(None), None);
}

#[test]
fn selected_image_path_requires_an_existing_gallery_file() {
    let temp = tempdir().expect("create temp dir");
    let state = state_in(temp.path());
    std::fs::write(state.images_dir.join("a.png"), b"png").expect("write image");

    let path = selected_image_path(&state, "a.png", "missing").expect("existing image");
    assert_eq!(path, state.images_dir.join("a.png"));

    let resp = selected_image_path(&state, "b.png", "missing").expect_err("absent image");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn selected_image_path_rejects_traversal() {
    let temp = tempdir().expect("create temp dir");
    let state = state_in(temp.path());
    std::fs::write(temp.path().join("secret.png"), b"png").expect("write file");

    let resp = selected_image_path(&state, "../secret.png", "missing").expect_err("traversal");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
