use std::path::PathBuf;

use tempfile::tempdir;

use super::*;

fn args_with_data_dir(data_dir: PathBuf) -> Args {
    Args {
        addr: "127.0.0.1:0".parse().expect("parse socket addr"),
        addr_file: None,
        data_dir,
        api_key: None,
        api_base_url: "http://127.0.0.1:9".to_string(),
        chat_model: "chat".to_string(),
        image_model: "image".to_string(),
        upstream_timeout_secs: 5,
        max_upload_mb: 1,
    }
}

#[tokio::test]
async fn build_state_bootstraps_tree_from_existing_images() {
    let temp = tempdir().expect("create temp dir");
    let images = temp.path().join(IMAGES_DIR);
    std::fs::create_dir_all(&images).expect("create images dir");
    for name in ["image_a_1.png", "image_a_2.png", "loose.png"] {
        std::fs::write(images.join(name), b"png").expect("write image");
    }

    let state = build_state(&args_with_data_dir(temp.path().to_path_buf())).expect("build state");

    let snapshot = state.tree.snapshot().await;
    let roots: Vec<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(roots, vec!["image_a_1.png", "loose.png"]);
    assert_eq!(snapshot.nodes[0].children.len(), 1);
    assert!(temp.path().join("tree.json").exists(), "tree should be persisted");
    assert!(temp.path().join(UPLOADS_DIR).is_dir());
    assert!(!state.generator.has_api_key());
}

#[tokio::test]
async fn build_state_prefers_persisted_tree_over_listing() {
    let temp = tempdir().expect("create temp dir");
    std::fs::write(temp.path().join("tree.json"), b"[]").expect("write tree");
    let images = temp.path().join(IMAGES_DIR);
    std::fs::create_dir_all(&images).expect("create images dir");
    std::fs::write(images.join("x_1.png"), b"png").expect("write image");

    let state = build_state(&args_with_data_dir(temp.path().to_path_buf())).expect("build state");

    assert!(state.tree.snapshot().await.nodes.is_empty());
}

#[test]
fn build_state_rejects_unreadable_tree_file() {
    let temp = tempdir().expect("create temp dir");
    std::fs::write(temp.path().join("tree.json"), b"{not json").expect("write tree");

    let err = build_state(&args_with_data_dir(temp.path().to_path_buf()))
        .err()
        .expect("corrupt tree should fail startup");
    assert!(format!("{:#}", err).contains("open tree store"));
}
