use super::*;

use imagetree::tree::TreeError;

#[test]
fn store_errors_map_to_client_and_server_statuses() {
    let dup = store_error(StoreError::Tree(TreeError::DuplicateNode("a.png".to_string())));
    assert_eq!(dup.status(), StatusCode::BAD_REQUEST);

    let stale = store_error(StoreError::VersionConflict {
        expected: "old".to_string(),
        current: "new".to_string(),
    });
    assert_eq!(stale.status(), StatusCode::CONFLICT);

    let save = store_error(StoreError::Save(anyhow::anyhow!("disk full")));
    assert_eq!(save.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn missing_api_key_is_a_server_error() {
    let resp = generation_error(GenerationError::MissingApiKey);
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn message_helpers_use_expected_statuses() {
    assert_eq!(bad_request_msg("x").status(), StatusCode::BAD_REQUEST);
    assert_eq!(not_found("x").status(), StatusCode::NOT_FOUND);
    assert_eq!(conflict("x").status(), StatusCode::CONFLICT);
}
