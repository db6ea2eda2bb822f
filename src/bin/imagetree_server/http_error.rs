use super::*;

fn error_json(status: StatusCode, msg: &str) -> Response {
    (status, Json(serde_json::json!({"error": msg}))).into_response()
}

pub(super) fn internal_error(err: anyhow::Error) -> Response {
    tracing::error!("{:#}", err);
    error_json(StatusCode::INTERNAL_SERVER_ERROR, &format!("{:#}", err))
}

pub(super) fn bad_request(err: anyhow::Error) -> Response {
    error_json(StatusCode::BAD_REQUEST, &err.to_string())
}

pub(super) fn bad_request_msg(msg: &str) -> Response {
    error_json(StatusCode::BAD_REQUEST, msg)
}

pub(super) fn not_found(msg: &str) -> Response {
    error_json(StatusCode::NOT_FOUND, msg)
}

pub(super) fn conflict(msg: &str) -> Response {
    error_json(StatusCode::CONFLICT, msg)
}

pub(super) fn store_error(err: StoreError) -> Response {
    match err {
        StoreError::Tree(e) => bad_request_msg(&e.to_string()),
        e @ StoreError::VersionConflict { .. } => conflict(&e.to_string()),
        e => internal_error(anyhow::Error::new(e)),
    }
}

pub(super) fn generation_error(err: GenerationError) -> Response {
    internal_error(anyhow::Error::new(err))
}

#[cfg(test)]
#[path = "../../tests/bin/imagetree_server/http_error_tests.rs"]
mod tests;
