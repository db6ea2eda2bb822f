use super::*;

fn etag(version: &str) -> String {
    format!("\"{}\"", version)
}

/// `If-Match` value with optional quotes and weak prefix removed.
pub(super) fn if_match_version(headers: &HeaderMap) -> Result<Option<String>, Response> {
    let Some(raw) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    let raw = raw
        .to_str()
        .map_err(|_| bad_request_msg("If-Match header is not valid text"))?
        .trim();
    if raw == "*" {
        return Ok(None);
    }
    let raw = raw.strip_prefix("W/").unwrap_or(raw);
    Ok(Some(raw.trim_matches('"').to_string()))
}

pub(super) async fn get_tree(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.tree.snapshot().await;
    let tag = etag(&snapshot.version);
    (
        [(header::ETAG, tag)],
        Json(TreeResponse {
            tree: snapshot.nodes,
            version: snapshot.version,
        }),
    )
        .into_response()
}

pub(super) async fn post_tree(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<serde_json::Value>, Response> {
    let upload: TreeUpload = match serde_json::from_slice(&body) {
        Ok(upload) => upload,
        Err(err) => {
            tracing::warn!("rejected tree document: {}", err);
            return Err(bad_request_msg("Invalid tree structure"));
        }
    };
    let expected = if_match_version(&headers)?;

    let version = state
        .tree
        .replace(upload.tree, expected.as_deref())
        .await
        .map_err(|err| match err {
            StoreError::Tree(e) => {
                tracing::warn!("rejected tree document: {}", e);
                bad_request_msg(&format!("Invalid tree structure: {}", e))
            }
            other => store_error(other),
        })?;

    Ok(Json(serde_json::json!({"success": true, "version": version})))
}

pub(super) async fn post_roots(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewRootsRequest>,
) -> Result<Json<MutationResponse>, Response> {
    let m = state
        .tree
        .add_new_roots(&req.images, req.kind, req.prompt.as_deref())
        .await
        .map_err(store_error)?;
    Ok(Json(MutationResponse {
        applied: m.applied,
        version: m.version,
    }))
}

pub(super) async fn post_children(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewChildrenRequest>,
) -> Result<Json<MutationResponse>, Response> {
    let m = state
        .tree
        .add_children(&req.parent_id, &req.images, req.kind, req.prompt.as_deref())
        .await
        .map_err(store_error)?;
    Ok(Json(MutationResponse {
        applied: m.applied,
        version: m.version,
    }))
}

pub(super) async fn post_toggle(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<MutationResponse>, Response> {
    let m = state
        .tree
        .toggle_expanded(&req.id)
        .await
        .map_err(store_error)?;
    Ok(Json(MutationResponse {
        applied: m.applied,
        version: m.version,
    }))
}

#[cfg(test)]
#[path = "../../tests/bin/imagetree_server/handlers_tree_tests.rs"]
mod tests;
