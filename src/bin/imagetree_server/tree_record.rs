use super::*;

// Recording failures never fail the request: the images already exist on disk,
// so the caller reports them and attaches the message as `treeError`.

pub(super) async fn record_roots(
    state: &AppState,
    images: &[String],
    kind: NodeKind,
    prompt: &str,
) -> Option<String> {
    if images.is_empty() {
        return None;
    }
    match state.tree.add_new_roots(images, kind, Some(prompt)).await {
        Ok(_) => None,
        Err(err) => {
            tracing::warn!("could not record {} new roots: {}", images.len(), err);
            Some(err.to_string())
        }
    }
}

pub(super) async fn record_children(
    state: &AppState,
    parent_id: &str,
    images: &[String],
    kind: NodeKind,
    prompt: &str,
) -> Option<String> {
    if images.is_empty() {
        return None;
    }
    match state
        .tree
        .add_children(parent_id, images, kind, Some(prompt))
        .await
    {
        Ok(m) if m.applied => None,
        Ok(_) => {
            // Gallery image with no node yet: it becomes a root of its own batch.
            tracing::info!(parent = %parent_id, "parent not in tree; recording results as roots");
            record_roots(state, images, kind, prompt).await
        }
        Err(err) => {
            tracing::warn!(parent = %parent_id, "could not record children: {}", err);
            Some(err.to_string())
        }
    }
}
