use super::*;

pub(super) fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/tree", get(get_tree).post(post_tree))
        .route("/api/tree/roots", post(post_roots))
        .route("/api/tree/children", post(post_children))
        .route("/api/tree/toggle", post(post_toggle))
        .route("/api/images-list", get(images_list))
        .route("/api/images/:filename", get(get_image))
        // Node urls point here.
        .route("/generated_images/:filename", get(get_image))
        .route("/api/generate", post(generate))
        .route("/api/edit", post(edit))
        .route("/api/themify", post(themify))
        .route("/api/merge", post(merge))
        .route("/api/chat", post(chat))
        .with_state(state)
}
