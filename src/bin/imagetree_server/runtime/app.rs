use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;

use imagetree::gallery::{self, IMAGES_DIR, UPLOADS_DIR};
use imagetree::imagegen::{Generator, GeneratorConfig};
use imagetree::store::{FileTreePersistence, TreeStore};

use super::super::routes::build_router;
use super::super::types::AppState;
use super::Args;

pub(super) fn build_state(args: &Args) -> Result<Arc<AppState>> {
    let images_dir = args.data_dir.join(IMAGES_DIR);
    let uploads_dir = args.data_dir.join(UPLOADS_DIR);
    for dir in [&images_dir, &uploads_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }

    let persistence = Arc::new(FileTreePersistence::in_dir(&args.data_dir));
    let listing_dir = images_dir.clone();
    let tree = TreeStore::open(persistence, move || {
        gallery::list_images(&listing_dir).unwrap_or_else(|err| {
            tracing::warn!("could not list images, starting with an empty tree: {:#}", err);
            Vec::new()
        })
    })
    .context("open tree store")?;

    let mut config = GeneratorConfig::new(images_dir.clone());
    config.base_url = args.api_base_url.clone();
    config.api_key = args.api_key.clone();
    config.chat_model = args.chat_model.clone();
    config.image_model = args.image_model.clone();
    config.timeout = Duration::from_secs(args.upstream_timeout_secs);
    let generator = Generator::new(config)?;
    if !generator.has_api_key() {
        tracing::warn!("no upstream API key configured; generation requests will fail");
    }

    Ok(Arc::new(AppState {
        images_dir,
        uploads_dir,
        tree: Arc::new(tree),
        generator: Arc::new(generator),
    }))
}

pub(super) fn build_app_router(state: Arc<AppState>, max_upload_mb: usize) -> Router {
    build_router(state).layer(DefaultBodyLimit::max(max_upload_mb * 1024 * 1024))
}

#[cfg(test)]
#[path = "../../../tests/bin/imagetree_server/runtime/app_tests.rs"]
mod tests;
