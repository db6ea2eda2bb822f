use super::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) images_dir: PathBuf,
    pub(crate) uploads_dir: PathBuf,

    // Single owner of the derivation tree; every mutation goes through it.
    pub(crate) tree: Arc<TreeStore>,

    pub(crate) generator: Arc<Generator>,
}

impl AppState {
    pub(crate) fn image_path(&self, name: &str) -> PathBuf {
        self.images_dir.join(name)
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct GenerateRequest {
    #[serde(default)]
    pub(crate) prompt: Option<String>,
}
