use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use crate::model::{ImageNode, NodeKind};
use crate::tree::{Forest, TreeError, build_from_filenames};

pub const TREE_FILE: &str = "tree.json";

/// Durable home of the whole forest. Reads and writes are always full documents.
pub trait TreePersistence: Send + Sync {
    /// Returns `None` when no document has been written yet.
    fn load(&self) -> Result<Option<Vec<ImageNode>>>;

    fn save(&self, nodes: &[ImageNode]) -> Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("tree version conflict (expected {expected}, current {current})")]
    VersionConflict { expected: String, current: String },

    #[error("encode tree: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("load tree: {0:#}")]
    Load(anyhow::Error),

    #[error("save tree: {0:#}")]
    Save(anyhow::Error),
}

/// Content hash of a document, used as an optimistic-concurrency token.
pub fn document_version(nodes: &[ImageNode]) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(nodes)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

#[derive(Clone, Debug)]
pub struct TreeSnapshot {
    pub nodes: Vec<ImageNode>,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
    pub applied: bool,
    pub version: String,
}

struct StoreState {
    forest: Forest,
    version: String,
}

/// Authoritative derivation forest for the process.
///
/// All mutations are serialized: the change is applied to a copy, the copy is
/// saved through the persistence port, and only then does it become current.
/// A failed save leaves the in-memory forest as it was.
pub struct TreeStore {
    persistence: Arc<dyn TreePersistence>,
    state: Mutex<StoreState>,
}

impl TreeStore {
    /// Loads the persisted document, or builds one from `listing` and saves it
    /// when nothing has been persisted yet.
    pub fn open(
        persistence: Arc<dyn TreePersistence>,
        listing: impl FnOnce() -> Vec<String>,
    ) -> Result<Self, StoreError> {
        let forest = match persistence.load().map_err(StoreError::Load)? {
            Some(nodes) => Forest::from_nodes(nodes)?,
            None => {
                let images = listing();
                let forest = build_from_filenames(&images);
                tracing::info!(
                    images = images.len(),
                    roots = forest.roots().len(),
                    "no persisted tree; built one from the image listing"
                );
                persistence
                    .save(&forest.to_nodes())
                    .map_err(StoreError::Save)?;
                forest
            }
        };
        let version = document_version(&forest.to_nodes())?;

        Ok(Self {
            persistence,
            state: Mutex::new(StoreState { forest, version }),
        })
    }

    pub async fn snapshot(&self) -> TreeSnapshot {
        let state = self.state.lock().await;
        TreeSnapshot {
            nodes: state.forest.to_nodes(),
            version: state.version.clone(),
        }
    }

    pub async fn add_new_roots(
        &self,
        images: &[String],
        kind: NodeKind,
        prompt: Option<&str>,
    ) -> Result<Mutation, StoreError> {
        self.commit(|forest| Ok(forest.add_new_roots(images, kind, prompt)?.is_some()))
            .await
    }

    pub async fn add_children(
        &self,
        parent_id: &str,
        images: &[String],
        kind: NodeKind,
        prompt: Option<&str>,
    ) -> Result<Mutation, StoreError> {
        self.commit(|forest| forest.add_children(parent_id, images, kind, prompt))
            .await
    }

    pub async fn toggle_expanded(&self, id: &str) -> Result<Mutation, StoreError> {
        self.commit(|forest| Ok(forest.toggle_expanded(id))).await
    }

    /// Overwrites the whole forest.
    ///
    /// With `expected_version`, the write only happens if nobody else has
    /// changed the forest since that version was read.
    pub async fn replace(
        &self,
        nodes: Vec<ImageNode>,
        expected_version: Option<&str>,
    ) -> Result<String, StoreError> {
        let forest = Forest::from_nodes(nodes)?;

        let mut state = self.state.lock().await;
        if let Some(expected) = expected_version
            && expected != state.version
        {
            return Err(StoreError::VersionConflict {
                expected: expected.to_string(),
                current: state.version.clone(),
            });
        }

        let version = self.persist(&forest).await?;
        state.forest = forest;
        state.version = version.clone();
        Ok(version)
    }

    async fn commit(
        &self,
        apply: impl FnOnce(&mut Forest) -> Result<bool, TreeError>,
    ) -> Result<Mutation, StoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.forest.clone();
        if !apply(&mut next)? {
            return Ok(Mutation {
                applied: false,
                version: state.version.clone(),
            });
        }

        let version = self.persist(&next).await?;
        state.forest = next;
        state.version = version.clone();
        Ok(Mutation {
            applied: true,
            version,
        })
    }

    /// Saves on the blocking pool so file I/O never runs on a runtime worker.
    async fn persist(&self, forest: &Forest) -> Result<String, StoreError> {
        let nodes = forest.to_nodes();
        let version = document_version(&nodes)?;
        let persistence = Arc::clone(&self.persistence);
        let saved = tokio::task::spawn_blocking(move || persistence.save(&nodes))
            .await
            .map_err(|e| StoreError::Save(anyhow::anyhow!("tree save task: {}", e)))?;
        if let Err(err) = saved {
            tracing::error!("tree save failed, keeping previous tree: {:#}", err);
            return Err(StoreError::Save(err));
        }
        Ok(version)
    }
}

/// `tree.json` on disk, stored as a bare pretty-printed `ImageNode[]` array.
#[derive(Clone, Debug)]
pub struct FileTreePersistence {
    path: PathBuf,
}

impl FileTreePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(TREE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TreePersistence for FileTreePersistence {
    fn load(&self) -> Result<Option<Vec<ImageNode>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes =
            fs::read(&self.path).with_context(|| format!("read {}", self.path.display()))?;
        let nodes = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse {}", self.path.display()))?;
        Ok(Some(nodes))
    }

    fn save(&self, nodes: &[ImageNode]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(nodes).context("serialize tree")?;
        write_atomic(&self.path, &bytes).with_context(|| format!("write {}", TREE_FILE))
    }
}

/// In-process document with switchable write failures.
#[derive(Debug, Default)]
pub struct MemoryTreePersistence {
    doc: std::sync::Mutex<Option<Vec<ImageNode>>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryTreePersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(nodes: Vec<ImageNode>) -> Self {
        Self {
            doc: std::sync::Mutex::new(Some(nodes)),
            ..Self::default()
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn document(&self) -> Option<Vec<ImageNode>> {
        self.doc.lock().ok().and_then(|d| d.clone())
    }
}

impl TreePersistence for MemoryTreePersistence {
    fn load(&self) -> Result<Option<Vec<ImageNode>>> {
        let doc = self
            .doc
            .lock()
            .map_err(|_| anyhow::anyhow!("tree document lock poisoned"))?;
        Ok(doc.clone())
    }

    fn save(&self, nodes: &[ImageNode]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("simulated write failure");
        }
        let mut doc = self
            .doc
            .lock()
            .map_err(|_| anyhow::anyhow!("tree document lock poisoned"))?;
        *doc = Some(nodes.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create parent directories")?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes).with_context(|| format!("write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
