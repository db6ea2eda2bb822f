//! Image derivation forest.
//!
//! Nodes live in an arena keyed by id; parent and child links are ids into the
//! same arena, so lookups and edits never rebuild ancestor chains. The nested
//! [`ImageNode`] shape is only produced at the edges (persistence and HTTP).

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ImageNode, NodeKind, image_url};

static BATCH_MEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+)_(\d+)\.(png|jpg)$").expect("batch member pattern"));

static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\.(png|jpg)$").expect("trailing number pattern"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("image node '{0}' already exists")]
    DuplicateNode(String),

    #[error("image node id cannot be empty")]
    EmptyId,
}

/// Trailing batch number of a generated filename (`image_..._3.png` -> 3), or 0.
pub fn file_number(filename: &str) -> u64 {
    TRAILING_NUMBER
        .captures(filename)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Root ordering: case-insensitive by id, ties broken by raw bytes.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Splits `<base>_<N>.<ext>` into `(base, N)`.
pub fn batch_member(filename: &str) -> Option<(&str, u64)> {
    let caps = BATCH_MEMBER.captures(filename)?;
    let base = caps.get(1)?.as_str();
    let num = caps.get(2)?.as_str().parse().ok()?;
    Some((base, num))
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct NodeRecord {
    url: String,
    parent_id: Option<String>,
    children: Vec<String>,
    kind: NodeKind,
    prompt: Option<String>,
    expanded: bool,
}

impl NodeRecord {
    fn new(id: &str, parent_id: Option<&str>, kind: NodeKind, prompt: Option<&str>) -> Self {
        Self {
            url: image_url(id),
            parent_id: parent_id.map(str::to_string),
            children: Vec::new(),
            kind,
            prompt: prompt.map(str::to_string),
            expanded: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Forest {
    nodes: HashMap<String, NodeRecord>,
    roots: Vec<String>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn children_of(&self, id: &str) -> Option<&[String]> {
        self.nodes.get(id).map(|n| n.children.as_slice())
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.parent_id.as_deref())
    }

    pub fn is_expanded(&self, id: &str) -> Option<bool> {
        self.nodes.get(id).map(|n| n.expanded)
    }

    pub fn kind_of(&self, id: &str) -> Option<NodeKind> {
        self.nodes.get(id).map(|n| n.kind)
    }

    pub fn prompt_of(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.prompt.as_deref())
    }

    /// Node ids in display order (roots in order, each followed by its subtree).
    pub fn ids(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&String> = self.roots.iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id.clone());
            if let Some(n) = self.nodes.get(id) {
                stack.extend(n.children.iter().rev());
            }
        }
        out
    }

    /// Builds a forest from a nested document.
    ///
    /// Parent links are taken from the nesting, not from the `parentId` fields.
    /// Empty `url` fields are filled from the id.
    pub fn from_nodes(nodes: Vec<ImageNode>) -> Result<Self, TreeError> {
        let mut forest = Forest::new();
        let mut stack: Vec<(Option<String>, ImageNode)> =
            nodes.into_iter().rev().map(|n| (None, n)).collect();

        while let Some((parent, node)) = stack.pop() {
            if node.id.is_empty() {
                return Err(TreeError::EmptyId);
            }
            if forest.nodes.contains_key(&node.id) {
                return Err(TreeError::DuplicateNode(node.id));
            }

            let url = if node.url.is_empty() {
                image_url(&node.id)
            } else {
                node.url
            };
            let record = NodeRecord {
                url,
                parent_id: parent.clone(),
                children: node.children.iter().map(|c| c.id.clone()).collect(),
                kind: node.kind,
                prompt: node.prompt,
                expanded: node.expanded,
            };

            if parent.is_none() {
                forest.roots.push(node.id.clone());
            }
            for child in node.children.into_iter().rev() {
                stack.push((Some(node.id.clone()), child));
            }
            forest.nodes.insert(node.id, record);
        }

        Ok(forest)
    }

    pub fn to_nodes(&self) -> Vec<ImageNode> {
        self.roots.iter().filter_map(|id| self.nested(id)).collect()
    }

    fn nested(&self, id: &str) -> Option<ImageNode> {
        let n = self.nodes.get(id)?;
        Some(ImageNode {
            id: id.to_string(),
            url: n.url.clone(),
            parent_id: n.parent_id.clone(),
            children: n.children.iter().filter_map(|c| self.nested(c)).collect(),
            kind: n.kind,
            prompt: n.prompt.clone(),
            expanded: n.expanded,
        })
    }

    fn check_new_ids(&self, images: &[String]) -> Result<(), TreeError> {
        let mut seen = HashSet::new();
        for id in images {
            if id.is_empty() {
                return Err(TreeError::EmptyId);
            }
            if self.nodes.contains_key(id) || !seen.insert(id.as_str()) {
                return Err(TreeError::DuplicateNode(id.clone()));
            }
        }
        Ok(())
    }

    /// Records a freshly generated batch as a new root with the rest of the
    /// batch as its children.
    ///
    /// The lowest-numbered file becomes the (expanded) root. Returns the root id,
    /// or `None` for an empty batch.
    pub fn add_new_roots(
        &mut self,
        images: &[String],
        kind: NodeKind,
        prompt: Option<&str>,
    ) -> Result<Option<String>, TreeError> {
        self.check_new_ids(images)?;

        let mut sorted: Vec<&String> = images.iter().collect();
        sorted.sort_by_key(|f| file_number(f));
        let Some((root_id, rest)) = sorted.split_first() else {
            return Ok(None);
        };
        let root_id = (*root_id).clone();

        let mut root = NodeRecord::new(&root_id, None, kind, prompt);
        root.expanded = true;
        for id in rest {
            self.nodes.insert(
                (*id).clone(),
                NodeRecord::new(id, Some(root_id.as_str()), kind, prompt),
            );
            root.children.push((*id).clone());
        }
        self.nodes.insert(root_id.clone(), root);

        self.roots.push(root_id.clone());
        self.roots.sort_by(|a, b| compare_ids(a, b));
        Ok(Some(root_id))
    }

    /// Appends `images` as children of `parent_id` and expands the parent.
    ///
    /// Returns `Ok(false)` and leaves the forest untouched when the parent does
    /// not exist.
    pub fn add_children(
        &mut self,
        parent_id: &str,
        images: &[String],
        kind: NodeKind,
        prompt: Option<&str>,
    ) -> Result<bool, TreeError> {
        if !self.nodes.contains_key(parent_id) {
            return Ok(false);
        }
        self.check_new_ids(images)?;

        for id in images {
            self.nodes.insert(
                id.clone(),
                NodeRecord::new(id, Some(parent_id), kind, prompt),
            );
        }
        let Some(parent) = self.nodes.get_mut(parent_id) else {
            return Ok(false);
        };
        parent.children.extend(images.iter().cloned());
        parent.expanded = true;
        Ok(true)
    }

    /// Flips the `expanded` flag. Returns `false` when no such node exists.
    pub fn toggle_expanded(&mut self, id: &str) -> bool {
        match self.nodes.get_mut(id) {
            Some(n) => {
                n.expanded = !n.expanded;
                true
            }
            None => false,
        }
    }
}

enum GroupKey<'a> {
    Batch(&'a str),
    Single(&'a str),
}

/// Reconstructs a best-effort forest from a flat listing of filenames.
///
/// Files named `<base>_<N>.<ext>` that share a base are treated as one
/// generation batch: the lowest `N` becomes the root and the others its
/// children in ascending `N`. Anything else becomes a childless root.
pub fn build_from_filenames<S: AsRef<str>>(filenames: &[S]) -> Forest {
    let mut order: Vec<GroupKey<'_>> = Vec::new();
    let mut groups: HashMap<&str, Vec<(&str, u64)>> = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for f in filenames {
        let f = f.as_ref();
        if !seen.insert(f) {
            continue;
        }
        match batch_member(f) {
            Some((base, num)) => {
                let members = groups.entry(base).or_insert_with(|| {
                    order.push(GroupKey::Batch(base));
                    Vec::new()
                });
                members.push((f, num));
            }
            None => order.push(GroupKey::Single(f)),
        }
    }

    let mut forest = Forest::new();
    for key in order {
        match key {
            GroupKey::Single(id) => {
                forest
                    .nodes
                    .insert(id.to_string(), NodeRecord::new(id, None, NodeKind::Original, None));
                forest.roots.push(id.to_string());
            }
            GroupKey::Batch(base) => {
                let Some(mut members) = groups.remove(base) else {
                    continue;
                };
                members.sort_by(|(a, na), (b, nb)| na.cmp(nb).then_with(|| a.cmp(b)));
                let Some(((root_id, _), rest)) = members.split_first() else {
                    continue;
                };
                let root_id: &str = root_id;

                let mut root = NodeRecord::new(root_id, None, NodeKind::Original, None);
                root.expanded = !rest.is_empty();
                for (id, _) in rest {
                    forest.nodes.insert(
                        id.to_string(),
                        NodeRecord::new(id, Some(root_id), NodeKind::Original, None),
                    );
                    root.children.push(id.to_string());
                }
                forest.nodes.insert(root_id.to_string(), root);
                forest.roots.push(root_id.to_string());
            }
        }
    }

    forest.roots.sort_by(|a, b| compare_ids(a, b));
    forest
}

/// Indented text rendering of a nested document, one node per line.
///
/// Collapsed nodes are marked `+` and their subtrees are hidden unless
/// `show_collapsed` is set; expanded nodes with children are marked `-`.
pub fn outline(nodes: &[ImageNode], show_collapsed: bool) -> String {
    let mut out = String::new();
    let mut stack: Vec<(&ImageNode, usize)> = nodes.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        let marker = match (node.children.is_empty(), node.expanded) {
            (true, _) => ' ',
            (false, true) => '-',
            (false, false) => '+',
        };
        out.push_str(&"  ".repeat(depth));
        out.push(marker);
        out.push(' ');
        out.push_str(&node.id);
        if node.kind != NodeKind::Original {
            out.push_str(&format!(" [{}]", node.kind));
        }
        if let Some(prompt) = node.prompt.as_deref().filter(|p| !p.is_empty()) {
            out.push_str(&format!(" {:?}", prompt));
        }
        out.push('\n');
        if node.expanded || show_collapsed {
            stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tests;
