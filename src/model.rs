use serde::{Deserialize, Serialize};

/// Path prefix under which generated images are served.
pub const IMAGE_URL_PREFIX: &str = "/generated_images/";

pub fn image_url(id: &str) -> String {
    format!("{}{}", IMAGE_URL_PREFIX, id)
}

/// Operation that produced an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Original,
    Edit,
    Themify,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Original => "original",
            NodeKind::Edit => "edit",
            NodeKind::Themify => "themify",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(NodeKind::Original),
            "edit" => Ok(NodeKind::Edit),
            "themify" => Ok(NodeKind::Themify),
            other => Err(anyhow::anyhow!("unknown node type '{}'", other)),
        }
    }
}

/// Nested wire shape of a derivation tree node.
///
/// This is the shape stored in `tree.json` and exchanged over `/api/tree`.
/// `id` and `children` are required at every level; everything else has a
/// default so older or hand-edited documents still load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub id: String,

    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    pub children: Vec<ImageNode>,

    #[serde(rename = "type", default)]
    pub kind: NodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(default)]
    pub expanded: bool,
}

impl ImageNode {
    pub fn leaf(id: &str, parent_id: Option<&str>, kind: NodeKind, prompt: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            url: image_url(id),
            parent_id: parent_id.map(str::to_string),
            children: Vec::new(),
            kind,
            prompt: prompt.map(str::to_string),
            expanded: false,
        }
    }
}

/// Body of `GET /api/tree`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeResponse {
    pub tree: Vec<ImageNode>,

    #[serde(default)]
    pub version: String,
}

/// Body of `POST /api/tree`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeUpload {
    pub tree: Vec<ImageNode>,
}

/// Result of an image-producing operation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub success: bool,
    pub images: Vec<String>,
    pub count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_prompt: Option<String>,

    // Set when the images exist on disk but could not be recorded in the tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_error: Option<String>,
}

/// Body of `POST /api/chat`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub selected_image: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatAction {
    Chat,
    Generate,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,

    pub action: ChatAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewRootsRequest {
    pub images: Vec<String>,

    #[serde(rename = "type", default)]
    pub kind: NodeKind,

    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChildrenRequest {
    pub parent_id: String,
    pub images: Vec<String>,

    #[serde(rename = "type", default)]
    pub kind: NodeKind,

    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub id: String,
}

/// Outcome of a tree mutation request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    pub applied: bool,
    pub version: String,
}
