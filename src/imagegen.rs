//! Client for the upstream chat/image completion API.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use base64::Engine;
use futures::future::join_all;

pub const DEFAULT_API_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_CHAT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_IMAGE_MODEL: &str = "google/gemini-2.5-flash-image-preview";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("OPENROUTER_API_KEY not found")]
    MissingApiKey,

    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream response contained no image")]
    NoImage,

    #[error("decode image data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("read input image {path}: {source}")]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("write image {path}: {source}")]
    WriteImage {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("batch stamp: {0}")]
    Stamp(String),
}

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub image_model: String,
    pub timeout: Duration,
    pub images_dir: PathBuf,
}

impl GeneratorConfig {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: Duration::from_secs(120),
            images_dir: images_dir.into(),
        }
    }
}

/// Files written by one fan-out. Fewer files than prompts means some calls failed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationBatch {
    pub files: Vec<String>,
}

impl GenerationBatch {
    pub fn count(&self) -> usize {
        self.files.len()
    }
}

#[derive(Debug, serde::Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, serde::Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, serde::Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<serde_json::Value>,

    #[serde(default)]
    images: Vec<ImagePart>,
}

#[derive(Debug, serde::Deserialize)]
struct ImagePart {
    #[serde(default)]
    image_url: Option<ImageUrl>,
}

#[derive(Debug, serde::Deserialize)]
struct ImageUrl {
    url: String,
}

impl Completion {
    fn text(&self) -> String {
        match self.choices.first().and_then(|c| c.message.content.as_ref()) {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }

    fn first_image_base64(&self) -> Option<&str> {
        let message = &self.choices.first()?.message;
        message
            .images
            .iter()
            .filter_map(|i| i.image_url.as_ref())
            .filter(|u| u.url.starts_with("data:image"))
            .find_map(|u| u.url.split_once("base64,").map(|(_, data)| data))
    }
}

pub struct Generator {
    client: reqwest::Client,
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("imagetree")
            .timeout(config.timeout)
            .build()
            .context("build reqwest client")?;
        Ok(Self { client, config })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_ok()
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(GenerationError::MissingApiKey)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn complete(&self, body: serde_json::Value) -> Result<Completion, GenerationError> {
        let key = self.api_key()?;
        let resp = self
            .client
            .post(self.url("/chat/completions"))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json::<Completion>().await?)
    }

    /// One text completion with the chat model; empty when the model returns no text.
    pub async fn complete_text(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let completion = self
            .complete(serde_json::json!({
                "model": self.config.chat_model,
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": user},
                ],
            }))
            .await?;
        Ok(completion.text())
    }

    /// Runs one image request per prompt concurrently and saves whatever comes back.
    ///
    /// Every input image is attached to every request, in order. Output files
    /// are named `image_<stamp>_<N>.png` with `N` the 1-based prompt position.
    /// A failed call is logged and skipped; only a missing key or an unreadable
    /// input image fails the whole batch.
    pub async fn generate_batch(
        &self,
        prompts: &[String],
        inputs: &[PathBuf],
    ) -> Result<GenerationBatch, GenerationError> {
        self.api_key()?;
        let mut encoded = Vec::with_capacity(inputs.len());
        for path in inputs {
            let bytes = std::fs::read(path).map_err(|source| GenerationError::ReadInput {
                path: path.clone(),
                source,
            })?;
            encoded.push(base64::engine::general_purpose::STANDARD.encode(bytes));
        }
        let stamp = batch_stamp()?;

        let calls = prompts
            .iter()
            .enumerate()
            .map(|(i, prompt)| self.generate_one(prompt, &stamp, i + 1, &encoded));
        let results = join_all(calls).await;

        let mut files = Vec::new();
        for (i, r) in results.into_iter().enumerate() {
            match r {
                Ok(name) => files.push(name),
                Err(err) => tracing::warn!("image {} of batch {} failed: {}", i + 1, stamp, err),
            }
        }
        tracing::info!(
            batch = %stamp,
            requested = prompts.len(),
            produced = files.len(),
            "generation batch finished"
        );
        Ok(GenerationBatch { files })
    }

    async fn generate_one(
        &self,
        prompt: &str,
        stamp: &str,
        num: usize,
        inputs_base64: &[String],
    ) -> Result<String, GenerationError> {
        let content = if inputs_base64.is_empty() {
            serde_json::Value::String(prompt.to_string())
        } else {
            let mut parts = vec![serde_json::json!({"type": "text", "text": prompt})];
            parts.extend(inputs_base64.iter().map(|b64| {
                serde_json::json!({
                    "type": "image_url",
                    "image_url": {"url": format!("data:image/jpeg;base64,{}", b64)},
                })
            }));
            serde_json::Value::Array(parts)
        };
        let completion = self
            .complete(serde_json::json!({
                "model": self.config.image_model,
                "messages": [{"role": "user", "content": content}],
                "modalities": ["image", "text"],
            }))
            .await?;

        let data = completion
            .first_image_base64()
            .ok_or(GenerationError::NoImage)?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(data.trim())?;

        let name = format!("image_{}_{}.png", stamp, num);
        let path = self.config.images_dir.join(&name);
        std::fs::create_dir_all(&self.config.images_dir)
            .and_then(|_| std::fs::write(&path, &bytes))
            .map_err(|source| GenerationError::WriteImage {
                path: path.clone(),
                source,
            })?;
        Ok(name)
    }
}

/// UTC `YYYYMMDDTHHMMSS` plus a random suffix, unique per batch.
pub fn batch_stamp() -> Result<String, GenerationError> {
    let format = time::macros::format_description!("[year][month][day]T[hour][minute][second]");
    let ts = time::OffsetDateTime::now_utc()
        .format(format)
        .map_err(|e| GenerationError::Stamp(e.to_string()))?;

    let mut bytes = [0u8; 3];
    getrandom::getrandom(&mut bytes).map_err(|e| GenerationError::Stamp(format!("{:?}", e)))?;
    let mut out = ts;
    out.push('-');
    for b in &bytes {
        out.push_str(&format!("{:02x}", b));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "tests/imagegen_tests.rs"]
mod tests;
