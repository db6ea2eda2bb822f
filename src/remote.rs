//! Blocking HTTP client for a running `imagetree-server`.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::blocking::multipart::Form;

use crate::model::{
    ChatRequest, ChatResponse, GenerationResponse, MutationResponse, NewChildrenRequest, NodeKind,
    ToggleRequest, TreeResponse,
};

/// An image operand: either an existing gallery image or a local file to upload.
#[derive(Clone, Debug)]
pub enum ImageSource<'a> {
    Gallery(&'a str),
    Upload(&'a Path),
}

pub struct RemoteClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl RemoteClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("imagetree")
            // Generation fans out to the upstream API; allow it to take a while.
            .timeout(std::time::Duration::from_secs(600))
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn ensure_ok(
        &self,
        resp: reqwest::blocking::Response,
        label: &str,
    ) -> Result<reqwest::blocking::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().unwrap_or_default();
        let msg = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(text);
        anyhow::bail!("{} failed ({}): {}", label, status, msg)
    }

    pub fn tree(&self) -> Result<TreeResponse> {
        let resp = self
            .client
            .get(self.url("/api/tree"))
            .send()
            .context("GET /api/tree")?;
        let resp = self.ensure_ok(resp, "get tree")?;
        resp.json().context("parse tree response")
    }

    pub fn images(&self) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(self.url("/api/images-list"))
            .send()
            .context("GET /api/images-list")?;
        let resp = self.ensure_ok(resp, "list images")?;
        resp.json().context("parse images list")
    }

    pub fn toggle(&self, id: &str) -> Result<MutationResponse> {
        let resp = self
            .client
            .post(self.url("/api/tree/toggle"))
            .json(&ToggleRequest { id: id.to_string() })
            .send()
            .context("POST /api/tree/toggle")?;
        let resp = self.ensure_ok(resp, "toggle node")?;
        resp.json().context("parse toggle response")
    }

    pub fn add_children(
        &self,
        parent_id: &str,
        images: &[String],
        kind: NodeKind,
        prompt: Option<&str>,
    ) -> Result<MutationResponse> {
        let body = NewChildrenRequest {
            parent_id: parent_id.to_string(),
            images: images.to_vec(),
            kind,
            prompt: prompt.map(str::to_string),
        };
        let resp = self
            .client
            .post(self.url("/api/tree/children"))
            .json(&body)
            .send()
            .context("POST /api/tree/children")?;
        let resp = self.ensure_ok(resp, "add children")?;
        resp.json().context("parse add children response")
    }

    pub fn generate(&self, prompt: &str) -> Result<GenerationResponse> {
        let resp = self
            .client
            .post(self.url("/api/generate"))
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .context("POST /api/generate")?;
        let resp = self.ensure_ok(resp, "generate")?;
        resp.json().context("parse generate response")
    }

    pub fn edit(
        &self,
        image: ImageSource<'_>,
        preset: Option<&str>,
        prompt: Option<&str>,
    ) -> Result<GenerationResponse> {
        let mut form = attach(Form::new(), "image", "selected_image", image)?;
        if let Some(preset) = preset {
            form = form.text("preset", preset.to_string());
        }
        if let Some(prompt) = prompt {
            form = form.text("custom_prompt", prompt.to_string());
        }
        self.post_form("/api/edit", form, "edit")
    }

    pub fn themify(&self, image: ImageSource<'_>, prompt: Option<&str>) -> Result<GenerationResponse> {
        let mut form = attach(Form::new(), "image", "selected_image", image)?;
        if let Some(prompt) = prompt {
            form = form.text("custom_prompt", prompt.to_string());
        }
        self.post_form("/api/themify", form, "themify")
    }

    pub fn merge(
        &self,
        first: ImageSource<'_>,
        second: ImageSource<'_>,
        prompt: Option<&str>,
    ) -> Result<GenerationResponse> {
        let form = attach(Form::new(), "image1", "selected_image1", first)?;
        let mut form = attach(form, "image2", "selected_image2", second)?;
        if let Some(prompt) = prompt {
            form = form.text("custom_prompt", prompt.to_string());
        }
        self.post_form("/api/merge", form, "merge")
    }

    pub fn chat(&self, message: &str, selected_image: Option<&str>) -> Result<ChatResponse> {
        let body = ChatRequest {
            message: Some(message.to_string()),
            selected_image: selected_image.map(str::to_string),
        };
        let resp = self
            .client
            .post(self.url("/api/chat"))
            .json(&body)
            .send()
            .context("POST /api/chat")?;
        let resp = self.ensure_ok(resp, "chat")?;
        resp.json().context("parse chat response")
    }

    fn post_form(&self, path: &str, form: Form, label: &str) -> Result<GenerationResponse> {
        let resp = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .with_context(|| format!("POST {}", path))?;
        let resp = self.ensure_ok(resp, label)?;
        resp.json()
            .with_context(|| format!("parse {} response", label))
    }
}

fn attach(form: Form, file_field: &str, selected_field: &str, image: ImageSource<'_>) -> Result<Form> {
    match image {
        ImageSource::Gallery(name) => Ok(form.text(selected_field.to_string(), name.to_string())),
        ImageSource::Upload(path) => form
            .file(file_field.to_string(), path)
            .with_context(|| format!("open {}", path.display())),
    }
}
