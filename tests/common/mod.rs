use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine;

/// Bytes the fake upstream hands back as every generated image.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake image body";

pub struct ServerGuard {
    pub base_url: String,
    pub data_dir: PathBuf,
    child: Child,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl ServerGuard {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("generated_images")
    }

    pub fn tree_file(&self) -> PathBuf {
        self.data_dir.join("tree.json")
    }
}

#[derive(Clone, Debug, Default)]
pub struct ServerOptions {
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
}

impl ServerOptions {
    pub fn with_upstream(upstream: &FakeUpstream) -> Self {
        Self {
            api_base_url: Some(upstream.base_url.clone()),
            api_key: Some("test-key".to_string()),
        }
    }
}

pub fn spawn_server_in(data_dir: &Path, opts: &ServerOptions) -> Result<ServerGuard> {
    let addr_file = data_dir.join("addr.txt");
    let _ = std::fs::remove_file(&addr_file);

    let mut args = vec![
        "--addr".to_string(),
        "127.0.0.1:0".to_string(),
        "--addr-file".to_string(),
        addr_file.display().to_string(),
        "--data-dir".to_string(),
        data_dir.display().to_string(),
        "--upstream-timeout-secs".to_string(),
        "10".to_string(),
    ];
    // Unreachable by default so no test ever talks to a real API.
    args.push("--api-base-url".to_string());
    args.push(
        opts.api_base_url
            .clone()
            .unwrap_or_else(|| "http://127.0.0.1:9".to_string()),
    );
    if let Some(key) = &opts.api_key {
        args.push("--api-key".to_string());
        args.push(key.clone());
    }

    let child = Command::new(env!("CARGO_BIN_EXE_imagetree-server"))
        .args(&args)
        .env_remove("OPENROUTER_API_KEY")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("spawn imagetree-server")?;

    let mut guard = ServerGuard {
        base_url: String::new(),
        data_dir: data_dir.to_path_buf(),
        child,
    };
    guard.base_url = read_addr_file(&addr_file)?;
    wait_for_healthz(&guard.base_url)?;
    Ok(guard)
}

fn read_addr_file(addr_file: &Path) -> Result<String> {
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(10) {
            anyhow::bail!("addr file not written at {}", addr_file.display());
        }

        if let Ok(s) = std::fs::read_to_string(addr_file) {
            let s = s.trim();
            if !s.is_empty() {
                return Ok(format!("http://{}", s));
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
}

pub fn wait_for_healthz(base_url: &str) -> Result<()> {
    let client = reqwest::blocking::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(10) {
            anyhow::bail!("server did not become healthy at {}/healthz", base_url);
        }
        match client.get(format!("{}/healthz", base_url)).send() {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => {
                thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

pub fn write_image(dir: &Path, name: &str) -> Result<()> {
    std::fs::create_dir_all(dir).context("create images dir")?;
    std::fs::write(dir.join(name), FAKE_PNG).with_context(|| format!("write {}", name))
}

/// What the fake upstream has been asked so far.
#[derive(Clone, Debug, Default)]
pub struct UpstreamLog {
    pub chat_calls: usize,
    pub image_prompts: Vec<String>,
    /// Attached input images per image call, in arrival order.
    pub image_parts: Vec<usize>,
}

struct FakeState {
    fail_on: Option<&'static str>,
    chat_reply: &'static str,
    log: Arc<Mutex<UpstreamLog>>,
}

/// OpenRouter-shaped `/chat/completions` on a background runtime.
///
/// Image calls whose prompt contains `fail_on` answer 500; every other image
/// call returns [`FAKE_PNG`]. Text calls answer `chat_reply`.
pub struct FakeUpstream {
    pub base_url: String,
    log: Arc<Mutex<UpstreamLog>>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl FakeUpstream {
    pub fn start(fail_on: Option<&'static str>, chat_reply: &'static str) -> Result<Self> {
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").context("bind fake upstream")?;
        listener
            .set_nonblocking(true)
            .context("set fake upstream nonblocking")?;
        let addr = listener.local_addr().context("fake upstream addr")?;

        let log = Arc::new(Mutex::new(UpstreamLog::default()));
        let state = Arc::new(FakeState {
            fail_on,
            chat_reply,
            log: log.clone(),
        });
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let thread = thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("fake upstream runtime");
            rt.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("fake upstream listener");
                let app = Router::new()
                    .route("/chat/completions", post(completions))
                    .with_state(state);
                let _ = axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = rx.await;
                    })
                    .await;
            });
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            log,
            shutdown: Some(tx),
            thread: Some(thread),
        })
    }

    pub fn log(&self) -> UpstreamLog {
        self.log.lock().expect("upstream log lock").clone()
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

async fn completions(
    State(state): State<Arc<FakeState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if body.get("modalities").is_none() {
        state.log.lock().expect("upstream log lock").chat_calls += 1;
        return Json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": state.chat_reply}}]
        }))
        .into_response();
    }

    let content = &body["messages"][0]["content"];
    let (prompt, parts) = match content {
        serde_json::Value::String(s) => (s.clone(), 0),
        serde_json::Value::Array(items) => (
            items
                .first()
                .and_then(|i| i["text"].as_str())
                .unwrap_or_default()
                .to_string(),
            items.iter().filter(|i| i["type"] == "image_url").count(),
        ),
        _ => (String::new(), 0),
    };
    {
        let mut log = state.log.lock().expect("upstream log lock");
        log.image_prompts.push(prompt.clone());
        log.image_parts.push(parts);
    }

    if let Some(marker) = state.fail_on
        && prompt.contains(marker)
    {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }

    let data = base64::engine::general_purpose::STANDARD.encode(FAKE_PNG);
    Json(serde_json::json!({
        "choices": [{"message": {
            "role": "assistant",
            "content": "here you go",
            "images": [{"type": "image_url", "image_url": {"url": format!("data:image/png;base64,{}", data)}}]
        }}]
    }))
    .into_response()
}
