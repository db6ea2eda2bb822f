use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

mod app;
mod listener;
mod logging;
mod shutdown;

use self::app::{build_app_router, build_state};
use self::listener::{bind, publish_addr};
use self::logging::init_logging;
use self::shutdown::shutdown_signal;

#[derive(Parser, Debug)]
#[command(name = "imagetree-server")]
#[command(about = "Image generation gallery with a derivation tree", long_about = None)]
pub(super) struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub(super) addr: SocketAddr,

    /// Write bound address to this file (dev/test convenience)
    #[arg(long)]
    pub(super) addr_file: Option<PathBuf>,

    /// Holds tree.json, generated_images/ and uploads/
    #[arg(long, default_value = "./imagetree-data")]
    pub(super) data_dir: PathBuf,

    /// Bearer credential for the upstream image API
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub(super) api_key: Option<String>,

    /// Base URL of the OpenRouter-compatible upstream
    #[arg(long, default_value = imagetree::imagegen::DEFAULT_API_BASE_URL)]
    pub(super) api_base_url: String,

    /// Model used for chat and prompt extraction
    #[arg(long, default_value = imagetree::imagegen::DEFAULT_CHAT_MODEL)]
    pub(super) chat_model: String,

    /// Model used for image generation
    #[arg(long, default_value = imagetree::imagegen::DEFAULT_IMAGE_MODEL)]
    pub(super) image_model: String,

    /// Per-request timeout for upstream calls
    #[arg(long, default_value_t = 120)]
    pub(super) upstream_timeout_secs: u64,

    /// Largest accepted multipart body
    #[arg(long, default_value_t = 32)]
    pub(super) max_upload_mb: usize,
}

pub(super) async fn run() -> Result<()> {
    let args = Args::parse();
    init_logging();

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("create data dir {}", args.data_dir.display()))?;

    let state = build_state(&args)?;
    let app = build_app_router(state, args.max_upload_mb);
    let (listener, local_addr) = bind(args.addr).await?;
    tracing::info!(addr = %local_addr, data_dir = %args.data_dir.display(), "imagetree-server listening");
    publish_addr(args.addr_file.as_deref(), local_addr)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
