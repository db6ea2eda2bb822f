use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use imagetree::gallery::{self, validate_image_filename};
use imagetree::imagegen::{GenerationBatch, GenerationError, Generator};
use imagetree::model::{
    ChatAction, ChatRequest, ChatResponse, GenerationResponse, MutationResponse,
    NewChildrenRequest, NewRootsRequest, NodeKind, ToggleRequest, TreeResponse, TreeUpload,
};
use imagetree::prompts;
use imagetree::store::{StoreError, TreeStore};

#[path = "imagetree_server/types.rs"]
mod types;
use self::types::*;
#[path = "imagetree_server/http_error.rs"]
mod http_error;
use self::http_error::*;
#[path = "imagetree_server/validators.rs"]
mod validators;
use self::validators::*;
#[path = "imagetree_server/uploads.rs"]
mod uploads;
use self::uploads::*;
#[path = "imagetree_server/tree_record.rs"]
mod tree_record;
use self::tree_record::*;
#[path = "imagetree_server/handlers_system.rs"]
mod handlers_system;
use self::handlers_system::*;
#[path = "imagetree_server/handlers_tree.rs"]
mod handlers_tree;
use self::handlers_tree::*;
#[path = "imagetree_server/handlers_images.rs"]
mod handlers_images;
use self::handlers_images::*;
#[path = "imagetree_server/handlers_generate.rs"]
mod handlers_generate;
use self::handlers_generate::*;
#[path = "imagetree_server/handlers_chat.rs"]
mod handlers_chat;
use self::handlers_chat::*;
#[path = "imagetree_server/routes.rs"]
mod routes;
use self::routes::*;
#[path = "imagetree_server/runtime/mod.rs"]
mod runtime;

#[tokio::main]
async fn main() {
    if let Err(err) = runtime::run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
