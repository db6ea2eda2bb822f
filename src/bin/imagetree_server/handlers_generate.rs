use super::*;

fn batch_response(batch: GenerationBatch, tree_error: Option<String>) -> GenerationResponse {
    GenerationResponse {
        success: true,
        count: batch.count(),
        images: batch.files,
        tree_error,
        ..GenerationResponse::default()
    }
}

pub(super) async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerationResponse>, Response> {
    let Some(prompt) = non_blank(req.prompt.as_deref()) else {
        return Err(bad_request_msg("Prompt is required"));
    };

    let batch = state
        .generator
        .generate_batch(&prompts::generation_variations(prompt), &[])
        .await
        .map_err(generation_error)?;
    let tree_error = record_roots(&state, &batch.files, NodeKind::Original, prompt).await;
    Ok(Json(batch_response(batch, tree_error)))
}

pub(super) async fn edit(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<GenerationResponse>, Response> {
    let form = read_form(multipart).await?;
    let input = resolve_source(
        &state,
        &form,
        SourceFields {
            file: "image",
            selected: "selected_image",
            missing: "No file selected",
            not_found: "Selected image not found",
        },
    )?;
    let custom = form.text("custom_prompt");
    let prompt = prompts::edit_prompt(form.text("preset"), custom);

    let batch = state
        .generator
        .generate_batch(&prompts::generation_variations(&prompt), &[input.path])
        .await
        .map_err(generation_error)?;
    let tree_error = match input.selected.as_deref() {
        Some(parent) => {
            record_children(&state, parent, &batch.files, NodeKind::Edit, custom.unwrap_or("Edit"))
                .await
        }
        None => None,
    };
    Ok(Json(batch_response(batch, tree_error)))
}

pub(super) async fn themify(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<GenerationResponse>, Response> {
    let form = read_form(multipart).await?;
    let theme = form
        .text("custom_prompt")
        .unwrap_or(prompts::DEFAULT_THEME_PROMPT)
        .to_string();
    let input = resolve_source(
        &state,
        &form,
        SourceFields {
            file: "image",
            selected: "selected_image",
            missing: "No image selected for themifying",
            not_found: "Selected image not found",
        },
    )?;

    let batch = state
        .generator
        .generate_batch(&prompts::theme_variations(&theme), &[input.path])
        .await
        .map_err(generation_error)?;
    let tree_error = match input.selected.as_deref() {
        Some(parent) => {
            record_children(&state, parent, &batch.files, NodeKind::Themify, &theme).await
        }
        None => None,
    };
    Ok(Json(GenerationResponse {
        theme: Some(theme),
        ..batch_response(batch, tree_error)
    }))
}

/// Merged images are not recorded in the tree; they have two parents.
pub(super) async fn merge(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<GenerationResponse>, Response> {
    let form = read_form(multipart).await?;
    let has = |file: &str, selected: &str| form.files.contains_key(file) || form.text(selected).is_some();
    if !has("image1", "selected_image1") || !has("image2", "selected_image2") {
        return Err(bad_request_msg("Two images are required for merging"));
    }
    let merge_prompt = form
        .text("custom_prompt")
        .unwrap_or(prompts::DEFAULT_MERGE_PROMPT)
        .to_string();

    let first = resolve_source(
        &state,
        &form,
        SourceFields {
            file: "image1",
            selected: "selected_image1",
            missing: "First image not provided",
            not_found: "First selected image not found",
        },
    )?;
    let second = resolve_source(
        &state,
        &form,
        SourceFields {
            file: "image2",
            selected: "selected_image2",
            missing: "Second image not provided",
            not_found: "Second selected image not found",
        },
    )?;

    let batch = state
        .generator
        .generate_batch(
            &prompts::merge_variations(&merge_prompt),
            &[first.path, second.path],
        )
        .await
        .map_err(generation_error)?;
    Ok(Json(GenerationResponse {
        merge_prompt: Some(merge_prompt),
        ..batch_response(batch, None)
    }))
}
