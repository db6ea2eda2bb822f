use super::*;

use imagetree::prompts::ChatIntent;

fn reply(text: impl Into<String>) -> Json<ChatResponse> {
    Json(ChatResponse {
        response: text.into(),
        images: Vec::new(),
        action: ChatAction::Chat,
        tree_error: None,
    })
}

fn produced(text: String, images: Vec<String>, tree_error: Option<String>) -> Json<ChatResponse> {
    Json(ChatResponse {
        response: text,
        images,
        action: ChatAction::Generate,
        tree_error,
    })
}

pub(super) async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, Response> {
    let Some(message) = non_blank(req.message.as_deref()) else {
        return Err(bad_request_msg("Message is required"));
    };
    if !state.generator.has_api_key() {
        return Err(internal_error(anyhow::anyhow!("API key not found")));
    }
    let selected = non_blank(req.selected_image.as_deref());
    let generator = &state.generator;

    let intent = prompts::classify_chat(message, selected.is_some());
    tracing::info!(?intent, selected = selected.unwrap_or(""), "chat request");

    match (intent, selected) {
        (ChatIntent::Themify, Some(image)) => {
            let path = selected_image_path(&state, image, "Selected image not found")?;
            let theme = generator
                .complete_text(&prompts::themify_system_prompt(image), message)
                .await
                .map_err(generation_error)?;
            match generator
                .generate_batch(&prompts::theme_variations(&theme), &[path])
                .await
            {
                Ok(batch) => {
                    let tree_error =
                        record_children(&state, image, &batch.files, NodeKind::Themify, &theme).await;
                    Ok(produced(
                        format!("I've applied the theme to your image: {}", theme),
                        batch.files,
                        tree_error,
                    ))
                }
                Err(err) => Ok(reply(format!("Sorry, I couldn't apply the theme: {}", err))),
            }
        }
        (ChatIntent::Edit, Some(image)) => {
            let path = selected_image_path(&state, image, "Selected image not found")?;
            let instructions = generator
                .complete_text(&prompts::edit_system_prompt(image), message)
                .await
                .map_err(generation_error)?;
            match generator
                .generate_batch(&prompts::generation_variations(&instructions), &[path])
                .await
            {
                Ok(batch) => {
                    let tree_error =
                        record_children(&state, image, &batch.files, NodeKind::Edit, &instructions)
                            .await;
                    Ok(produced(
                        format!("I've edited your selected image with: {}", instructions),
                        batch.files,
                        tree_error,
                    ))
                }
                Err(err) => Ok(reply(format!("Sorry, I couldn't edit the image: {}", err))),
            }
        }
        (ChatIntent::Generate, _) => {
            let image_prompt = generator
                .complete_text(prompts::GENERATE_SYSTEM_PROMPT, message)
                .await
                .map_err(generation_error)?;
            match generator
                .generate_batch(&prompts::generation_variations(&image_prompt), &[])
                .await
            {
                Ok(batch) => {
                    let tree_error =
                        record_roots(&state, &batch.files, NodeKind::Original, &image_prompt).await;
                    Ok(produced(
                        format!("I've generated {} images for: {}", batch.count(), image_prompt),
                        batch.files,
                        tree_error,
                    ))
                }
                Err(err) => Ok(reply(format!("Sorry, I couldn't generate images: {}", err))),
            }
        }
        (ChatIntent::MergeNeedsTwoImages, _) => Ok(reply(prompts::MERGE_NEEDS_TWO_IMAGES_REPLY)),
        (ChatIntent::ThemifyNeedsSelection, _) => {
            Ok(reply(prompts::THEMIFY_NEEDS_SELECTION_REPLY))
        }
        (ChatIntent::MergeNeedsImages, _) => Ok(reply(prompts::MERGE_NEEDS_IMAGES_REPLY)),
        // Themify and Edit are only classified with a selection.
        (ChatIntent::Chat, _) | (ChatIntent::Themify | ChatIntent::Edit, None) => {
            let text = generator
                .complete_text(prompts::CHAT_SYSTEM_PROMPT, message)
                .await
                .map_err(generation_error)?;
            Ok(reply(text))
        }
    }
}
