use super::*;

pub(super) async fn images_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, Response> {
    let images = gallery::list_images(&state.images_dir).map_err(internal_error)?;
    Ok(Json(images))
}

pub(super) async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, Response> {
    if validate_image_filename(&filename).is_err() {
        return Err(not_found("Image not found"));
    }
    let path = state.image_path(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(not_found("Image not found"));
        }
        Err(err) => {
            return Err(internal_error(
                anyhow::Error::new(err).context(format!("read {}", path.display())),
            ));
        }
    };
    Ok((
        [
            (header::CONTENT_TYPE, gallery::content_type_for(&filename)),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        bytes,
    )
        .into_response())
}
