use super::*;

/// Trimmed text, or `None` when absent or blank.
pub(super) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Resolves a gallery selection to its file, rejecting names that escape the
/// images directory and names with nothing behind them.
pub(super) fn selected_image_path(
    state: &AppState,
    name: &str,
    not_found_msg: &str,
) -> Result<PathBuf, Response> {
    validate_image_filename(name).map_err(bad_request)?;
    let path = state.image_path(name);
    if !path.is_file() {
        return Err(bad_request_msg(not_found_msg));
    }
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/bin/imagetree_server/validators_tests.rs"]
mod tests;
