//! Prompt construction for the four image operations and chat intent routing.

pub const DEFAULT_THEME_PROMPT: &str = "apply a beautiful artistic theme transformation";
pub const DEFAULT_MERGE_PROMPT: &str = "creatively merge and blend these images together";

/// Named edit instructions; `enhance` is the fallback for unknown names.
pub const EDITING_PRESETS: &[(&str, &str)] = &[
    (
        "enhance",
        "enhance the image quality, make it more vibrant and sharp",
    ),
    (
        "blur",
        "add a beautiful artistic blur effect to the background",
    ),
    ("vintage", "apply a vintage, retro filter with warm tones"),
    ("black_white", "convert to black and white with high contrast"),
    ("artistic", "transform into an artistic painting style"),
    ("cartoon", "convert to cartoon/anime style illustration"),
];

pub fn preset_instruction(preset: Option<&str>) -> &'static str {
    let wanted = preset.unwrap_or("enhance");
    EDITING_PRESETS
        .iter()
        .find(|(name, _)| *name == wanted)
        .or_else(|| EDITING_PRESETS.first())
        .map(|(_, text)| *text)
        .unwrap_or_default()
}

/// `"<custom>, <preset>"`, or the preset alone when no custom text is given.
pub fn edit_prompt(preset: Option<&str>, custom: Option<&str>) -> String {
    let base = preset_instruction(preset);
    match custom.map(str::trim).filter(|c| !c.is_empty()) {
        Some(custom) => format!("{}, {}", custom, base),
        None => base.to_string(),
    }
}

pub fn generation_variations(base: &str) -> Vec<String> {
    vec![
        base.to_string(),
        format!("{}, artistic style, vibrant colors", base),
        format!("{}, minimalist design, clean composition", base),
        format!("{}, detailed illustration, rich textures", base),
    ]
}

pub fn theme_variations(theme: &str) -> Vec<String> {
    vec![
        theme.to_string(),
        format!("{}, enhance the theme with vibrant colors and details", theme),
        format!("{}, artistic interpretation with creative flair", theme),
        format!("{}, dramatic and cinematic style", theme),
    ]
}

pub fn merge_variations(merge: &str) -> Vec<String> {
    vec![
        format!("{}, blend and combine elements seamlessly", merge),
        format!("{}, create a harmonious fusion of styles", merge),
        format!("{}, merge with creative transitions and effects", merge),
        format!("{}, artistic combination with unique perspective", merge),
    ]
}

const IMAGE_KEYWORDS: &[&str] = &[
    "generate", "create", "make", "draw", "image", "picture", "edit", "modify", "change",
];
const THEMIFY_KEYWORDS: &[&str] = &[
    "theme",
    "themify",
    "style",
    "transform",
    "apply theme",
    "change style",
];
const MERGE_KEYWORDS: &[&str] = &["merge", "combine", "blend", "fuse", "join", "mix"];

/// What a chat message is asking for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatIntent {
    /// Theme the selected image.
    Themify,
    /// Merge was asked for with a single selection; needs the merge flow.
    MergeNeedsTwoImages,
    /// Edit the selected image.
    Edit,
    /// Text-to-image generation.
    Generate,
    /// Theme was asked for with nothing selected.
    ThemifyNeedsSelection,
    /// Merge was asked for with nothing selected.
    MergeNeedsImages,
    Chat,
}

pub fn classify_chat(message: &str, has_selection: bool) -> ChatIntent {
    let lower = message.to_lowercase();
    let any = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    let wants_image = any(IMAGE_KEYWORDS);
    let wants_themify = any(THEMIFY_KEYWORDS);
    let wants_merge = any(MERGE_KEYWORDS);

    if wants_themify && has_selection {
        ChatIntent::Themify
    } else if wants_merge && has_selection {
        ChatIntent::MergeNeedsTwoImages
    } else if has_selection {
        ChatIntent::Edit
    } else if wants_image {
        ChatIntent::Generate
    } else if wants_themify {
        ChatIntent::ThemifyNeedsSelection
    } else if wants_merge {
        ChatIntent::MergeNeedsImages
    } else {
        ChatIntent::Chat
    }
}

pub fn themify_system_prompt(selected: &str) -> String {
    format!(
        "User wants to apply a theme to image '{}'. Extract theme instructions from their message.",
        selected
    )
}

pub fn edit_system_prompt(selected: &str) -> String {
    format!(
        "User has selected an image '{}' and wants to edit it. Extract editing instructions from their message.",
        selected
    )
}

pub const GENERATE_SYSTEM_PROMPT: &str = "Extract or create a detailed image generation prompt from the user's message. Be creative and descriptive.";

pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant that specializes in image generation and editing. Be friendly and concise.";

pub const MERGE_NEEDS_TWO_IMAGES_REPLY: &str = "I understand you want to merge images! Please select two images using the Merge tab, as I need two images to perform a merge operation.";

pub const THEMIFY_NEEDS_SELECTION_REPLY: &str = "I can help you apply themes to images! Please select an image from the gallery first, or use the Themify tab to upload and theme an image.";

pub const MERGE_NEEDS_IMAGES_REPLY: &str = "I can help you merge images! Please use the Merge tab to select or upload two images that you'd like to combine.";

#[cfg(test)]
#[path = "tests/prompts_tests.rs"]
mod tests;
