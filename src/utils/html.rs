use ammonia;

/// Clean user-authored text using the ammonia library.
///
/// Post content, comments, bios and message bodies are stored as the user
/// sent them and rendered by arbitrary clients, so dangerous tags
/// (<script>, <iframe>) and attributes (onclick) are stripped on the way
/// in, while harmless formatting (<b>, <p>) survives.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
