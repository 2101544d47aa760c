pub mod driver;
pub mod filters;
pub mod guards;
pub mod music_manager;
pub mod play_requests;
pub mod player;
pub mod responses;
pub mod suggestions;

/// Shorten `text` to at most `max` characters, ending it with "..." when cut.
pub fn trim_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let mut trimmed: String = text.chars().take(max.saturating_sub(3)).collect();
    trimmed.push_str("...");
    trimmed
}
