//! YouTube query suggestions used to autocomplete `/play`.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::music_manager::{MusicError, MusicResult};
use super::trim_ellipsis;

/// Discord accepts at most 25 autocomplete choices of up to 100 characters.
const MAX_SUGGESTIONS: usize = 25;
const MAX_SUGGESTION_LENGTH: usize = 100;

/// Matches the `["suggestion",0,...]` entries of the JSONP body. The echoed query is
/// followed by the suggestion list rather than `,0` and is not matched.
static SUGGESTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\["((?:[^"\\]|\\.)*)",0"#).unwrap());

/// Extract the suggestion strings from a suggest endpoint response body.
pub fn parse_suggestions(body: &str) -> Vec<String> {
    SUGGESTION_REGEX
        .captures_iter(body)
        .filter_map(|captures| {
            let raw = captures.get(1)?.as_str();
            // The body uses JSON string escapes such as \u0026
            serde_json::from_str::<String>(&format!("\"{}\"", raw)).ok()
        })
        .filter(|suggestion| !suggestion.is_empty())
        .map(|suggestion| trim_ellipsis(&suggestion, MAX_SUGGESTION_LENGTH))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Fetch suggestions for a partially typed query.
pub async fn fetch_suggestions(
    client: &reqwest::Client,
    endpoint: &str,
    partial: &str,
) -> MusicResult<Vec<String>> {
    let body = client
        .get(endpoint)
        .query(&[("client", "youtube"), ("ds", "yt"), ("q", partial), ("cp", "10")])
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| MusicError::ExternalApiError(format!("Failed to fetch suggestions: {}", e)))?
        .text()
        .await
        .map_err(|e| MusicError::ExternalApiError(format!("Failed to read suggestions: {}", e)))?;

    let suggestions = parse_suggestions(&body);
    debug!("{} suggestions for '{}'", suggestions.len(), partial);
    Ok(suggestions)
}
