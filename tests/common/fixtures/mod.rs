//! Test fixtures for the melody music bot
//! This module contains sample data and configurations used in tests

use melody::commands::music::audio_sources::Track;
use melody::config::Config;

/// Sample guild ID for testing
pub const GUILD_ID: u64 = 123456789;

/// Sample voice channel ID for testing
pub const VOICE_CHANNEL_ID: u64 = 987654321;

/// Sample text channel ID for testing
pub const TEXT_CHANNEL_ID: u64 = 192837465;

/// Sample user ID for testing
pub const USER_ID: u64 = 555555555;

/// Builds a YouTube track with a predictable title and URL.
pub fn track(id: &str) -> Track {
    Track {
        identifier: id.to_string(),
        title: format!("Title {}", id),
        author: format!("Channel {}", id),
        uri: format!("https://www.youtube.com/watch?v={}", id),
        ..Default::default()
    }
}

/// Configuration pointing every HTTP endpoint at a mock server.
pub fn config_for(server_uri: &str) -> Config {
    Config {
        discord_token: "test-token".into(),
        spotify_client_id: Some("client".into()),
        spotify_client_secret: Some("secret".into()),
        spotify_api_url: format!("{}/v1", server_uri),
        spotify_accounts_url: server_uri.to_string(),
        suggest_url: format!("{}/complete/search", server_uri),
        ..Config::default()
    }
}

/// Spotify token response body.
pub fn token_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "integration-token",
        "token_type": "Bearer",
        "expires_in": 3600
    })
}
