//! Runtime configuration read from the environment (and `.env` via `dotenv`).

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_VOLUME: u8 = 100;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Discord caps select menus at 25 options.
pub const MAX_SEARCH_LIMIT: usize = 25;
pub const DEFAULT_SELECTION_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_SPOTIFY_TRACK_LIMIT: usize = 100;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// `APP_ENV`; `development` joins voice channels self-muted.
    pub app_env: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub default_volume: u8,
    pub search_limit: usize,
    pub selection_timeout: Duration,
    pub spotify_track_limit: usize,
    pub ytdlp_path: String,
    pub ffmpeg_path: String,
    pub suggest_url: String,
    pub spotify_api_url: String,
    pub spotify_accounts_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            app_env: None,
            spotify_client_id: None,
            spotify_client_secret: None,
            default_volume: DEFAULT_VOLUME,
            search_limit: DEFAULT_SEARCH_LIMIT,
            selection_timeout: DEFAULT_SELECTION_TIMEOUT,
            spotify_track_limit: DEFAULT_SPOTIFY_TRACK_LIMIT,
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            suggest_url: "https://suggestqueries-clients6.youtube.com/complete/search".to_string(),
            spotify_api_url: "https://api.spotify.com/v1".to_string(),
            spotify_accounts_url: "https://accounts.spotify.com".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Config::default();

        let default_volume = parse_or(&get, "MUSIC_DEFAULT_VOLUME", defaults.default_volume)?;
        if default_volume > 100 {
            return Err(ConfigError::Invalid {
                key: "MUSIC_DEFAULT_VOLUME",
                value: default_volume.to_string(),
            });
        }

        let search_limit: usize = parse_or(&get, "MUSIC_SEARCH_LIMIT", defaults.search_limit)?;
        if search_limit == 0 || search_limit > MAX_SEARCH_LIMIT {
            return Err(ConfigError::Invalid {
                key: "MUSIC_SEARCH_LIMIT",
                value: search_limit.to_string(),
            });
        }

        let timeout_secs = parse_or(
            &get,
            "MUSIC_SELECTION_TIMEOUT_SECS",
            defaults.selection_timeout.as_secs(),
        )?;

        Ok(Self {
            discord_token: get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?,
            app_env: get("APP_ENV"),
            spotify_client_id: get("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: get("SPOTIFY_CLIENT_SECRET"),
            default_volume,
            search_limit,
            selection_timeout: Duration::from_secs(timeout_secs),
            spotify_track_limit: parse_or(&get, "SPOTIFY_TRACK_LIMIT", defaults.spotify_track_limit)?,
            ytdlp_path: get("YTDLP_PATH").unwrap_or(defaults.ytdlp_path),
            ffmpeg_path: get("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            suggest_url: get("YOUTUBE_SUGGEST_URL").unwrap_or(defaults.suggest_url),
            spotify_api_url: get("SPOTIFY_API_URL").unwrap_or(defaults.spotify_api_url),
            spotify_accounts_url: get("SPOTIFY_ACCOUNTS_URL").unwrap_or(defaults.spotify_accounts_url),
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env
            .as_deref()
            .is_some_and(|env| env.eq_ignore_ascii_case("development"))
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::Invalid { key, value }),
        },
        None => Ok(default),
    }
}
