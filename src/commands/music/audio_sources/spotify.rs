//! Spotify link parsing and a small Spotify Web API client.
//!
//! Spotify never streams audio here: tracks are resolved to their name and artists so
//! an equivalent YouTube track can be searched for.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use reqwest::header;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serenity::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::commands::music::utils::music_manager::{MusicError, MusicResult};
use crate::config::Config;

/// Hosts serving Spotify web links.
const SPOTIFY_HOSTS: [&str; 3] = ["open.spotify.com", "play.spotify.com", "embed.spotify.com"];

/// Page size requested when walking album and playlist tracks.
const PAGE_SIZE: usize = 50;

/// Whether the text is a Spotify URI (`spotify:...`) or a Spotify web link.
pub fn is_spotify(text: &str) -> bool {
    if text.starts_with("spotify:") {
        return true;
    }

    match Url::parse(text) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url
                    .host_str()
                    .is_some_and(|host| SPOTIFY_HOSTS.contains(&host))
        }
        Err(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotifyKind {
    Track,
    Album,
    Playlist,
    /// Artists, shows, episodes and anything else we cannot queue.
    Other(String),
}

impl From<&str> for SpotifyKind {
    fn from(kind: &str) -> Self {
        match kind {
            "track" => SpotifyKind::Track,
            "album" => SpotifyKind::Album,
            "playlist" => SpotifyKind::Playlist,
            other => SpotifyKind::Other(other.to_string()),
        }
    }
}

/// A parsed Spotify link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyUri {
    pub kind: SpotifyKind,
    pub id: String,
}

impl SpotifyUri {
    /// Parse `spotify:<kind>:<id>` URIs, `https://open.spotify.com/<kind>/<id>` links and
    /// `https://embed.spotify.com/?uri=<uri>` embeds.
    pub fn parse(text: &str) -> MusicResult<Self> {
        let invalid = || MusicError::InvalidSpotifyUri(text.to_string());

        let segments: Vec<String> = if let Some(rest) = text.strip_prefix("spotify:") {
            rest.split(':').map(str::to_string).collect()
        } else {
            let url = Url::parse(text).map_err(|_| invalid())?;
            if !url.host_str().is_some_and(|host| SPOTIFY_HOSTS.contains(&host)) {
                return Err(invalid());
            }
            if url.host_str() == Some("embed.spotify.com") {
                if let Some((_, uri)) = url.query_pairs().find(|(key, _)| key == "uri") {
                    return Self::parse(&uri).map_err(|_| invalid());
                }
            }
            url.path_segments()
                .map(|segments| {
                    segments
                        .filter(|segment| !segment.is_empty())
                        .skip_while(|segment| segment.starts_with("intl-") || *segment == "embed")
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };

        Self::from_segments(&segments).ok_or_else(invalid)
    }

    fn from_segments(segments: &[String]) -> Option<Self> {
        let (kind, id) = match segments {
            [user, _, playlist, id, ..] if user == "user" && playlist == "playlist" => {
                ("playlist", id)
            }
            [kind, id, ..] => (kind.as_str(), id),
            _ => return None,
        };

        // Ids are base62 and end up in API paths
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        Some(Self {
            kind: SpotifyKind::from(kind),
            id: id.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyTrack {
    pub name: String,
    pub artists: Vec<String>,
}

impl SpotifyTrack {
    /// Search query used to find the track on YouTube.
    pub fn youtube_query(&self) -> String {
        std::iter::once(self.name.as_str())
            .chain(self.artists.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyAlbum {
    pub name: String,
    pub tracks: Vec<SpotifyTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyPlaylist {
    pub name: String,
    pub tracks: Vec<SpotifyTrack>,
}

/// Read access to the Spotify catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    async fn track(&self, id: &str) -> MusicResult<SpotifyTrack>;

    async fn album(&self, id: &str) -> MusicResult<SpotifyAlbum>;

    async fn playlist(&self, id: &str) -> MusicResult<SpotifyPlaylist>;
}

/// Authentication tokens for Spotify API
#[derive(Debug, Deserialize)]
struct SpotifyToken {
    access_token: String,
    expires_in: u64,
    #[serde(skip, default = "Instant::now")]
    created_at: Instant,
}

impl SpotifyToken {
    fn is_expired(&self) -> bool {
        let expiry = Duration::from_secs(self.expires_in);
        let elapsed = self.created_at.elapsed();
        // Consider it expired 30 seconds before actual expiry
        elapsed > expiry.saturating_sub(Duration::from_secs(30))
    }
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtist>,
    #[serde(default)]
    is_local: bool,
}

impl ApiTrack {
    /// Local files have no catalog id and cannot be matched.
    fn into_track(self) -> Option<SpotifyTrack> {
        if self.is_local || self.id.is_none() {
            return None;
        }

        Some(SpotifyTrack {
            name: self.name,
            artists: self.artists.into_iter().map(|artist| artist.name).collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    name: String,
    tracks: Paging<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylist {
    name: String,
    tracks: Paging<PlaylistItem>,
}

/// Spotify Web API client using the client credentials flow.
pub struct SpotifyApi {
    client: reqwest::Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    api_url: String,
    accounts_url: String,
    track_limit: usize,
    token: Mutex<Option<SpotifyToken>>,
}

impl SpotifyApi {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            api_url: config.spotify_api_url.trim_end_matches('/').to_string(),
            accounts_url: config.spotify_accounts_url.trim_end_matches('/').to_string(),
            track_limit: config.spotify_track_limit,
            token: Mutex::new(None),
        }
    }

    /// Get an access token, requesting a new one when the cached token is about to expire.
    async fn access_token(&self) -> MusicResult<String> {
        let mut token_lock = self.token.lock().await;

        // Return existing token if it's still valid
        if let Some(token) = token_lock.as_ref() {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| MusicError::ConfigError("SPOTIFY_CLIENT_ID not set".to_string()))?;
        let client_secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| MusicError::ConfigError("SPOTIFY_CLIENT_SECRET not set".to_string()))?;

        // Basic auth with client_id:client_secret
        let auth = BASE64_STANDARD.encode(format!("{}:{}", client_id, client_secret));

        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .header(header::AUTHORIZATION, format!("Basic {}", auth))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to request Spotify token: {}", e))
            })?;

        let token: SpotifyToken = Self::read_json(response).await?;
        debug!("Fetched Spotify token valid for {}s", token.expires_in);

        let access_token = token.access_token.clone();
        *token_lock = Some(token);

        Ok(access_token)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> MusicResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Cannot read response".to_string());
            return Err(MusicError::ExternalApiError(format!(
                "Spotify API error: {} - {}",
                status, text
            )));
        }

        response.json::<T>().await.map_err(|e| {
            MusicError::ExternalApiError(format!("Failed to parse Spotify response: {}", e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> MusicResult<T> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| MusicError::ExternalApiError(format!("Failed to request Spotify: {}", e)))?;

        Self::read_json(response).await
    }

    /// Collect tracks from the first page and every following one, up to the track limit.
    async fn collect_pages<T, F>(&self, first: Paging<T>, convert: F) -> MusicResult<Vec<SpotifyTrack>>
    where
        T: DeserializeOwned,
        F: Fn(T) -> Option<SpotifyTrack>,
    {
        let mut tracks = Vec::new();
        let mut page = first;

        loop {
            tracks.extend(page.items.into_iter().filter_map(&convert));

            if tracks.len() >= self.track_limit {
                tracks.truncate(self.track_limit);
                break;
            }

            match page.next {
                Some(next) => page = self.get(&next).await?,
                None => break,
            }
        }

        Ok(tracks)
    }
}

#[async_trait]
impl MusicCatalog for SpotifyApi {
    async fn track(&self, id: &str) -> MusicResult<SpotifyTrack> {
        let track: ApiTrack = self.get(&format!("{}/tracks/{}", self.api_url, id)).await?;

        track
            .into_track()
            .ok_or_else(|| MusicError::ExternalApiError(format!("Track {} is not playable", id)))
    }

    async fn album(&self, id: &str) -> MusicResult<SpotifyAlbum> {
        let album: ApiAlbum = self
            .get(&format!("{}/albums/{}?limit={}", self.api_url, id, PAGE_SIZE))
            .await?;

        let tracks = self.collect_pages(album.tracks, ApiTrack::into_track).await?;
        debug!("Fetched {} tracks of album '{}'", tracks.len(), album.name);

        Ok(SpotifyAlbum {
            name: album.name,
            tracks,
        })
    }

    async fn playlist(&self, id: &str) -> MusicResult<SpotifyPlaylist> {
        let playlist: ApiPlaylist = self
            .get(&format!("{}/playlists/{}?limit={}", self.api_url, id, PAGE_SIZE))
            .await?;

        let tracks = self
            .collect_pages(playlist.tracks, |item: PlaylistItem| {
                item.track.and_then(ApiTrack::into_track)
            })
            .await?;
        debug!("Fetched {} tracks of playlist '{}'", tracks.len(), playlist.name);

        Ok(SpotifyPlaylist {
            name: playlist.name,
            tracks,
        })
    }
}
