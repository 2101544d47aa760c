//! Track model and the search backends that resolve queries into playable tracks.
//!
//! `youtube` loads searches and URLs through `yt-dlp`; `spotify` talks to the Spotify
//! Web API so catalog links can be matched against YouTube.

/// Spotify link parsing and Web API client.
pub mod spotify;
/// `yt-dlp` backed implementation of `TrackSearch`.
pub mod youtube;

use serenity::async_trait;
use serenity::model::id::UserId;
use std::fmt;
use std::time::Duration;
use url::Url;

/// A playable track as returned by the search backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    /// Backend identifier (the YouTube video id).
    pub identifier: String,
    pub title: String,
    pub author: String,
    /// Page URL handed to the streaming pipeline.
    pub uri: String,
    pub duration: Option<Duration>,
    /// User who queued the track.
    pub requester: Option<UserId>,
}

impl Track {
    pub fn with_requester(mut self, requester: UserId) -> Self {
        self.requester = Some(requester);
        self
    }
}

/// Classification of a search outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadType {
    Track,
    Playlist,
    Search,
    Empty,
    Error,
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadType::Track => "track",
            LoadType::Playlist => "playlist",
            LoadType::Search => "search",
            LoadType::Empty => "empty",
            LoadType::Error => "error",
        };
        f.write_str(name)
    }
}

/// Outcome of loading a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    /// A direct link to a single track.
    Track(Track),
    /// A direct link to a playlist.
    Playlist { name: String, tracks: Vec<Track> },
    /// Ranked results of a free-text search.
    Search(Vec<Track>),
    Empty,
    Error(String),
}

impl SearchResult {
    pub fn load_type(&self) -> LoadType {
        match self {
            SearchResult::Track(_) => LoadType::Track,
            SearchResult::Playlist { .. } => LoadType::Playlist,
            SearchResult::Search(_) => LoadType::Search,
            SearchResult::Empty => LoadType::Empty,
            SearchResult::Error(_) => LoadType::Error,
        }
    }
}

/// Resolves a URL or free-text query into tracks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackSearch: Send + Sync {
    /// Load the query. Failures are reported as `SearchResult::Error`.
    async fn search(&self, query: &str) -> SearchResult;
}

/// A utility struct providing general helper functions related to audio sources.
pub struct AudioSource;

impl AudioSource {
    /// Performs a basic check if the input string can be parsed as a URL.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }
}
