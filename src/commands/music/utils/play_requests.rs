//! Resolution of `/play` queries into queue changes and reply texts.
//!
//! Kept free of Discord types so the flows can be tested against mocked backends;
//! the command only has to present the outcome.

use serenity::model::id::UserId;
use std::fmt;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use super::music_manager::MusicResult;
use super::player::Player;
use super::responses;
use crate::commands::music::audio_sources::spotify::{
    MusicCatalog, SpotifyKind, SpotifyTrack, SpotifyUri, is_spotify,
};
use crate::commands::music::audio_sources::{SearchResult, Track, TrackSearch};

/// Where a requested track lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueType {
    /// Append to the end of the queue.
    Later,
    /// Insert at the front of the queue.
    Next,
    /// Interrupt the current track.
    Now,
}

impl QueueType {
    /// Priority requests may not load whole lists.
    pub fn is_priority(&self) -> bool {
        !matches!(self, QueueType::Later)
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueueType::Later => "later",
            QueueType::Next => "next",
            QueueType::Now => "now",
        };
        f.write_str(name)
    }
}

/// What the command has to show once a query is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The request is complete; reply with the text.
    Reply(String),
    /// Ask the caller to pick one of the search results.
    Choose(Vec<Track>),
}

/// A single `/play` invocation against a guild's player.
pub struct PlayRequest<'a> {
    pub searcher: &'a dyn TrackSearch,
    pub catalog: &'a dyn MusicCatalog,
    pub player: &'a Mutex<Player>,
    pub queue: QueueType,
    pub requester: UserId,
}

impl PlayRequest<'_> {
    pub async fn resolve(&self, query: &str) -> MusicResult<Resolution> {
        if is_spotify(query) {
            self.resolve_spotify(query).await
        } else {
            self.resolve_youtube(query).await
        }
    }

    async fn resolve_youtube(&self, query: &str) -> MusicResult<Resolution> {
        let result = self.searcher.search(query).await;
        debug!("Query '{}' resolved as {}", query, result.load_type());

        let reply = match result {
            SearchResult::Error(message) => {
                warn!("Lookup of '{}' failed: {}", query, message);
                responses::LOOKUP_ERROR.to_string()
            }
            SearchResult::Empty => responses::NO_MATCHES.to_string(),
            SearchResult::Playlist { .. } if self.queue.is_priority() => {
                responses::PLAYLIST_ON_PRIORITY.to_string()
            }
            SearchResult::Playlist { name, tracks } => {
                let mut player = self.player.lock().await;
                for track in tracks {
                    player.enqueue(track.with_requester(self.requester));
                }
                responses::queueing_music_list(&name)
            }
            SearchResult::Track(track) => self.respond_to_play(track).await?,
            SearchResult::Search(tracks) => return Ok(Resolution::Choose(tracks)),
        };

        Ok(Resolution::Reply(reply))
    }

    async fn resolve_spotify(&self, query: &str) -> MusicResult<Resolution> {
        let Ok(uri) = SpotifyUri::parse(query) else {
            return Ok(Resolution::Reply(responses::UNSUPPORTED_SPOTIFY_LINK.to_string()));
        };

        let reply = match uri.kind {
            SpotifyKind::Album if self.queue.is_priority() => {
                responses::ALBUM_ON_PRIORITY.to_string()
            }
            SpotifyKind::Album => match self.catalog.album(&uri.id).await {
                Ok(album) => {
                    self.queue_spotify_tracks(&album.tracks).await;
                    responses::queueing_spotify_album(&album.name)
                }
                Err(err) => {
                    error!("Failed to fetch spotify album {}: {}", uri.id, err);
                    responses::LOOKUP_ERROR.to_string()
                }
            },
            SpotifyKind::Playlist if self.queue.is_priority() => {
                responses::PLAYLIST_ON_PRIORITY.to_string()
            }
            SpotifyKind::Playlist => match self.catalog.playlist(&uri.id).await {
                Ok(playlist) => {
                    self.queue_spotify_tracks(&playlist.tracks).await;
                    responses::queueing_spotify_playlist(&playlist.name)
                }
                Err(err) => {
                    error!("Failed to fetch spotify playlist {}: {}", uri.id, err);
                    responses::LOOKUP_ERROR.to_string()
                }
            },
            SpotifyKind::Track => match self.catalog.track(&uri.id).await {
                Ok(spotify_track) => match lookup_track(self.searcher, &spotify_track).await {
                    Some(track) => self.respond_to_play(track).await?,
                    None => responses::NO_YOUTUBE_EQUIVALENT.to_string(),
                },
                Err(err) => {
                    error!("Failed to fetch spotify track {}: {}", uri.id, err);
                    responses::LOOKUP_ERROR.to_string()
                }
            },
            SpotifyKind::Other(kind) => {
                debug!("Unsupported spotify link kind '{}'", kind);
                responses::UNSUPPORTED_SPOTIFY_LINK.to_string()
            }
        };

        Ok(Resolution::Reply(reply))
    }

    /// Look every catalog track up on YouTube and append the matches.
    async fn queue_spotify_tracks(&self, tracks: &[SpotifyTrack]) -> usize {
        let mut queued = 0;

        for spotify_track in tracks {
            if let Some(track) = lookup_track(self.searcher, spotify_track).await {
                self.player
                    .lock()
                    .await
                    .enqueue(track.with_requester(self.requester));
                queued += 1;
            }
        }

        debug!("Queued {} of {} spotify tracks", queued, tracks.len());
        queued
    }

    /// Complete a selection from the search results.
    pub async fn choose(&self, tracks: &[Track], identifier: &str) -> MusicResult<String> {
        match tracks.iter().find(|track| track.identifier == identifier) {
            Some(track) => {
                debug!("Track selected: {}", track.title);
                self.respond_to_play(track.clone()).await
            }
            None => Ok(responses::TRACK_NOT_FOUND.to_string()),
        }
    }

    /// Place the track according to the queue type and describe the outcome.
    pub async fn respond_to_play(&self, track: Track) -> MusicResult<String> {
        let track = track.with_requester(self.requester);
        let title = track.title.clone();
        let mut player = self.player.lock().await;

        let reply = match self.queue {
            QueueType::Later => {
                let idle = player.is_idle();
                player.enqueue(track);
                if idle {
                    responses::now_playing(&title)
                } else {
                    responses::playing_later(&title)
                }
            }
            QueueType::Next => {
                let idle = player.is_idle();
                player.enqueue_next(track);
                if idle {
                    responses::now_playing(&title)
                } else {
                    responses::playing_next(&title)
                }
            }
            QueueType::Now => {
                player.play_now(track).await?;
                responses::now_playing(&title)
            }
        };

        Ok(reply)
    }
}

/// Find the YouTube equivalent of a catalog track.
pub async fn lookup_track(searcher: &dyn TrackSearch, spotify_track: &SpotifyTrack) -> Option<Track> {
    let query = spotify_track.youtube_query();

    match searcher.search(&query).await {
        SearchResult::Error(message) => {
            warn!("Lookup error for '{}': {}", query, message);
            None
        }
        SearchResult::Empty => {
            warn!("Lookup returned nothing for '{}'", query);
            None
        }
        SearchResult::Search(tracks) => tracks.into_iter().next(),
        SearchResult::Track(track) => Some(track),
        SearchResult::Playlist { .. } => None,
    }
}

/// Start playback when the player has nothing playing.
pub async fn start_if_idle(player: &Mutex<Player>) -> MusicResult<bool> {
    let mut player = player.lock().await;
    if !player.is_idle() {
        return Ok(false);
    }
    player.play().await
}
