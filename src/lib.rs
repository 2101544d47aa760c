//! Slash-command music bot.
//!
//! Commands validate the caller's voice state, resolve YouTube or Spotify queries
//! into playable tracks and drive a per-guild player backed by songbird.

use std::sync::{Arc, LazyLock};

use songbird::Songbird;
use tokio::sync::mpsc;

pub mod commands;
pub mod config;
pub mod events;

use commands::music::audio_sources::{
    TrackSearch,
    spotify::{MusicCatalog, SpotifyApi},
    youtube::YtDlp,
};
use commands::music::utils::{driver::SongbirdGateway, music_manager::PlayerManager};
use config::Config;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// Shared HTTP client for every outgoing request (Spotify, suggestions, audio streams).
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub players: Arc<PlayerManager>,
    pub searcher: Arc<dyn TrackSearch>,
    pub catalog: Arc<dyn MusicCatalog>,
    pub config: Config,
}

impl Data {
    /// Wires the songbird-backed player registry, the yt-dlp searcher and the Spotify client.
    ///
    /// Must be called from within the tokio runtime: the registry's track event loop is
    /// spawned here.
    pub fn new(config: Config, songbird: Arc<Songbird>) -> Self {
        let (events, receiver) = mpsc::unbounded_channel();
        let gateway = SongbirdGateway::new(songbird, events, &config);

        let players = Arc::new(PlayerManager::new(Arc::new(gateway)));
        players.listen(receiver);

        Self {
            players,
            searcher: Arc::new(YtDlp::new(&config)),
            catalog: Arc::new(SpotifyApi::new(HTTP_CLIENT.clone(), &config)),
            config,
        }
    }
}
