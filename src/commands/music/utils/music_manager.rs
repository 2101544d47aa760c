use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc::UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::driver::{PlayerEvent, VoiceGateway};
use super::player::{Player, PlayerOptions};

/// Errors that can occur during music operations.
///
/// The first group are rejections shown verbatim to the invoking user.
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("You are not in a guild.")]
    NotInGuild,

    #[error("Illegal attempt for a non gateway interaction request.")]
    NoVoiceState,

    #[error("You are not in a voice channel.")]
    UserNotInVoiceChannel,

    #[error("I am not playing anything.")]
    NoPlayer,

    #[error("Volume should not be greater than 100.")]
    VolumeTooHigh,

    #[error("Volume should not be less than zero.")]
    VolumeTooLow,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Playback error: {0}")]
    PlaybackError(String),

    #[error("Invalid Spotify link: {0}")]
    InvalidSpotifyUri(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl MusicError {
    /// Whether the error is a guard rejection meant to be replied to the user as-is.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            MusicError::NotInGuild
                | MusicError::NoVoiceState
                | MusicError::UserNotInVoiceChannel
                | MusicError::NoPlayer
                | MusicError::VolumeTooHigh
                | MusicError::VolumeTooLow
        )
    }
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Registry of per-guild players.
pub struct PlayerManager {
    players: DashMap<GuildId, Arc<Mutex<Player>>>,
    gateway: Arc<dyn VoiceGateway>,
}

impl PlayerManager {
    pub fn new(gateway: Arc<dyn VoiceGateway>) -> Self {
        Self {
            players: DashMap::new(),
            gateway,
        }
    }

    /// Get the player for this guild, if one was created
    pub fn get(&self, guild_id: GuildId) -> Option<Arc<Mutex<Player>>> {
        self.players
            .get(&guild_id)
            .map(|player| Arc::clone(player.value()))
    }

    /// Get the existing player for the guild or create a new, unconnected one.
    pub fn create(&self, options: PlayerOptions) -> Arc<Mutex<Player>> {
        let guild_id = options.guild_id;
        let player = self.players.entry(guild_id).or_insert_with(|| {
            info!("Creating player for guild {}", guild_id);
            Arc::new(Mutex::new(Player::new(options)))
        });

        Arc::clone(player.value())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Connect the player to its voice channel unless it already is.
    ///
    /// A player that fails to connect is dropped from the registry.
    pub async fn ensure_connected(
        &self,
        player: &Mutex<Player>,
        self_mute: bool,
    ) -> MusicResult<()> {
        let mut player = player.lock().await;
        if player.is_connected() {
            return Ok(());
        }

        if let Err(err) = player.connect(self.gateway.as_ref(), self_mute).await {
            error!(
                "Failed to connect player for guild {}: {}",
                player.guild_id(),
                err
            );
            self.players.remove(&player.guild_id());
            return Err(err);
        }

        Ok(())
    }

    /// Stop and forget the guild's player, leaving the voice channel.
    pub async fn destroy(&self, guild_id: GuildId) {
        let Some((_, player)) = self.players.remove(&guild_id) else {
            return;
        };

        info!("Destroying player for guild {}", guild_id);
        player.lock().await.stop().await;

        if let Err(err) = self.gateway.disconnect(guild_id).await {
            debug!("Voice disconnect for guild {}: {}", guild_id, err);
        }
    }

    pub async fn handle_event(&self, event: PlayerEvent) {
        match event {
            PlayerEvent::TrackEnded {
                guild_id,
                generation,
            } => {
                let Some(player) = self.get(guild_id) else {
                    debug!("Track ended for guild {} without a player", guild_id);
                    return;
                };

                let mut player = player.lock().await;
                if let Err(err) = player.handle_track_end(generation).await {
                    error!("Failed to advance queue for guild {}: {}", guild_id, err);
                }
            }
        }
    }

    /// Spawn the loop feeding track events from the voice driver back into the players.
    pub fn listen(self: &Arc<Self>, mut events: UnboundedReceiver<PlayerEvent>) -> JoinHandle<()> {
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                manager.handle_event(event).await;
            }
            info!("Player event loop finished");
        })
    }
}
