//! The seam between players and the voice connection.
//!
//! `VoiceGateway` joins voice channels and hands back an `AudioDriver` that plays one
//! track at a time. The songbird implementations live here as well; the track end
//! notifications they emit are routed back to the `PlayerManager` over a channel.

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::{ChildContainer, Input, YoutubeDl};
use songbird::tracks::{Track as SongbirdTrack, TrackHandle};
use songbird::{Call, Event, EventContext, Songbird, TrackEvent};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::HTTP_CLIENT;
use crate::commands::music::audio_sources::Track;
use crate::config::Config;

use super::filters::Filters;
use super::music_manager::{MusicError, MusicResult};

/// Everything the driver needs to start a track.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    /// Volume in percent (0-100).
    pub volume: u8,
    pub filters: Filters,
    /// Position to resume from, used when filters are re-applied.
    pub start_at: Option<Duration>,
    /// Player generation the track belongs to, echoed back on track end.
    pub generation: u64,
}

/// Notifications flowing from the voice driver back to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    TrackEnded { guild_id: GuildId, generation: u64 },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioDriver: Send + Sync {
    /// Replace whatever is playing with `track`.
    async fn play(&self, track: &Track, settings: PlaybackSettings) -> MusicResult<()>;

    async fn set_volume(&self, volume: u8) -> MusicResult<()>;

    /// Position within the playing track, if any.
    async fn position(&self) -> Option<Duration>;

    async fn stop(&self);
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        self_mute: bool,
    ) -> MusicResult<Arc<dyn AudioDriver>>;

    async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()>;
}

/// Convert a 0-100 volume into songbird's linear multiplier.
pub fn volume_ratio(volume: u8) -> f32 {
    f32::from(volume.min(100)) / 100.0
}

/// Joins voice channels through songbird.
pub struct SongbirdGateway {
    songbird: Arc<Songbird>,
    events: UnboundedSender<PlayerEvent>,
    ytdlp_path: &'static str,
    ffmpeg_path: String,
}

impl SongbirdGateway {
    pub fn new(songbird: Arc<Songbird>, events: UnboundedSender<PlayerEvent>, config: &Config) -> Self {
        Self {
            songbird,
            events,
            // songbird's yt-dlp input takes a static program name
            ytdlp_path: Box::leak(config.ytdlp_path.clone().into_boxed_str()),
            ffmpeg_path: config.ffmpeg_path.clone(),
        }
    }
}

#[async_trait]
impl VoiceGateway for SongbirdGateway {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        self_mute: bool,
    ) -> MusicResult<Arc<dyn AudioDriver>> {
        let call = self
            .songbird
            .join(guild_id, channel_id)
            .await
            .map_err(|e| MusicError::JoinError(e.to_string()))?;

        if self_mute {
            call.lock()
                .await
                .mute(true)
                .await
                .map_err(|e| MusicError::JoinError(e.to_string()))?;
        }

        info!(
            "Joined voice channel {} in guild {} (muted: {})",
            channel_id, guild_id, self_mute
        );

        Ok(Arc::new(SongbirdDriver {
            guild_id,
            call,
            current: Mutex::new(None),
            events: self.events.clone(),
            ytdlp_path: self.ytdlp_path,
            ffmpeg_path: self.ffmpeg_path.clone(),
        }))
    }

    async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()> {
        // Check if we're in a voice channel
        if self.songbird.get(guild_id).is_none() {
            return Err(MusicError::NotConnected);
        }

        self.songbird
            .remove(guild_id)
            .await
            .map_err(|e| MusicError::JoinError(format!("Failed to leave voice channel: {}", e)))
    }
}

/// Plays tracks on a single songbird call.
pub struct SongbirdDriver {
    guild_id: GuildId,
    call: Arc<SerenityMutex<Call>>,
    current: Mutex<Option<TrackHandle>>,
    events: UnboundedSender<PlayerEvent>,
    ytdlp_path: &'static str,
    ffmpeg_path: String,
}

impl SongbirdDriver {
    /// Build the audio input for a track.
    ///
    /// Unfiltered tracks stream straight through `YoutubeDl`; filtered ones go through a
    /// `yt-dlp | ffmpeg` pipeline carrying the filter chain.
    fn create_input(&self, track: &Track, filters: &Filters, start_at: Option<Duration>) -> MusicResult<Input> {
        if filters.is_empty() {
            return Ok(
                YoutubeDl::new_ytdl_like(self.ytdlp_path, HTTP_CLIENT.clone(), track.uri.clone()).into(),
            );
        }

        let mut ytdlp = Command::new(self.ytdlp_path)
            .args([
                "-f",
                "bestaudio/best",
                "--no-playlist",
                "--quiet",
                "-o",
                "-",
                &track.uri,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MusicError::PlaybackError(format!("Failed to spawn yt-dlp: {}", e)))?;

        let stream = ytdlp
            .stdout
            .take()
            .ok_or_else(|| MusicError::PlaybackError("yt-dlp has no output stream".to_string()))?;

        let ffmpeg = Command::new(&self.ffmpeg_path)
            .args(filters.ffmpeg_args(start_at))
            .stdin(Stdio::from(stream))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MusicError::PlaybackError(format!("Failed to spawn ffmpeg: {}", e)))?;

        Ok(ChildContainer::from(vec![ytdlp, ffmpeg]).into())
    }
}

#[async_trait]
impl AudioDriver for SongbirdDriver {
    async fn play(&self, track: &Track, settings: PlaybackSettings) -> MusicResult<()> {
        let input = self.create_input(track, &settings.filters, settings.start_at)?;
        let playable = SongbirdTrack::from(input).volume(volume_ratio(settings.volume));

        let handle = {
            let mut call = self.call.lock().await;
            call.play_only(playable)
        };

        let notifier = TrackEndNotifier {
            guild_id: self.guild_id,
            generation: settings.generation,
            events: self.events.clone(),
        };
        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(Event::Track(event), notifier.clone())
                .map_err(|e| MusicError::PlaybackError(e.to_string()))?;
        }

        // Filtered streams are already cut by ffmpeg
        if let (Some(position), true) = (settings.start_at, settings.filters.is_empty()) {
            let seek = handle.seek(position);
            let (title, guild_id) = (track.title.clone(), self.guild_id);
            tokio::spawn(async move {
                if let Err(err) = seek.result_async().await {
                    warn!(
                        "Failed to seek '{}' to {:?} in guild {}: {}",
                        title, position, guild_id, err
                    );
                }
            });
        }

        debug!(
            "Started '{}' in guild {} (generation {})",
            track.title, self.guild_id, settings.generation
        );
        *self.current.lock().await = Some(handle);

        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> MusicResult<()> {
        if let Some(handle) = self.current.lock().await.as_ref() {
            handle
                .set_volume(volume_ratio(volume))
                .map_err(|e| MusicError::PlaybackError(e.to_string()))?;
        }
        Ok(())
    }

    async fn position(&self) -> Option<Duration> {
        let handle = self.current.lock().await.clone()?;
        handle.get_info().await.ok().map(|state| state.position)
    }

    async fn stop(&self) {
        self.current.lock().await.take();
        self.call.lock().await.stop();
    }
}

/// Songbird event handler reporting the end of a track to the player registry
#[derive(Clone)]
struct TrackEndNotifier {
    guild_id: GuildId,
    generation: u64,
    events: UnboundedSender<PlayerEvent>,
}

#[async_trait]
impl songbird::EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(_) = ctx {
            let event = PlayerEvent::TrackEnded {
                guild_id: self.guild_id,
                generation: self.generation,
            };
            if self.events.send(event).is_err() {
                warn!("Player event loop is gone, dropping track end for guild {}", self.guild_id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_ratio() {
        assert_eq!(volume_ratio(100), 1.0);
        assert_eq!(volume_ratio(50), 0.5);
        assert_eq!(volume_ratio(0), 0.0);
        assert_eq!(volume_ratio(250), 1.0);
    }

    #[test]
    fn test_gateway_uses_configured_ytdlp() {
        let config = Config {
            ytdlp_path: "/opt/yt-dlp/bin/yt-dlp".into(),
            ffmpeg_path: "/opt/ffmpeg".into(),
            ..Config::default()
        };
        let (events, _receiver) = tokio::sync::mpsc::unbounded_channel();

        let gateway = SongbirdGateway::new(Songbird::serenity(), events, &config);

        assert_eq!(gateway.ytdlp_path, "/opt/yt-dlp/bin/yt-dlp");
        assert_eq!(gateway.ffmpeg_path, "/opt/ffmpeg");
    }
}
