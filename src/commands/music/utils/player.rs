use serenity::model::id::{ChannelId, GuildId};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::commands::music::audio_sources::Track;

use super::driver::{AudioDriver, PlaybackSettings, VoiceGateway};
use super::filters::{Effect, Filters};
use super::music_manager::{MusicError, MusicResult};

/// Options used when a guild's player is first created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerOptions {
    pub guild_id: GuildId,
    pub voice_channel: ChannelId,
    pub text_channel: ChannelId,
    pub volume: u8,
}

/// Playback state of a single guild.
pub struct Player {
    guild_id: GuildId,
    voice_channel: ChannelId,
    text_channel: ChannelId,
    driver: Option<Arc<dyn AudioDriver>>,
    queue: VecDeque<Track>,
    current: Option<Track>,
    previous: Option<Track>,
    volume: u8,
    filters: Filters,
    /// Bumped on every started track so end events of replaced tracks can be told apart.
    generation: u64,
}

// Tests format `Result<_, Player>` values; the driver trait object has no Debug.
#[cfg(test)]
impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("guild_id", &self.guild_id)
            .field("voice_channel", &self.voice_channel)
            .field("text_channel", &self.text_channel)
            .field("queue", &self.queue)
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("volume", &self.volume)
            .field("filters", &self.filters)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl Player {
    pub fn new(options: PlayerOptions) -> Self {
        Self {
            guild_id: options.guild_id,
            voice_channel: options.voice_channel,
            text_channel: options.text_channel,
            driver: None,
            queue: VecDeque::new(),
            current: None,
            previous: None,
            volume: options.volume.min(100),
            filters: Filters::default(),
            generation: 0,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    /// Join the player's voice channel.
    pub async fn connect(&mut self, gateway: &dyn VoiceGateway, self_mute: bool) -> MusicResult<()> {
        let driver = gateway
            .connect(self.guild_id, self.voice_channel, self_mute)
            .await?;
        debug!(
            "Player for guild {} connected to {}, bound to text channel {}",
            self.guild_id, self.voice_channel, self.text_channel
        );
        self.attach(driver);
        Ok(())
    }

    /// Use `driver` for every following track.
    pub fn attach(&mut self, driver: Arc<dyn AudioDriver>) {
        self.driver = Some(driver);
    }

    /// Nothing is playing.
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Track> {
        self.previous.as_ref()
    }

    /// Upcoming tracks, next first.
    pub fn queue(&self) -> &VecDeque<Track> {
        &self.queue
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn enqueue(&mut self, track: Track) {
        self.queue.push_back(track);
    }

    pub fn enqueue_next(&mut self, track: Track) {
        self.queue.push_front(track);
    }

    /// Drop every upcoming track, returning how many were removed.
    pub fn clear_queue(&mut self) -> usize {
        let removed = self.queue.len();
        self.queue.clear();
        removed
    }

    /// Start the next queued track if nothing is playing.
    ///
    /// Tracks that fail to start are dropped and the following one is tried.
    /// Returns whether a track was started.
    pub async fn play(&mut self) -> MusicResult<bool> {
        if !self.is_idle() {
            return Ok(false);
        }
        if self.driver.is_none() {
            return Err(MusicError::NotConnected);
        }

        while let Some(track) = self.queue.pop_front() {
            let title = track.title.clone();
            match self.start(track, None).await {
                Ok(()) => return Ok(true),
                Err(err) => warn!("Skipping '{}' in guild {}: {}", title, self.guild_id, err),
            }
        }

        Ok(false)
    }

    /// Interrupt the current track with `track`. The interrupted track goes back to the
    /// front of the queue.
    pub async fn play_now(&mut self, track: Track) -> MusicResult<()> {
        let interrupted = self.current.take();

        if let Err(err) = self.start(track, None).await {
            self.current = interrupted;
            return Err(err);
        }

        if let Some(track) = interrupted {
            self.queue.push_front(track);
        }
        Ok(())
    }

    /// Advance the queue after the track started with `generation` finished.
    pub async fn handle_track_end(&mut self, generation: u64) -> MusicResult<()> {
        if generation != self.generation || self.current.is_none() {
            debug!(
                "Ignoring stale track end in guild {} (generation {}, current {})",
                self.guild_id, generation, self.generation
            );
            return Ok(());
        }

        self.previous = self.current.take();
        if !self.play().await? {
            info!("Queue finished in guild {}", self.guild_id);
        }
        Ok(())
    }

    /// Set the volume for the current and every following track.
    pub async fn set_volume(&mut self, volume: u8) -> MusicResult<()> {
        self.volume = volume.min(100);

        if let (Some(driver), Some(_)) = (&self.driver, &self.current) {
            driver.set_volume(self.volume).await?;
        }
        Ok(())
    }

    /// Add an effect, returning `false` when it was already active.
    pub async fn apply_effect(&mut self, effect: Effect) -> MusicResult<bool> {
        let previous = self.filters.clone();
        if !self.filters.insert(effect) {
            return Ok(false);
        }

        if let Err(err) = self.reapply_filters().await {
            self.filters = previous;
            return Err(err);
        }
        Ok(true)
    }

    pub async fn clear_filters(&mut self) -> MusicResult<()> {
        if self.filters.is_empty() {
            return Ok(());
        }

        let previous = self.filters.clone();
        self.filters.clear();
        if let Err(err) = self.reapply_filters().await {
            self.filters = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Restart the current track at its position with the current filter chain.
    async fn reapply_filters(&mut self) -> MusicResult<()> {
        let (Some(driver), Some(track)) = (self.driver.clone(), self.current.clone()) else {
            return Ok(());
        };

        let position = driver.position().await;
        self.start(track, position).await
    }

    /// Stop playback and forget the queue.
    pub async fn stop(&mut self) {
        self.queue.clear();
        self.current = None;
        self.generation += 1;

        if let Some(driver) = &self.driver {
            driver.stop().await;
        }
    }

    fn settings(&self, generation: u64, start_at: Option<Duration>) -> PlaybackSettings {
        PlaybackSettings {
            volume: self.volume,
            filters: self.filters.clone(),
            start_at,
            generation,
        }
    }

    async fn start(&mut self, track: Track, start_at: Option<Duration>) -> MusicResult<()> {
        let driver = self.driver.clone().ok_or(MusicError::NotConnected)?;
        let generation = self.generation + 1;

        driver
            .play(&track, self.settings(generation, start_at))
            .await?;

        info!("Playing '{}' in guild {}", track.title, self.guild_id);
        self.generation = generation;
        self.current = Some(track);
        Ok(())
    }
}
