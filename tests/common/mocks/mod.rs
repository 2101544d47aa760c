//! Mock implementations for the bot's external seams
//! This module contains mock objects used for testing

use async_trait::async_trait;
use melody::commands::music::audio_sources::spotify::{
    MusicCatalog, SpotifyAlbum, SpotifyPlaylist, SpotifyTrack,
};
use melody::commands::music::audio_sources::{SearchResult, Track, TrackSearch};
use melody::commands::music::utils::driver::{AudioDriver, PlaybackSettings, VoiceGateway};
use melody::commands::music::utils::music_manager::MusicResult;
use mockall::mock;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Searcher {}

    #[async_trait]
    impl TrackSearch for Searcher {
        async fn search(&self, query: &str) -> SearchResult;
    }
}

mock! {
    pub Catalog {}

    #[async_trait]
    impl MusicCatalog for Catalog {
        async fn track(&self, id: &str) -> MusicResult<SpotifyTrack>;
        async fn album(&self, id: &str) -> MusicResult<SpotifyAlbum>;
        async fn playlist(&self, id: &str) -> MusicResult<SpotifyPlaylist>;
    }
}

mock! {
    pub Driver {}

    #[async_trait]
    impl AudioDriver for Driver {
        async fn play(&self, track: &Track, settings: PlaybackSettings) -> MusicResult<()>;
        async fn set_volume(&self, volume: u8) -> MusicResult<()>;
        async fn position(&self) -> Option<Duration>;
        async fn stop(&self);
    }
}

mock! {
    pub Gateway {}

    #[async_trait]
    impl VoiceGateway for Gateway {
        async fn connect(
            &self,
            guild_id: GuildId,
            channel_id: ChannelId,
            self_mute: bool,
        ) -> MusicResult<Arc<dyn AudioDriver>>;
        async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()>;
    }
}

/// A driver accepting any number of tracks.
pub fn permissive_driver() -> MockDriver {
    let mut driver = MockDriver::new();
    driver.expect_play().returning(|_, _| Ok(()));
    driver.expect_set_volume().returning(|_| Ok(()));
    driver.expect_position().returning(|| None);
    driver.expect_stop().returning(|| ());
    driver
}
