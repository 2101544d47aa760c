//! Common test utilities, fixtures, and mocks
//! This module contains shared functionality used across different test categories

pub mod fixtures;
pub mod mocks;

use melody::commands::music::utils::driver::{AudioDriver, VoiceGateway};
use melody::commands::music::utils::music_manager::PlayerManager;
use melody::commands::music::utils::player::PlayerOptions;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;

use mocks::{MockDriver, MockGateway};

/// Options for a player in the fixture guild.
pub fn player_options() -> PlayerOptions {
    PlayerOptions {
        guild_id: GuildId::new(fixtures::GUILD_ID),
        voice_channel: ChannelId::new(fixtures::VOICE_CHANNEL_ID),
        text_channel: ChannelId::new(fixtures::TEXT_CHANNEL_ID),
        volume: 100,
    }
}

/// A gateway that hands out `driver` on the first connection.
pub fn gateway_with(driver: MockDriver) -> MockGateway {
    let driver: Arc<dyn AudioDriver> = Arc::new(driver);
    let mut gateway = MockGateway::new();
    gateway
        .expect_connect()
        .times(1)
        .return_once(move |_, _, _| Ok(driver));
    gateway
}

/// A registry backed by the mocked gateway.
pub fn manager_with(gateway: MockGateway) -> Arc<PlayerManager> {
    let gateway: Arc<dyn VoiceGateway> = Arc::new(gateway);
    Arc::new(PlayerManager::new(gateway))
}
