//! Preconditions shared by every music command.

use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::music_manager::{MusicError, MusicResult, PlayerManager};
use super::player::Player;
use super::responses::ephemeral;
use crate::{CommandResult, Context};

/// What the gateway cache knows about the caller's voice state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceLookup {
    /// The guild is not in the cache, so voice states cannot be read.
    Unavailable,
    NotConnected,
    Connected(ChannelId),
}

/// Where a music command was invoked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceContext {
    pub guild_id: GuildId,
    /// The caller's voice channel.
    pub voice_channel: ChannelId,
    /// The channel the command was sent in.
    pub text_channel: ChannelId,
}

/// Apply the guards in order: guild, readable voice state, voice channel.
pub fn check_voice_context(
    guild_id: Option<GuildId>,
    voice: VoiceLookup,
    text_channel: ChannelId,
) -> MusicResult<VoiceContext> {
    let guild_id = guild_id.ok_or(MusicError::NotInGuild)?;

    let voice_channel = match voice {
        VoiceLookup::Unavailable => return Err(MusicError::NoVoiceState),
        VoiceLookup::NotConnected => return Err(MusicError::UserNotInVoiceChannel),
        VoiceLookup::Connected(channel_id) => channel_id,
    };

    Ok(VoiceContext {
        guild_id,
        voice_channel,
        text_channel,
    })
}

/// Run the voice guards against the invoking interaction.
pub fn voice_context(ctx: Context<'_>) -> MusicResult<VoiceContext> {
    let guild_id = ctx.guild_id();

    let voice = match ctx.guild() {
        Some(guild) => guild
            .voice_states
            .get(&ctx.author().id)
            .and_then(|state| state.channel_id)
            .map_or(VoiceLookup::NotConnected, VoiceLookup::Connected),
        None => VoiceLookup::Unavailable,
    };

    check_voice_context(guild_id, voice, ctx.channel_id())
}

/// Run the voice guards and fetch the guild's existing player.
pub fn active_player(ctx: Context<'_>) -> MusicResult<(VoiceContext, Arc<Mutex<Player>>)> {
    let voice = voice_context(ctx)?;
    let player = require_player(&ctx.data().players, voice.guild_id)?;

    Ok((voice, player))
}

/// The guild's player, or a rejection when nothing was ever played there.
pub fn require_player(players: &PlayerManager, guild_id: GuildId) -> MusicResult<Arc<Mutex<Player>>> {
    players.get(guild_id).ok_or(MusicError::NoPlayer)
}

/// Reply guard rejections to the caller; propagate anything else to the error handler.
pub async fn reject(ctx: Context<'_>, err: MusicError) -> CommandResult {
    if !err.is_rejection() {
        return Err(err.into());
    }

    ctx.send(ephemeral(err.to_string())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::music::utils::driver::MockVoiceGateway;
    use crate::commands::music::utils::player::PlayerOptions;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn manager() -> PlayerManager {
        PlayerManager::new(Arc::new(MockVoiceGateway::new()))
    }

    #[rstest]
    #[case(None, VoiceLookup::Connected(ChannelId::new(5)), "You are not in a guild.")]
    #[case(None, VoiceLookup::Unavailable, "You are not in a guild.")]
    #[case(
        Some(GuildId::new(1)),
        VoiceLookup::Unavailable,
        "Illegal attempt for a non gateway interaction request."
    )]
    #[case(
        Some(GuildId::new(1)),
        VoiceLookup::NotConnected,
        "You are not in a voice channel."
    )]
    fn test_guard_rejections(
        #[case] guild_id: Option<GuildId>,
        #[case] voice: VoiceLookup,
        #[case] message: &str,
    ) {
        let err = check_voice_context(guild_id, voice, ChannelId::new(9)).unwrap_err();

        assert!(err.is_rejection());
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_guards_pass() {
        let context = check_voice_context(
            Some(GuildId::new(1)),
            VoiceLookup::Connected(ChannelId::new(5)),
            ChannelId::new(9),
        );

        assert_matches!(
            context,
            Ok(VoiceContext {
                voice_channel,
                text_channel,
                ..
            }) if voice_channel == ChannelId::new(5) && text_channel == ChannelId::new(9)
        );
    }

    #[test]
    fn test_require_player_without_player() {
        let players = manager();

        let err = require_player(&players, GuildId::new(1)).unwrap_err();

        assert_matches!(err, MusicError::NoPlayer);
        assert!(err.is_rejection());
        assert_eq!(err.to_string(), "I am not playing anything.");
    }

    #[test]
    fn test_require_player_returns_existing() {
        let players = manager();
        let created = players.create(PlayerOptions {
            guild_id: GuildId::new(1),
            voice_channel: ChannelId::new(5),
            text_channel: ChannelId::new(9),
            volume: 100,
        });

        let found = require_player(&players, GuildId::new(1)).unwrap();

        assert!(Arc::ptr_eq(&created, &found));
        assert_matches!(require_player(&players, GuildId::new(2)), Err(MusicError::NoPlayer));
    }
}
