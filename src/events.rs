//! Gateway events the music player reacts to.

use poise::serenity_prelude as serenity;
use tracing::info;

use crate::{Data, Error};

/// Framework event handler: forget a guild's player once the bot is no longer in voice.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::VoiceStateUpdate { old, new } = event {
        let Some(guild_id) = new.guild_id else {
            return Ok(());
        };

        let left = new.user_id == ctx.cache.current_user().id && new.channel_id.is_none();
        let was_connected = old.as_ref().is_none_or(|state| state.channel_id.is_some());

        if left && was_connected && data.players.get(guild_id).is_some() {
            info!("Left voice in guild {}, destroying player", guild_id);
            data.players.destroy(guild_id).await;
        }
    }

    Ok(())
}
