//! Defines the `/effect` command layering audio presets on top of playback.

use super::*;
use crate::commands::music::utils::{
    filters::Effect,
    guards::{active_player, reject},
    music_manager::MusicResult,
    player::Player,
    responses::{self, ephemeral},
};
use tokio::sync::Mutex;
use tracing::info;

/// Apply an audio effect to the music.
#[poise::command(slash_command, category = "Music")]
pub async fn effect(
    ctx: Context<'_>,
    #[description = "The effect to apply."] preset: Effect,
) -> CommandResult {
    let player = match active_player(ctx) {
        Ok((_, player)) => player,
        Err(err) => return reject(ctx, err).await,
    };

    let reply = apply_effect(&player, preset).await?;
    ctx.send(ephemeral(reply)).await?;
    Ok(())
}

pub async fn apply_effect(player: &Mutex<Player>, effect: Effect) -> MusicResult<String> {
    let mut player = player.lock().await;

    if !player.apply_effect(effect).await? {
        return Ok(responses::effect_already_applied(effect.label()));
    }

    info!("Applied {} in guild {}", effect.label(), player.guild_id());
    Ok(responses::effect_applied(effect.label()))
}
