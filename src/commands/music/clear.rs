//! Defines the `/clear` command, resetting either the queue or the audio effects.

use super::*;
use crate::commands::music::utils::{
    guards::{active_player, reject},
    music_manager::MusicResult,
    player::Player,
    responses::{self, ephemeral},
};
use tokio::sync::Mutex;
use tracing::info;

/// Clear the music queue or effects.
#[poise::command(
    slash_command,
    subcommands("clear_effect", "clear_queue"),
    subcommand_required,
    category = "Music"
)]
pub async fn clear(_: Context<'_>) -> CommandResult {
    Ok(())
}

/// Clear all the effects applied to the music.
#[poise::command(slash_command, rename = "effect")]
pub async fn clear_effect(ctx: Context<'_>) -> CommandResult {
    let player = match active_player(ctx) {
        Ok((_, player)) => player,
        Err(err) => return reject(ctx, err).await,
    };

    clear_effects(&player).await?;
    ctx.send(ephemeral(responses::EFFECTS_CLEARED)).await?;
    Ok(())
}

/// Clear all the music in the queue.
#[poise::command(slash_command, rename = "queue")]
pub async fn clear_queue(ctx: Context<'_>) -> CommandResult {
    let player = match active_player(ctx) {
        Ok((_, player)) => player,
        Err(err) => return reject(ctx, err).await,
    };

    empty_queue(&player).await;
    ctx.send(ephemeral(responses::QUEUE_CLEARED)).await?;
    Ok(())
}

/// Remove every upcoming track, returning how many were dropped.
pub async fn empty_queue(player: &Mutex<Player>) -> usize {
    let mut player = player.lock().await;
    let removed = player.clear_queue();
    info!("Cleared {} queued tracks in guild {}", removed, player.guild_id());
    removed
}

/// Drop every active effect, restarting the current track unfiltered.
pub async fn clear_effects(player: &Mutex<Player>) -> MusicResult<()> {
    let mut player = player.lock().await;
    player.clear_filters().await?;
    info!("Cleared effects in guild {}", player.guild_id());
    Ok(())
}
