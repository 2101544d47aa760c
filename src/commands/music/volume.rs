//! Defines the `/volume` command.

use super::*;
use crate::commands::music::utils::{
    guards::{active_player, reject},
    music_manager::{MusicError, MusicResult},
    player::Player,
    responses::{self, ephemeral},
};
use tokio::sync::Mutex;
use tracing::info;

/// Change the volume of the music player.
#[poise::command(slash_command, category = "Music")]
pub async fn volume(
    ctx: Context<'_>,
    #[description = "The volume from 0 to 100."] volume: f64,
) -> CommandResult {
    let player = match active_player(ctx) {
        Ok((_, player)) => player,
        Err(err) => return reject(ctx, err).await,
    };

    match change_volume(&player, volume).await {
        Ok(reply) => {
            ctx.send(ephemeral(reply)).await?;
            Ok(())
        }
        Err(err) => reject(ctx, err).await,
    }
}

/// Check the requested volume and convert it to a whole percentage.
pub fn validate_volume(volume: f64) -> MusicResult<u8> {
    if volume > 100.0 {
        return Err(MusicError::VolumeTooHigh);
    }
    if volume < 0.0 || volume.is_nan() {
        return Err(MusicError::VolumeTooLow);
    }

    Ok(volume.round() as u8)
}

/// Apply a validated volume to the player and build the reply.
pub async fn change_volume(player: &Mutex<Player>, volume: f64) -> MusicResult<String> {
    let level = validate_volume(volume)?;

    let mut player = player.lock().await;
    player.set_volume(level).await?;
    info!("Volume set to {} in guild {}", level, player.guild_id());

    Ok(responses::volume_set(volume))
}
