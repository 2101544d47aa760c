//! Defines the `/play` command and the autocompletion of its query.

use super::*;
use crate::HTTP_CLIENT;
use crate::commands::music::audio_sources::Track;
use crate::commands::music::utils::{
    guards::{reject, voice_context},
    play_requests::{PlayRequest, QueueType, Resolution, start_if_idle},
    player::PlayerOptions,
    responses::{self, SELECT_MUSIC_ID, ephemeral, replace_components, track_select_menu},
    suggestions::fetch_suggestions,
};
use futures::Stream;
use poise::serenity_prelude as serenity;
use serenity::{ComponentInteractionDataKind, CreateInteractionResponse};
use tracing::{debug, error, warn};

/// Play music.
#[poise::command(
    slash_command,
    subcommands("play_later", "play_next", "play_now"),
    subcommand_required,
    category = "Music"
)]
pub async fn play(_: Context<'_>) -> CommandResult {
    Ok(())
}

/// Play the music later in the music queue.
#[poise::command(slash_command, rename = "later")]
pub async fn play_later(
    ctx: Context<'_>,
    #[description = "The music or url you want to play."]
    #[autocomplete = "autocomplete_query"]
    query: String,
) -> CommandResult {
    play_music(ctx, query, QueueType::Later).await
}

/// Play the music next in the music queue.
#[poise::command(slash_command, rename = "next")]
pub async fn play_next(
    ctx: Context<'_>,
    #[description = "The music or url you want to play."]
    #[autocomplete = "autocomplete_query"]
    query: String,
) -> CommandResult {
    play_music(ctx, query, QueueType::Next).await
}

/// Play the music immediately.
#[poise::command(slash_command, rename = "now")]
pub async fn play_now(
    ctx: Context<'_>,
    #[description = "The music or url you want to play."]
    #[autocomplete = "autocomplete_query"]
    query: String,
) -> CommandResult {
    play_music(ctx, query, QueueType::Now).await
}

async fn play_music(ctx: Context<'_>, query: String, queue: QueueType) -> CommandResult {
    let voice = match voice_context(ctx) {
        Ok(voice) => voice,
        Err(err) => return reject(ctx, err).await,
    };

    // Passed the guards, lookups may take a while
    ctx.defer_ephemeral().await?;
    debug!("Play command, queue type: {}", queue);

    let data = ctx.data();
    let player = data.players.create(PlayerOptions {
        guild_id: voice.guild_id,
        voice_channel: voice.voice_channel,
        text_channel: voice.text_channel,
        volume: data.config.default_volume,
    });

    if let Err(err) = data
        .players
        .ensure_connected(&player, data.config.is_development())
        .await
    {
        ctx.send(ephemeral(err.to_string())).await?;
        return Ok(());
    }

    let request = PlayRequest {
        searcher: data.searcher.as_ref(),
        catalog: data.catalog.as_ref(),
        player: &player,
        queue,
        requester: ctx.author().id,
    };

    match request.resolve(&query).await? {
        Resolution::Reply(content) => {
            ctx.send(replace_components(content)).await?;
        }
        Resolution::Choose(tracks) => select_track(ctx, &request, &tracks).await?,
    }

    if let Err(err) = start_if_idle(&player).await {
        error!("Failed to start playback in guild {}: {}", voice.guild_id, err);
    }

    Ok(())
}

/// Let the caller pick one of the search results from a select menu.
async fn select_track(ctx: Context<'_>, request: &PlayRequest<'_>, tracks: &[Track]) -> CommandResult {
    let handle = ctx.send(track_select_menu(tracks)).await?;
    let message_id = handle.message().await?.id;

    let selection = serenity::ComponentInteractionCollector::new(ctx.serenity_context())
        .author_id(ctx.author().id)
        .message_id(message_id)
        .custom_ids(vec![SELECT_MUSIC_ID.to_string()])
        .timeout(ctx.data().config.selection_timeout)
        .await;

    let Some(interaction) = selection else {
        debug!("Track selection timed out for {}", ctx.author().name);
        handle
            .edit(ctx, replace_components(responses::SELECTION_CANCELLED))
            .await?;
        return Ok(());
    };

    interaction
        .create_response(ctx.serenity_context(), CreateInteractionResponse::Acknowledge)
        .await?;

    let selected = match &interaction.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => values.first().cloned(),
        _ => None,
    };

    let content = match selected {
        Some(identifier) => request.choose(tracks, &identifier).await?,
        None => responses::TRACK_NOT_FOUND.to_string(),
    };

    handle.edit(ctx, replace_components(content)).await?;
    Ok(())
}

/// Suggests YouTube searches for the partially typed query.
async fn autocomplete_query<'a>(ctx: Context<'_>, partial: &'a str) -> impl Stream<Item = String> + 'a {
    let suggestions = match fetch_suggestions(&HTTP_CLIENT, &ctx.data().config.suggest_url, partial).await {
        Ok(suggestions) => suggestions,
        Err(err) => {
            warn!("Autocomplete for '{}' failed: {}", partial, err);
            Vec::new()
        }
    };

    futures::stream::iter(suggestions)
}
