use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::{SerenityInit, Songbird};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use melody::{
    Data, Error,
    commands::{
        general::help::{help, register},
        music::{clear::clear, effect::effect, play::play, volume::volume},
    },
    config::Config,
    events::event_handler,
};

/// Log command failures, then let poise report them to the user.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    if let poise::FrameworkError::Command { error, ctx, .. } = &error {
        error!("Command '{}' failed: {}", ctx.command().qualified_name, error);
    }

    if let Err(e) = poise::builtins::on_error(error).await {
        error!("Error while handling error: {}", e);
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("melody=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Config::from_env()?;
    if config.is_development() {
        info!("Running in development mode, joining voice channels muted");
    }

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        // Default commands
        register(),
        help(),
        // Music commands
        play(),
        clear(),
        volume(),
        effect(),
    ];

    let songbird = Songbird::serenity();
    let token = config.discord_token.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup({
            let songbird = songbird.clone();
            move |ctx, ready, framework| {
                Box::pin(async move {
                    info!("Logged in as {}", ready.user.name);
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    Ok(Data::new(config, songbird))
                })
            }
        });

    let client_builder = ClientBuilder::new(token, intents).framework(framework.build());

    let mut client = client_builder.register_songbird_with(songbird).await?;
    client.start().await.map_err(Into::into)
}
