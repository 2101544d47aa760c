//! End-to-end flows through the public library API with mocked voice and search backends.

use crate::common::fixtures::{self, track};
use crate::common::mocks::{MockCatalog, MockDriver, MockSearcher, permissive_driver};
use crate::common::{gateway_with, manager_with, player_options};
use crate::test_utils;
use assert_matches::assert_matches;
use melody::commands::music::audio_sources::SearchResult;
use melody::commands::music::audio_sources::spotify::SpotifyApi;
use melody::commands::music::clear::{clear_effects, empty_queue};
use melody::commands::music::effect::apply_effect;
use melody::commands::music::utils::driver::PlayerEvent;
use melody::commands::music::utils::filters::Effect;
use melody::commands::music::utils::music_manager::MusicError;
use melody::commands::music::utils::play_requests::{
    PlayRequest, QueueType, Resolution, start_if_idle,
};
use melody::commands::music::volume::change_volume;
use pretty_assertions::assert_eq;
use serde_json::json;
use serenity::model::id::{GuildId, UserId};
use std::sync::Arc;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Tests a `/play later` on a fresh guild: connect, queue, start, then advance on track end.
#[tokio::test]
async fn test_play_later_then_track_end_advances() {
    // Arrange
    test_utils::init();
    let mut driver = MockDriver::new();
    driver
        .expect_play()
        .withf(|track, settings| track.identifier == "first" && settings.generation == 1)
        .times(1)
        .returning(|_, _| Ok(()));
    driver
        .expect_play()
        .withf(|track, settings| track.identifier == "second" && settings.generation == 2)
        .times(1)
        .returning(|_, _| Ok(()));
    let manager = manager_with(gateway_with(driver));
    let (events, receiver) = mpsc::unbounded_channel();
    let listener = manager.listen(receiver);

    let mut searcher = MockSearcher::new();
    searcher
        .expect_search()
        .withf(|query| query == "https://youtu.be/first")
        .returning(|_| SearchResult::Track(track("first")));
    searcher
        .expect_search()
        .withf(|query| query == "https://youtu.be/second")
        .returning(|_| SearchResult::Track(track("second")));
    let catalog = MockCatalog::new();

    let player = manager.create(player_options());
    manager.ensure_connected(&player, false).await.unwrap();
    let request = PlayRequest {
        searcher: &searcher,
        catalog: &catalog,
        player: &player,
        queue: QueueType::Later,
        requester: UserId::new(fixtures::USER_ID),
    };

    // Act
    let first = request.resolve("https://youtu.be/first").await.unwrap();
    start_if_idle(&player).await.unwrap();
    let second = request.resolve("https://youtu.be/second").await.unwrap();
    start_if_idle(&player).await.unwrap();

    events
        .send(PlayerEvent::TrackEnded {
            guild_id: GuildId::new(fixtures::GUILD_ID),
            generation: 1,
        })
        .unwrap();
    drop(events);
    listener.await.unwrap();

    // Assert
    assert_eq!(first, Resolution::Reply("Now playing `Title first`.".into()));
    assert_eq!(second, Resolution::Reply("Playing later `Title second`.".into()));
    let player = player.lock().await;
    assert_eq!(player.current().map(|t| t.identifier.as_str()), Some("second"));
    assert_eq!(player.previous().map(|t| t.identifier.as_str()), Some("first"));
    assert_eq!(player.current().and_then(|t| t.requester), Some(UserId::new(fixtures::USER_ID)));
}

/// Tests that a Spotify album link is fetched from the Web API and matched on YouTube.
#[tokio::test]
async fn test_spotify_album_is_queued() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::token_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/albums/4aawyAB9vmqN3uQ7FjRGTy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Global Warming",
            "tracks": {
                "items": [
                    {"id": "1", "name": "Global Warming", "artists": [{"name": "Pitbull"}]},
                    {"id": "2", "name": "Feel This Moment", "artists": [{"name": "Pitbull"}, {"name": "Christina Aguilera"}]}
                ],
                "next": null
            }
        })))
        .mount(&server)
        .await;
    let catalog = SpotifyApi::new(reqwest::Client::new(), &fixtures::config_for(&server.uri()));

    let mut searcher = MockSearcher::new();
    searcher
        .expect_search()
        .withf(|query| query == "Global Warming Pitbull")
        .returning(|_| SearchResult::Search(vec![track("gw"), track("other")]));
    searcher
        .expect_search()
        .withf(|query| query == "Feel This Moment Pitbull Christina Aguilera")
        .returning(|_| SearchResult::Search(vec![track("ftm")]));

    let manager = manager_with(gateway_with(permissive_driver()));
    let player = manager.create(player_options());
    manager.ensure_connected(&player, true).await.unwrap();
    let request = PlayRequest {
        searcher: &searcher,
        catalog: &catalog,
        player: &player,
        queue: QueueType::Later,
        requester: UserId::new(fixtures::USER_ID),
    };

    // Act
    let resolution = request
        .resolve("https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy?si=abc")
        .await
        .unwrap();
    let started = start_if_idle(&player).await.unwrap();

    // Assert
    assert_eq!(
        resolution,
        Resolution::Reply("Queueing spotify album `Global Warming`".into())
    );
    assert!(started);
    let player = player.lock().await;
    assert_eq!(player.current().map(|t| t.identifier.as_str()), Some("gw"));
    assert_eq!(player.queue().len(), 1);
    assert_eq!(player.queue()[0].identifier, "ftm");
}

/// Tests that a Spotify outage is answered with the generic lookup error.
#[tokio::test]
async fn test_spotify_outage_replies_lookup_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let catalog = SpotifyApi::new(reqwest::Client::new(), &fixtures::config_for(&server.uri()));
    let searcher = MockSearcher::new();
    let manager = manager_with(gateway_with(permissive_driver()));
    let player = manager.create(player_options());
    manager.ensure_connected(&player, false).await.unwrap();

    let resolution = PlayRequest {
        searcher: &searcher,
        catalog: &catalog,
        player: &player,
        queue: QueueType::Now,
        requester: UserId::new(fixtures::USER_ID),
    }
    .resolve("spotify:track:6rqhFgbbKwnb9MLmUQDhG6")
    .await
    .unwrap();

    assert_eq!(
        resolution,
        Resolution::Reply("There was an error looking up the music. Please try again.".into())
    );
}

/// Tests volume, effects and queue clearing on a playing guild.
#[tokio::test]
async fn test_player_controls() {
    // Arrange
    let manager = manager_with(gateway_with(permissive_driver()));
    let player = manager.create(player_options());
    manager.ensure_connected(&player, false).await.unwrap();
    {
        let mut player = player.lock().await;
        player.enqueue(track("a"));
        player.enqueue(track("b"));
        player.play().await.unwrap();
    }

    // Act & Assert
    assert_eq!(change_volume(&player, 30.0).await.unwrap(), "Volume set to `30`.");
    assert_matches!(
        change_volume(&player, 130.0).await,
        Err(MusicError::VolumeTooHigh)
    );
    assert_eq!(player.lock().await.volume(), 30);

    assert_eq!(
        apply_effect(&player, Effect::Nightcore).await.unwrap(),
        "Applied effect `nightcore`."
    );
    clear_effects(&player).await.unwrap();
    assert!(player.lock().await.filters().is_empty());

    assert_eq!(empty_queue(&player).await, 1);
    assert!(player.lock().await.queue().is_empty());
}

/// Tests that destroying a guild's player leaves voice and a new player can be created.
#[tokio::test]
async fn test_destroy_then_recreate() {
    let mut gateway = gateway_with(permissive_driver());
    gateway.expect_disconnect().times(1).returning(|_| Ok(()));
    let manager = manager_with(gateway);
    let player = manager.create(player_options());
    manager.ensure_connected(&player, false).await.unwrap();

    manager.destroy(GuildId::new(fixtures::GUILD_ID)).await;
    let recreated = manager.create(player_options());

    assert!(!recreated.lock().await.is_connected());
    assert!(!Arc::ptr_eq(&player, &recreated));
    assert!(player.lock().await.is_idle());
    assert_eq!(manager.len(), 1);
}
