//! Checks of the public helpers that commands build on.

use melody::commands::music::audio_sources::spotify::{SpotifyKind, SpotifyUri, is_spotify};
use melody::commands::music::utils::guards::{VoiceLookup, check_voice_context};
use melody::commands::music::utils::responses::{menu_entries, track_select_menu};
use melody::commands::music::utils::suggestions::parse_suggestions;
use melody::commands::music::utils::trim_ellipsis;
use melody::config::{Config, ConfigError};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serenity::model::id::{ChannelId, GuildId};
use test_case::test_case;

use crate::common::fixtures::track;

#[test_case("spotify:album:2up3OPMp9Tb4dAKM2erWXQ", SpotifyKind::Album ; "album uri")]
#[test_case("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M", SpotifyKind::Playlist ; "playlist link")]
#[test_case("https://open.spotify.com/show/5CfCWKI5pZ28U0uOzXkDHe", SpotifyKind::Other("show".into()) ; "podcast link")]
fn test_spotify_links(link: &str, kind: SpotifyKind) {
    assert!(is_spotify(link));
    assert_eq!(SpotifyUri::parse(link).unwrap().kind, kind);
}

#[rstest]
#[case(VoiceLookup::Unavailable, "Illegal attempt for a non gateway interaction request.")]
#[case(VoiceLookup::NotConnected, "You are not in a voice channel.")]
fn test_voice_guards(#[case] voice: VoiceLookup, #[case] expected: &str) {
    let err = check_voice_context(Some(GuildId::new(1)), voice, ChannelId::new(2)).unwrap_err();
    assert_eq!(err.to_string(), expected);
}

#[test]
fn test_select_menu_for_search_results() {
    let tracks = vec![track("a"), track("b"), track("c")];

    let entries = menu_entries(&tracks);
    let reply = track_select_menu(&tracks);

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].value, "a");
    assert_eq!(entries[2].description, "Channel c");
    assert_eq!(reply.ephemeral, Some(true));
    assert_eq!(reply.components.map(|rows| rows.len()), Some(1));
}

#[test]
fn test_suggestions_are_trimmed() {
    let long = "b".repeat(140);
    let body = format!(r#"window.google.ac.h(["b",[["{}",0,[512]]],{{}}])"#, long);

    let suggestions = parse_suggestions(&body);

    assert_eq!(suggestions, vec![trim_ellipsis(&long, 100)]);
}

#[test]
fn test_config_requires_token() {
    let result = Config::from_lookup(|_| None);
    assert_eq!(result.unwrap_err(), ConfigError::Missing("DISCORD_TOKEN"));
}
