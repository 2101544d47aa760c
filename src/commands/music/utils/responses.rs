//! Reply texts and the message components sent by the music commands.

use poise::CreateReply;
use serenity::all::{
    CreateActionRow, CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption, ReactionType,
};
use std::collections::HashSet;

use super::trim_ellipsis;
use crate::commands::music::audio_sources::Track;

pub const LOOKUP_ERROR: &str = "There was an error looking up the music. Please try again.";
pub const NO_MATCHES: &str = "No matches found!";
pub const PLAYLIST_ON_PRIORITY: &str = "Trying to load an entire playlist on priority is cheating.";
pub const ALBUM_ON_PRIORITY: &str = "Trying to load an entire album on priority is cheating.";
pub const TRACK_NOT_FOUND: &str = "Unable to find selected track.";
pub const SELECTION_CANCELLED: &str = "No music selected within a minute, cancelled.";
pub const NO_YOUTUBE_EQUIVALENT: &str = "Cannot find equivalent track on youtube.";
pub const UNSUPPORTED_SPOTIFY_LINK: &str = "Unsupported spotify link.";
pub const QUEUE_CLEARED: &str = "Queue cleared.";
pub const EFFECTS_CLEARED: &str = "Effects cleared.";

pub const SELECT_MUSIC_ID: &str = "select:music";
pub const SELECT_MUSIC_PLACEHOLDER: &str = "Please select music to play";

/// Discord limits for select menus.
const MAX_OPTIONS: usize = 25;
const MAX_OPTION_TEXT: usize = 100;

const PREFERRED_EMOJI: &str = "⭐";
const MUSIC_NOTE_EMOJI: &str = "🎵";

pub fn now_playing(title: &str) -> String {
    format!("Now playing `{}`.", title)
}

pub fn playing_later(title: &str) -> String {
    format!("Playing later `{}`.", title)
}

pub fn playing_next(title: &str) -> String {
    format!("Playing next `{}`.", title)
}

pub fn queueing_music_list(name: &str) -> String {
    format!("Queueing music list: `{}`.", name)
}

pub fn queueing_spotify_album(name: &str) -> String {
    format!("Queueing spotify album `{}`", name)
}

pub fn queueing_spotify_playlist(name: &str) -> String {
    format!("Queueing spotify playlist `{}`", name)
}

pub fn volume_set(volume: f64) -> String {
    format!("Volume set to `{}`.", volume)
}

pub fn effect_applied(name: &str) -> String {
    format!("Applied effect `{}`.", name)
}

pub fn effect_already_applied(name: &str) -> String {
    format!("Effect `{}` is already applied.", name)
}

/// An ephemeral text reply.
pub fn ephemeral(content: impl Into<String>) -> CreateReply {
    CreateReply::default().content(content).ephemeral(true)
}

/// A text reply that replaces the message and drops its components.
pub fn replace_components(content: impl Into<String>) -> CreateReply {
    ephemeral(content).components(vec![])
}

/// One option of the track selection menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub description: String,
    pub value: String,
    pub emoji: &'static str,
}

/// Channel and length of a track, as shown under its title.
fn describe(track: &Track) -> String {
    let Some(duration) = track.duration else {
        return track.author.clone();
    };

    let secs = duration.as_secs();
    let length = if secs >= 3600 {
        format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
    } else {
        format!("{}:{:02}", secs / 60, secs % 60)
    };

    if track.author.is_empty() {
        length
    } else {
        format!("{} · {}", track.author, length)
    }
}

/// Menu entries for the search results, best match first.
///
/// Duplicate identifiers are dropped since option values must be unique.
pub fn menu_entries(tracks: &[Track]) -> Vec<MenuEntry> {
    let mut seen = HashSet::new();

    tracks
        .iter()
        .filter(|track| seen.insert(track.identifier.clone()))
        .take(MAX_OPTIONS)
        .enumerate()
        .map(|(index, track)| MenuEntry {
            label: trim_ellipsis(&track.title, MAX_OPTION_TEXT),
            description: trim_ellipsis(&describe(track), MAX_OPTION_TEXT),
            value: track.identifier.clone(),
            emoji: if index == 0 {
                PREFERRED_EMOJI
            } else {
                MUSIC_NOTE_EMOJI
            },
        })
        .collect()
}

/// Ephemeral reply carrying the track selection menu.
pub fn track_select_menu(tracks: &[Track]) -> CreateReply {
    let options = menu_entries(tracks)
        .into_iter()
        .map(|entry| {
            let option = CreateSelectMenuOption::new(entry.label, entry.value)
                .emoji(ReactionType::Unicode(entry.emoji.to_string()));
            // Discord rejects empty descriptions
            if entry.description.is_empty() {
                option
            } else {
                option.description(entry.description)
            }
        })
        .collect();

    let menu = CreateSelectMenu::new(SELECT_MUSIC_ID, CreateSelectMenuKind::String { options })
        .placeholder(SELECT_MUSIC_PLACEHOLDER);

    CreateReply::default()
        .components(vec![CreateActionRow::SelectMenu(menu)])
        .ephemeral(true)
}
