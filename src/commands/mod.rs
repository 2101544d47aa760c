//! This module aggregates all the command modules for the bot.

/// Help and command registration.
pub mod general;
/// Commands related to music playback.
pub mod music;

use crate::{CommandResult, Context};
