pub mod clear;
pub mod effect;
pub mod play;
pub mod volume;

pub mod audio_sources;
pub mod utils;

use crate::{CommandResult, Context};
