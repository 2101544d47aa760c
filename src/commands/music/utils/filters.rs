//! Audio effect presets and the ffmpeg filter chain built from them.

use std::collections::BTreeSet;
use std::time::Duration;

/// A preset audio effect that can be layered on top of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, poise::ChoiceParameter)]
pub enum Effect {
    #[name = "nightcore"]
    Nightcore,
    #[name = "vaporwave"]
    Vaporwave,
    #[name = "bassboost"]
    Bassboost,
    #[name = "8d"]
    EightD,
    #[name = "karaoke"]
    Karaoke,
}

impl Effect {
    pub fn label(&self) -> &'static str {
        match self {
            Effect::Nightcore => "nightcore",
            Effect::Vaporwave => "vaporwave",
            Effect::Bassboost => "bassboost",
            Effect::EightD => "8d",
            Effect::Karaoke => "karaoke",
        }
    }

    /// The ffmpeg `-af` expression implementing this effect.
    pub fn filter_expression(&self) -> &'static str {
        match self {
            Effect::Nightcore => "asetrate=48000*1.25,aresample=48000,atempo=1.06",
            Effect::Vaporwave => "asetrate=48000*0.8,aresample=48000,atempo=1.1",
            Effect::Bassboost => "bass=g=10:f=110:w=0.6",
            Effect::EightD => "apulsator=hz=0.125",
            Effect::Karaoke => "stereotools=mlev=0.03",
        }
    }
}

/// The set of effects active on a player. Empty means unfiltered playback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    effects: BTreeSet<Effect>,
}

impl Filters {
    /// Add an effect, returning `false` when it was already active.
    pub fn insert(&mut self, effect: Effect) -> bool {
        self.effects.insert(effect)
    }

    pub fn contains(&self, effect: Effect) -> bool {
        self.effects.contains(&effect)
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn effects(&self) -> impl Iterator<Item = Effect> + '_ {
        self.effects.iter().copied()
    }

    /// Comma separated filter graph, or `None` when no effect is active.
    pub fn chain(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        Some(
            self.effects()
                .map(|effect| effect.filter_expression())
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// Arguments for an ffmpeg process reading the source on stdin and writing
    /// filtered 48kHz stereo mp3 to stdout.
    pub fn ffmpeg_args(&self, start_at: Option<Duration>) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-i", "pipe:0"]
            .into_iter()
            .map(String::from)
            .collect();

        // Placed after the input so the seek is exact
        if let Some(position) = start_at {
            args.push("-ss".to_string());
            args.push(format!("{:.3}", position.as_secs_f64()));
        }

        if let Some(chain) = self.chain() {
            args.push("-af".to_string());
            args.push(chain);
        }

        args.extend(
            ["-vn", "-f", "mp3", "-ar", "48000", "-ac", "2", "pipe:1"]
                .into_iter()
                .map(String::from),
        );
        args
    }
}
