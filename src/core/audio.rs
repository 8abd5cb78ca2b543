use crate::game::symbol::Symbol;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Sounds the turn engine may ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundId {
    /// Whole-pattern voice clip, addressed by the 1-based pattern id.
    Pattern(usize),
    /// Monster voice for a single prompt symbol.
    Voice(Symbol),
    /// Player feedback for a pressed command key.
    Key(Symbol),
    /// The "go" signal that opens the player's turn.
    Cue,
    Spawn,
}

impl SoundId {
    /// Key used in the `[sounds]` config section.
    pub fn bank_key(self) -> String {
        match self {
            SoundId::Pattern(id) => format!("pattern{}", id),
            SoundId::Voice(s) => format!("voice_{}", s.key_name()),
            SoundId::Key(s) => format!("key_{}", s.key_name()),
            SoundId::Cue => "cue".to_string(),
            SoundId::Spawn => "spawn".to_string(),
        }
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bank_key())
    }
}

/// Fire-and-forget playback capability.
pub trait AudioPlayback {
    fn play_one_shot(&mut self, sound: SoundId);
    fn stop_current(&mut self);
}

// --- Sound bank ---

/// Maps sound ids to asset paths. Lookups that miss are reported once and
/// otherwise ignored.
#[derive(Debug, Default, Clone)]
pub struct SoundBank {
    paths: HashMap<String, String>,
    reported_missing: HashSet<String>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, path: impl Into<String>) {
        self.paths.insert(key.into().to_ascii_lowercase(), path.into());
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn resolve(&mut self, sound: SoundId) -> Option<&str> {
        let key = sound.bank_key();
        if !self.paths.contains_key(&key) {
            if self.reported_missing.insert(key.clone()) {
                warn!("No asset mapped for sound '{}'; it will be skipped.", key);
            }
            return None;
        }
        self.paths.get(&key).map(String::as_str)
    }
}

/// Playback backend that only logs what it would play. Used by the headless
/// driver and any host without an audio device.
#[derive(Debug, Default)]
pub struct LoggingAudio {
    bank: SoundBank,
    played: usize,
}

impl LoggingAudio {
    pub fn new(bank: SoundBank) -> Self {
        Self { bank, played: 0 }
    }

    pub fn played(&self) -> usize {
        self.played
    }
}

impl AudioPlayback for LoggingAudio {
    fn play_one_shot(&mut self, sound: SoundId) {
        if let Some(path) = self.bank.resolve(sound) {
            debug!("SFX {} -> {}", sound, path);
            self.played += 1;
        }
    }

    fn stop_current(&mut self) {
        debug!("SFX stop");
    }
}

/// Keeps every request, in order. Useful for tests and replays.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingAudio {
    pub played: Vec<SoundId>,
    pub stops: usize,
}

impl RecordingAudio {
    pub fn count(&self, sound: SoundId) -> usize {
        self.played.iter().filter(|s| **s == sound).count()
    }
}

impl AudioPlayback for RecordingAudio {
    fn play_one_shot(&mut self, sound: SoundId) {
        self.played.push(sound);
    }

    fn stop_current(&mut self) {
        self.stops += 1;
    }
}
