pub mod audio;
pub mod clock;
pub mod input;
pub mod space;
pub mod visual;

use audio::AudioPlayback;
use visual::VisualPresentation;

/// Side-effect sinks handed to the game logic for one call.
pub struct Effects<'a> {
    pub audio: &'a mut dyn AudioPlayback,
    pub visual: &'a mut dyn VisualPresentation,
}

impl<'a> Effects<'a> {
    pub fn new(audio: &'a mut dyn AudioPlayback, visual: &'a mut dyn VisualPresentation) -> Self {
        Self { audio, visual }
    }
}
