//! Beat clock and call-and-response turn engine for a lane-based
//! rhythm-action game. Hosts plug in audio and visuals through the traits in
//! [`crate::core`] and drive a [`game::session::GameSession`] once per frame.

pub mod autoplay;
pub mod config;
pub mod core;
pub mod game;

pub use crate::core::audio::{AudioPlayback, SoundId};
pub use crate::core::visual::VisualPresentation;
pub use crate::game::judgment::{HitTiming, Judgment, MissReason};
pub use crate::game::session::{GameSession, SessionEvent, SessionSettings};
pub use crate::game::symbol::{Pattern, Symbol};
pub use crate::game::target::TargetPolicy;
