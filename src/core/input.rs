use crate::game::symbol::Symbol;
use cgmath::Vector2;
use log::debug;
use std::collections::HashMap;

/// Everything the player can do in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerCommand {
    Press(Symbol),
    CycleNext,
    CyclePrev,
    /// Pointer click in world space.
    Pick(Vector2<f32>),
}

impl PlayerCommand {
    #[inline(always)]
    pub const fn is_selection(&self) -> bool {
        matches!(self, PlayerCommand::CycleNext | PlayerCommand::CyclePrev | PlayerCommand::Pick(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Controller,
    Pointer,
}

#[derive(Clone, Copy, Debug)]
pub struct CommandEdge {
    pub command: PlayerCommand,
    pub source: InputSource,
    /// Clock time the press happened, seconds.
    pub timestamp: f64,
}

/// Key-name → command bindings. Unknown keys are dropped here so the turn
/// engine only ever sees valid symbols.
#[derive(Clone, Debug)]
pub struct KeyMap {
    bindings: HashMap<String, PlayerCommand>,
}

impl Default for KeyMap {
    fn default() -> Self {
        let mut map = Self { bindings: HashMap::new() };
        map.bind("a", PlayerCommand::Press(Symbol::A));
        map.bind("s", PlayerCommand::Press(Symbol::S));
        map.bind("j", PlayerCommand::Press(Symbol::J));
        map.bind("k", PlayerCommand::Press(Symbol::K));
        map.bind("space", PlayerCommand::Press(Symbol::Pause));
        map.bind("q", PlayerCommand::CyclePrev);
        map.bind("e", PlayerCommand::CycleNext);
        map
    }
}

impl KeyMap {
    pub fn empty() -> Self {
        Self { bindings: HashMap::new() }
    }

    pub fn bind(&mut self, key: &str, command: PlayerCommand) {
        self.bindings.insert(normalize_key(key), command);
    }

    pub fn lookup(&self, key: &str) -> Option<PlayerCommand> {
        let command = self.bindings.get(&normalize_key(key)).copied();
        if command.is_none() {
            debug!("Ignoring unbound key '{}'", key);
        }
        command
    }

    pub fn edge(&self, key: &str, source: InputSource, timestamp: f64) -> Option<CommandEdge> {
        self.lookup(key).map(|command| CommandEdge { command, source, timestamp })
    }
}

#[inline(always)]
fn normalize_key(key: &str) -> String {
    if key == " " {
        return "space".to_string();
    }
    key.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_match_the_command_keys() {
        let map = KeyMap::default();
        assert_eq!(map.lookup("A"), Some(PlayerCommand::Press(Symbol::A)));
        assert_eq!(map.lookup("k"), Some(PlayerCommand::Press(Symbol::K)));
        assert_eq!(map.lookup(" "), Some(PlayerCommand::Press(Symbol::Pause)));
        assert_eq!(map.lookup("Space"), Some(PlayerCommand::Press(Symbol::Pause)));
        assert_eq!(map.lookup("E"), Some(PlayerCommand::CycleNext));
        assert_eq!(map.lookup("d"), None);
    }

    #[test]
    fn edges_carry_source_and_time() {
        let map = KeyMap::default();
        let edge = map.edge("j", InputSource::Controller, 2.5).unwrap();
        assert_eq!(edge.command, PlayerCommand::Press(Symbol::J));
        assert_eq!(edge.source, InputSource::Controller);
        assert_eq!(edge.timestamp, 2.5);
        assert!(PlayerCommand::Pick(Vector2::new(0.0, 0.0)).is_selection());
        assert!(!PlayerCommand::Press(Symbol::A).is_selection());
    }
}
