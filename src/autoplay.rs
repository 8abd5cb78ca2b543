use crate::core::audio::AudioPlayback;
use crate::core::input::{InputSource, PlayerCommand};
use crate::core::visual::VisualPresentation;
use crate::game::session::GameSession;
use crate::game::symbol::Symbol;
use crate::game::target::TargetPolicy;
use crate::game::turn::TurnPhase;
use cgmath::MetricSpace;
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scripted player for headless runs. Picks a target when it has none and
/// presses the expected symbol inside each main-pulse window, fumbling now
/// and then.
#[derive(Debug)]
pub struct Autoplayer {
    rng: StdRng,
    slip_chance: f64,
    last_press: Option<f64>,
}

impl Autoplayer {
    pub fn new(seed: u64, slip_chance: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            slip_chance: if slip_chance.is_finite() { slip_chance.clamp(0.0, 1.0) } else { 0.0 },
            last_press: None,
        }
    }

    /// Commands for this frame, decided from the session as it stood after
    /// the previous frame.
    pub fn plan<A: AudioPlayback, V: VisualPresentation>(
        &mut self,
        session: &GameSession<A, V>,
        now: f64,
    ) -> Vec<(PlayerCommand, InputSource)> {
        let mut commands = Vec::new();

        let Some(target) = session.current_target() else {
            match session.selector().policy() {
                TargetPolicy::PointerPick => {
                    let origin = session.selector().origin();
                    let closest = session
                        .roster()
                        .iter()
                        .min_by(|a, b| a.position().distance(origin).total_cmp(&b.position().distance(origin)));
                    if let Some(monster) = closest {
                        commands.push((PlayerCommand::Pick(monster.position()), InputSource::Pointer));
                    }
                }
                TargetPolicy::ManualCycle => {
                    if !session.roster().is_empty() {
                        commands.push((PlayerCommand::CycleNext, InputSource::Keyboard));
                    }
                }
                TargetPolicy::NearestAuto => {}
            }
            return commands;
        };

        let Some(monster) = session.monster(target) else { return commands };
        if monster.turn.phase() != TurnPhase::AwaitingInput {
            return commands;
        }
        let Some(front) = monster.turn.front() else { return commands };
        let clock = session.clock();
        if front.is_pause() || !clock.is_input_window_open(now) {
            return commands;
        }
        if self.last_press.is_some_and(|t| now - t < clock.main_interval() * 0.5) {
            return commands;
        }

        self.last_press = Some(now);
        let symbol = if self.rng.random_bool(self.slip_chance) {
            let others: Vec<Symbol> = Symbol::KEYS.iter().copied().filter(|s| *s != front).collect();
            others[self.rng.random_range(0..others.len())]
        } else {
            front
        };
        trace!("Autoplay presses {} (expects {})", symbol, front);
        commands.push((PlayerCommand::Press(symbol), InputSource::Keyboard));
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::RecordingAudio;
    use cgmath::Vector2;
    use crate::core::visual::RecordingVisual;
    use crate::game::session::{SessionEvent, SessionSettings};
    use crate::game::spawner::SpawnerSettings;
    use crate::game::symbol::Pattern;

    fn run(policy: TargetPolicy, slip: f64) -> (Vec<SessionEvent>, GameSession<RecordingAudio, RecordingVisual>) {
        let settings = SessionSettings {
            policy,
            seed: Some(4),
            spawner: SpawnerSettings { enabled: false, ..SpawnerSettings::default() },
            ..SessionSettings::default()
        };
        let mut session = GameSession::new(settings, RecordingAudio::default(), RecordingVisual::default());
        session.start(0.0);
        let pattern = Pattern::new(2, vec![Symbol::A, Symbol::Pause, Symbol::S, Symbol::Pause, Symbol::J, Symbol::Pause]);
        session.spawn_with_pattern(Vector2::new(0.0, -3.22), 0.0, pattern);

        let mut player = Autoplayer::new(1, slip);
        let mut events = Vec::new();
        for frame in 1..=(60 * 10) {
            let now = frame as f64 / 60.0;
            for (command, source) in player.plan(&session, now) {
                session.queue_command(command, source, now);
            }
            events.extend(session.update(now, 1.0 / 60.0));
        }
        (events, session)
    }

    #[test]
    fn clean_play_defeats_the_monster_with_perfects() {
        for policy in [TargetPolicy::PointerPick, TargetPolicy::ManualCycle, TargetPolicy::NearestAuto] {
            let (events, session) = run(policy, 0.0);
            assert!(events.iter().any(|e| matches!(e, SessionEvent::Defeated(_))), "{} never won", policy);
            assert_eq!(session.stats().perfect, 3);
            assert_eq!(session.stats().misses(), 0);
            assert!(session.roster().is_empty());
        }
    }

    #[test]
    fn constant_slips_never_hit() {
        let (_, session) = run(TargetPolicy::PointerPick, 1.0);
        assert_eq!(session.stats().hits(), 0);
        assert!(session.stats().wrong_symbol > 0);
    }
}
