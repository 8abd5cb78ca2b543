use crate::core::audio::{AudioPlayback, SoundId};
use crate::core::input::{CommandEdge, InputSource, PlayerCommand};
use crate::core::space::MonsterId;
use crate::core::visual::VisualPresentation;
use crate::core::Effects;
use crate::game::judgment::{Judgment, JudgmentRecord, MissReason, SessionStats};
use crate::game::life::{MeterChange, TrustMeter, DEFAULT_MAX_FAILURES};
use crate::game::monster::{Monster, Roster, DEFAULT_HIT_RADIUS};
use crate::game::movement::{DeathLine, Movement};
use crate::game::sequence::SequenceGenerator;
use crate::game::spawner::{SpawnRequest, Spawner, SpawnerSettings};
use crate::game::symbol::{Pattern, Symbol, MAX_PATTERN_LEN, MIN_PATTERN_LEN};
use crate::game::target::{TargetPolicy, TargetSelector};
use crate::game::timing::BeatClock;
use crate::game::turn::{TurnEvent, TurnSettings, TurnStateMachine};
use cgmath::Vector2;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;

// --- Defaults ---
pub const DEFAULT_SYSTEM_BPM: f64 = 240.0;
pub const DEFAULT_MAIN_BPM: f64 = 120.0;
pub const DEFAULT_TOLERANCE: f64 = 0.08;
pub const DEFAULT_MAX_CATCH_UP: u32 = 8;
pub const PLAYER_ORIGIN: Vector2<f32> = Vector2 { x: -7.5, y: -3.22 };
pub const DEFAULT_DETECTION_RADIUS: f32 = 15.0;
pub const DEFAULT_DEATH_LINE_X: f32 = -6.0;

/// Everything needed to build a session.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub system_bpm: f64,
    pub main_bpm: f64,
    pub tolerance: f64,
    pub audio_offset: f64,
    pub max_catch_up: u32,
    pub policy: TargetPolicy,
    pub player_origin: Vector2<f32>,
    pub detection_radius: f32,
    pub death_line_x: f32,
    /// Travel direction of spawned monsters.
    pub monster_direction: Vector2<f32>,
    pub hit_radius: f32,
    pub max_failures: u32,
    pub turn: TurnSettings,
    pub spawner: SpawnerSettings,
    /// Empty means the built-in table.
    pub patterns: Vec<Pattern>,
    /// Fixed seed for repeatable runs; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            system_bpm: DEFAULT_SYSTEM_BPM,
            main_bpm: DEFAULT_MAIN_BPM,
            tolerance: DEFAULT_TOLERANCE,
            audio_offset: 0.0,
            max_catch_up: DEFAULT_MAX_CATCH_UP,
            policy: TargetPolicy::default(),
            player_origin: PLAYER_ORIGIN,
            detection_radius: DEFAULT_DETECTION_RADIUS,
            death_line_x: DEFAULT_DEATH_LINE_X,
            monster_direction: Vector2::new(-1.0, 0.0),
            hit_radius: DEFAULT_HIT_RADIUS,
            max_failures: DEFAULT_MAX_FAILURES,
            turn: TurnSettings::default(),
            spawner: SpawnerSettings::default(),
            patterns: Vec::new(),
            seed: None,
        }
    }
}

/// Things that happened during one `update`.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Spawned(MonsterId),
    Judged(JudgmentRecord),
    Defeated(MonsterId),
    Escaped(MonsterId),
    GameOver,
}

/// One play session. Owns the clock, the monsters and every manager; the
/// host supplies audio and visuals and drives `update` once per frame.
pub struct GameSession<A: AudioPlayback, V: VisualPresentation> {
    clock: BeatClock,
    roster: Roster,
    selector: TargetSelector,
    meter: TrustMeter,
    generator: SequenceGenerator,
    spawner: Spawner,
    rng: StdRng,
    audio: A,
    visual: V,

    turn_settings: TurnSettings,
    death_line: DeathLine,
    monster_direction: Vector2<f32>,
    hit_radius: f32,

    pending_commands: VecDeque<CommandEdge>,
    stats: SessionStats,
    judgments: Vec<JudgmentRecord>,
    frozen: bool,
}

impl<A: AudioPlayback, V: VisualPresentation> GameSession<A, V> {
    pub fn new(settings: SessionSettings, audio: A, visual: V) -> Self {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let clock = BeatClock::new(settings.system_bpm, settings.main_bpm, settings.tolerance)
            .with_audio_offset(settings.audio_offset)
            .with_max_catch_up(settings.max_catch_up);
        let generator = if settings.patterns.is_empty() {
            SequenceGenerator::default()
        } else {
            SequenceGenerator::with_table(settings.patterns)
        };
        let spawner = Spawner::new(settings.spawner, &mut rng);

        Self {
            clock,
            roster: Roster::new(),
            selector: TargetSelector::new(settings.policy, settings.player_origin, settings.detection_radius),
            meter: TrustMeter::new(settings.max_failures),
            generator,
            spawner,
            rng,
            audio,
            visual,
            turn_settings: settings.turn,
            death_line: DeathLine { x: settings.death_line_x },
            monster_direction: settings.monster_direction,
            hit_radius: settings.hit_radius,
            pending_commands: VecDeque::new(),
            stats: SessionStats::default(),
            judgments: Vec::new(),
            frozen: false,
        }
    }

    /// Starts the beat grid at `now`.
    pub fn start(&mut self, now: f64) {
        self.clock.start(now);
        info!(
            "Session started: {} / {} BPM, {} targeting",
            self.clock.system_bpm(),
            self.clock.main_bpm(),
            self.selector.policy()
        );
    }

    // --- Input ---

    pub fn queue_command(&mut self, command: PlayerCommand, source: InputSource, timestamp: f64) {
        self.pending_commands.push_back(CommandEdge { command, source, timestamp });
    }

    pub fn queue_edge(&mut self, edge: CommandEdge) {
        self.pending_commands.push_back(edge);
    }

    // --- Frame ---

    /// Runs one frame: beats, target selection, beat delivery, player input,
    /// then fades, movement and spawning.
    pub fn update(&mut self, now: f64, dt: f32) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.frozen {
            self.pending_commands.clear();
            return events;
        }

        let ticks = self.clock.tick(now);

        let mut presses = Vec::new();
        let mut resolved = Vec::new();
        {
            let mut fx = Effects::new(&mut self.audio, &mut self.visual);
            self.selector.update(&mut self.roster, &mut fx);
            while let Some(edge) = self.pending_commands.pop_front() {
                if !self.selector.handle_command(edge.command, &mut self.roster, &mut fx) {
                    presses.push(edge);
                }
            }

            for tick in &ticks {
                for id in self.clock.subscribers() {
                    let Some(monster) = self.roster.get_mut(*id) else { continue };
                    if monster.turn.on_beat(tick, &mut fx) == Some(TurnEvent::Resolved) {
                        resolved.push(*id);
                    }
                }
            }
        }
        for id in resolved {
            self.defeat(id, &mut events);
        }

        for edge in presses {
            if let PlayerCommand::Press(symbol) = edge.command {
                self.apply_press(symbol, edge.timestamp, &mut events);
            }
            if self.frozen {
                return events;
            }
        }

        let mut escaped = Vec::new();
        {
            let mut fx = Effects::new(&mut self.audio, &mut self.visual);
            for monster in self.roster.iter_mut() {
                monster.turn.update(dt, &mut fx);
                let pos = monster.movement.advance(dt);
                if self.death_line.is_crossed(pos, monster.movement.direction()) {
                    escaped.push(monster.id);
                }
            }
        }
        for id in escaped {
            self.escape(id, now, &mut events);
            if self.frozen {
                return events;
            }
        }

        if let Some(request) = self.spawner.update(dt, self.selector.origin().x, &mut self.rng) {
            let id = self.spawn_from_request(request, None);
            events.push(SessionEvent::Spawned(id));
        }
        events
    }

    fn apply_press(&mut self, symbol: Symbol, timestamp: f64, events: &mut Vec<SessionEvent>) {
        if !symbol.is_pause() {
            self.audio.play_one_shot(SoundId::Key(symbol));
        }
        let Some(target) = self.selector.current() else {
            debug!("{} pressed with no target", symbol);
            return;
        };
        let judgment = {
            let mut fx = Effects::new(&mut self.audio, &mut self.visual);
            match self.roster.get_mut(target) {
                Some(monster) => monster.turn.submit(symbol, &self.clock, timestamp, &mut fx),
                None => None,
            }
        };
        let Some(judgment) = judgment else { return };
        self.record(target, judgment, timestamp, events);

        match judgment {
            Judgment::Hit(_) => {
                self.meter.record_hit();
                if self.roster.get(target).is_some_and(|m| m.turn.is_resolved()) {
                    self.defeat(target, events);
                }
            }
            Judgment::Miss(_) => {
                let mut fx = Effects::new(&mut self.audio, &mut self.visual);
                self.selector.clear_target(&mut self.roster, &mut fx);
                self.penalize(events);
            }
        }
    }

    fn record(&mut self, monster: MonsterId, judgment: Judgment, time: f64, events: &mut Vec<SessionEvent>) {
        let record = JudgmentRecord { monster, judgment, time };
        debug!("{} judged {:?} at {:.3}s", monster, judgment, time);
        self.stats.record(judgment);
        self.judgments.push(record);
        events.push(SessionEvent::Judged(record));
    }

    fn penalize(&mut self, events: &mut Vec<SessionEvent>) {
        if self.meter.record_miss() == MeterChange::Depleted {
            self.frozen = true;
            self.pending_commands.clear();
            self.clock.stop();
            self.stats.game_overs += 1;
            warn!("Game over: trust meter full ({} failures)", self.meter.max_failures());
            events.push(SessionEvent::GameOver);
        }
    }

    fn defeat(&mut self, id: MonsterId, events: &mut Vec<SessionEvent>) {
        if self.destroy(id) {
            self.stats.defeated += 1;
            info!("{} defeated", id);
            events.push(SessionEvent::Defeated(id));
        }
    }

    fn escape(&mut self, id: MonsterId, now: f64, events: &mut Vec<SessionEvent>) {
        if self.destroy(id) {
            info!("{} crossed the death line", id);
            events.push(SessionEvent::Escaped(id));
            self.record(id, Judgment::Miss(MissReason::DeathLine), now, events);
            self.penalize(events);
        }
    }

    /// Tears a monster down: no more beats, no longer a candidate, fade
    /// stopped, visuals gone. Returns false for unknown handles.
    fn destroy(&mut self, id: MonsterId) -> bool {
        let Some(mut monster) = self.roster.remove(id) else {
            return false;
        };
        monster.turn.halt();
        self.clock.unsubscribe(id);
        self.selector.deregister(id);
        self.visual.despawn(id);
        true
    }

    /// Removes a monster without scoring it.
    pub fn remove_monster(&mut self, id: MonsterId) -> bool {
        let removed = self.destroy(id);
        if removed {
            debug!("{} removed", id);
        }
        removed
    }

    // --- Spawning ---

    fn spawn_from_request(&mut self, request: SpawnRequest, pattern: Option<Pattern>) -> MonsterId {
        let id = self.roster.allocate_id();
        let pattern = pattern.unwrap_or_else(|| self.generator.generate(&mut self.rng));
        let turn = TurnStateMachine::new(id, pattern, self.turn_settings.clone());
        let mut movement = Movement::new(request.position, self.monster_direction, request.speed);
        if let Some(zigzag) = request.zigzag {
            movement = movement.with_zigzag(zigzag);
        }
        movement.advance(0.0);

        {
            let mut fx = Effects::new(&mut self.audio, &mut self.visual);
            fx.audio.play_one_shot(SoundId::Spawn);
            turn.present(&mut fx);
        }
        info!(
            "{} spawned at ({:.2}, {:.2}) with [{}]{}",
            id,
            request.position.x,
            request.position.y,
            turn.pattern(),
            if request.zigzag.is_some() { " (irregular)" } else { "" }
        );
        self.roster.insert(Monster { id, turn, movement, hit_radius: self.hit_radius });
        self.selector.register(id);
        self.clock.subscribe(id);
        self.stats.spawned += 1;
        id
    }

    /// Spawns a monster with a random pattern.
    pub fn spawn_at(&mut self, position: Vector2<f32>, speed: f32) -> MonsterId {
        self.spawn_from_request(SpawnRequest { position, speed, zigzag: None }, None)
    }

    /// Spawns a monster with a fixed pattern. A pattern of the wrong length
    /// is replaced by a random one.
    pub fn spawn_with_pattern(&mut self, position: Vector2<f32>, speed: f32, pattern: Pattern) -> MonsterId {
        let pattern = if (MIN_PATTERN_LEN..=MAX_PATTERN_LEN).contains(&pattern.len()) {
            Some(pattern)
        } else {
            warn!(
                "Pattern {} has {} symbols, expected {}..={}; using a random one.",
                pattern.id,
                pattern.len(),
                MIN_PATTERN_LEN,
                MAX_PATTERN_LEN
            );
            None
        };
        self.spawn_from_request(SpawnRequest { position, speed, zigzag: None }, pattern)
    }

    /// Clears the game-over freeze and restarts the beat grid at `now`.
    pub fn resume(&mut self, now: f64) {
        if !self.frozen {
            return;
        }
        self.meter.reset();
        self.frozen = false;
        self.clock.start(now);
        info!("Session resumed at {:.3}s", now);
    }

    // --- Accessors ---

    #[inline(always)]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    #[inline(always)]
    pub fn current_target(&self) -> Option<MonsterId> {
        self.selector.current()
    }

    pub fn monster(&self, id: MonsterId) -> Option<&Monster> {
        self.roster.get(id)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn clock(&self) -> &BeatClock {
        &self.clock
    }

    /// Changes tempo in place; see `BeatClock::configure`.
    pub fn set_tempo(&mut self, system_bpm: f64, main_bpm: f64) {
        self.clock.configure(system_bpm, main_bpm);
    }

    pub fn selector(&self) -> &TargetSelector {
        &self.selector
    }

    pub fn meter(&self) -> &TrustMeter {
        &self.meter
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn judgments(&self) -> &[JudgmentRecord] {
        &self.judgments
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn visual(&self) -> &V {
        &self.visual
    }

    pub fn visual_mut(&mut self) -> &mut V {
        &mut self.visual
    }
}
