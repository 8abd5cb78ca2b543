use crate::core::audio::SoundId;
use crate::core::space::MonsterId;
use crate::core::visual::IconMark;
use crate::core::Effects;
use crate::game::flash::{Ease, HighlightFade};
use crate::game::judgment::{Judgment, MissReason};
use crate::game::symbol::{Pattern, Symbol};
use crate::game::timing::{BeatClock, BeatTick};
use log::debug;
use std::collections::VecDeque;

/// How a monster voices its pattern while prompting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptVoice {
    /// One clip for the whole pattern, played when prompting starts.
    WholePattern,
    /// One clip per non-rest symbol, played on its beat.
    PerSymbol,
    Silent,
}

#[derive(Clone, Debug)]
pub struct TurnSettings {
    pub prompt_voice: PromptVoice,
    /// Hold the "go" cue until a main pulse.
    pub cue_on_main_pulse: bool,
    pub flash_duration: f32,
    pub baseline_alpha: f32,
    pub flash_ease: Ease,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            prompt_voice: PromptVoice::WholePattern,
            cue_on_main_pulse: true,
            flash_duration: 0.2,
            baseline_alpha: 0.35,
            flash_ease: Ease::Linear,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    Inactive,
    /// Waiting for a main pulse so the prompt starts on the beat.
    Quantizing,
    Prompting,
    Cueing,
    AwaitingInput,
    Resolved,
}

/// Transitions reported by `on_beat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnEvent {
    PatternAnnounced,
    Cued,
    /// Last rest consumed; the encounter is over.
    Resolved,
}

/// Call-and-response state for one monster.
#[derive(Clone, Debug)]
pub struct TurnStateMachine {
    owner: MonsterId,
    pattern: Pattern,
    settings: TurnSettings,
    phase: TurnPhase,
    expected: VecDeque<Symbol>,
    prompt_cursor: usize,
    targeted: bool,
    announced: bool,
    cued: bool,
    fade: HighlightFade,
}

impl TurnStateMachine {
    pub fn new(owner: MonsterId, pattern: Pattern, settings: TurnSettings) -> Self {
        let fade = HighlightFade::new(settings.baseline_alpha, settings.flash_ease);
        Self {
            owner,
            pattern,
            settings,
            phase: TurnPhase::Inactive,
            expected: VecDeque::new(),
            prompt_cursor: 0,
            targeted: false,
            announced: false,
            cued: false,
            fade,
        }
    }

    /// Shows the untouched icon queue at baseline highlight.
    pub fn present(&self, fx: &mut Effects<'_>) {
        fx.visual.show_icon_queue(self.owner, &self.pattern.symbols);
        fx.visual.set_highlight_alpha(self.owner, self.settings.baseline_alpha);
    }

    /// Starts the turn if it is not already running.
    pub fn activate(&mut self, fx: &mut Effects<'_>) {
        if self.phase != TurnPhase::Inactive {
            return;
        }
        self.phase = TurnPhase::Quantizing;
        self.prompt_cursor = 0;
        self.announced = false;
        self.cued = false;
        self.expected.clear();
        self.present(fx);
        debug!("{} quantizing pattern {} [{}]", self.owner, self.pattern.id, self.pattern);
    }

    /// Target enter/exit. Losing the target abandons the turn; the next
    /// activation starts over from quantizing, so an untargeted turn is never
    /// mid-phase. A nearest-auto selector that re-acquires the same monster
    /// after a miss hears the whole pattern again.
    pub fn set_targeted(&mut self, targeted: bool, fx: &mut Effects<'_>) {
        if targeted == self.targeted {
            return;
        }
        self.targeted = targeted;
        if targeted {
            self.activate(fx);
            return;
        }

        self.fade.halt();
        if matches!(self.phase, TurnPhase::Inactive | TurnPhase::Resolved) {
            return;
        }
        fx.audio.stop_current();
        self.phase = TurnPhase::Inactive;
        self.expected.clear();
        self.prompt_cursor = 0;
        self.present(fx);
        debug!("{} lost target, turn abandoned", self.owner);
    }

    /// Beat-driven step.
    pub fn on_beat(&mut self, tick: &BeatTick, fx: &mut Effects<'_>) -> Option<TurnEvent> {
        match self.phase {
            TurnPhase::Inactive | TurnPhase::Resolved => None,
            TurnPhase::Quantizing => {
                if !tick.is_main_pulse() {
                    return None;
                }
                self.phase = TurnPhase::Prompting;
                if !self.announced {
                    self.announced = true;
                    if self.settings.prompt_voice == PromptVoice::WholePattern {
                        fx.audio.play_one_shot(SoundId::Pattern(self.pattern.id));
                    }
                }
                self.prompt_step(tick, fx);
                Some(TurnEvent::PatternAnnounced)
            }
            TurnPhase::Prompting => {
                self.prompt_step(tick, fx);
                None
            }
            TurnPhase::Cueing => {
                if self.settings.cue_on_main_pulse && !tick.is_main_pulse() {
                    return None;
                }
                if !self.cued {
                    self.cued = true;
                    fx.audio.play_one_shot(SoundId::Cue);
                }
                self.expected = self.pattern.symbols.iter().copied().collect();
                if self.expected.is_empty() {
                    self.phase = TurnPhase::Resolved;
                    return Some(TurnEvent::Resolved);
                }
                self.phase = TurnPhase::AwaitingInput;
                debug!("{} cued, awaiting {} symbols", self.owner, self.expected.len());
                Some(TurnEvent::Cued)
            }
            TurnPhase::AwaitingInput => {
                if self.expected.front().is_some_and(|s| s.is_pause()) {
                    self.expected.pop_front();
                    fx.visual.remove_front_icon(self.owner);
                    if self.expected.is_empty() {
                        self.phase = TurnPhase::Resolved;
                        return Some(TurnEvent::Resolved);
                    }
                }
                None
            }
        }
    }

    fn prompt_step(&mut self, tick: &BeatTick, fx: &mut Effects<'_>) {
        if let Some(&symbol) = self.pattern.symbols.get(self.prompt_cursor) {
            let alpha = self.fade.trigger(self.settings.flash_duration, tick.main_interval);
            fx.visual.set_highlight_alpha(self.owner, alpha);
            if self.settings.prompt_voice == PromptVoice::PerSymbol && !symbol.is_pause() {
                fx.audio.play_one_shot(SoundId::Voice(symbol));
            }
            self.prompt_cursor += 1;
        }
        if self.prompt_cursor >= self.pattern.len() {
            self.phase = TurnPhase::Cueing;
        }
    }

    /// Input-driven step. `None` means the press was ignored (nothing left to
    /// match). Any miss means the caller should drop the target.
    pub fn submit(
        &mut self,
        symbol: Symbol,
        clock: &BeatClock,
        now: f64,
        fx: &mut Effects<'_>,
    ) -> Option<Judgment> {
        if self.phase != TurnPhase::AwaitingInput {
            debug!("{} got {} while {:?}", self.owner, symbol, self.phase);
            return Some(Judgment::Miss(MissReason::OutOfTurn));
        }
        let front = *self.expected.front()?;

        if front.is_pause() {
            fx.visual.mark_front_icon(self.owner, IconMark::Miss);
            return Some(Judgment::Miss(MissReason::PressedDuringRest));
        }
        if symbol != front {
            fx.visual.mark_front_icon(self.owner, IconMark::Miss);
            return Some(Judgment::Miss(MissReason::WrongSymbol));
        }

        let timing = clock.judge_timing(now);
        fx.visual.mark_front_icon(self.owner, timing.icon_mark());
        fx.visual.remove_front_icon(self.owner);
        self.expected.pop_front();
        if self.expected.is_empty() {
            self.phase = TurnPhase::Resolved;
        }
        Some(Judgment::Hit(timing))
    }

    /// Per-frame fade update.
    pub fn update(&mut self, dt: f32, fx: &mut Effects<'_>) {
        if let Some(alpha) = self.fade.advance(dt) {
            fx.visual.set_highlight_alpha(self.owner, alpha);
        }
    }

    /// Cancels transient state; used when the monster is destroyed.
    pub fn halt(&mut self) {
        self.fade.halt();
    }

    // --- Accessors ---

    #[inline(always)]
    pub fn owner(&self) -> MonsterId {
        self.owner
    }

    #[inline(always)]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    #[inline(always)]
    pub fn is_resolved(&self) -> bool {
        self.phase == TurnPhase::Resolved
    }

    #[inline(always)]
    pub fn is_targeted(&self) -> bool {
        self.targeted
    }

    #[inline(always)]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    #[inline(always)]
    pub fn prompt_cursor(&self) -> usize {
        self.prompt_cursor
    }

    pub fn expected(&self) -> &VecDeque<Symbol> {
        &self.expected
    }

    pub fn front(&self) -> Option<Symbol> {
        self.expected.front().copied()
    }

    #[inline(always)]
    pub fn is_fading(&self) -> bool {
        self.fade.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::RecordingAudio;
    use crate::core::visual::{RecordingVisual, VisualCall};
    use crate::game::judgment::HitTiming;

    const A: Symbol = Symbol::A;
    const S: Symbol = Symbol::S;
    const J: Symbol = Symbol::J;
    const K: Symbol = Symbol::K;
    const P: Symbol = Symbol::Pause;

    struct Rig {
        clock: BeatClock,
        audio: RecordingAudio,
        visual: RecordingVisual,
        turn: TurnStateMachine,
        now: f64,
    }

    impl Rig {
        fn new(symbols: Vec<Symbol>, settings: TurnSettings) -> Self {
            let mut clock = BeatClock::new(240.0, 120.0, 0.05);
            clock.start(0.0);
            Self {
                clock,
                audio: RecordingAudio::default(),
                visual: RecordingVisual::default(),
                turn: TurnStateMachine::new(MonsterId(1), Pattern::new(4, symbols), settings),
                now: 0.0,
            }
        }

        fn target(&mut self) {
            let mut fx = Effects::new(&mut self.audio, &mut self.visual);
            self.turn.set_targeted(true, &mut fx);
        }

        /// Advances to `t` and delivers the fired beats.
        fn run_to(&mut self, t: f64) -> Vec<TurnEvent> {
            self.now = t;
            let ticks = self.clock.tick(t);
            let mut fx = Effects::new(&mut self.audio, &mut self.visual);
            ticks.iter().filter_map(|tick| self.turn.on_beat(tick, &mut fx)).collect()
        }

        /// Delivers exactly the next beat.
        fn next_beat(&mut self) -> Option<TurnEvent> {
            let t = self.clock.next_system_beat_time();
            self.run_to(t).pop()
        }

        fn press(&mut self, symbol: Symbol, t: f64) -> Option<Judgment> {
            self.now = t;
            let mut fx = Effects::new(&mut self.audio, &mut self.visual);
            self.turn.submit(symbol, &self.clock, t, &mut fx)
        }

        fn flashes(&self) -> usize {
            self.visual.calls.iter().filter(|c| matches!(c, VisualCall::Alpha(_, a) if *a == 1.0)).count()
        }
    }

    #[test]
    fn quantizing_waits_for_a_main_pulse() {
        let mut rig = Rig::new(vec![A, S], TurnSettings::default());
        rig.run_to(0.0); // consume the first main pulse before targeting
        rig.target();
        assert_eq!(rig.turn.phase(), TurnPhase::Quantizing);
        assert_eq!(rig.next_beat(), None); // 0.25, subdivision
        assert_eq!(rig.turn.phase(), TurnPhase::Quantizing);
        assert_eq!(rig.next_beat(), Some(TurnEvent::PatternAnnounced)); // 0.5
        assert_eq!(rig.turn.phase(), TurnPhase::Prompting);
        assert_eq!(rig.turn.prompt_cursor(), 1);
        assert_eq!(rig.audio.count(SoundId::Pattern(4)), 1);
    }

    #[test]
    fn full_scenario_with_rests_on_the_off_beats() {
        let mut rig = Rig::new(vec![A, P, A, P, A, P], TurnSettings::default());
        rig.target();

        // beat 0 (main) releases quantize and flashes once, beats 1..=5 flash the rest
        assert_eq!(rig.run_to(0.0), vec![TurnEvent::PatternAnnounced]);
        for _ in 0..5 {
            rig.next_beat();
        }
        assert_eq!(rig.flashes(), 6);
        assert_eq!(rig.turn.phase(), TurnPhase::Cueing);

        // 7th beat is a main pulse: cue
        assert_eq!(rig.next_beat(), Some(TurnEvent::Cued));
        assert_eq!(rig.turn.phase(), TurnPhase::AwaitingInput);
        assert_eq!(rig.audio.count(SoundId::Cue), 1);
        let cue_time = rig.now;
        assert_eq!(cue_time, 1.5);

        let mut hits = 0;
        for slot in 0..3 {
            let press_at = cue_time + slot as f64 * 0.5 + 0.01;
            assert_eq!(rig.press(A, press_at), Some(Judgment::Hit(HitTiming::Perfect)));
            hits += 1;
            let event = rig.next_beat(); // rest consumed on the off-beat
            if slot < 2 {
                assert_eq!(event, None);
                rig.next_beat();
            } else {
                assert_eq!(event, Some(TurnEvent::Resolved));
            }
        }
        assert_eq!(hits, 3);
        assert!(rig.turn.is_resolved());
        assert_eq!(rig.audio.count(SoundId::Cue), 1);
    }

    #[test]
    fn one_rest_in_six_resolves_after_five_presses() {
        let symbols = vec![A, S, J, P, K, A];
        let mut rig = Rig::new(symbols.clone(), TurnSettings::default());
        rig.target();
        while rig.turn.phase() != TurnPhase::AwaitingInput {
            rig.next_beat();
        }
        let mut presses = 0;
        for s in symbols {
            if s.is_pause() {
                rig.next_beat();
                continue;
            }
            let t = rig.now + 0.01;
            assert!(rig.press(s, t).unwrap().is_hit());
            presses += 1;
        }
        assert_eq!(presses, 5);
        assert!(rig.turn.is_resolved());
    }

    #[test]
    fn presses_before_the_cue_are_misses_and_leave_the_queue_alone() {
        let mut rig = Rig::new(vec![A, S, P], TurnSettings::default());
        assert_eq!(rig.press(A, 0.0), Some(Judgment::Miss(MissReason::OutOfTurn)));
        rig.target();
        assert_eq!(rig.press(A, 0.0), Some(Judgment::Miss(MissReason::OutOfTurn)));
        rig.run_to(0.0);
        assert_eq!(rig.turn.phase(), TurnPhase::Prompting);
        assert_eq!(rig.press(A, 0.01), Some(Judgment::Miss(MissReason::OutOfTurn)));
        assert!(rig.turn.expected().is_empty());
        assert_eq!(rig.turn.prompt_cursor(), 1);
    }

    #[test]
    fn matching_press_outside_window_is_accepted_but_not_perfect() {
        let mut rig = Rig::new(vec![S, K], TurnSettings::default());
        rig.target();
        while rig.turn.phase() != TurnPhase::AwaitingInput {
            rig.next_beat();
        }
        let pulse = rig.now;
        let late = rig.press(S, pulse + 0.2);
        assert_eq!(late, Some(Judgment::Hit(HitTiming::Late)));
        assert_eq!(rig.turn.front(), Some(K));
        let early = rig.press(K, pulse + 0.3);
        assert_eq!(early, Some(Judgment::Hit(HitTiming::Early)));
        assert!(rig.turn.is_resolved());
        assert!(rig.visual.calls.contains(&VisualCall::MarkFrontIcon(MonsterId(1), IconMark::Late)));
    }

    #[test]
    fn pressing_during_a_rest_or_the_wrong_key_misses() {
        let mut rig = Rig::new(vec![P, A, S], TurnSettings::default());
        rig.target();
        while rig.turn.phase() != TurnPhase::AwaitingInput {
            rig.next_beat();
        }
        let t = rig.now;
        assert_eq!(rig.press(A, t), Some(Judgment::Miss(MissReason::PressedDuringRest)));
        assert_eq!(rig.turn.expected().len(), 3);
        rig.next_beat();
        assert_eq!(rig.turn.front(), Some(A));
        let t = rig.now;
        assert_eq!(rig.press(J, t), Some(Judgment::Miss(MissReason::WrongSymbol)));
        assert_eq!(rig.press(P, t), Some(Judgment::Miss(MissReason::WrongSymbol)));
        assert_eq!(rig.turn.front(), Some(A));
    }

    #[test]
    fn cue_can_land_on_any_beat_when_not_gated() {
        let settings = TurnSettings { cue_on_main_pulse: false, ..TurnSettings::default() };
        let mut rig = Rig::new(vec![A, S, J], settings);
        rig.target();
        rig.run_to(0.0);
        rig.next_beat();
        rig.next_beat(); // cursor reaches 3 on the main pulse at 0.5
        assert_eq!(rig.turn.phase(), TurnPhase::Cueing);
        assert_eq!(rig.next_beat(), Some(TurnEvent::Cued)); // index 3, subdivision
    }

    #[test]
    fn per_symbol_voice_skips_rests() {
        let settings = TurnSettings { prompt_voice: PromptVoice::PerSymbol, ..TurnSettings::default() };
        let mut rig = Rig::new(vec![A, P, K], settings);
        rig.target();
        rig.run_to(0.5);
        assert_eq!(rig.audio.played, vec![SoundId::Voice(A), SoundId::Voice(K)]);
    }

    #[test]
    fn losing_the_target_abandons_and_restarts() {
        let mut rig = Rig::new(vec![A, S], TurnSettings::default());
        rig.target();
        rig.run_to(0.0);
        assert!(rig.turn.is_fading());
        let mut fx = Effects::new(&mut rig.audio, &mut rig.visual);
        rig.turn.set_targeted(false, &mut fx);
        assert_eq!(rig.turn.phase(), TurnPhase::Inactive);
        assert!(!rig.turn.is_fading());
        assert_eq!(rig.audio.stops, 1);

        // untargeted and inactive: beats do nothing
        rig.visual.clear();
        rig.run_to(1.0);
        assert!(rig.visual.calls.is_empty());

        rig.target();
        assert_eq!(rig.turn.phase(), TurnPhase::Quantizing);
        assert_eq!(rig.turn.prompt_cursor(), 0);
    }

    #[test]
    fn a_miss_and_retarget_replays_the_whole_prompt() {
        let mut rig = Rig::new(vec![A, S], TurnSettings::default());
        rig.target();
        rig.run_to(0.5);
        assert_eq!(rig.turn.phase(), TurnPhase::AwaitingInput);
        assert_eq!(rig.press(K, 0.5), Some(Judgment::Miss(MissReason::WrongSymbol)));
        let mut fx = Effects::new(&mut rig.audio, &mut rig.visual);
        rig.turn.set_targeted(false, &mut fx);

        rig.target();
        rig.run_to(1.0);
        rig.run_to(1.25);
        assert_eq!(rig.turn.phase(), TurnPhase::Cueing);
        assert_eq!(rig.flashes(), 4);
        assert_eq!(rig.audio.count(SoundId::Pattern(4)), 2);
    }

    #[test]
    fn empty_pattern_resolves_on_the_cue() {
        let mut rig = Rig::new(Vec::new(), TurnSettings::default());
        rig.target();
        assert_eq!(rig.next_beat(), Some(TurnEvent::PatternAnnounced));
        assert_eq!(rig.turn.phase(), TurnPhase::Cueing);
        assert_eq!(rig.next_beat(), None);
        assert_eq!(rig.next_beat(), Some(TurnEvent::Resolved));
        assert_eq!(rig.turn.phase(), TurnPhase::Resolved);
        assert_eq!(rig.press(A, 0.5), Some(Judgment::Miss(MissReason::OutOfTurn)));
    }

    #[test]
    fn redundant_target_calls_are_no_ops() {
        let mut rig = Rig::new(vec![A, S], TurnSettings::default());
        rig.target();
        rig.run_to(0.0);
        rig.target();
        assert_eq!(rig.turn.phase(), TurnPhase::Prompting);
        assert_eq!(rig.turn.prompt_cursor(), 1);
    }

    #[test]
    fn fade_runs_on_frame_updates() {
        let mut rig = Rig::new(vec![A, S], TurnSettings::default());
        rig.target();
        rig.run_to(0.0);
        rig.visual.clear();
        let mut fx = Effects::new(&mut rig.audio, &mut rig.visual);
        for _ in 0..20 {
            rig.turn.update(1.0 / 60.0, &mut fx);
        }
        let alphas: Vec<f32> = rig
            .visual
            .calls
            .iter()
            .filter_map(|c| if let VisualCall::Alpha(_, a) = c { Some(*a) } else { None })
            .collect();
        assert!(!alphas.is_empty());
        assert!(alphas.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(alphas.last().copied(), Some(0.35));
        assert!(!rig.turn.is_fading());
    }
}
