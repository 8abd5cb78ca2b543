use crate::core::space::MonsterId;
use crate::game::judgment::HitTiming;
use log::{debug, trace, warn};

/// Smallest BPM the clock will run at. Non-positive settings are clamped here.
pub const MIN_BPM: f64 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeatKind {
    /// Coarse pulse on which input is judged and cue/quantize transitions land.
    MainPulse,
    /// Intermediate system beat between main pulses.
    Subdivision,
}

/// One fired system beat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatTick {
    /// System beats fired since `start`, starting at 0.
    pub index: u64,
    /// Scheduled time of the beat (not the time it was observed).
    pub time: f64,
    pub kind: BeatKind,
    /// BPM of the grid that produced the tick: main BPM for main pulses,
    /// system BPM otherwise.
    pub period_bpm: f64,
    /// Seconds between main pulses at the time of firing.
    pub main_interval: f64,
}

impl BeatTick {
    #[inline(always)]
    pub fn is_main_pulse(&self) -> bool {
        self.kind == BeatKind::MainPulse
    }
}

#[derive(Clone, Debug)]
pub struct BeatClock {
    system_bpm: f64,
    main_bpm: f64,
    subdivision: u32,
    system_interval: f64,
    audio_offset: f64,
    tolerance: f64,
    max_catch_up_beats: u32,

    running: bool,
    reference_time: f64,
    /// Beats fired since `reference_time`. The pointer is always
    /// `reference_time + beats_since_reference * system_interval`.
    beats_since_reference: u64,
    next_system_beat_time: f64,
    /// Position of the last fired beat inside its main pulse; 0 = main pulse.
    beat_counter: u32,
    fired: u64,

    subscribers: Vec<MonsterId>,
}

fn sanitize_bpm(label: &str, bpm: f64) -> f64 {
    if !bpm.is_finite() || bpm <= 0.0 {
        warn!("{} BPM {} is invalid; clamping to {}", label, bpm, MIN_BPM);
        MIN_BPM
    } else {
        bpm.max(MIN_BPM)
    }
}

impl BeatClock {
    pub fn new(system_bpm: f64, main_bpm: f64, tolerance: f64) -> Self {
        let mut clock = Self {
            system_bpm: 0.0,
            main_bpm: 0.0,
            subdivision: 1,
            system_interval: 0.0,
            audio_offset: 0.0,
            tolerance: tolerance.max(0.0),
            max_catch_up_beats: 0,
            running: false,
            reference_time: 0.0,
            beats_since_reference: 0,
            next_system_beat_time: 0.0,
            beat_counter: 0,
            fired: 0,
            subscribers: Vec::new(),
        };
        clock.apply_rates(system_bpm, main_bpm);
        clock.beat_counter = clock.subdivision - 1;
        clock
    }

    pub fn with_audio_offset(mut self, offset: f64) -> Self {
        self.audio_offset = if offset.is_finite() { offset } else { 0.0 };
        self
    }

    /// Caps how many overdue beats a single `tick` delivers; the rest are
    /// skipped with phase preserved. 0 = deliver everything.
    pub fn with_max_catch_up(mut self, beats: u32) -> Self {
        self.max_catch_up_beats = beats;
        self
    }

    fn apply_rates(&mut self, system_bpm: f64, main_bpm: f64) {
        let system_bpm = sanitize_bpm("System", system_bpm);
        let main_bpm = sanitize_bpm("Main", main_bpm);

        let ratio = system_bpm / main_bpm;
        let subdivision = ratio.round().max(1.0) as u32;
        if (ratio - subdivision as f64).abs() > 1e-6 {
            warn!(
                "Main BPM {} does not divide system BPM {}; using every {} system beats",
                main_bpm, system_bpm, subdivision
            );
        }

        self.system_bpm = system_bpm;
        self.subdivision = subdivision;
        self.main_bpm = system_bpm / subdivision as f64;
        self.system_interval = 60.0 / system_bpm;
    }

    /// Anchors the grid at `now + audio_offset`. The first beat is a main pulse.
    pub fn start(&mut self, now: f64) {
        self.reference_time = now + self.audio_offset;
        self.beats_since_reference = 0;
        self.next_system_beat_time = self.reference_time;
        self.beat_counter = self.subdivision - 1;
        self.fired = 0;
        self.running = true;
        debug!(
            "BeatClock started at {:.3}s ({} / {} BPM, window ±{:.0}ms)",
            self.reference_time,
            self.system_bpm,
            self.main_bpm,
            self.tolerance * 1000.0
        );
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Changes rates in place. The pending beat keeps its time; spacing after
    /// it follows the new rate.
    pub fn configure(&mut self, system_bpm: f64, main_bpm: f64) {
        self.apply_rates(system_bpm, main_bpm);
        self.reference_time = self.next_system_beat_time;
        self.beats_since_reference = 0;
        self.beat_counter %= self.subdivision;
        debug!("BeatClock reconfigured to {} / {} BPM", self.system_bpm, self.main_bpm);
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = if tolerance.is_finite() { tolerance.max(0.0) } else { 0.0 };
    }

    #[inline(always)]
    fn advance_pointer(&mut self, beats: u64) {
        self.beats_since_reference += beats;
        self.next_system_beat_time =
            self.reference_time + self.beats_since_reference as f64 * self.system_interval;
    }

    /// Fires every beat due at `now`, oldest first.
    pub fn tick(&mut self, now: f64) -> Vec<BeatTick> {
        let mut ticks = Vec::new();
        if !self.running || !now.is_finite() {
            return ticks;
        }

        if self.max_catch_up_beats > 0 && now >= self.next_system_beat_time {
            let due = ((now - self.next_system_beat_time) / self.system_interval).floor() as u64 + 1;
            let cap = self.max_catch_up_beats as u64;
            if due > cap {
                let skipped = due - cap;
                self.beat_counter = ((self.beat_counter as u64 + skipped) % self.subdivision as u64) as u32;
                self.fired += skipped;
                self.advance_pointer(skipped);
                debug!("BeatClock skipped {} overdue beats", skipped);
            }
        }

        while now >= self.next_system_beat_time {
            self.beat_counter = (self.beat_counter + 1) % self.subdivision;
            let kind = if self.beat_counter == 0 { BeatKind::MainPulse } else { BeatKind::Subdivision };
            let tick = BeatTick {
                index: self.fired,
                time: self.next_system_beat_time,
                kind,
                period_bpm: if kind == BeatKind::MainPulse { self.main_bpm } else { self.system_bpm },
                main_interval: self.main_interval(),
            };
            trace!("Beat {} at {:.4}s ({:?})", tick.index, tick.time, tick.kind);
            ticks.push(tick);
            self.fired += 1;
            self.advance_pointer(1);
        }
        ticks
    }

    /// Time of the next main pulse that has not fired yet.
    pub fn next_main_pulse_time(&self) -> f64 {
        let sub = self.subdivision;
        let upcoming = (self.beat_counter + 1) % sub;
        let steps = (sub - upcoming) % sub;
        self.next_system_beat_time + steps as f64 * self.system_interval
    }

    /// Signed seconds from the nearest main pulse: negative before it,
    /// positive after it.
    pub fn pulse_offset(&self, now: f64) -> f64 {
        let anchor = self.next_main_pulse_time();
        let interval = self.main_interval();
        let pulses = ((now - anchor) / interval).round();
        now - (anchor + pulses * interval)
    }

    /// True when `now` is within the tolerance of a main pulse, boundary
    /// included.
    pub fn is_input_window_open(&self, now: f64) -> bool {
        if !self.running || !now.is_finite() {
            return false;
        }
        self.pulse_offset(now).abs() <= self.tolerance
    }

    pub fn judge_timing(&self, now: f64) -> HitTiming {
        if self.is_input_window_open(now) {
            HitTiming::Perfect
        } else if self.running && self.pulse_offset(now) < 0.0 {
            HitTiming::Early
        } else {
            HitTiming::Late
        }
    }

    // --- Subscribers ---

    pub fn subscribe(&mut self, monster: MonsterId) {
        if !self.subscribers.contains(&monster) {
            self.subscribers.push(monster);
        }
    }

    pub fn unsubscribe(&mut self, monster: MonsterId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|m| *m != monster);
        before != self.subscribers.len()
    }

    pub fn subscribers(&self) -> &[MonsterId] {
        &self.subscribers
    }

    // --- Accessors ---

    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline(always)]
    pub fn system_bpm(&self) -> f64 {
        self.system_bpm
    }

    #[inline(always)]
    pub fn main_bpm(&self) -> f64 {
        self.main_bpm
    }

    #[inline(always)]
    pub fn system_interval(&self) -> f64 {
        self.system_interval
    }

    #[inline(always)]
    pub fn main_interval(&self) -> f64 {
        self.system_interval * self.subdivision as f64
    }

    #[inline(always)]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[inline(always)]
    pub fn next_system_beat_time(&self) -> f64 {
        self.next_system_beat_time
    }

    #[inline(always)]
    pub fn beat_counter(&self) -> u32 {
        self.beat_counter
    }

    #[inline(always)]
    pub fn beats_fired(&self) -> u64 {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock_240() -> BeatClock {
        let mut clock = BeatClock::new(240.0, 120.0, 0.125);
        clock.start(0.0);
        clock
    }

    #[test]
    fn first_beat_is_a_main_pulse_and_parity_alternates() {
        let mut clock = clock_240();
        let ticks = clock.tick(1.0);
        let kinds: Vec<bool> = ticks.iter().map(|t| t.is_main_pulse()).collect();
        assert_eq!(kinds, vec![true, false, true, false, true]);
        assert_eq!(ticks[0].period_bpm, 120.0);
        assert_eq!(ticks[1].period_bpm, 240.0);
        assert_eq!(ticks[4].time, 1.0);
        assert_eq!(clock.next_system_beat_time(), 1.25);
    }

    #[test]
    fn tick_fires_nothing_before_the_pointer() {
        let mut clock = clock_240();
        assert_eq!(clock.tick(0.0).len(), 1);
        assert!(clock.tick(0.2499).is_empty());
        assert_eq!(clock.tick(0.25).len(), 1);
    }

    #[test]
    fn no_drift_over_ten_thousand_beats() {
        for &bpm in &[137.0, 240.0, 93.7, 1000.0] {
            let mut clock = BeatClock::new(bpm, bpm / 2.0, 0.05);
            clock.start(3.0);
            let interval = 60.0 / bpm;
            let mut now = 3.0;
            let mut times = Vec::with_capacity(10_000);
            let mut step = 0u32;
            while times.len() < 10_000 {
                // jittery frame deltas
                step = step.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                now += 0.004 + (step % 1000) as f64 * 0.000_012;
                times.extend(clock.tick(now).into_iter().map(|t| t.time));
            }
            for pair in times.windows(2) {
                assert!((pair[1] - pair[0] - interval).abs() < 1e-9);
            }
            let last = times[9_999];
            assert!((last - (3.0 + 9_999.0 * interval)).abs() < 1e-9);
        }
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let mut clock = clock_240();
        clock.tick(0.9);
        assert!(clock.is_input_window_open(1.0));
        assert!(clock.is_input_window_open(1.0 - 0.125));
        assert!(clock.is_input_window_open(1.0 + 0.125));
        assert!(!clock.is_input_window_open(1.0 - 0.126));
        assert!(!clock.is_input_window_open(1.0 + 0.126));
        // off-beat subdivision is not a judging point
        assert!(!clock.is_input_window_open(1.25));
    }

    #[test]
    fn window_uses_previous_pulse_after_it_fired() {
        let mut clock = clock_240();
        clock.tick(1.1);
        assert!(clock.is_input_window_open(1.1));
        assert!(clock.pulse_offset(1.1) > 0.0);
        assert_eq!(clock.judge_timing(1.1), HitTiming::Perfect);
        assert_eq!(clock.judge_timing(1.2), HitTiming::Late);
        assert_eq!(clock.judge_timing(1.3), HitTiming::Early);
    }

    #[test]
    fn window_closed_before_start() {
        let clock = BeatClock::new(240.0, 120.0, 0.125);
        assert!(!clock.is_input_window_open(0.0));
    }

    #[test]
    fn invalid_bpm_is_clamped() {
        let mut clock = BeatClock::new(0.0, -5.0, 0.1);
        assert_eq!(clock.system_bpm(), MIN_BPM);
        assert!(clock.system_interval().is_finite());
        clock.start(0.0);
        assert_eq!(clock.tick(1.0).len(), 1);
    }

    #[test]
    fn catch_up_cap_preserves_phase() {
        let mut clock = BeatClock::new(240.0, 120.0, 0.1).with_max_catch_up(3);
        clock.start(0.0);
        // beats due: 0.0 .. 2.5 -> 11 beats, only the last three are delivered
        let ticks = clock.tick(2.5);
        assert_eq!(ticks.len(), 3);
        assert_eq!(ticks[2].time, 2.5);
        assert!(ticks[2].is_main_pulse());
        assert_eq!(ticks[2].index, 10);
    }

    #[test]
    fn reconfigure_keeps_pending_beat() {
        let mut clock = clock_240();
        clock.tick(0.5);
        assert_eq!(clock.next_system_beat_time(), 0.75);
        clock.configure(120.0, 60.0);
        assert_eq!(clock.next_system_beat_time(), 0.75);
        let ticks = clock.tick(1.75);
        let times: Vec<f64> = ticks.iter().map(|t| t.time).collect();
        assert_eq!(times, vec![0.75, 1.25, 1.75]);
        assert!(!ticks[0].is_main_pulse());
        assert!(ticks[1].is_main_pulse());
    }

    #[test]
    fn subscribers_are_deduplicated_and_pruned() {
        let mut clock = clock_240();
        clock.subscribe(MonsterId(1));
        clock.subscribe(MonsterId(2));
        clock.subscribe(MonsterId(1));
        assert_eq!(clock.subscribers(), &[MonsterId(1), MonsterId(2)]);
        assert!(clock.unsubscribe(MonsterId(1)));
        assert!(!clock.unsubscribe(MonsterId(1)));
        assert_eq!(clock.subscribers(), &[MonsterId(2)]);
    }
}
