//! Beat flash: highlight alpha that snaps to full and eases back to a
//! baseline. Advanced by frame delta, never by sleeping.

/// Fraction of the main-pulse interval a fade may occupy, so one flash is
/// always finished before the next pulse.
pub const MAX_FADE_SHARE_OF_PULSE: f32 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ease {
    Linear,
    /// quad-out
    Decelerate,
}

fn ease_apply(e: Ease, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match e {
        Ease::Linear => t,
        Ease::Decelerate => 1.0 - (1.0 - t) * (1.0 - t),
    }
}

#[derive(Clone, Debug)]
pub struct HighlightFade {
    pub baseline_alpha: f32,
    pub ease: Ease,
    fade_elapsed: f32,
    fade_duration: f32,
    fade_active: bool,
}

impl HighlightFade {
    pub fn new(baseline_alpha: f32, ease: Ease) -> Self {
        Self {
            baseline_alpha: baseline_alpha.clamp(0.0, 1.0),
            ease,
            fade_elapsed: 0.0,
            fade_duration: 0.0,
            fade_active: false,
        }
    }

    /// Restarts from full intensity, whatever the current state. Returns the
    /// alpha to show right now.
    pub fn trigger(&mut self, duration: f32, main_interval: f64) -> f32 {
        let cap = (main_interval as f32 * MAX_FADE_SHARE_OF_PULSE).max(0.0);
        self.fade_duration = duration.max(0.0).min(cap);
        self.fade_elapsed = 0.0;
        self.fade_active = self.fade_duration > 0.0;
        if self.fade_active { 1.0 } else { self.baseline_alpha }
    }

    /// Advances the fade. Returns `Some(alpha)` while fading (the last value
    /// is the baseline), `None` once idle.
    pub fn advance(&mut self, dt: f32) -> Option<f32> {
        if !self.fade_active {
            return None;
        }
        self.fade_elapsed += dt.max(0.0);
        if self.fade_elapsed >= self.fade_duration {
            self.fade_active = false;
            return Some(self.baseline_alpha);
        }
        let t = ease_apply(self.ease, self.fade_elapsed / self.fade_duration);
        Some(1.0 + (self.baseline_alpha - 1.0) * t)
    }

    /// Drops any running fade without emitting anything.
    pub fn halt(&mut self) {
        self.fade_active = false;
        self.fade_elapsed = 0.0;
    }

    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.fade_active
    }

    #[inline(always)]
    pub fn duration(&self) -> f32 {
        self.fade_duration
    }
}
