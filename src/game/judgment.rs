use crate::core::space::MonsterId;
use crate::core::visual::IconMark;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum HitTiming {
    Perfect, // inside the main-pulse window
    Early,   // accepted, before the nearest pulse
    Late,    // accepted, after the nearest pulse
}

impl HitTiming {
    #[inline(always)]
    pub fn is_perfect(self) -> bool {
        self == HitTiming::Perfect
    }

    pub fn icon_mark(self) -> IconMark {
        match self {
            HitTiming::Perfect => IconMark::Perfect,
            HitTiming::Early => IconMark::Early,
            HitTiming::Late => IconMark::Late,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MissReason {
    /// Pressed while the monster was not waiting for input.
    OutOfTurn,
    /// Pressed during a rest.
    PressedDuringRest,
    WrongSymbol,
    /// Monster reached the death line.
    DeathLine,
}

impl MissReason {
    /// Whether the miss came from a keypress. Death-line misses do not.
    #[inline(always)]
    pub fn is_protocol_violation(self) -> bool {
        !matches!(self, MissReason::DeathLine)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Judgment {
    Hit(HitTiming),
    Miss(MissReason),
}

impl Judgment {
    #[inline(always)]
    pub fn is_hit(self) -> bool {
        matches!(self, Judgment::Hit(_))
    }

    #[inline(always)]
    pub fn is_perfect(self) -> bool {
        matches!(self, Judgment::Hit(HitTiming::Perfect))
    }

    pub fn icon_mark(self) -> IconMark {
        match self {
            Judgment::Hit(timing) => timing.icon_mark(),
            Judgment::Miss(_) => IconMark::Miss,
        }
    }
}

/// A judged event, kept for the session log.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JudgmentRecord {
    pub monster: MonsterId,
    pub judgment: Judgment,
    pub time: f64,
}

/// Running totals for a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub perfect: u32,
    pub early: u32,
    pub late: u32,
    pub out_of_turn: u32,
    pub pressed_during_rest: u32,
    pub wrong_symbol: u32,
    pub death_line: u32,
    pub defeated: u32,
    pub spawned: u32,
    pub game_overs: u32,
}

impl SessionStats {
    pub fn record(&mut self, judgment: Judgment) {
        let slot = match judgment {
            Judgment::Hit(HitTiming::Perfect) => &mut self.perfect,
            Judgment::Hit(HitTiming::Early) => &mut self.early,
            Judgment::Hit(HitTiming::Late) => &mut self.late,
            Judgment::Miss(MissReason::OutOfTurn) => &mut self.out_of_turn,
            Judgment::Miss(MissReason::PressedDuringRest) => &mut self.pressed_during_rest,
            Judgment::Miss(MissReason::WrongSymbol) => &mut self.wrong_symbol,
            Judgment::Miss(MissReason::DeathLine) => &mut self.death_line,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn hits(&self) -> u32 {
        self.perfect + self.early + self.late
    }

    pub fn misses(&self) -> u32 {
        self.out_of_turn + self.pressed_during_rest + self.wrong_symbol + self.death_line
    }

    /// Share of hits that were perfect, 0.0 when nothing was hit.
    pub fn perfect_ratio(&self) -> f64 {
        let hits = self.hits();
        if hits == 0 { 0.0 } else { self.perfect as f64 / hits as f64 }
    }
}
