use crate::core::input::PlayerCommand;
use crate::core::space::{MonsterId, SpatialQuery};
use crate::core::Effects;
use crate::game::monster::Roster;
use cgmath::{MetricSpace, Vector2};
use log::debug;
use std::fmt;
use std::str::FromStr;

/// How the player's target is chosen. Fixed for a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetPolicy {
    /// Closest candidate within the detection radius, re-evaluated every frame.
    NearestAuto,
    /// Next/previous commands walk the candidates in registration order.
    ManualCycle,
    /// A pointer pick selects the monster under it.
    #[default]
    PointerPick,
}

impl FromStr for TargetPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "nearestauto" | "nearest" | "auto" => Ok(Self::NearestAuto),
            "manualcycle" | "cycle" | "manual" => Ok(Self::ManualCycle),
            "pointerpick" | "pointer" | "pick" => Ok(Self::PointerPick),
            other => Err(format!("'{}' is not a valid target policy", other)),
        }
    }
}

impl fmt::Display for TargetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NearestAuto => write!(f, "NearestAuto"),
            Self::ManualCycle => write!(f, "ManualCycle"),
            Self::PointerPick => write!(f, "PointerPick"),
        }
    }
}

/// Decides which single monster receives player input.
#[derive(Clone, Debug)]
pub struct TargetSelector {
    policy: TargetPolicy,
    current: Option<MonsterId>,
    candidates: Vec<MonsterId>,
    detection_radius: f32,
    origin: Vector2<f32>,
}

impl TargetSelector {
    pub fn new(policy: TargetPolicy, origin: Vector2<f32>, detection_radius: f32) -> Self {
        Self {
            policy,
            current: None,
            candidates: Vec::new(),
            detection_radius: detection_radius.max(0.0),
            origin,
        }
    }

    pub fn register(&mut self, monster: MonsterId) {
        if !self.candidates.contains(&monster) {
            self.candidates.push(monster);
        }
    }

    /// Drops a candidate. If it was the current target the selection is
    /// cleared and nothing is promoted in its place. Returns whether it was
    /// the current target.
    pub fn deregister(&mut self, monster: MonsterId) -> bool {
        self.candidates.retain(|m| *m != monster);
        if self.current == Some(monster) {
            self.current = None;
            debug!("{} deregistered while targeted", monster);
            return true;
        }
        false
    }

    /// Moves the target to `next`, deasserting the previous one first.
    /// Requests for the current target, or for non-candidates, do nothing.
    pub fn retarget(&mut self, next: Option<MonsterId>, roster: &mut Roster, fx: &mut Effects<'_>) {
        if next == self.current {
            return;
        }
        if let Some(id) = next {
            if !self.candidates.contains(&id) {
                debug!("{} is not a target candidate", id);
                return;
            }
        }

        if let Some(prev) = self.current.take() {
            if let Some(monster) = roster.get_mut(prev) {
                monster.turn.set_targeted(false, fx);
            }
            fx.visual.set_selected(prev, false);
        }
        if let Some(id) = next {
            if let Some(monster) = roster.get_mut(id) {
                monster.turn.set_targeted(true, fx);
            }
            fx.visual.set_selected(id, true);
        }
        self.current = next;
        debug!("Target -> {:?}", self.current);
    }

    pub fn clear_target(&mut self, roster: &mut Roster, fx: &mut Effects<'_>) {
        self.retarget(None, roster, fx);
    }

    /// Per-frame policy pass. Only the auto policy acts here.
    pub fn update(&mut self, roster: &mut Roster, fx: &mut Effects<'_>) {
        if self.policy != TargetPolicy::NearestAuto {
            return;
        }
        let nearest = self.nearest_candidate(roster);
        self.retarget(nearest, roster, fx);
    }

    fn nearest_candidate(&self, roster: &Roster) -> Option<MonsterId> {
        let in_range = roster.monsters_within_radius(self.origin, self.detection_radius);
        self.candidates
            .iter()
            .filter(|id| in_range.contains(*id))
            .filter_map(|id| roster.position_of(*id).map(|p| (*id, p.distance(self.origin))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Steps through candidates, wrapping at both ends. `forward` picks the
    /// direction.
    pub fn cycle(&mut self, forward: bool, roster: &mut Roster, fx: &mut Effects<'_>) {
        let n = self.candidates.len();
        if n == 0 {
            return;
        }
        let idx = match self.current.and_then(|c| self.candidates.iter().position(|m| *m == c)) {
            Some(i) if forward => (i + 1) % n,
            Some(i) => (i + n - 1) % n,
            None if forward => 0,
            None => n - 1,
        };
        let next = self.candidates[idx];
        self.retarget(Some(next), roster, fx);
    }

    /// Selects the candidate under `point`. Empty space does nothing.
    pub fn pick(&mut self, point: Vector2<f32>, roster: &mut Roster, fx: &mut Effects<'_>) {
        match roster.monster_at_point(point) {
            Some(id) if self.candidates.contains(&id) => self.retarget(Some(id), roster, fx),
            _ => debug!("Pick at ({:.2}, {:.2}) hit nothing", point.x, point.y),
        }
    }

    /// Routes a selection command through the session's policy. Commands for
    /// other policies are ignored. Returns true when the command was a
    /// selection command.
    pub fn handle_command(
        &mut self,
        command: PlayerCommand,
        roster: &mut Roster,
        fx: &mut Effects<'_>,
    ) -> bool {
        match (self.policy, command) {
            (TargetPolicy::ManualCycle, PlayerCommand::CycleNext) => self.cycle(true, roster, fx),
            (TargetPolicy::ManualCycle, PlayerCommand::CyclePrev) => self.cycle(false, roster, fx),
            (TargetPolicy::PointerPick, PlayerCommand::Pick(point)) => self.pick(point, roster, fx),
            (policy, cmd) if cmd.is_selection() => {
                debug!("{:?} ignored under {} targeting", cmd, policy);
            }
            _ => return false,
        }
        true
    }

    // --- Accessors ---

    #[inline(always)]
    pub fn policy(&self) -> TargetPolicy {
        self.policy
    }

    #[inline(always)]
    pub fn current(&self) -> Option<MonsterId> {
        self.current
    }

    pub fn candidates(&self) -> &[MonsterId] {
        &self.candidates
    }

    #[inline(always)]
    pub fn origin(&self) -> Vector2<f32> {
        self.origin
    }

    #[inline(always)]
    pub fn detection_radius(&self) -> f32 {
        self.detection_radius
    }
}
