use crate::core::space::{MonsterId, SpatialQuery};
use crate::game::movement::Movement;
use crate::game::turn::TurnStateMachine;
use cgmath::{MetricSpace, Vector2};
use std::collections::BTreeMap;

pub const DEFAULT_HIT_RADIUS: f32 = 0.6;

#[derive(Clone, Debug)]
pub struct Monster {
    pub id: MonsterId,
    pub turn: TurnStateMachine,
    pub movement: Movement,
    /// Radius of the clickable region around the monster's position.
    pub hit_radius: f32,
}

impl Monster {
    #[inline(always)]
    pub fn position(&self) -> Vector2<f32> {
        self.movement.position()
    }

    pub fn contains_point(&self, point: Vector2<f32>) -> bool {
        self.position().distance(point) <= self.hit_radius
    }
}

/// Live monsters keyed by handle. Handles are never reused.
#[derive(Debug, Default)]
pub struct Roster {
    monsters: BTreeMap<MonsterId, Monster>,
    next_id: u32,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next handle.
    pub fn allocate_id(&mut self) -> MonsterId {
        self.next_id += 1;
        MonsterId(self.next_id)
    }

    pub fn insert(&mut self, monster: Monster) {
        self.monsters.insert(monster.id, monster);
    }

    pub fn remove(&mut self, id: MonsterId) -> Option<Monster> {
        self.monsters.remove(&id)
    }

    pub fn get(&self, id: MonsterId) -> Option<&Monster> {
        self.monsters.get(&id)
    }

    pub fn get_mut(&mut self, id: MonsterId) -> Option<&mut Monster> {
        self.monsters.get_mut(&id)
    }

    pub fn contains(&self, id: MonsterId) -> bool {
        self.monsters.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<MonsterId> {
        self.monsters.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Monster> {
        self.monsters.values_mut()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.monsters.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty()
    }
}

impl SpatialQuery for Roster {
    fn monsters_within_radius(&self, center: Vector2<f32>, radius: f32) -> Vec<MonsterId> {
        self.monsters
            .values()
            .filter(|m| m.position().distance(center) <= radius)
            .map(|m| m.id)
            .collect()
    }

    /// Closest monster whose hit region contains `point`.
    fn monster_at_point(&self, point: Vector2<f32>) -> Option<MonsterId> {
        self.monsters
            .values()
            .filter(|m| m.contains_point(point))
            .min_by(|a, b| a.position().distance(point).total_cmp(&b.position().distance(point)))
            .map(|m| m.id)
    }

    fn position_of(&self, monster: MonsterId) -> Option<Vector2<f32>> {
        self.monsters.get(&monster).map(Monster::position)
    }
}
