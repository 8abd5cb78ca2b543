use crate::core::space::perp;
use cgmath::{InnerSpace, Vector2, Zero};

/// Perpendicular wobble applied on top of straight-line travel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zigzag {
    pub amplitude: f32,
    /// Radians per second.
    pub frequency: f32,
}

/// Straight-line mover with an optional zigzag.
#[derive(Clone, Debug)]
pub struct Movement {
    origin: Vector2<f32>,
    direction: Vector2<f32>,
    speed: f32,
    zigzag: Option<Zigzag>,
    elapsed: f32,
    position: Vector2<f32>,
}

impl Movement {
    pub fn new(origin: Vector2<f32>, direction: Vector2<f32>, speed: f32) -> Self {
        Self {
            origin,
            direction: if direction.magnitude2() > f32::EPSILON { direction.normalize() } else { Vector2::zero() },
            speed: speed.max(0.0),
            zigzag: None,
            elapsed: 0.0,
            position: origin,
        }
    }

    pub fn with_zigzag(mut self, zigzag: Zigzag) -> Self {
        self.zigzag = Some(zigzag);
        self
    }

    /// Moves by `dt` seconds and returns the new position. The path is a
    /// function of total elapsed time, so frame size does not change it.
    pub fn advance(&mut self, dt: f32) -> Vector2<f32> {
        self.elapsed += dt.max(0.0);
        let mut pos = self.origin + self.direction * (self.speed * self.elapsed);
        if let Some(z) = self.zigzag {
            pos += perp(self.direction) * (z.amplitude * (self.elapsed * z.frequency).sin());
        }
        self.position = pos;
        pos
    }

    #[inline(always)]
    pub fn position(&self) -> Vector2<f32> {
        self.position
    }

    #[inline(always)]
    pub fn direction(&self) -> Vector2<f32> {
        self.direction
    }

    #[inline(always)]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline(always)]
    pub fn is_irregular(&self) -> bool {
        self.zigzag.is_some()
    }
}

/// Vertical line a monster must not cross.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeathLine {
    pub x: f32,
}

impl DeathLine {
    /// Whether `position` is at or past the line for something travelling in
    /// `direction`. Movers with no horizontal component never cross.
    pub fn is_crossed(&self, position: Vector2<f32>, direction: Vector2<f32>) -> bool {
        if direction.x < 0.0 {
            position.x <= self.x
        } else if direction.x > 0.0 {
            position.x >= self.x
        } else {
            false
        }
    }
}
