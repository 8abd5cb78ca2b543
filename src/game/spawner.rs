use crate::game::movement::Zigzag;
use cgmath::Vector2;
use log::{debug, warn};
use rand::Rng;

#[derive(Clone, Debug, PartialEq)]
pub struct SpawnerSettings {
    pub enabled: bool,
    pub min_secs: f32,
    pub max_secs: f32,
    /// Spawn x is the player's x plus this.
    pub distance: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub irregular_chance: f64,
    pub irregular_speed_scale: f32,
    pub zigzag: Zigzag,
}

impl Default for SpawnerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_secs: 3.0,
            max_secs: 7.0,
            distance: 12.0,
            min_y: -4.0,
            max_y: -2.0,
            min_speed: 0.8,
            max_speed: 1.2,
            irregular_chance: 0.10,
            irregular_speed_scale: 1.4,
            zigzag: Zigzag { amplitude: 0.3, frequency: 3.0 },
        }
    }
}

impl SpawnerSettings {
    /// Replaces non-finite values with defaults, orders swapped bounds and
    /// clamps the chance into 0..=1.
    fn sanitized(mut self) -> Self {
        let d = SpawnerSettings::default();
        let fields = [
            ("min_secs", &mut self.min_secs, d.min_secs),
            ("max_secs", &mut self.max_secs, d.max_secs),
            ("distance", &mut self.distance, d.distance),
            ("min_y", &mut self.min_y, d.min_y),
            ("max_y", &mut self.max_y, d.max_y),
            ("min_speed", &mut self.min_speed, d.min_speed),
            ("max_speed", &mut self.max_speed, d.max_speed),
            ("irregular_speed_scale", &mut self.irregular_speed_scale, d.irregular_speed_scale),
            ("zigzag amplitude", &mut self.zigzag.amplitude, d.zigzag.amplitude),
            ("zigzag frequency", &mut self.zigzag.frequency, d.zigzag.frequency),
        ];
        for (name, value, default) in fields {
            if !value.is_finite() {
                warn!("Spawner {} is {}; using {}.", name, value, default);
                *value = default;
            }
        }
        if self.min_secs > self.max_secs {
            std::mem::swap(&mut self.min_secs, &mut self.max_secs);
        }
        if self.min_y > self.max_y {
            std::mem::swap(&mut self.min_y, &mut self.max_y);
        }
        if self.min_speed > self.max_speed {
            std::mem::swap(&mut self.min_speed, &mut self.max_speed);
        }
        self.min_secs = self.min_secs.max(0.0);
        self.max_secs = self.max_secs.max(self.min_secs);
        self.irregular_chance = if self.irregular_chance.is_finite() {
            self.irregular_chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }
}

/// Where and how a new monster should appear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest {
    pub position: Vector2<f32>,
    pub speed: f32,
    pub zigzag: Option<Zigzag>,
}

/// Countdown spawner. Randomness is supplied by the caller.
#[derive(Clone, Debug)]
pub struct Spawner {
    settings: SpawnerSettings,
    timer: f32,
}

impl Spawner {
    pub fn new<R: Rng + ?Sized>(settings: SpawnerSettings, rng: &mut R) -> Self {
        let mut spawner = Self { settings: settings.sanitized(), timer: 0.0 };
        spawner.reset_timer(rng);
        spawner
    }

    fn reset_timer<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.timer = rng.random_range(self.settings.min_secs..=self.settings.max_secs);
    }

    /// Counts down by `dt`; returns a request when the timer expires.
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, player_x: f32, rng: &mut R) -> Option<SpawnRequest> {
        if !self.settings.enabled {
            return None;
        }
        self.timer -= dt.max(0.0);
        if self.timer > 0.0 {
            return None;
        }
        let request = self.roll(player_x, rng);
        self.reset_timer(rng);
        Some(request)
    }

    pub fn roll<R: Rng + ?Sized>(&self, player_x: f32, rng: &mut R) -> SpawnRequest {
        let s = &self.settings;
        let y = rng.random_range(s.min_y..=s.max_y);
        let mut speed = rng.random_range(s.min_speed..=s.max_speed);
        let mut zigzag = None;
        if rng.random_bool(s.irregular_chance) {
            speed *= s.irregular_speed_scale;
            zigzag = Some(s.zigzag);
        }
        debug!(
            "Spawn roll: y={:.2} speed={:.2}{}",
            y,
            speed,
            if zigzag.is_some() { " (irregular)" } else { "" }
        );
        SpawnRequest { position: Vector2::new(player_x + s.distance, y), speed, zigzag }
    }

    #[inline(always)]
    pub fn time_until_next(&self) -> f32 {
        self.timer
    }

    pub fn settings(&self) -> &SpawnerSettings {
        &self.settings
    }
}
