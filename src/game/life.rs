use log::{debug, info};

pub const DEFAULT_MAX_FAILURES: u32 = 5;

/// What a miss did to the meter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeterChange {
    /// Meter was already depleted; nothing changed.
    Ignored,
    Raised,
    /// This miss filled the meter.
    Depleted,
}

/// Failure counter. Hits pay back one failure, misses add one, and a full
/// meter ends the run until `reset`.
#[derive(Clone, Debug)]
pub struct TrustMeter {
    failure_count: u32,
    max_failures: u32,
    depleted: bool,
}

impl Default for TrustMeter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FAILURES)
    }
}

impl TrustMeter {
    pub fn new(max_failures: u32) -> Self {
        Self { failure_count: 0, max_failures: max_failures.max(1), depleted: false }
    }

    pub fn record_hit(&mut self) {
        if self.depleted {
            return;
        }
        self.failure_count = self.failure_count.saturating_sub(1);
        debug!("Hit: trust {}/{}", self.failure_count, self.max_failures);
    }

    pub fn record_miss(&mut self) -> MeterChange {
        if self.depleted {
            return MeterChange::Ignored;
        }
        self.failure_count += 1;
        debug!("Miss: trust {}/{}", self.failure_count, self.max_failures);
        if self.failure_count >= self.max_failures {
            self.failure_count = self.max_failures;
            self.depleted = true;
            info!("Trust meter depleted after {} failures", self.max_failures);
            return MeterChange::Depleted;
        }
        MeterChange::Raised
    }

    pub fn reset(&mut self) {
        self.failure_count = 0;
        self.depleted = false;
        debug!("Trust meter reset");
    }

    #[inline(always)]
    pub fn is_depleted(&self) -> bool {
        self.depleted
    }

    #[inline(always)]
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    #[inline(always)]
    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    /// How full the meter bar is, 0.0..=1.0.
    pub fn fill_fraction(&self) -> f32 {
        self.failure_count as f32 / self.max_failures as f32
    }
}
