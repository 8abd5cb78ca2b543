use crate::game::symbol::{builtin_patterns, Pattern};
use log::warn;
use rand::Rng;

/// Picks encounter patterns uniformly from a fixed table. The random source
/// is passed in, so a seeded RNG gives a repeatable sequence.
#[derive(Clone, Debug)]
pub struct SequenceGenerator {
    table: Vec<Pattern>,
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self { table: builtin_patterns() }
    }
}

impl SequenceGenerator {
    /// Uses `table` unless it is empty, in which case the built-in table is
    /// used instead.
    pub fn with_table(table: Vec<Pattern>) -> Self {
        if table.is_empty() {
            warn!("Pattern table is empty; falling back to the built-in patterns.");
            return Self::default();
        }
        Self { table }
    }

    pub fn table(&self) -> &[Pattern] {
        &self.table
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Pattern {
        let idx = rng.random_range(0..self.table.len());
        self.table[idx].clone()
    }
}
