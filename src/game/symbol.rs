use std::fmt;
use std::str::FromStr;

pub const MIN_PATTERN_LEN: usize = 2;
pub const MAX_PATTERN_LEN: usize = 6;

/// One command prompt. `Pause` is a rest that never requires a keypress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    A,
    S,
    J,
    K,
    Pause,
}

impl Symbol {
    pub const KEYS: [Symbol; 4] = [Symbol::A, Symbol::S, Symbol::J, Symbol::K];

    #[inline(always)]
    pub const fn is_pause(self) -> bool {
        matches!(self, Symbol::Pause)
    }

    /// Lowercase name used for sound-bank keys.
    pub const fn key_name(self) -> &'static str {
        match self {
            Symbol::A => "a",
            Symbol::S => "s",
            Symbol::J => "j",
            Symbol::K => "k",
            Symbol::Pause => "pause",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::A => write!(f, "A"),
            Symbol::S => write!(f, "S"),
            Symbol::J => write!(f, "J"),
            Symbol::K => write!(f, "K"),
            Symbol::Pause => write!(f, "・"),
        }
    }
}

impl FromStr for Symbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "A" | "a" => Ok(Symbol::A),
            "S" | "s" => Ok(Symbol::S),
            "J" | "j" => Ok(Symbol::J),
            "K" | "k" => Ok(Symbol::K),
            "・" | "." | "-" | "_" => Ok(Symbol::Pause),
            _ if trimmed.eq_ignore_ascii_case("pause") => Ok(Symbol::Pause),
            "" => Err("Symbol is empty".to_string()),
            _ => Err(format!("'{}' is not one of A, S, J, K or a pause", trimmed)),
        }
    }
}

/// An authored command sequence. `id` is the 1-based row in the table the
/// pattern came from and addresses its whole-pattern audio clip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    pub id: usize,
    pub symbols: Vec<Symbol>,
}

impl Pattern {
    pub fn new(id: usize, symbols: Vec<Symbol>) -> Self {
        Self { id, symbols }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of symbols that need a keypress.
    pub fn keypress_count(&self) -> usize {
        self.symbols.iter().filter(|s| !s.is_pause()).count()
    }

    /// Parses a whitespace-separated pattern such as `A S J . . K`.
    pub fn parse(id: usize, text: &str) -> Result<Self, String> {
        let symbols = text
            .split_whitespace()
            .map(Symbol::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if !(MIN_PATTERN_LEN..=MAX_PATTERN_LEN).contains(&symbols.len()) {
            return Err(format!(
                "Pattern '{}' has {} symbols, expected {}..={}",
                text.trim(),
                symbols.len(),
                MIN_PATTERN_LEN,
                MAX_PATTERN_LEN
            ));
        }
        Ok(Self { id, symbols })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.symbols.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", s)?;
        }
        Ok(())
    }
}

// --- Built-in pattern table ---
// Authoring rule: at most three keypresses in a row.

const A: Symbol = Symbol::A;
const S: Symbol = Symbol::S;
const J: Symbol = Symbol::J;
const K: Symbol = Symbol::K;
const P: Symbol = Symbol::Pause;

pub const PATTERN_TABLE: &[&[Symbol]] = &[
    &[A, S, J, P, P, K],
    &[A, P, S, P, J, P],
    &[P, A, S, P, J, K],
    &[A, S, P, J, P, K],
    &[A, P, P, S, P, J],
    &[A, P, A, P, A, P],
    &[J, K, P, S],
    &[K, P, J],
    &[S, K],
];

pub fn builtin_patterns() -> Vec<Pattern> {
    PATTERN_TABLE
        .iter()
        .enumerate()
        .map(|(i, symbols)| Pattern::new(i + 1, symbols.to_vec()))
        .collect()
}
