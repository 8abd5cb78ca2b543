use crate::core::audio::SoundBank;
use crate::game::flash::Ease;
use crate::game::session::SessionSettings;
use crate::game::symbol::{builtin_patterns, Pattern, PATTERN_TABLE};
use crate::game::target::TargetPolicy;
use crate::game::turn::PromptVoice;
use cgmath::Vector2;
use configparser::ini::Ini;
use log::{info, warn};
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_PATH: &str = "echoforest.ini";
pub const SOUND_DIR: &str = "assets/sounds";

// Driver
pub const DEFAULT_DURATION_SECS: f64 = 60.0;
pub const DEFAULT_FRAME_RATE: u32 = 60;
pub const DEFAULT_SLIP_CHANCE: f64 = 0.05;

/// Settings for the headless driver. Not used by the core.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverSettings {
    pub duration_secs: f64,
    pub frame_rate: u32,
    /// Chance the autoplayer fumbles a press.
    pub slip_chance: f64,
    pub report_path: Option<String>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            frame_rate: DEFAULT_FRAME_RATE,
            slip_chance: DEFAULT_SLIP_CHANCE,
            report_path: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub session: SessionSettings,
    pub sounds: SoundBank,
    pub driver: DriverSettings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { session: SessionSettings::default(), sounds: default_sounds(), driver: DriverSettings::default() }
    }
}

/// Asset paths for every sound the engine can request.
pub fn default_sounds() -> SoundBank {
    let mut bank = SoundBank::new();
    for (key, path) in default_sound_entries() {
        bank.insert(key, path);
    }
    bank
}

fn default_sound_entries() -> Vec<(String, String)> {
    let mut entries = vec![
        ("cue".to_string(), format!("{}/go.ogg", SOUND_DIR)),
        ("spawn".to_string(), format!("{}/spawn.ogg", SOUND_DIR)),
    ];
    for id in 1..=PATTERN_TABLE.len() {
        entries.push((format!("pattern{}", id), format!("{}/pattern{}.ogg", SOUND_DIR, id)));
    }
    for key in ["a", "s", "j", "k"] {
        entries.push((format!("key_{}", key), format!("{}/key_{}.ogg", SOUND_DIR, key)));
        entries.push((format!("voice_{}", key), format!("{}/voice_{}.ogg", SOUND_DIR, key)));
    }
    entries
}

// --- Value parsing ---

fn parse_prompt_voice(s: &str) -> Result<PromptVoice, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "whole" | "wholepattern" | "pattern" => Ok(PromptVoice::WholePattern),
        "per_symbol" | "persymbol" | "symbol" => Ok(PromptVoice::PerSymbol),
        "silent" | "none" | "off" => Ok(PromptVoice::Silent),
        other => Err(format!("'{}' is not a prompt voice", other)),
    }
}

fn parse_ease(s: &str) -> Result<Ease, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "linear" => Ok(Ease::Linear),
        "decelerate" | "quadout" | "quad_out" => Ok(Ease::Decelerate),
        other => Err(format!("'{}' is not an ease", other)),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("'{}' is not a boolean", other)),
    }
}

/// Reads `[section] key`, warning and keeping `default` when the value does
/// not parse.
fn read_with<T, E: Display>(conf: &Ini, section: &str, key: &str, default: T, parse: impl Fn(&str) -> Result<T, E>) -> T {
    match conf.get(section, key) {
        None => default,
        Some(raw) => match parse(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("Invalid value for [{}] {} = '{}' ({}); using default.", section, key, raw, e);
                default
            }
        },
    }
}

fn read<T: FromStr>(conf: &Ini, section: &str, key: &str, default: T) -> T
where
    T::Err: Display,
{
    read_with(conf, section, key, default, |s| s.trim().parse::<T>())
}

/// Like `read` but rejects `nan` and `inf`.
fn read_finite<T>(conf: &Ini, section: &str, key: &str, default: T) -> T
where
    T: FromStr + Copy + Into<f64>,
    T::Err: Display,
{
    read_with(conf, section, key, default, |s| match s.trim().parse::<T>() {
        Ok(v) if v.into().is_finite() => Ok(v),
        Ok(_) => Err("not a finite number".to_string()),
        Err(e) => Err(e.to_string()),
    })
}

/// Like `read` but rejects non-finite and non-positive numbers.
fn read_positive(conf: &Ini, section: &str, key: &str, default: f64) -> f64 {
    read_with(conf, section, key, default, |s| match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        Ok(v) => Err(format!("{} must be positive", v)),
        Err(e) => Err(e.to_string()),
    })
}

impl GameConfig {
    pub fn from_ini(conf: &Ini) -> Self {
        let d = GameConfig::default();
        let ds = &d.session;

        let mut session = SessionSettings {
            system_bpm: read_positive(conf, "timing", "system_bpm", ds.system_bpm),
            main_bpm: read_positive(conf, "timing", "main_bpm", ds.main_bpm),
            tolerance: read_finite(conf, "timing", "tolerance", ds.tolerance).max(0.0),
            audio_offset: read_finite(conf, "timing", "audio_offset", ds.audio_offset),
            max_catch_up: read(conf, "timing", "max_catch_up", ds.max_catch_up),
            policy: read(conf, "targeting", "policy", ds.policy),
            detection_radius: read_finite(conf, "targeting", "detection_radius", ds.detection_radius),
            max_failures: read(conf, "meter", "max_failures", ds.max_failures),
            seed: read_with(conf, "driver", "seed", ds.seed, |s| s.trim().parse::<u64>().map(Some)),
            ..ds.clone()
        };

        session.player_origin = Vector2::new(
            read_finite(conf, "field", "player_x", ds.player_origin.x),
            read_finite(conf, "field", "player_y", ds.player_origin.y),
        );
        session.death_line_x = read_finite(conf, "field", "death_line_x", ds.death_line_x);
        session.hit_radius = read_finite(conf, "field", "hit_radius", ds.hit_radius);

        let t = &mut session.turn;
        t.prompt_voice = read_with(conf, "turn", "prompt_voice", t.prompt_voice, parse_prompt_voice);
        t.cue_on_main_pulse = read_with(conf, "turn", "cue_on_main_pulse", t.cue_on_main_pulse, parse_bool);
        t.flash_duration = read_finite(conf, "turn", "flash_duration", t.flash_duration);
        t.baseline_alpha = read_finite(conf, "turn", "baseline_alpha", t.baseline_alpha);
        t.flash_ease = read_with(conf, "turn", "flash_ease", t.flash_ease, parse_ease);

        let sp = &mut session.spawner;
        sp.enabled = read_with(conf, "spawner", "enabled", sp.enabled, parse_bool);
        sp.min_secs = read_finite(conf, "spawner", "min_secs", sp.min_secs);
        sp.max_secs = read_finite(conf, "spawner", "max_secs", sp.max_secs);
        sp.distance = read_finite(conf, "spawner", "distance", sp.distance);
        sp.min_y = read_finite(conf, "spawner", "min_y", sp.min_y);
        sp.max_y = read_finite(conf, "spawner", "max_y", sp.max_y);
        sp.min_speed = read_finite(conf, "spawner", "min_speed", sp.min_speed);
        sp.max_speed = read_finite(conf, "spawner", "max_speed", sp.max_speed);
        sp.irregular_chance = read_finite(conf, "spawner", "irregular_chance", sp.irregular_chance);

        session.patterns = read_patterns(conf);

        let driver = DriverSettings {
            duration_secs: read_positive(conf, "driver", "duration_secs", d.driver.duration_secs),
            frame_rate: read(conf, "driver", "frame_rate", d.driver.frame_rate).max(1),
            slip_chance: read_finite(conf, "driver", "slip_chance", d.driver.slip_chance).clamp(0.0, 1.0),
            report_path: conf.get("driver", "report_path").filter(|p| !p.trim().is_empty()),
        };

        Self { session, sounds: read_sounds(conf), driver }
    }

    pub fn from_ini_str(text: &str) -> Result<Self, String> {
        let mut conf = Ini::new();
        conf.read(text.to_string())?;
        Ok(Self::from_ini(&conf))
    }

    /// Loads `path`, writing a default file first if it does not exist.
    /// Syntax errors are returned; bad values are warned about and defaulted.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            info!("Config '{}' not found, writing defaults.", path.display());
            if let Err(e) = write_default(path) {
                warn!("Failed to write default config '{}': {}", path.display(), e);
            }
            return Ok(Self::default());
        }
        let mut conf = Ini::new();
        conf.load(path)?;
        info!("Loaded config from '{}'.", path.display());
        Ok(Self::from_ini(&conf))
    }
}

/// `[patterns] patternN = A . S J` rows. Rows that do not parse are
/// skipped; if none survive, the built-in table is used.
fn read_patterns(conf: &Ini) -> Vec<Pattern> {
    let Some(section) = conf.get_map_ref().get("patterns") else {
        return Vec::new();
    };
    let mut rows: Vec<(usize, &str)> = Vec::new();
    for (key, value) in section {
        let id = key.strip_prefix("pattern").and_then(|n| n.trim().parse::<usize>().ok());
        match (id, value) {
            (Some(id), Some(text)) if id > 0 => rows.push((id, text.as_str())),
            _ => warn!("Ignoring [patterns] entry '{}'; expected patternN = symbols.", key),
        }
    }
    rows.sort_by_key(|(id, _)| *id);
    rows.into_iter()
        .filter_map(|(id, text)| match Pattern::parse(id, text) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("Skipping pattern{}: {}", id, e);
                None
            }
        })
        .collect()
}

/// Defaults overlaid with any `[sounds]` entries.
fn read_sounds(conf: &Ini) -> SoundBank {
    let mut bank = default_sounds();
    if let Some(section) = conf.get_map_ref().get("sounds") {
        for (key, value) in section {
            match value {
                Some(path) if !path.trim().is_empty() => bank.insert(key.as_str(), path.trim()),
                _ => warn!("[sounds] {} has no path; keeping the default.", key),
            }
        }
    }
    bank
}

fn write_default(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let d = GameConfig::default();
    let s = &d.session;
    let mut conf = Ini::new();
    let mut set = |section: &str, key: &str, value: String| {
        conf.set(section, key, Some(value));
    };

    set("timing", "system_bpm", s.system_bpm.to_string());
    set("timing", "main_bpm", s.main_bpm.to_string());
    set("timing", "tolerance", s.tolerance.to_string());
    set("timing", "audio_offset", s.audio_offset.to_string());
    set("timing", "max_catch_up", s.max_catch_up.to_string());

    set("turn", "prompt_voice", "whole".to_string());
    set("turn", "cue_on_main_pulse", "1".to_string());
    set("turn", "flash_duration", s.turn.flash_duration.to_string());
    set("turn", "baseline_alpha", s.turn.baseline_alpha.to_string());
    set("turn", "flash_ease", "linear".to_string());

    set("targeting", "policy", s.policy.to_string());
    set("targeting", "detection_radius", s.detection_radius.to_string());

    set("meter", "max_failures", s.max_failures.to_string());

    set("field", "player_x", s.player_origin.x.to_string());
    set("field", "player_y", s.player_origin.y.to_string());
    set("field", "death_line_x", s.death_line_x.to_string());
    set("field", "hit_radius", s.hit_radius.to_string());

    let sp = &s.spawner;
    set("spawner", "enabled", "1".to_string());
    set("spawner", "min_secs", sp.min_secs.to_string());
    set("spawner", "max_secs", sp.max_secs.to_string());
    set("spawner", "distance", sp.distance.to_string());
    set("spawner", "min_y", sp.min_y.to_string());
    set("spawner", "max_y", sp.max_y.to_string());
    set("spawner", "min_speed", sp.min_speed.to_string());
    set("spawner", "max_speed", sp.max_speed.to_string());
    set("spawner", "irregular_chance", sp.irregular_chance.to_string());

    for pattern in builtin_patterns() {
        let text = pattern
            .symbols
            .iter()
            .map(|sym| if sym.is_pause() { ".".to_string() } else { sym.to_string() })
            .collect::<Vec<_>>()
            .join(" ");
        set("patterns", &format!("pattern{}", pattern.id), text);
    }

    for (key, path) in default_sound_entries() {
        set("sounds", &key, path);
    }

    set("driver", "duration_secs", d.driver.duration_secs.to_string());
    set("driver", "frame_rate", d.driver.frame_rate.to_string());
    set("driver", "slip_chance", d.driver.slip_chance.to_string());

    conf.write(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::{RecordingAudio, SoundId};
    use crate::core::visual::RecordingVisual;
    use crate::game::session::{GameSession, SessionEvent};
    use crate::game::symbol::Symbol;

    #[test]
    fn empty_text_gives_defaults() {
        let cfg = GameConfig::from_ini_str("").unwrap();
        assert_eq!(cfg.session.system_bpm, 240.0);
        assert_eq!(cfg.session.main_bpm, 120.0);
        assert_eq!(cfg.session.tolerance, 0.08);
        assert_eq!(cfg.session.policy, TargetPolicy::PointerPick);
        assert_eq!(cfg.session.max_failures, 5);
        assert!(cfg.session.patterns.is_empty());
        assert_eq!(cfg.driver, DriverSettings::default());
    }

    #[test]
    fn values_are_read_per_section() {
        let text = "\
[timing]
system_bpm = 180
main_bpm = 90
tolerance = 0.1

[turn]
prompt_voice = per_symbol
cue_on_main_pulse = no
flash_ease = decelerate

[targeting]
policy = nearest_auto
detection_radius = 9.5

[meter]
max_failures = 3

[spawner]
enabled = false
min_y = -5

[driver]
seed = 77
";
        let cfg = GameConfig::from_ini_str(text).unwrap();
        let s = &cfg.session;
        assert_eq!(s.system_bpm, 180.0);
        assert_eq!(s.main_bpm, 90.0);
        assert_eq!(s.tolerance, 0.1);
        assert_eq!(s.turn.prompt_voice, PromptVoice::PerSymbol);
        assert!(!s.turn.cue_on_main_pulse);
        assert_eq!(s.turn.flash_ease, Ease::Decelerate);
        assert_eq!(s.policy, TargetPolicy::NearestAuto);
        assert_eq!(s.detection_radius, 9.5);
        assert_eq!(s.max_failures, 3);
        assert!(!s.spawner.enabled);
        assert_eq!(s.spawner.min_y, -5.0);
        assert_eq!(s.seed, Some(77));
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let text = "\
[timing]
system_bpm = -4
main_bpm = fast
[targeting]
policy = telepathy
[meter]
max_failures = lots
";
        let cfg = GameConfig::from_ini_str(text).unwrap();
        assert_eq!(cfg.session.system_bpm, 240.0);
        assert_eq!(cfg.session.main_bpm, 120.0);
        assert_eq!(cfg.session.policy, TargetPolicy::PointerPick);
        assert_eq!(cfg.session.max_failures, 5);
    }

    #[test]
    fn non_finite_numbers_fall_back_to_defaults() {
        let text = "\
[timing]
tolerance = nan
[targeting]
detection_radius = inf
[field]
death_line_x = NaN
[turn]
baseline_alpha = nan
flash_duration = -inf
[spawner]
min_y = nan
max_speed = inf
min_secs = 0.1
max_secs = 0.2
";
        let cfg = GameConfig::from_ini_str(text).unwrap();
        let d = SessionSettings::default();
        assert_eq!(cfg.session.tolerance, d.tolerance);
        assert_eq!(cfg.session.detection_radius, d.detection_radius);
        assert_eq!(cfg.session.death_line_x, d.death_line_x);
        assert_eq!(cfg.session.turn.baseline_alpha, d.turn.baseline_alpha);
        assert_eq!(cfg.session.turn.flash_duration, d.turn.flash_duration);
        assert_eq!(cfg.session.spawner.min_y, d.spawner.min_y);
        assert_eq!(cfg.session.spawner.max_speed, d.spawner.max_speed);
        assert_eq!(cfg.session.spawner.min_secs, 0.1);

        let mut session = GameSession::new(cfg.session, RecordingAudio::default(), RecordingVisual::default());
        session.start(0.0);
        let mut spawned = 0;
        for frame in 1..=60 {
            let events = session.update(frame as f64 / 60.0, 1.0 / 60.0);
            spawned += events.iter().filter(|e| matches!(e, SessionEvent::Spawned(_))).count();
        }
        assert!(spawned >= 4);
    }

    #[test]
    fn patterns_are_parsed_and_invalid_rows_skipped() {
        let text = "\
[patterns]
pattern2 = A . S
pattern1 = J K
pattern3 = A B
pattern4 = A S J K A S J
";
        let cfg = GameConfig::from_ini_str(text).unwrap();
        let patterns = &cfg.session.patterns;
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0], Pattern::new(1, vec![Symbol::J, Symbol::K]));
        assert_eq!(patterns[1], Pattern::new(2, vec![Symbol::A, Symbol::Pause, Symbol::S]));
    }

    #[test]
    fn sound_overrides_keep_defaults() {
        let text = "[sounds]\ncue = custom/go.wav\n";
        let mut cfg = GameConfig::from_ini_str(text).unwrap();
        assert_eq!(cfg.sounds.resolve(SoundId::Cue), Some("custom/go.wav"));
        assert_eq!(cfg.sounds.resolve(SoundId::Key(Symbol::J)), Some("assets/sounds/key_j.ogg"));
        assert_eq!(cfg.sounds.resolve(SoundId::Pattern(1)), Some("assets/sounds/pattern1.ogg"));
    }

    #[test]
    fn prompt_voice_and_ease_names() {
        assert_eq!(parse_prompt_voice("Silent"), Ok(PromptVoice::Silent));
        assert!(parse_prompt_voice("loud").is_err());
        assert_eq!(parse_ease(" linear "), Ok(Ease::Linear));
        assert_eq!(parse_bool("ON"), Ok(true));
    }
}
