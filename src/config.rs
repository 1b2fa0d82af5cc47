//! Configuration types, grounded on the teacher's `option.rs` pattern
//! (`serde`-deserializable structs with field defaults) minus the `clap`
//! half, since Juniper is a library with no CLI surface of its own.

use serde::Deserialize;

/// Minimal distance to introduce a continuation symbol.
pub const MIN_CONTINUATION: usize = 8;
/// Minimal surround length to ever size a window down to.
pub const MIN_SURROUND_LEN: usize = 10;
/// Allow a word split if the word is longer than this many bytes.
pub const MAX_SCAN_WORD: usize = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Fallback {
    None,
    Prefix,
}

impl Default for Fallback {
    fn default() -> Self {
        Fallback::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EscapeMarkup {
    On,
    Off,
    Auto,
}

impl Default for EscapeMarkup {
    fn default() -> Self {
        EscapeMarkup::Auto
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub highlight_on: String,
    pub highlight_off: String,
    pub continuation: String,
    pub fallback: Fallback,
    pub length: usize,
    pub min_length: usize,
    pub max_matches: usize,
    pub surround_max: usize,
    pub separators: Vec<char>,
    pub connectors: Vec<u8>,
    pub escape_markup: EscapeMarkup,
    pub preserve_white_space: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        SummaryConfig {
            highlight_on: "<b>".to_string(),
            highlight_off: "</b>".to_string(),
            continuation: "...".to_string(),
            fallback: Fallback::default(),
            length: 256,
            min_length: 128,
            max_matches: 3,
            surround_max: 48,
            separators: vec!['\u{1D}', '\u{1F}'],
            connectors: vec![b'-', b'\''],
            escape_markup: EscapeMarkup::default(),
            preserve_white_space: false,
        }
    }
}

impl SummaryConfig {
    pub fn is_separator(&self, c: char) -> bool {
        self.separators.contains(&c)
    }

    pub fn is_connector(&self, b: u8) -> bool {
        self.connectors.contains(&b)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct StemConfig {
    pub min_length: usize,
    pub max_extend: usize,
}

impl Default for StemConfig {
    fn default() -> Self {
        StemConfig { min_length: 4, max_extend: 3 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub winsize: usize,
    pub winsize_fallback_multiplier: usize,
    pub max_match_candidates: usize,
    pub need_complete_cnt: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            winsize: 100,
            winsize_fallback_multiplier: 10,
            max_match_candidates: 1000,
            need_complete_cnt: 3,
        }
    }
}

const PROXIMITY_FACTOR_DEFAULT: f64 = 0.25;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    pub factor: f64,
    pub noconstraint_offset: i64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        ProximityConfig { factor: PROXIMITY_FACTOR_DEFAULT, noconstraint_offset: 50 }
    }
}

impl ProximityConfig {
    /// Values outside `[0, 1e8]` silently reset to the default, per spec.
    pub fn normalized_factor(&self) -> f64 {
        if (0.0..=1e8).contains(&self.factor) {
            self.factor
        } else {
            PROXIMITY_FACTOR_DEFAULT
        }
    }
}

/// Top-level configuration a caller builds from any `serde`-compatible
/// source (file, env, literal struct). Juniper itself never reads files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JuniperConfig {
    pub dynsum: SummaryConfig,
    pub stem: StemConfig,
    pub matcher: MatcherConfig,
    pub proximity: ProximityConfig,
}
