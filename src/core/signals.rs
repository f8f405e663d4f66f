//! Snapshot types written by external collaborators and read by the core
//! once per frame.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::core::color::Rgb;
use crate::core::formation::Formation;

pub const LETTER_COUNT: usize = 26;
pub const DIGIT_COUNT: usize = 10;

/// Normalized spectrum energies, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioBands {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub average: f32,
}

impl AudioBands {
    pub const SILENT: AudioBands = AudioBands {
        bass: 0.0,
        mid: 0.0,
        treble: 0.0,
        average: 0.0,
    };

    /// Clamps every band into `[0, 1]`; non-finite values read as zero.
    pub fn clamped(self) -> Self {
        let c = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            bass: c(self.bass),
            mid: c(self.mid),
            treble: c(self.treble),
            average: c(self.average),
        }
    }
}

/// Tracked hand state. `x`/`y` are in `[-1, 1]`, `hand_spread` in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandPose {
    pub x: f32,
    pub y: f32,
    pub is_detected: bool,
    pub is_clenched: bool,
    pub hand_spread: f32,
}

impl HandPose {
    pub fn detected(x: f32, y: f32, hand_spread: f32) -> Self {
        Self {
            x,
            y,
            is_detected: true,
            is_clenched: false,
            hand_spread,
        }
    }

    /// Clamps `x`/`y` into `[-1, 1]` and spread into `[0, 1]`; non-finite
    /// values read as zero.
    pub fn clamped(self) -> Self {
        let c = |v: f32, lo: f32| if v.is_finite() { v.clamp(lo, 1.0) } else { 0.0 };
        Self {
            x: c(self.x, -1.0),
            y: c(self.y, -1.0),
            hand_spread: c(self.hand_spread, 0.0),
            ..self
        }
    }
}

/// Pointer position clamped into `[-1, 1]`; non-finite axes read as zero.
pub fn clamp_pointer(p: [f32; 2]) -> [f32; 2] {
    p.map(|v| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 })
}

/// User-facing configuration pushed by UI or voice collaborators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(default)]
    pub shape: Formation,
    #[serde(default, deserialize_with = "SelectionState::lenient_color")]
    pub color: Rgb,
    #[serde(default = "SelectionState::default_particle_count")]
    pub particle_count: i64,
    #[serde(default)]
    pub char_index: i64,
    #[serde(default)]
    pub num_index: i64,
}

impl SelectionState {
    fn default_particle_count() -> i64 {
        20_000
    }
    fn lenient_color<'de, D: Deserializer<'de>>(d: D) -> Result<Rgb, D::Error> {
        Rgb::deserialize_or(d, Rgb::default())
    }

    /// Clamps out-of-range values into their valid ranges. Warns once per
    /// clamped field.
    pub fn sanitized(&self, max_count: usize) -> SelectionState {
        let max_count = max_count.max(1) as i64;
        let mut out = self.clone();
        if !(1..=max_count).contains(&self.particle_count) {
            out.particle_count = self.particle_count.clamp(1, max_count);
            warn!(
                "particle_count {} out of range, clamped to {}",
                self.particle_count, out.particle_count
            );
        }
        if !(0..LETTER_COUNT as i64).contains(&self.char_index) {
            out.char_index = self.char_index.clamp(0, LETTER_COUNT as i64 - 1);
            warn!(
                "char_index {} out of range, clamped to {}",
                self.char_index, out.char_index
            );
        }
        if !(0..DIGIT_COUNT as i64).contains(&self.num_index) {
            out.num_index = self.num_index.clamp(0, DIGIT_COUNT as i64 - 1);
            warn!(
                "num_index {} out of range, clamped to {}",
                self.num_index, out.num_index
            );
        }
        out
    }

    /// Count as a buffer length. Assumes the state has been sanitized.
    pub fn count(&self) -> usize {
        self.particle_count.max(1) as usize
    }

    /// Symbol rasterized for glyph formations, `None` for procedural ones.
    pub fn glyph(&self) -> Option<char> {
        match self.shape {
            Formation::GlyphText => Some(letter_for_index(self.char_index)),
            Formation::GlyphDigit => Some(digit_for_index(self.num_index)),
            _ => None,
        }
    }

    /// True when the target buffer must be resampled between `self` and `prev`.
    pub fn target_differs(&self, prev: &SelectionState) -> bool {
        if self.shape != prev.shape {
            return true;
        }
        match self.shape {
            Formation::GlyphText => self.char_index != prev.char_index,
            Formation::GlyphDigit => self.num_index != prev.num_index,
            _ => false,
        }
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            shape: Formation::Sphere,
            color: Rgb::default(),
            particle_count: Self::default_particle_count(),
            char_index: 0,
            num_index: 0,
        }
    }
}

/// `0 -> 'A'`, `25 -> 'Z'`; out-of-range indices are clamped.
pub fn letter_for_index(index: i64) -> char {
    let i = index.clamp(0, LETTER_COUNT as i64 - 1) as u8;
    (b'A' + i) as char
}

/// `0 -> '0'`, `9 -> '9'`; out-of-range indices are clamped.
pub fn digit_for_index(index: i64) -> char {
    let i = index.clamp(0, DIGIT_COUNT as i64 - 1) as u8;
    (b'0' + i) as char
}
