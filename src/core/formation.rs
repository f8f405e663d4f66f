//! Formation names and lenient name lookup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Target shape the particle cloud relaxes toward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Formation {
    #[default]
    Sphere,
    Cube,
    Torus,
    Galaxy,
    DnaHelix,
    RingedSphere,
    Pyramid,
    Explosion,
    GlyphText,
    GlyphDigit,
}

impl Formation {
    pub const ALL: [Formation; 10] = [
        Formation::Sphere,
        Formation::Cube,
        Formation::Torus,
        Formation::Galaxy,
        Formation::DnaHelix,
        Formation::RingedSphere,
        Formation::Pyramid,
        Formation::Explosion,
        Formation::GlyphText,
        Formation::GlyphDigit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Formation::Sphere => "sphere",
            Formation::Cube => "cube",
            Formation::Torus => "torus",
            Formation::Galaxy => "galaxy",
            Formation::DnaHelix => "dna-helix",
            Formation::RingedSphere => "ringed-sphere",
            Formation::Pyramid => "pyramid",
            Formation::Explosion => "explosion",
            Formation::GlyphText => "glyph-text",
            Formation::GlyphDigit => "glyph-digit",
        }
    }

    pub fn is_glyph(self) -> bool {
        matches!(self, Formation::GlyphText | Formation::GlyphDigit)
    }

    /// Lenient lookup used at the collaborator boundary: unknown names
    /// resolve to [`Formation::Explosion`].
    pub fn parse_lenient(name: &str) -> Formation {
        Self::lookup(name).unwrap_or_else(|| {
            warn!("unknown formation {name:?}, using explosion");
            Formation::Explosion
        })
    }

    fn lookup(name: &str) -> Option<Formation> {
        let key = name.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        let f = match key.as_str() {
            "sphere" => Formation::Sphere,
            "cube" => Formation::Cube,
            "torus" => Formation::Torus,
            "galaxy" => Formation::Galaxy,
            "dna-helix" | "dna" | "helix" => Formation::DnaHelix,
            "ringed-sphere" | "saturn" => Formation::RingedSphere,
            "pyramid" => Formation::Pyramid,
            "explosion" | "big-bang" | "bigbang" => Formation::Explosion,
            "glyph-text" | "text" | "letter" => Formation::GlyphText,
            "glyph-digit" | "number" | "digit" => Formation::GlyphDigit,
            _ => return None,
        };
        Some(f)
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Formation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl From<String> for Formation {
    fn from(value: String) -> Self {
        Self::parse_lenient(&value)
    }
}

impl From<Formation> for String {
    fn from(value: Formation) -> Self {
        value.name().to_string()
    }
}
