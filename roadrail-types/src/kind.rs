use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The category of a source entity.
///
/// Part of the SyncInfo key, so the textual form returned by [`Kind::as_str`]
/// is persisted and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Horizontal alignment, either a design alignment or a 3D linear.
    Alignment,
    /// Vertical profile owned by an alignment.
    VerticalAlignment,
    /// Corridor referencing a design alignment.
    Corridor,
    /// Surface generated by a corridor, converted as a corridor component.
    CorridorSurface,
}

impl Kind {
    /// All kinds, in conversion dependency order.
    pub const ALL: [Kind; 4] = [
        Kind::Alignment,
        Kind::VerticalAlignment,
        Kind::Corridor,
        Kind::CorridorSurface,
    ];

    /// Returns the persisted name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Kind::Alignment => "alignment",
            Kind::VerticalAlignment => "vertical_alignment",
            Kind::Corridor => "corridor",
            Kind::CorridorSurface => "corridor_surface",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| crate::Error::UnknownKind(s.to_string()))
    }
}
