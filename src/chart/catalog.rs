use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::tooth::{ChartError, ToothKind};

/// A concrete anatomical face of a tooth.
/// Declaration order is the order surfaces appear in derived output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Surface {
    Mesial,
    Distal,
    Buccal,
    Lingual,
    Occlusal,
    Incisal,
    Labial,
}

impl Surface {
    pub const ALL: [Surface; 7] = [
        Surface::Mesial,
        Surface::Distal,
        Surface::Buccal,
        Surface::Lingual,
        Surface::Occlusal,
        Surface::Incisal,
        Surface::Labial,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Surface::Mesial => "mesial",
            Surface::Distal => "distal",
            Surface::Buccal => "buccal",
            Surface::Lingual => "lingual",
            Surface::Occlusal => "occlusal",
            Surface::Incisal => "incisal",
            Surface::Labial => "labial",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Surface::Mesial => "Mesial",
            Surface::Distal => "Distal",
            Surface::Buccal => "Buccal",
            Surface::Lingual => "Lingual",
            Surface::Occlusal => "Occlusal",
            Surface::Incisal => "Incisal",
            Surface::Labial => "Labial",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Surface::Mesial => "Mesial - Towards midline",
            Surface::Distal => "Distal - Away from midline",
            Surface::Buccal => "Buccal - Facing cheek",
            Surface::Lingual => "Lingual - Facing tongue",
            Surface::Occlusal => "Occlusal - Chewing surface",
            Surface::Incisal => "Incisal - Cutting edge (front teeth only)",
            Surface::Labial => "Labial/Facial - Facing lip (front teeth only)",
        }
    }

    /// Whether the surface exists on this kind of tooth.
    /// Informational: the chart accepts any surface on any tooth.
    pub fn is_anatomical_for(&self, kind: ToothKind) -> bool {
        match self {
            Surface::Incisal | Surface::Labial => kind.is_anterior(),
            Surface::Occlusal | Surface::Buccal => !kind.is_anterior(),
            Surface::Mesial | Surface::Distal | Surface::Lingual => true,
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Surface {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Surface::ALL
            .iter()
            .copied()
            .find(|surface| surface.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ChartError::UnknownSurface(s.to_string()))
    }
}

/// What the user has picked to mark: one surface, or the whole tooth (`full`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceTarget {
    Surface(Surface),
    WholeTooth,
}

impl SurfaceTarget {
    pub fn description(&self) -> &'static str {
        match self {
            SurfaceTarget::Surface(surface) => surface.description(),
            SurfaceTarget::WholeTooth => "Full Tooth",
        }
    }
}

impl From<Surface> for SurfaceTarget {
    fn from(surface: Surface) -> Self {
        SurfaceTarget::Surface(surface)
    }
}

impl fmt::Display for SurfaceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceTarget::Surface(surface) => fmt::Display::fmt(surface, f),
            SurfaceTarget::WholeTooth => f.pad("full"),
        }
    }
}

impl FromStr for SurfaceTarget {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("full") {
            return Ok(SurfaceTarget::WholeTooth);
        }
        s.parse().map(SurfaceTarget::Surface)
    }
}

/// Clinical state of a tooth surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Healthy,
    #[default]
    Decay,
    Filling,
    Crown,
    RootCanal,
    Missing,
    Bridge,
    Implant,
}

impl Condition {
    pub const ALL: [Condition; 8] = [
        Condition::Healthy,
        Condition::Decay,
        Condition::Filling,
        Condition::Crown,
        Condition::RootCanal,
        Condition::Missing,
        Condition::Bridge,
        Condition::Implant,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Condition::Healthy => "healthy",
            Condition::Decay => "decay",
            Condition::Filling => "filling",
            Condition::Crown => "crown",
            Condition::RootCanal => "root-canal",
            Condition::Missing => "missing",
            Condition::Bridge => "bridge",
            Condition::Implant => "implant",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Condition::Healthy => "Healthy",
            Condition::Decay => "Decay/Caries",
            Condition::Filling => "Filling",
            Condition::Crown => "Crown",
            Condition::RootCanal => "Root Canal",
            Condition::Missing => "Missing Tooth",
            Condition::Bridge => "Bridge",
            Condition::Implant => "Implant",
        }
    }

    /// Display color as a CSS color string.
    pub fn color(&self) -> &'static str {
        match self {
            Condition::Healthy => "transparent",
            Condition::Decay => "#FF5C5C",
            Condition::Filling => "#5C7CFF",
            Condition::Crown => "#FFD700",
            Condition::RootCanal => "#8B4513",
            Condition::Missing => "#CCCCCC",
            Condition::Bridge => "#9370DB",
            Condition::Implant => "#32CD32",
        }
    }

    /// Billable procedure for this condition. `None` for `Healthy`.
    pub fn treatment(&self) -> Option<TreatmentInfo> {
        let (price, description) = match self {
            Condition::Healthy => return None,
            Condition::Decay => (150, "Caries removal and composite restoration"),
            Condition::Filling => (120, "Replacement of existing filling"),
            Condition::Crown => (1100, "Porcelain-fused-to-metal crown"),
            Condition::RootCanal => (950, "Endodontic root canal therapy"),
            Condition::Missing => (250, "Consultation for tooth replacement"),
            Condition::Bridge => (900, "Fixed bridge unit"),
            Condition::Implant => (3200, "Implant placement with abutment and crown"),
        };
        Some(TreatmentInfo { price, description })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Condition {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().replace('_', "-");
        Condition::ALL
            .iter()
            .copied()
            .find(|condition| condition.name().eq_ignore_ascii_case(&needle))
            .ok_or_else(|| ChartError::UnknownCondition(s.to_string()))
    }
}

/// Price (whole currency units) and description of a billable procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreatmentInfo {
    pub price: u32,
    pub description: &'static str,
}
