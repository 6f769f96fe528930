use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::catalog::{Condition, Surface};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChartError {
    #[error("tooth {0} is outside universal numbering 1-32")]
    InvalidTooth(u8),
    #[error("not a tooth number: {0:?}")]
    MalformedTooth(String),
    #[error("unknown surface: {0:?}")]
    UnknownSurface(String),
    #[error("unknown condition: {0:?}")]
    UnknownCondition(String),
    #[error("unknown chart command: {0:?}")]
    UnknownCommand(String),
}

/// Universal tooth number, always within 1..=32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ToothId(u8);

impl ToothId {
    pub const COUNT: usize = 32;

    pub fn new(number: u8) -> Result<Self, ChartError> {
        if (1..=32).contains(&number) {
            Ok(Self(number))
        } else {
            Err(ChartError::InvalidTooth(number))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// All 32 ids in ascending order.
    pub fn all() -> impl Iterator<Item = ToothId> {
        (1..=32).map(ToothId)
    }

    pub(crate) fn index(&self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn quadrant(&self) -> Quadrant {
        match self.0 {
            1..=8 => Quadrant::UpperRight,
            9..=16 => Quadrant::UpperLeft,
            17..=24 => Quadrant::LowerLeft,
            _ => Quadrant::LowerRight,
        }
    }

    pub fn kind(&self) -> ToothKind {
        match self.0 {
            1..=3 | 14..=19 | 30..=32 => ToothKind::Molar,
            4 | 5 | 12 | 13 | 20 | 21 | 28 | 29 => ToothKind::Premolar,
            6 | 11 | 22 | 27 => ToothKind::Canine,
            _ => ToothKind::Incisor,
        }
    }
}

impl TryFrom<u8> for ToothId {
    type Error = ChartError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        ToothId::new(number)
    }
}

impl From<ToothId> for u8 {
    fn from(id: ToothId) -> Self {
        id.0
    }
}

impl fmt::Display for ToothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ToothId {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('#');
        let number: u8 = trimmed
            .parse()
            .map_err(|_| ChartError::MalformedTooth(s.to_string()))?;
        ToothId::new(number)
    }
}

/// Anatomical quadrant, numbered 1-4 starting upper right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
}

impl Quadrant {
    pub fn number(&self) -> u8 {
        match self {
            Quadrant::UpperRight => 1,
            Quadrant::UpperLeft => 2,
            Quadrant::LowerLeft => 3,
            Quadrant::LowerRight => 4,
        }
    }

    /// Teeth of this quadrant in ascending id order.
    pub fn teeth(&self) -> impl DoubleEndedIterator<Item = ToothId> {
        let first = (self.number() - 1) * 8 + 1;
        (first..first + 8).map(ToothId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToothKind {
    Molar,
    Premolar,
    Canine,
    Incisor,
}

impl ToothKind {
    /// Front teeth (incisors and canines).
    pub fn is_anterior(&self) -> bool {
        matches!(self, ToothKind::Canine | ToothKind::Incisor)
    }
}

/// One tooth and its committed surface conditions.
/// Absent surfaces are unmarked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooth {
    pub id: ToothId,
    pub quadrant: Quadrant,
    surfaces: BTreeMap<Surface, Condition>,
}

impl Tooth {
    pub fn new(id: ToothId) -> Self {
        Self {
            id,
            quadrant: id.quadrant(),
            surfaces: BTreeMap::new(),
        }
    }

    pub fn condition(&self, surface: Surface) -> Option<Condition> {
        self.surfaces.get(&surface).copied()
    }

    /// Marked surfaces in declaration order.
    pub fn surfaces(&self) -> impl Iterator<Item = (Surface, Condition)> + '_ {
        self.surfaces.iter().map(|(surface, condition)| (*surface, *condition))
    }

    pub fn is_unmarked(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub(crate) fn set(&mut self, surface: Surface, condition: Condition) -> bool {
        self.surfaces.insert(surface, condition) != Some(condition)
    }
}
