use super::tooth::{Quadrant, ToothId};

/// Display arrangement of the 32 teeth as seen facing the patient.
/// Lower quadrants are mirrored so the midline sits in the center of both rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartLayout {
    pub upper: [Vec<ToothId>; 2],
    pub lower: [Vec<ToothId>; 2],
}

impl ChartLayout {
    pub fn standard() -> Self {
        Self {
            upper: [
                Quadrant::UpperRight.teeth().collect(),
                Quadrant::UpperLeft.teeth().collect(),
            ],
            lower: [
                Quadrant::LowerRight.teeth().rev().collect(),
                Quadrant::LowerLeft.teeth().rev().collect(),
            ],
        }
    }

    /// Both rows flattened left to right.
    pub fn rows(&self) -> [Vec<ToothId>; 2] {
        [self.upper.concat(), self.lower.concat()]
    }
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self::standard()
    }
}
