//! Treatment plan derived from the chart.

pub mod schedule;

use serde::Serialize;

use crate::chart::{ChartState, Condition, Surface, ToothId};

pub use schedule::{Appointment, ScheduleError, ScheduledTreatment, TreatmentSchedule};

/// One billable procedure for one marked surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Treatment {
    pub tooth: ToothId,
    pub surface: Surface,
    pub condition: Condition,
    pub price: u32,
    pub description: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreatmentPlan {
    pub treatments: Vec<Treatment>,
}

impl TreatmentPlan {
    /// Pure projection: Chart -> Treatments.
    /// Ordered by tooth id, then surface declaration order. Healthy surfaces are skipped.
    pub fn derive(chart: &ChartState) -> Self {
        let treatments = chart
            .teeth()
            .iter()
            .flat_map(|tooth| {
                tooth.surfaces().filter_map(move |(surface, condition)| {
                    let info = condition.treatment()?;
                    Some(Treatment {
                        tooth: tooth.id,
                        surface,
                        condition,
                        price: info.price,
                        description: info.description,
                    })
                })
            })
            .collect();

        Self { treatments }
    }

    pub fn total(&self) -> u32 {
        self.treatments.iter().map(|t| t.price).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.treatments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.treatments.len()
    }

    pub fn contains(&self, tooth: ToothId, surface: Surface) -> bool {
        self.treatments
            .iter()
            .any(|t| t.tooth == tooth && t.surface == surface)
    }
}
