use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use super::{Treatment, TreatmentPlan};
use crate::chart::{Surface, ToothId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("appointment must be on or after {earliest}")]
    NotInFuture { earliest: NaiveDate },
    #[error("no planned treatment for tooth {tooth} {surface}")]
    NoSuchTreatment { tooth: ToothId, surface: Surface },
    #[error("no calendar day before {0}")]
    OutOfRange(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub at: NaiveDateTime,
    /// Exactly one calendar day before the appointment date.
    pub reminder: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledTreatment {
    pub treatment: Treatment,
    pub appointment: Option<Appointment>,
}

/// Appointments keyed by (tooth, surface). Lives beside the chart, not inside it.
#[derive(Debug, Clone, Default)]
pub struct TreatmentSchedule {
    appointments: HashMap<(ToothId, Surface), Appointment>,
}

impl TreatmentSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule (or reschedule) a treatment. `at` must fall on a date after `today`.
    pub fn schedule(
        &mut self,
        tooth: ToothId,
        surface: Surface,
        at: NaiveDateTime,
        today: NaiveDate,
    ) -> Result<Appointment, ScheduleError> {
        let earliest = today.succ_opt().ok_or(ScheduleError::OutOfRange(today))?;
        let date = at.date();
        if date < earliest {
            return Err(ScheduleError::NotInFuture { earliest });
        }
        let reminder = date.pred_opt().ok_or(ScheduleError::OutOfRange(date))?;

        let appointment = Appointment { at, reminder };
        self.appointments.insert((tooth, surface), appointment);
        info!("Scheduled tooth {} {} at {} (reminder {})", tooth, surface, at, reminder);
        Ok(appointment)
    }

    pub fn unschedule(&mut self, tooth: ToothId, surface: Surface) -> Option<Appointment> {
        self.appointments.remove(&(tooth, surface))
    }

    pub fn appointment(&self, tooth: ToothId, surface: Surface) -> Option<&Appointment> {
        self.appointments.get(&(tooth, surface))
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    /// Reminders that fall on `day`, in plan order.
    pub fn reminders_due<'a>(&'a self, plan: &'a TreatmentPlan, day: NaiveDate) -> Vec<&'a Treatment> {
        plan.treatments
            .iter()
            .filter(|t| {
                self.appointment(t.tooth, t.surface)
                    .is_some_and(|a| a.reminder == day)
            })
            .collect()
    }

    /// Join the plan with its appointments. Unscheduled entries carry `None`.
    pub fn annotate(&self, plan: &TreatmentPlan) -> Vec<ScheduledTreatment> {
        plan.treatments
            .iter()
            .map(|t| ScheduledTreatment {
                treatment: t.clone(),
                appointment: self.appointment(t.tooth, t.surface).copied(),
            })
            .collect()
    }
}
