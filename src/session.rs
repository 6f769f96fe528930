use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::chart::{ChartCommand, ChartState, Surface, ToothId};
use crate::patient::PatientRecord;
use crate::plan::{Appointment, ScheduleError, ScheduledTreatment, TreatmentPlan, TreatmentSchedule};

/// Everything one chart session owns. Dropped at session end; nothing persists.
#[derive(Debug, Default)]
pub struct ExamSession {
    chart: ChartState,
    patient: Option<PatientRecord>,
    schedule: TreatmentSchedule,
    transcript: String,
}

impl ExamSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patient(patient: PatientRecord) -> Self {
        Self {
            patient: Some(patient),
            ..Self::default()
        }
    }

    /// Route a protocol command into the chart. Returns whether the chart changed.
    pub fn dispatch(&mut self, command: ChartCommand) -> bool {
        let changed = self.chart.reduce(command);
        if changed {
            info!("Chart v{}: {:?}", self.chart.version, command);
        } else {
            debug!("Chart unchanged by {:?}", command);
        }
        changed
    }

    pub fn chart(&self) -> &ChartState {
        &self.chart
    }

    pub fn plan(&self) -> TreatmentPlan {
        TreatmentPlan::derive(&self.chart)
    }

    pub fn scheduled_plan(&self) -> Vec<ScheduledTreatment> {
        self.schedule.annotate(&self.plan())
    }

    /// Schedule a treatment that is currently in the plan.
    pub fn schedule_treatment(
        &mut self,
        tooth: ToothId,
        surface: Surface,
        at: NaiveDateTime,
        today: NaiveDate,
    ) -> Result<Appointment, ScheduleError> {
        if !self.plan().contains(tooth, surface) {
            return Err(ScheduleError::NoSuchTreatment { tooth, surface });
        }
        self.schedule.schedule(tooth, surface, at, today)
    }

    pub fn schedule(&self) -> &TreatmentSchedule {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut TreatmentSchedule {
        &mut self.schedule
    }

    pub fn patient(&self) -> Option<&PatientRecord> {
        self.patient.as_ref()
    }

    pub fn patient_mut(&mut self) -> Option<&mut PatientRecord> {
        self.patient.as_mut()
    }

    pub fn set_patient(&mut self, patient: PatientRecord) {
        self.patient = Some(patient);
    }

    /// Dictated text committed by speech capture.
    pub fn append_transcript(&mut self, text: &str) {
        self.transcript.push_str(text);
    }

    /// Catch up with a growing dictation buffer. Only the unseen suffix is appended.
    pub fn sync_transcript(&mut self, full: &str) -> usize {
        match full.strip_prefix(self.transcript.as_str()) {
            Some(suffix) if !suffix.is_empty() => {
                self.transcript.push_str(suffix);
                suffix.len()
            }
            Some(_) => 0,
            None => {
                debug!("Dictation buffer diverged, replacing transcript");
                self.transcript = full.to_string();
                full.len()
            }
        }
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}
