use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Read-only patient header shown alongside the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub last_visit: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalNote {
    pub date: NaiveDate,
    pub text: String,
}

/// Patient plus the treatment-notes history, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient: Patient,
    notes: Vec<ClinicalNote>,
}

impl PatientRecord {
    pub fn new(patient: Patient) -> Self {
        Self {
            patient,
            notes: Vec::new(),
        }
    }

    /// Returns false (and stores nothing) for blank text.
    pub fn add_note(&mut self, text: &str, today: NaiveDate) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.notes.insert(
            0,
            ClinicalNote {
                date: today,
                text: text.to_string(),
            },
        );
        true
    }

    pub fn notes(&self) -> &[ClinicalNote] {
        &self.notes
    }
}
