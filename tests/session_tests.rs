use chrono::{NaiveDate, NaiveDateTime};
use dentai::chart::{ChartCommand, Condition, Surface, SurfaceTarget, ToothId};
use dentai::patient::{Patient, PatientRecord};
use dentai::plan::{ScheduleError, TreatmentSchedule};
use dentai::session::ExamSession;

fn tooth(n: u8) -> ToothId {
    ToothId::new(n).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(date: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
    date.and_hms_opt(h, min, 0).unwrap()
}

fn session_with_decay(id: u8, surface: Surface) -> ExamSession {
    let mut session = ExamSession::new();
    session.dispatch(ChartCommand::SelectTooth(tooth(id)));
    session.dispatch(ChartCommand::SelectSurface(SurfaceTarget::Surface(surface)));
    session.dispatch(ChartCommand::MarkCondition);
    session
}

#[test]
fn test_dispatch_routes_into_chart() {
    let session = session_with_decay(8, Surface::Occlusal);
    assert_eq!(session.chart().tooth(tooth(8)).condition(Surface::Occlusal), Some(Condition::Decay));
    assert_eq!(session.plan().total(), 150);
}

#[test]
fn test_schedule_today_rejected_tomorrow_accepted() {
    let today = day(2026, 3, 10);
    let mut schedule = TreatmentSchedule::new();

    // 1. Today is too early
    let result = schedule.schedule(tooth(8), Surface::Occlusal, at(today, 15, 0), today);
    assert_eq!(result, Err(ScheduleError::NotInFuture { earliest: day(2026, 3, 11) }));
    assert!(schedule.is_empty());

    // 2. Past dates too
    let result = schedule.schedule(tooth(8), Surface::Occlusal, at(day(2026, 1, 2), 9, 0), today);
    assert!(matches!(result, Err(ScheduleError::NotInFuture { .. })));

    // 3. Tomorrow works; reminder is today
    let appointment = schedule
        .schedule(tooth(8), Surface::Occlusal, at(day(2026, 3, 11), 8, 30), today)
        .unwrap();
    assert_eq!(appointment.reminder, today);
    assert_eq!(schedule.len(), 1);
}

#[test]
fn test_reminder_crosses_month_boundary() {
    let today = day(2026, 2, 20);
    let mut schedule = TreatmentSchedule::new();
    let appointment = schedule
        .schedule(tooth(19), Surface::Buccal, at(day(2026, 3, 1), 10, 0), today)
        .unwrap();
    assert_eq!(appointment.reminder, day(2026, 2, 28));
}

#[test]
fn test_reschedule_replaces_and_unschedule_removes() {
    let today = day(2026, 5, 1);
    let mut schedule = TreatmentSchedule::new();
    schedule.schedule(tooth(2), Surface::Distal, at(day(2026, 5, 3), 9, 0), today).unwrap();
    schedule.schedule(tooth(2), Surface::Distal, at(day(2026, 5, 9), 9, 0), today).unwrap();

    assert_eq!(schedule.len(), 1);
    assert_eq!(schedule.appointment(tooth(2), Surface::Distal).map(|a| a.reminder), Some(day(2026, 5, 8)));

    assert!(schedule.unschedule(tooth(2), Surface::Distal).is_some());
    assert!(schedule.is_empty());
}

#[test]
fn test_session_refuses_to_schedule_unplanned_treatment() {
    let today = day(2026, 6, 1);
    let mut session = session_with_decay(8, Surface::Occlusal);

    let result = session.schedule_treatment(tooth(9), Surface::Occlusal, at(day(2026, 6, 5), 9, 0), today);
    assert_eq!(
        result,
        Err(ScheduleError::NoSuchTreatment {
            tooth: tooth(9),
            surface: Surface::Occlusal
        })
    );

    let ok = session.schedule_treatment(tooth(8), Surface::Occlusal, at(day(2026, 6, 5), 9, 0), today);
    assert!(ok.is_ok());
}

#[test]
fn test_scheduled_plan_and_reminders() {
    let today = day(2026, 7, 1);
    let mut session = session_with_decay(8, Surface::Occlusal);
    session.dispatch(ChartCommand::SelectSurface(SurfaceTarget::Surface(Surface::Mesial)));
    session.dispatch(ChartCommand::MarkCondition);

    session
        .schedule_treatment(tooth(8), Surface::Mesial, at(day(2026, 7, 4), 11, 0), today)
        .unwrap();

    let annotated = session.scheduled_plan();
    assert_eq!(annotated.len(), 2);
    assert_eq!(annotated[0].treatment.surface, Surface::Mesial);
    assert!(annotated[0].appointment.is_some());
    assert!(annotated[1].appointment.is_none(), "Occlusal stays unscheduled");

    let plan = session.plan();
    let due = session.schedule().reminders_due(&plan, day(2026, 7, 3));
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].surface, Surface::Mesial);
    assert!(session.schedule().reminders_due(&plan, day(2026, 7, 2)).is_empty());
}

#[test]
fn test_patient_notes_newest_first() {
    let patient = Patient {
        id: "P-1".to_string(),
        name: "Anna Nowak".to_string(),
        date_of_birth: day(1990, 1, 15),
        last_visit: day(2026, 1, 5),
    };
    let mut session = ExamSession::with_patient(PatientRecord::new(patient));
    let record = session.patient_mut().unwrap();

    assert!(record.add_note("Sensitivity on 14", day(2026, 1, 5)));
    assert!(record.add_note("Follow-up after filling", day(2026, 2, 1)));
    assert!(!record.add_note("   ", day(2026, 2, 2)), "Blank notes are rejected");

    let notes = session.patient().unwrap().notes();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].text, "Follow-up after filling");
    assert_eq!(notes[1].date, day(2026, 1, 5));
}

#[test]
fn test_transcript_sync_appends_only_new_text() {
    let mut session = ExamSession::new();
    assert_eq!(session.sync_transcript("tooth eight "), 12);
    assert_eq!(session.sync_transcript("tooth eight "), 0);
    assert_eq!(session.sync_transcript("tooth eight occlusal decay "), 15);
    assert_eq!(session.transcript(), "tooth eight occlusal decay ");

    session.append_transcript("[manual]");
    assert!(session.transcript().ends_with("[manual]"));
}
