use std::collections::HashSet;
use std::ops::Range;

use itertools::Itertools;
use log::{debug, warn};

use crate::data::{Day, Hour, Penalties, Settings, SubjectName, TimeSlot, TimetableInput};
use crate::error::{Result, TimetableError};

pub type RoomIdx = usize;
pub type FacultyIdx = usize;
pub type BatchIdx = usize;
pub type SessionIdx = usize;

pub const MAX_WORKING_DAYS: u32 = 7;
pub const MAX_PENALTY_WEIGHT: i64 = 1_000_000;

/// Days `0..working_days` by clock hours `start_hour..start_hour + hours_per_day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub working_days: u32,
    pub hours_per_day: u32,
    pub start_hour: Hour,
}

impl Grid {
    pub fn days(&self) -> Range<Day> {
        0..self.working_days
    }

    pub fn hours(&self) -> Range<Hour> {
        self.start_hour..self.start_hour + self.hours_per_day
    }

    pub fn slots(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.days()
            .flat_map(move |day| self.hours().map(move |hour| TimeSlot::new(day, hour)))
    }

    pub fn contains(&self, slot: TimeSlot) -> bool {
        self.days().contains(&slot.day) && self.hours().contains(&slot.hour)
    }

    pub fn slot_count(&self) -> usize {
        self.working_days as usize * self.hours_per_day as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyWeights {
    pub gap: i64,
    pub contiguous: i64,
    pub subject_spread: i64,
}

impl From<Penalties> for PenaltyWeights {
    fn from(p: Penalties) -> Self {
        Self {
            gap: p.batch_gap,
            contiguous: p.max_contiguous,
            subject_spread: p.subject_spread,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FacultyProfile {
    pub id: String,
    pub subjects: HashSet<SubjectName>,
    pub unavailable: HashSet<TimeSlot>,
}

impl FacultyProfile {
    pub fn can_teach(&self, subject: &str) -> bool {
        self.subjects.contains(subject)
    }

    pub fn is_free(&self, slot: TimeSlot) -> bool {
        !self.unavailable.contains(&slot)
    }
}

#[derive(Debug, Clone)]
pub struct SubjectLoad {
    pub name: SubjectName,
    pub classes_per_week: u32,
}

#[derive(Debug, Clone)]
pub struct BatchProfile {
    pub name: String,
    pub subjects: Vec<SubjectLoad>,
    pub max_classes_per_day: u32,
}

/// One weekly occurrence of a (batch, subject) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSession {
    pub id: String,
    pub batch: BatchIdx,
    /// Position of the subject in the batch's subject list.
    pub subject: usize,
}

#[derive(Debug, Clone)]
pub struct Problem {
    pub grid: Grid,
    pub penalties: PenaltyWeights,
    pub rooms: Vec<String>,
    pub faculties: Vec<FacultyProfile>,
    pub batches: Vec<BatchProfile>,
    pub sessions: Vec<ClassSession>,
}

impl Problem {
    /// Validates the request and builds the canonical problem.
    ///
    /// Every detected problem is collected, so the error lists them all.
    pub fn from_input(input: &TimetableInput) -> Result<Problem> {
        let mut errors = Vec::new();
        let grid = validate_grid(&input.settings, &mut errors);
        validate_penalties(&input.settings.penalties, &mut errors);

        check_ids("classroom", input.classrooms.iter().map(|c| c.id.as_str()), &mut errors);
        check_ids("faculty", input.faculties.iter().map(|f| f.id.as_str()), &mut errors);
        check_ids("batch", input.batches.iter().map(|b| b.name.as_str()), &mut errors);

        for batch in &input.batches {
            if batch.subjects.is_empty() {
                errors.push(format!("batch '{}' has no subjects", batch.name));
            }
            for name in batch.subjects.iter().map(|s| s.name.as_str()).duplicates() {
                errors.push(format!("batch '{}' lists subject '{}' more than once", batch.name, name));
            }
            if batch.subjects.iter().any(|s| s.name.is_empty()) {
                errors.push(format!("batch '{}' has a subject with an empty name", batch.name));
            }
            // a subject needing more sessions than the week has slots can never fit
            for subject in batch.subjects.iter().filter(|s| s.classes_per_week as usize > grid.slot_count()) {
                errors.push(format!(
                    "batch '{}' needs {} {} classes but the week has only {} slots",
                    batch.name,
                    subject.classes_per_week,
                    subject.name,
                    grid.slot_count()
                ));
            }
            if batch.max_classes_per_day == Some(0) {
                errors.push(format!("batch '{}' has max_classes_per_day of 0", batch.name));
            }
        }

        if !errors.is_empty() {
            return Err(TimetableError::Validation(errors.join("; ")));
        }

        let faculties = input
            .faculties
            .iter()
            .map(|f| {
                let unavailable: HashSet<TimeSlot> = f
                    .unavailable_slots
                    .iter()
                    .copied()
                    .filter(|slot| {
                        let inside = grid.contains(*slot);
                        if !inside {
                            warn!("Ignoring unavailable slot outside the grid for faculty {}: {}", f.id, slot);
                        }
                        inside
                    })
                    .collect();
                FacultyProfile {
                    id: f.id.clone(),
                    subjects: f.subjects.iter().cloned().collect(),
                    unavailable,
                }
            })
            .collect();

        let batches: Vec<BatchProfile> = input
            .batches
            .iter()
            .map(|b| BatchProfile {
                name: b.name.clone(),
                subjects: b
                    .subjects
                    .iter()
                    .map(|s| SubjectLoad {
                        name: s.name.clone(),
                        classes_per_week: s.classes_per_week,
                    })
                    .collect(),
                max_classes_per_day: b.max_classes_per_day.unwrap_or(grid.hours_per_day),
            })
            .collect();

        let sessions = expand_sessions(&batches);
        debug!("Expanded {} batches into {} class sessions", batches.len(), sessions.len());

        Ok(Problem {
            grid,
            penalties: input.settings.penalties.into(),
            rooms: input.classrooms.iter().map(|c| c.id.clone()).collect(),
            faculties,
            batches,
            sessions,
        })
    }

    pub fn subject_name(&self, session: &ClassSession) -> &str {
        &self.batches[session.batch].subjects[session.subject].name
    }

    pub fn batch_name(&self, session: &ClassSession) -> &str {
        &self.batches[session.batch].name
    }
}

/// Creates `classes_per_week` sessions per subject, identified `batch_subject_index`.
pub fn expand_sessions(batches: &[BatchProfile]) -> Vec<ClassSession> {
    let mut sessions = Vec::new();
    for (batch_idx, batch) in batches.iter().enumerate() {
        for (subject_idx, subject) in batch.subjects.iter().enumerate() {
            for i in 0..subject.classes_per_week {
                sessions.push(ClassSession {
                    id: format!("{}_{}_{}", batch.name, subject.name, i),
                    batch: batch_idx,
                    subject: subject_idx,
                });
            }
        }
    }
    sessions
}

fn validate_grid(settings: &Settings, errors: &mut Vec<String>) -> Grid {
    if settings.working_days == 0 {
        errors.push("working_days must be at least 1".to_string());
    }
    if settings.working_days > MAX_WORKING_DAYS {
        errors.push(format!(
            "working_days must be at most {MAX_WORKING_DAYS}, got {}",
            settings.working_days
        ));
    }
    if settings.hours_per_day == 0 {
        errors.push("hours_per_day must be at least 1".to_string());
    }
    if settings.start_hour.saturating_add(settings.hours_per_day) > 24 {
        errors.push(format!(
            "a day starting at {}:00 cannot hold {} hours",
            settings.start_hour, settings.hours_per_day
        ));
    }
    Grid {
        working_days: settings.working_days,
        hours_per_day: settings.hours_per_day,
        start_hour: settings.start_hour,
    }
}

// weights at or below zero disable a family, so only the upper bound matters
fn validate_penalties(penalties: &Penalties, errors: &mut Vec<String>) {
    let weights = [
        ("batch_gap", penalties.batch_gap),
        ("subject_spread", penalties.subject_spread),
        ("max_contiguous", penalties.max_contiguous),
    ];
    for (name, weight) in weights {
        if weight > MAX_PENALTY_WEIGHT {
            errors.push(format!("penalty weight {name} must be at most {MAX_PENALTY_WEIGHT}, got {weight}"));
        }
    }
}

fn check_ids<'a>(entity: &str, ids: impl Iterator<Item = &'a str> + Clone, errors: &mut Vec<String>) {
    if ids.clone().any(str::is_empty) {
        errors.push(format!("a {entity} has an empty id"));
    }
    for id in ids.duplicates() {
        errors.push(format!("duplicate {entity} id '{id}'"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Batch, Classroom, Faculty, SubjectDemand};

    fn input() -> TimetableInput {
        TimetableInput {
            classrooms: vec![Classroom { id: "R1".into() }, Classroom { id: "R2".into() }],
            faculties: vec![Faculty {
                id: "F01".into(),
                subjects: vec!["Maths".into(), "Physics".into()],
                unavailable_slots: vec![TimeSlot::new(0, 9), TimeSlot::new(9, 9)],
            }],
            batches: vec![Batch {
                name: "CS-A".into(),
                subjects: vec![
                    SubjectDemand { name: "Maths".into(), classes_per_week: 2 },
                    SubjectDemand { name: "Physics".into(), classes_per_week: 1 },
                ],
                max_classes_per_day: None,
            }],
            settings: Settings::default(),
        }
    }

    #[test]
    fn sessions_are_expanded_per_weekly_occurrence() {
        let problem = Problem::from_input(&input()).unwrap();

        let ids: Vec<&str> = problem.sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["CS-A_Maths_0", "CS-A_Maths_1", "CS-A_Physics_0"]);
        assert_eq!(problem.subject_name(&problem.sessions[2]), "Physics");
        assert_eq!(problem.batch_name(&problem.sessions[0]), "CS-A");
    }

    #[test]
    fn daily_cap_defaults_to_hours_per_day() {
        let problem = Problem::from_input(&input()).unwrap();
        assert_eq!(problem.batches[0].max_classes_per_day, 8);
    }

    #[test]
    fn unavailable_slots_outside_grid_are_dropped() {
        let problem = Problem::from_input(&input()).unwrap();
        let faculty = &problem.faculties[0];

        assert_eq!(faculty.unavailable.len(), 1);
        assert!(!faculty.is_free(TimeSlot::new(0, 9)));
        assert!(faculty.is_free(TimeSlot::new(0, 10)));
        assert!(faculty.can_teach("Physics"));
        assert!(!faculty.can_teach("Chemistry"));
    }

    #[test]
    fn grid_uses_clock_hours() {
        let problem = Problem::from_input(&input()).unwrap();
        let grid = problem.grid;

        assert_eq!(grid.hours(), 9..17);
        assert_eq!(grid.slots().count(), grid.slot_count());
        assert_eq!(grid.slots().next(), Some(TimeSlot::new(0, 9)));
        assert!(!grid.contains(TimeSlot::new(0, 17)));
        assert!(!grid.contains(TimeSlot::new(5, 9)));
    }

    #[test]
    fn batch_without_subjects_is_a_validation_error() {
        let mut input = input();
        input.batches[0].subjects.clear();

        let err = Problem::from_input(&input).unwrap_err();
        assert!(matches!(err, TimetableError::Validation(ref msg) if msg.contains("has no subjects")));
    }

    #[test]
    fn all_validation_problems_are_reported_together() {
        let mut input = input();
        input.classrooms.push(Classroom { id: "R1".into() });
        input.batches[0].subjects.push(SubjectDemand { name: "Maths".into(), classes_per_week: 1 });
        input.settings.hours_per_day = 0;

        let err = Problem::from_input(&input).unwrap_err();
        let TimetableError::Validation(msg) = err else {
            panic!("expected a validation error");
        };
        assert!(msg.contains("duplicate classroom id 'R1'"));
        assert!(msg.contains("lists subject 'Maths' more than once"));
        assert!(msg.contains("hours_per_day must be at least 1"));
    }

    #[test]
    fn day_longer_than_twenty_four_hours_is_rejected() {
        let mut input = input();
        input.settings.start_hour = 20;
        input.settings.hours_per_day = 6;

        assert!(matches!(Problem::from_input(&input), Err(TimetableError::Validation(_))));
    }

    #[test]
    fn week_longer_than_seven_days_is_rejected() {
        let mut input = input();
        input.settings.working_days = u32::MAX;

        let err = Problem::from_input(&input).unwrap_err();
        assert!(matches!(err, TimetableError::Validation(ref msg) if msg.contains("working_days must be at most 7")));

        input.settings.working_days = 7;
        assert_eq!(Problem::from_input(&input).unwrap().grid.slot_count(), 56);
    }

    #[test]
    fn slot_count_does_not_overflow() {
        let grid = Grid {
            working_days: u32::MAX,
            hours_per_day: 24,
            start_hour: 0,
        };
        assert_eq!(grid.slot_count(), u32::MAX as usize * 24);
    }

    #[test]
    fn weekly_count_above_slot_count_is_rejected() {
        let mut input = input();
        input.settings.working_days = 1;
        input.settings.hours_per_day = 2;
        input.batches[0].subjects[0].classes_per_week = u32::MAX;

        let err = Problem::from_input(&input).unwrap_err();
        assert!(matches!(err, TimetableError::Validation(ref msg) if msg.contains("only 2 slots")));

        input.batches[0].subjects[0].classes_per_week = 2;
        assert!(Problem::from_input(&input).is_ok());
    }

    #[test]
    fn oversized_penalty_weight_is_rejected() {
        let mut input = input();
        input.settings.penalties.max_contiguous = i64::MAX;

        let err = Problem::from_input(&input).unwrap_err();
        assert!(matches!(err, TimetableError::Validation(ref msg) if msg.contains("max_contiguous")));

        input.settings.penalties.max_contiguous = MAX_PENALTY_WEIGHT;
        input.settings.penalties.batch_gap = i64::MIN;
        let problem = Problem::from_input(&input).unwrap();
        assert_eq!(problem.penalties.contiguous, MAX_PENALTY_WEIGHT);
        assert_eq!(problem.penalties.gap, i64::MIN);
    }

    #[test]
    fn zero_weekly_count_yields_no_sessions() {
        let mut input = input();
        input.batches[0].subjects[1].classes_per_week = 0;

        let problem = Problem::from_input(&input).unwrap();
        assert_eq!(problem.sessions.len(), 2);
    }
}
