use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type RoomId = String;
pub type FacultyId = String;
pub type BatchName = String;
pub type SubjectName = String;
pub type Day = u32;
pub type Hour = u32;

/// A (day, hour) coordinate of the weekly grid. Hours are clock hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct TimeSlot {
    pub day: Day,
    pub hour: Hour,
}

impl TimeSlot {
    pub fn new(day: Day, hour: Hour) -> Self {
        Self { day, hour }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} at {}:00", self.day, self.hour)
    }
}

/// A room that can host one class at a time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Classroom {
    pub id: RoomId,
}

/// A faculty member, the subjects they can teach and the slots they are blocked.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Faculty {
    pub id: FacultyId,
    pub subjects: Vec<SubjectName>,
    #[serde(default)]
    pub unavailable_slots: Vec<TimeSlot>,
}

/// How many sessions of a subject a batch needs each week.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubjectDemand {
    pub name: SubjectName,
    pub classes_per_week: u32,
}

/// A group of students that attends classes together.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Batch {
    pub name: BatchName,
    pub subjects: Vec<SubjectDemand>,
    #[serde(default)]
    pub max_classes_per_day: Option<u32>,
}

/// Soft constraint weights. A weight of zero or less disables its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Penalties {
    pub batch_gap: i64,
    pub subject_spread: i64,
    pub max_contiguous: i64,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            batch_gap: 1,
            subject_spread: 5,
            max_contiguous: 10,
        }
    }
}

/// The time grid and the penalty weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub working_days: u32,
    pub hours_per_day: u32,
    pub start_hour: Hour,
    pub penalties: Penalties,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            working_days: 5,
            hours_per_day: 8,
            start_hour: 9,
            penalties: Penalties::default(),
        }
    }
}

/// The complete input for the timetabling problem.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TimetableInput {
    #[serde(default)]
    pub classrooms: Vec<Classroom>,
    #[serde(default)]
    pub faculties: Vec<Faculty>,
    #[serde(default)]
    pub batches: Vec<Batch>,
    #[serde(default)]
    pub settings: Settings,
}

/// Represents a single, scheduled class session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ScheduledClass {
    pub batch: BatchName,
    pub subject: SubjectName,
    pub faculty: FacultyId,
    pub classroom: RoomId,
    pub time_slot: TimeSlot,
}

/// Describes a soft constraint that was not met in the final schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmetSoftConstraint {
    pub constraint_type: String,
    pub description: String,
}

impl fmt::Display for UnmetSoftConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.constraint_type, self.description)
    }
}

/// Soft constraint violations recomputed from a decoded schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PenaltyBreakdown {
    pub gaps: u32,
    pub gap_cost: i64,
    pub contiguous_windows: u32,
    pub contiguous_cost: i64,
    pub repeated_sessions: u32,
    pub subject_spread_cost: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    Feasible,
}

/// The final output of the solver.
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub objective_value: i64,
    pub schedule: Vec<ScheduledClass>,
    pub penalties: PenaltyBreakdown,
    pub unmet_soft_constraints: Vec<UnmetSoftConstraint>,
}
