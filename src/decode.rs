use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;

use crate::data::{Day, Hour, PenaltyBreakdown, ScheduledClass, UnmetSoftConstraint};
use crate::model::{Assignment, PenaltyFamily};
use crate::problem::Problem;
use crate::variables::VariableSpace;

/// One record per placement variable set to 1, ordered by slot, then batch.
pub fn decode(problem: &Problem, space: &VariableSpace, assignment: &Assignment) -> Vec<ScheduledClass> {
    space
        .decisions()
        .iter()
        .filter(|d| assignment.is_true(d.var))
        .map(|d| {
            let p = d.placement;
            let session = &problem.sessions[p.session];
            ScheduledClass {
                batch: problem.batch_name(session).to_string(),
                subject: problem.subject_name(session).to_string(),
                faculty: problem.faculties[p.faculty].id.clone(),
                classroom: problem.rooms[p.room].clone(),
                time_slot: p.slot,
            }
        })
        .sorted_by(|a, b| {
            (a.time_slot, &a.batch, &a.subject, &a.faculty, &a.classroom)
                .cmp(&(b.time_slot, &b.batch, &b.subject, &b.faculty, &b.classroom))
        })
        .collect()
}

/// Recomputes the soft constraint penalties from a schedule.
///
/// Families with a weight of zero or less are not counted, as they are
/// absent from the objective.
pub fn evaluate_penalties(problem: &Problem, schedule: &[ScheduledClass]) -> (PenaltyBreakdown, Vec<UnmetSoftConstraint>) {
    let weights = problem.penalties;
    let hours = problem.grid.hours();
    let mut breakdown = PenaltyBreakdown::default();
    let mut unmet = Vec::new();

    let occupied: HashMap<(&str, Day), BTreeSet<Hour>> = schedule
        .iter()
        .map(|c| ((c.batch.as_str(), c.time_slot.day), c.time_slot.hour))
        .into_grouping_map()
        .collect();

    for ((batch, day), busy) in occupied.iter().sorted_by_key(|(key, _)| *key) {
        if weights.gap > 0 {
            for hour in hours.start + 1..hours.end.saturating_sub(1) {
                if busy.contains(&(hour - 1)) && !busy.contains(&hour) && busy.contains(&(hour + 1)) {
                    breakdown.gaps += 1;
                    unmet.push(UnmetSoftConstraint {
                        constraint_type: PenaltyFamily::Gap.to_string(),
                        description: format!(
                            "Batch {batch} has a free hour at {hour}:00 on day {day} between two classes."
                        ),
                    });
                }
            }
        }
        if weights.contiguous > 0 {
            for first in hours.start..hours.end.saturating_sub(2) {
                if (first..first + 3).all(|h| busy.contains(&h)) {
                    breakdown.contiguous_windows += 1;
                    unmet.push(UnmetSoftConstraint {
                        constraint_type: PenaltyFamily::Contiguous.to_string(),
                        description: format!(
                            "Batch {batch} has classes from {first}:00 to {}:00 on day {day} without a break.",
                            first + 3
                        ),
                    });
                }
            }
        }
    }

    if weights.subject_spread > 0 {
        let per_subject_day = schedule
            .iter()
            .counts_by(|c| (c.batch.as_str(), c.subject.as_str(), c.time_slot.day));
        for ((batch, subject, day), n) in per_subject_day.into_iter().sorted() {
            if n > 1 {
                breakdown.repeated_sessions += (n - 1) as u32;
                unmet.push(UnmetSoftConstraint {
                    constraint_type: PenaltyFamily::SubjectSpread.to_string(),
                    description: format!("Batch {batch} has {n} {subject} classes on day {day}."),
                });
            }
        }
    }

    breakdown.gap_cost = i64::from(breakdown.gaps) * weights.gap.max(0);
    breakdown.contiguous_cost = i64::from(breakdown.contiguous_windows) * weights.contiguous.max(0);
    breakdown.subject_spread_cost = i64::from(breakdown.repeated_sessions) * weights.subject_spread.max(0);
    breakdown.total = breakdown.gap_cost + breakdown.contiguous_cost + breakdown.subject_spread_cost;

    (breakdown, unmet)
}
