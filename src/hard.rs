//! Mandatory placement and exclusivity rules.

use log::info;

use crate::error::{Result, TimetableError};
use crate::model::{ConstraintKind, LinearExpr, Model, Relation};
use crate::problem::Problem;
use crate::variables::VariableSpace;

/// Adds the five hard rules to `model`.
///
/// Fails with [`TimetableError::UnplaceableSessions`] when a session has no
/// variable at all, instead of emitting an exactly-one over nothing.
/// Exclusivity groups of a single variable and daily caps that the group
/// size can never exceed are left out.
pub fn add_hard_constraints(problem: &Problem, space: &VariableSpace, model: &mut Model) -> Result<()> {
    let unplaceable = space.unplaceable_sessions(problem);
    if !unplaceable.is_empty() {
        return Err(TimetableError::UnplaceableSessions(
            unplaceable.into_iter().map(str::to_string).collect(),
        ));
    }

    info!("Adding 'session scheduled once' constraints...");
    for session_idx in 0..problem.sessions.len() {
        model.add_exactly_one(ConstraintKind::ExactlyOnePlacement, space.for_session(session_idx));
    }

    info!("Adding 'no faculty overlap' constraints...");
    for faculty_idx in 0..problem.faculties.len() {
        for slot in problem.grid.slots() {
            let vars = space.at_faculty_slot(faculty_idx, slot);
            if vars.len() > 1 {
                model.add_at_most_one(ConstraintKind::FacultyExclusive, vars);
            }
        }
    }

    info!("Adding 'no room overlap' constraints...");
    for room_idx in 0..problem.rooms.len() {
        for slot in problem.grid.slots() {
            let vars = space.at_room_slot(room_idx, slot);
            if vars.len() > 1 {
                model.add_at_most_one(ConstraintKind::RoomExclusive, vars);
            }
        }
    }

    info!("Adding 'no batch overlap' and 'daily batch cap' constraints...");
    for (batch_idx, batch) in problem.batches.iter().enumerate() {
        for slot in problem.grid.slots() {
            let vars = space.at_batch_slot(batch_idx, slot);
            if vars.len() > 1 {
                model.add_at_most_one(ConstraintKind::BatchExclusive, vars);
            }
        }
        for day in problem.grid.days() {
            let vars = space.on_batch_day(batch_idx, day);
            if vars.len() > batch.max_classes_per_day as usize {
                model.add_constraint(
                    ConstraintKind::DailyBatchCap,
                    LinearExpr::sum(vars),
                    Relation::Leq,
                    i64::from(batch.max_classes_per_day),
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Batch, Classroom, Faculty, Settings, SubjectDemand, TimeSlot, TimetableInput};

    fn input() -> TimetableInput {
        TimetableInput {
            classrooms: vec![Classroom { id: "R1".into() }, Classroom { id: "R2".into() }],
            faculties: vec![Faculty {
                id: "F01".into(),
                subjects: vec!["Maths".into()],
                unavailable_slots: vec![],
            }],
            batches: vec![Batch {
                name: "CS-A".into(),
                subjects: vec![SubjectDemand { name: "Maths".into(), classes_per_week: 3 }],
                max_classes_per_day: Some(2),
            }],
            settings: Settings {
                working_days: 2,
                hours_per_day: 2,
                start_hour: 0,
                ..Settings::default()
            },
        }
    }

    fn build(input: &TimetableInput) -> (Problem, VariableSpace, Model, Result<()>) {
        let problem = Problem::from_input(input).unwrap();
        let mut model = Model::new();
        let space = VariableSpace::build(&problem, &mut model);
        let result = add_hard_constraints(&problem, &space, &mut model);
        (problem, space, model, result)
    }

    #[test]
    fn every_rule_is_emitted_per_group() {
        let (_, space, model, result) = build(&input());
        result.unwrap();

        assert_eq!(model.count_constraints(ConstraintKind::ExactlyOnePlacement), 3);
        // One faculty, four slots, three sessions by two rooms in each.
        assert_eq!(model.count_constraints(ConstraintKind::FacultyExclusive), 4);
        // Two rooms by four slots, three sessions in each.
        assert_eq!(model.count_constraints(ConstraintKind::RoomExclusive), 8);
        assert_eq!(model.count_constraints(ConstraintKind::BatchExclusive), 4);
        assert_eq!(model.count_constraints(ConstraintKind::DailyBatchCap), 2);

        let placement = model
            .constraints()
            .iter()
            .find(|c| c.kind == ConstraintKind::ExactlyOnePlacement)
            .unwrap();
        assert_eq!(placement.expr.terms().len(), space.for_session(0).len());
        assert_eq!(placement.relation, Relation::Eq);
        assert_eq!(placement.rhs, 1);
    }

    #[test]
    fn non_binding_daily_cap_is_left_out() {
        let mut input = input();
        input.batches[0].max_classes_per_day = Some(100);
        let (_, _, model, result) = build(&input);
        result.unwrap();

        assert_eq!(model.count_constraints(ConstraintKind::DailyBatchCap), 0);
    }

    #[test]
    fn singleton_groups_need_no_exclusivity() {
        let mut input = input();
        input.classrooms.truncate(1);
        input.batches[0].subjects[0].classes_per_week = 1;
        input.faculties[0].unavailable_slots = vec![TimeSlot::new(1, 0), TimeSlot::new(1, 1)];
        let (_, _, model, result) = build(&input);
        result.unwrap();

        assert_eq!(model.count_constraints(ConstraintKind::ExactlyOnePlacement), 1);
        assert_eq!(model.count_constraints(ConstraintKind::FacultyExclusive), 0);
        assert_eq!(model.count_constraints(ConstraintKind::RoomExclusive), 0);
        assert_eq!(model.count_constraints(ConstraintKind::BatchExclusive), 0);
    }

    #[test]
    fn session_without_faculty_is_reported_before_solving() {
        let mut input = input();
        input.batches[0].subjects.push(SubjectDemand { name: "Art".into(), classes_per_week: 2 });
        let (_, _, model, result) = build(&input);

        match result {
            Err(TimetableError::UnplaceableSessions(ids)) => {
                assert_eq!(ids, vec!["CS-A_Art_0".to_string(), "CS-A_Art_1".to_string()]);
            }
            other => panic!("expected unplaceable sessions, got {other:?}"),
        }
        assert!(model.constraints().is_empty());
    }
}
