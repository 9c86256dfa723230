use std::collections::HashMap;

use log::trace;

use crate::data::{Day, TimeSlot};
use crate::model::{Model, VarId};
use crate::problem::{BatchIdx, FacultyIdx, Problem, RoomIdx, SessionIdx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub session: SessionIdx,
    pub faculty: FacultyIdx,
    pub room: RoomIdx,
    pub slot: TimeSlot,
}

#[derive(Debug, Clone, Copy)]
pub struct DecisionVar {
    pub var: VarId,
    pub placement: Placement,
}

// only (session, faculty, room, slot) tuples with a capable and free faculty get a variable
#[derive(Debug, Default)]
pub struct VariableSpace {
    decisions: Vec<DecisionVar>,
    by_session: Vec<Vec<VarId>>,
    by_faculty_slot: HashMap<(FacultyIdx, TimeSlot), Vec<VarId>>,
    by_room_slot: HashMap<(RoomIdx, TimeSlot), Vec<VarId>>,
    by_batch_slot: HashMap<(BatchIdx, TimeSlot), Vec<VarId>>,
    by_batch_day: HashMap<(BatchIdx, Day), Vec<VarId>>,
    by_batch_subject_day: HashMap<(BatchIdx, usize, Day), Vec<VarId>>,
}

impl VariableSpace {
    /// Creates one binary variable in `model` per viable placement.
    pub fn build(problem: &Problem, model: &mut Model) -> VariableSpace {
        let mut space = VariableSpace {
            by_session: vec![Vec::new(); problem.sessions.len()],
            ..Default::default()
        };

        for (session_idx, session) in problem.sessions.iter().enumerate() {
            let subject = problem.subject_name(session);
            for (faculty_idx, faculty) in problem.faculties.iter().enumerate() {
                if !faculty.can_teach(subject) {
                    continue;
                }
                for (room_idx, room) in problem.rooms.iter().enumerate() {
                    for slot in problem.grid.slots().filter(|slot| faculty.is_free(*slot)) {
                        let var = model.add_binary(format!(
                            "assign_{}_{}_{}_{}_{}",
                            session.id, faculty.id, room, slot.day, slot.hour
                        ));
                        space.insert(
                            DecisionVar {
                                var,
                                placement: Placement {
                                    session: session_idx,
                                    faculty: faculty_idx,
                                    room: room_idx,
                                    slot,
                                },
                            },
                            session.batch,
                            session.subject,
                        );
                    }
                }
            }
        }

        trace!(
            "Generated {} placement variables out of a theoretical maximum of {}.",
            space.decisions.len(),
            problem.sessions.len() * problem.faculties.len() * problem.rooms.len() * problem.grid.slot_count()
        );
        space
    }

    fn insert(&mut self, decision: DecisionVar, batch: BatchIdx, subject: usize) {
        let DecisionVar { var, placement } = decision;
        let slot = placement.slot;
        self.by_session[placement.session].push(var);
        self.by_faculty_slot.entry((placement.faculty, slot)).or_default().push(var);
        self.by_room_slot.entry((placement.room, slot)).or_default().push(var);
        self.by_batch_slot.entry((batch, slot)).or_default().push(var);
        self.by_batch_day.entry((batch, slot.day)).or_default().push(var);
        self.by_batch_subject_day
            .entry((batch, subject, slot.day))
            .or_default()
            .push(var);
        self.decisions.push(decision);
    }

    pub fn decisions(&self) -> &[DecisionVar] {
        &self.decisions
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn for_session(&self, session: SessionIdx) -> &[VarId] {
        &self.by_session[session]
    }

    pub fn at_faculty_slot(&self, faculty: FacultyIdx, slot: TimeSlot) -> &[VarId] {
        lookup(&self.by_faculty_slot, &(faculty, slot))
    }

    pub fn at_room_slot(&self, room: RoomIdx, slot: TimeSlot) -> &[VarId] {
        lookup(&self.by_room_slot, &(room, slot))
    }

    pub fn at_batch_slot(&self, batch: BatchIdx, slot: TimeSlot) -> &[VarId] {
        lookup(&self.by_batch_slot, &(batch, slot))
    }

    pub fn on_batch_day(&self, batch: BatchIdx, day: Day) -> &[VarId] {
        lookup(&self.by_batch_day, &(batch, day))
    }

    pub fn on_batch_subject_day(&self, batch: BatchIdx, subject: usize, day: Day) -> &[VarId] {
        lookup(&self.by_batch_subject_day, &(batch, subject, day))
    }

    /// Sessions that no variable can place.
    pub fn unplaceable_sessions<'p>(&self, problem: &'p Problem) -> Vec<&'p str> {
        problem
            .sessions
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.by_session[*idx].is_empty())
            .map(|(_, session)| session.id.as_str())
            .collect()
    }
}

fn lookup<'a, K: Eq + std::hash::Hash>(index: &'a HashMap<K, Vec<VarId>>, key: &K) -> &'a [VarId] {
    index.get(key).map(Vec::as_slice).unwrap_or_default()
}
