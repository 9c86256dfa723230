use std::collections::HashMap;

use log::{debug, info};

use crate::data::{Hour, TimeSlot};
use crate::model::{ConstraintKind, LinearExpr, Model, PenaltyFamily, Relation, VarId};
use crate::problem::{BatchIdx, Problem};
use crate::variables::VariableSpace;

/// `occupied(batch, day, hour)` for every batch and grid slot.
#[derive(Debug, Default)]
pub struct Occupancy {
    vars: HashMap<(BatchIdx, TimeSlot), VarId>,
}

impl Occupancy {
    /// Creates one indicator per batch and slot, constrained to the OR of
    /// the batch's placement variables there, or to 0 when there are none.
    pub fn build(problem: &Problem, space: &VariableSpace, model: &mut Model) -> Occupancy {
        let mut vars = HashMap::new();
        for (batch_idx, batch) in problem.batches.iter().enumerate() {
            for slot in problem.grid.slots() {
                let occ = model.add_binary(format!("has_class_{}_{}_{}", batch.name, slot.day, slot.hour));
                let placements = space.at_batch_slot(batch_idx, slot);
                if placements.is_empty() {
                    model.add_constraint(ConstraintKind::OccupancyLink, LinearExpr::new().term(occ, 1), Relation::Eq, 0);
                } else {
                    for x in placements {
                        model.add_constraint(
                            ConstraintKind::OccupancyLink,
                            LinearExpr::new().term(occ, 1).term(*x, -1),
                            Relation::Geq,
                            0,
                        );
                    }
                    model.add_constraint(
                        ConstraintKind::OccupancyLink,
                        LinearExpr::new().term(occ, 1).plus_sum(placements, -1),
                        Relation::Leq,
                        0,
                    );
                }
                vars.insert((batch_idx, slot), occ);
            }
        }
        Occupancy { vars }
    }

    pub fn get(&self, batch: BatchIdx, slot: TimeSlot) -> Option<VarId> {
        self.vars.get(&(batch, slot)).copied()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    fn at(&self, batch: BatchIdx, day: u32, hour: Hour) -> Option<VarId> {
        self.get(batch, TimeSlot::new(day, hour))
    }
}

#[derive(Debug, Clone, Copy)]
enum Literal {
    Pos(VarId),
    Neg(VarId),
}

/// Adds a binary `ind` with `ind <=> AND(literals)`.
///
/// `ind <= lit` for each literal and `ind >= sum(lit) - (k - 1)`.
fn and_indicator(model: &mut Model, kind: ConstraintKind, name: String, literals: &[Literal]) -> VarId {
    let ind = model.add_binary(name);
    let mut lower = LinearExpr::new().term(ind, 1);
    let mut negated = 0;
    for literal in literals {
        match *literal {
            Literal::Pos(v) => {
                model.add_constraint(kind, LinearExpr::new().term(ind, 1).term(v, -1), Relation::Leq, 0);
                lower = lower.term(v, -1);
            }
            Literal::Neg(v) => {
                model.add_constraint(kind, LinearExpr::new().term(ind, 1).term(v, 1), Relation::Leq, 1);
                lower = lower.term(v, 1);
                negated += 1;
            }
        }
    }
    let k = literals.len() as i64;
    model.add_constraint(kind, lower, Relation::Geq, negated - k + 1);
    ind
}

/// Adds every penalty family whose weight is positive to the objective.
pub fn add_soft_constraints(problem: &Problem, space: &VariableSpace, occupancy: &Occupancy, model: &mut Model) {
    let weights = problem.penalties;

    if weights.gap > 0 {
        info!("Adding batch gap penalties (weight {})...", weights.gap);
        add_gap_penalties(problem, occupancy, model, weights.gap);
    }
    if weights.contiguous > 0 {
        info!("Adding contiguous class penalties (weight {})...", weights.contiguous);
        add_contiguous_penalties(problem, occupancy, model, weights.contiguous);
    }
    if weights.subject_spread > 0 {
        info!("Adding subject spread penalties (weight {})...", weights.subject_spread);
        add_subject_spread_penalties(problem, space, model, weights.subject_spread);
    }

    for family in model.objective().families() {
        debug!("{} penalty terms: {}", family, model.objective().terms(family).len());
    }
}

// gap(h) <=> occ(h-1) & !occ(h) & occ(h+1), for hours strictly inside the day
fn add_gap_penalties(problem: &Problem, occupancy: &Occupancy, model: &mut Model, weight: i64) {
    let hours = problem.grid.hours();
    for (batch_idx, batch) in problem.batches.iter().enumerate() {
        for day in problem.grid.days() {
            for hour in hours.start + 1..hours.end.saturating_sub(1) {
                let (Some(prev), Some(here), Some(next)) = (
                    occupancy.at(batch_idx, day, hour - 1),
                    occupancy.at(batch_idx, day, hour),
                    occupancy.at(batch_idx, day, hour + 1),
                ) else {
                    continue;
                };
                let gap = and_indicator(
                    model,
                    ConstraintKind::GapLink,
                    format!("gap_{}_{}_{}", batch.name, day, hour),
                    &[Literal::Pos(prev), Literal::Neg(here), Literal::Pos(next)],
                );
                model.objective_mut().add_term(PenaltyFamily::Gap, gap, weight);
            }
        }
    }
}

// run(h) <=> occ(h) & occ(h+1) & occ(h+2); a run of n hours hits n - 2 windows
fn add_contiguous_penalties(problem: &Problem, occupancy: &Occupancy, model: &mut Model, weight: i64) {
    let hours = problem.grid.hours();
    for (batch_idx, batch) in problem.batches.iter().enumerate() {
        for day in problem.grid.days() {
            for first in hours.start..hours.end.saturating_sub(2) {
                let (Some(h1), Some(h2), Some(h3)) = (
                    occupancy.at(batch_idx, day, first),
                    occupancy.at(batch_idx, day, first + 1),
                    occupancy.at(batch_idx, day, first + 2),
                ) else {
                    continue;
                };
                let run = and_indicator(
                    model,
                    ConstraintKind::ContiguousLink,
                    format!("too_many_contiguous_{}_{}_{}", batch.name, day, first),
                    &[Literal::Pos(h1), Literal::Pos(h2), Literal::Pos(h3)],
                );
                model.objective_mut().add_term(PenaltyFamily::Contiguous, run, weight);
            }
        }
    }
}

// overage >= n - 1 where n is the number of the subject's sessions on the day
fn add_subject_spread_penalties(problem: &Problem, space: &VariableSpace, model: &mut Model, weight: i64) {
    for (batch_idx, batch) in problem.batches.iter().enumerate() {
        for (subject_idx, subject) in batch.subjects.iter().enumerate() {
            if subject.classes_per_week == 0 {
                continue;
            }
            for day in problem.grid.days() {
                let daily = space.on_batch_subject_day(batch_idx, subject_idx, day);
                let overage = model.add_integer(
                    format!("overage_{}_{}_{}", batch.name, subject.name, day),
                    subject.classes_per_week,
                );
                model.add_constraint(
                    ConstraintKind::SubjectSpreadLink,
                    LinearExpr::new().term(overage, 1).plus_sum(daily, -1),
                    Relation::Geq,
                    -1,
                );
                model.objective_mut().add_term(PenaltyFamily::SubjectSpread, overage, weight);
            }
        }
    }
}
