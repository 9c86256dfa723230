use std::time::Instant;

use log::{info, warn};

use crate::data::{PenaltyBreakdown, SolveReport, SolveStatus, TimetableInput};
use crate::decode::{decode, evaluate_penalties};
use crate::engine::{SolveOptions, SolveOutcome, SolverEngine};
use crate::error::{Result, TimetableError};
use crate::hard::add_hard_constraints;
use crate::model::Model;
use crate::problem::Problem;
use crate::soft::{Occupancy, add_soft_constraints};
use crate::variables::VariableSpace;

/// A fully assembled model together with the structures needed to read it back.
#[derive(Debug)]
pub struct TimetableModel {
    pub model: Model,
    pub space: VariableSpace,
    pub occupancy: Occupancy,
}

/// Builds variables, hard constraints and the objective for `problem`.
pub fn build_model(problem: &Problem) -> Result<TimetableModel> {
    info!(
        "Setting up ILP model with {} sessions, {} faculty, {} rooms and {} timeslots...",
        problem.sessions.len(),
        problem.faculties.len(),
        problem.rooms.len(),
        problem.grid.slot_count()
    );
    let mut model = Model::new();
    let space = VariableSpace::build(problem, &mut model);
    add_hard_constraints(problem, &space, &mut model)?;
    let occupancy = Occupancy::build(problem, &space, &mut model);
    add_soft_constraints(problem, &space, &occupancy, &mut model);
    info!(
        "Model has {} variables ({} placements) and {} constraints.",
        model.variables().len(),
        space.len(),
        model.constraints().len()
    );
    Ok(TimetableModel { model, space, occupancy })
}

/// Solves the timetabling problem with the given engine.
pub fn solve(input: &TimetableInput, engine: &dyn SolverEngine, options: &SolveOptions) -> Result<SolveReport> {
    let start_time = Instant::now();
    let problem = Problem::from_input(input)?;

    if problem.sessions.is_empty() {
        info!("No class sessions requested, returning an empty timetable.");
        return Ok(SolveReport {
            status: SolveStatus::Optimal,
            objective_value: 0,
            schedule: Vec::new(),
            penalties: PenaltyBreakdown::default(),
            unmet_soft_constraints: Vec::new(),
        });
    }

    let built = build_model(&problem)?;
    info!("Solving with the {} engine (time limit {:?})", engine.name(), options.time_limit);
    let (status, assignment, objective_value) = match engine.solve(&built.model, options)? {
        SolveOutcome::Optimal {
            assignment,
            objective_value,
        } => (SolveStatus::Optimal, assignment, objective_value),
        SolveOutcome::Feasible {
            assignment,
            objective_value,
        } => (SolveStatus::Feasible, assignment, objective_value),
        SolveOutcome::Infeasible => {
            warn!("Model is infeasible.");
            return Err(TimetableError::Infeasible);
        }
        SolveOutcome::TimedOutNoSolution => {
            warn!("Time limit reached without a feasible timetable.");
            return Err(TimetableError::Infeasible);
        }
    };

    let schedule = decode(&problem, &built.space, &assignment);
    if schedule.len() != problem.sessions.len() {
        return Err(TimetableError::Internal(format!(
            "decoded {} classes for {} sessions",
            schedule.len(),
            problem.sessions.len()
        )));
    }
    let (penalties, unmet_soft_constraints) = evaluate_penalties(&problem, &schedule);
    info!(
        "Timetable with {} classes ready in {:.2?} ({:?}, objective value {})",
        schedule.len(),
        start_time.elapsed(),
        status,
        objective_value
    );

    Ok(SolveReport {
        status,
        objective_value,
        schedule,
        penalties,
        unmet_soft_constraints,
    })
}
