use std::time::{Duration, Instant};

use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    default_solver, variable,
};
use log::{info, trace, warn};

use crate::error::{Result, TimetableError};
use crate::model::{Assignment, Domain, LinearExpr, Model, Relation};

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    pub time_limit: Duration,
    pub threads: u32,
    pub random_seed: u32,
    pub log_to_console: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
            threads: 1,
            random_seed: 1234,
            log_to_console: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Optimal { assignment: Assignment, objective_value: i64 },
    Feasible { assignment: Assignment, objective_value: i64 },
    Infeasible,
    TimedOutNoSolution,
}

impl SolveOutcome {
    pub fn solution(&self) -> Option<(&Assignment, i64)> {
        match self {
            SolveOutcome::Optimal { assignment, objective_value }
            | SolveOutcome::Feasible { assignment, objective_value } => Some((assignment, *objective_value)),
            SolveOutcome::Infeasible | SolveOutcome::TimedOutNoSolution => None,
        }
    }
}

/// Minimizes a model's objective subject to its constraints.
pub trait SolverEngine: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, model: &Model, options: &SolveOptions) -> Result<SolveOutcome>;
}

/// MILP engine backed by HiGHS through `good_lp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighsEngine;

impl SolverEngine for HighsEngine {
    fn name(&self) -> &str {
        "highs"
    }

    fn solve(&self, model: &Model, options: &SolveOptions) -> Result<SolveOutcome> {
        let start_time = Instant::now();
        let mut problem = ProblemVariables::new();
        let vars: Vec<Variable> = model
            .variables()
            .iter()
            .map(|def| match def.domain {
                Domain::Binary => problem.add(variable().binary().name(def.name.clone())),
                Domain::Integer { max } => {
                    problem.add(variable().integer().min(0).max(max).name(def.name.clone()))
                }
            })
            .collect();

        let threads = i32::try_from(options.threads)
            .map_err(|_| TimetableError::Internal(format!("thread count {} out of range", options.threads)))?;
        let random_seed = i32::try_from(options.random_seed)
            .map_err(|_| TimetableError::Internal(format!("random seed {} out of range", options.random_seed)))?;

        let objective = to_expression(&model.objective().expression(), &vars);
        let mut solver_model = problem
            .minimise(objective)
            .using(default_solver)
            .set_option("threads", threads)
            .set_option("random_seed", random_seed)
            .set_option("time_limit", options.time_limit.as_secs_f64())
            .set_option("log_to_console", if options.log_to_console { "true" } else { "false" });

        for c in model.constraints() {
            let lhs = to_expression(&c.expr, &vars);
            let rhs = c.rhs as f64;
            let translated = match c.relation {
                Relation::Eq => constraint!(lhs == rhs),
                Relation::Leq => constraint!(lhs <= rhs),
                Relation::Geq => constraint!(lhs >= rhs),
            };
            solver_model.add_constraint(translated);
        }
        trace!(
            "Handed {} variables and {} constraints to HiGHS",
            vars.len(),
            model.constraints().len()
        );

        info!("Starting ILP solver...");
        let solution = match solver_model.solve() {
            Ok(s) => s,
            Err(ResolutionError::Infeasible) => {
                info!("Solver proved the model infeasible after {:.2?}", start_time.elapsed());
                return Ok(SolveOutcome::Infeasible);
            }
            Err(e) => return Err(TimetableError::Internal(format!("solver error: {e}"))),
        };
        let duration = start_time.elapsed();

        let assignment = Assignment::new(vars.iter().map(|v| solution.value(*v).round() as i64).collect());
        // Without an incumbent at the time limit HiGHS still hands back values.
        if !model.is_satisfied_by(&assignment) {
            warn!("No feasible assignment found within {:.2?}", options.time_limit);
            return Ok(SolveOutcome::TimedOutNoSolution);
        }

        let objective_value = model.objective().value(&assignment);
        info!("Solution found in {duration:.2?} with objective value {objective_value}");
        if duration >= options.time_limit {
            Ok(SolveOutcome::Feasible {
                assignment,
                objective_value,
            })
        } else {
            Ok(SolveOutcome::Optimal {
                assignment,
                objective_value,
            })
        }
    }
}

fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
    let mut translated = Expression::from(expr.constant() as f64);
    for (var, coefficient) in expr.terms() {
        translated += *coefficient as f64 * Expression::from(vars[var.index()]);
    }
    translated
}
