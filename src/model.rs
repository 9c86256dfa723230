//! Solver independent model: variables, linear constraints and a per-family objective.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Binary,
    /// Integer in `0..=max`.
    Integer { max: u32 },
}

#[derive(Debug, Clone)]
pub struct VarDef {
    pub name: String,
    pub domain: Domain,
}

/// `sum(coefficient * variable) + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, i64)>,
    constant: i64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sum<'a>(vars: impl IntoIterator<Item = &'a VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (*v, 1)).collect(),
            constant: 0,
        }
    }

    pub fn term(mut self, var: VarId, coefficient: i64) -> Self {
        self.terms.push((var, coefficient));
        self
    }

    pub fn plus_sum<'a>(mut self, vars: impl IntoIterator<Item = &'a VarId>, coefficient: i64) -> Self {
        self.terms.extend(vars.into_iter().map(|v| (*v, coefficient)));
        self
    }

    pub fn terms(&self) -> &[(VarId, i64)] {
        &self.terms
    }

    pub fn constant(&self) -> i64 {
        self.constant
    }

    pub fn eval(&self, assignment: &Assignment) -> i64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|(var, coefficient)| coefficient * assignment.value(*var))
                .sum::<i64>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Leq,
    Geq,
}

/// The rule a constraint encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintKind {
    ExactlyOnePlacement,
    FacultyExclusive,
    RoomExclusive,
    BatchExclusive,
    DailyBatchCap,
    OccupancyLink,
    GapLink,
    ContiguousLink,
    SubjectSpreadLink,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: i64,
}

impl Constraint {
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        let lhs = self.expr.eval(assignment);
        match self.relation {
            Relation::Eq => lhs == self.rhs,
            Relation::Leq => lhs <= self.rhs,
            Relation::Geq => lhs >= self.rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PenaltyFamily {
    Gap,
    Contiguous,
    SubjectSpread,
}

impl fmt::Display for PenaltyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PenaltyFamily::Gap => "Batch Gap",
            PenaltyFamily::Contiguous => "Max Contiguous Classes",
            PenaltyFamily::SubjectSpread => "Subject Spread",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyTerm {
    pub var: VarId,
    pub weight: i64,
}

/// Minimized sum of weighted indicator variables, grouped by family.
#[derive(Debug, Clone, Default)]
pub struct Objective {
    families: BTreeMap<PenaltyFamily, Vec<PenaltyTerm>>,
}

impl Objective {
    pub fn add_term(&mut self, family: PenaltyFamily, var: VarId, weight: i64) {
        self.families
            .entry(family)
            .or_default()
            .push(PenaltyTerm { var, weight });
    }

    pub fn terms(&self, family: PenaltyFamily) -> &[PenaltyTerm] {
        self.families.get(&family).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn families(&self) -> impl Iterator<Item = PenaltyFamily> + '_ {
        self.families.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.families.values().all(Vec::is_empty)
    }

    pub fn family_value(&self, family: PenaltyFamily, assignment: &Assignment) -> i64 {
        self.terms(family)
            .iter()
            .map(|t| t.weight * assignment.value(t.var))
            .sum()
    }

    pub fn value(&self, assignment: &Assignment) -> i64 {
        self.families()
            .map(|family| self.family_value(family, assignment))
            .sum()
    }

    pub fn expression(&self) -> LinearExpr {
        self.families
            .values()
            .flatten()
            .fold(LinearExpr::new(), |expr, t| expr.term(t.var, t.weight))
    }
}

/// Integer value per model variable, indexed by [`VarId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<i64>,
}

impl Assignment {
    pub fn new(values: Vec<i64>) -> Self {
        Self { values }
    }

    pub fn zeroed(model: &Model) -> Self {
        Self::new(vec![0; model.variables().len()])
    }

    pub fn value(&self, var: VarId) -> i64 {
        self.values[var.index()]
    }

    pub fn is_true(&self, var: VarId) -> bool {
        self.value(var) == 1
    }

    pub fn set(&mut self, var: VarId, value: i64) {
        self.values[var.index()] = value;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    variables: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: Objective,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name.into(), Domain::Binary)
    }

    pub fn add_integer(&mut self, name: impl Into<String>, max: u32) -> VarId {
        self.add_variable(name.into(), Domain::Integer { max })
    }

    fn add_variable(&mut self, name: String, domain: Domain) -> VarId {
        self.variables.push(VarDef { name, domain });
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(&mut self, kind: ConstraintKind, expr: LinearExpr, relation: Relation, rhs: i64) {
        self.constraints.push(Constraint {
            kind,
            expr,
            relation,
            rhs,
        });
    }

    pub fn add_exactly_one(&mut self, kind: ConstraintKind, vars: &[VarId]) {
        self.add_constraint(kind, LinearExpr::sum(vars), Relation::Eq, 1);
    }

    pub fn add_at_most_one(&mut self, kind: ConstraintKind, vars: &[VarId]) {
        self.add_constraint(kind, LinearExpr::sum(vars), Relation::Leq, 1);
    }

    pub fn variables(&self) -> &[VarDef] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn count_constraints(&self, kind: ConstraintKind) -> usize {
        self.constraints.iter().filter(|c| c.kind == kind).count()
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn objective_mut(&mut self) -> &mut Objective {
        &mut self.objective
    }

    /// Checks variable domains and every constraint.
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        let in_domain = self.variables.iter().enumerate().all(|(i, def)| {
            let value = assignment.value(VarId(i));
            match def.domain {
                Domain::Binary => value == 0 || value == 1,
                Domain::Integer { max } => (0..=i64::from(max)).contains(&value),
            }
        });
        in_domain && self.violated_constraints(assignment).next().is_none()
    }

    pub fn violated_constraints<'a>(&'a self, assignment: &'a Assignment) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.constraints.iter().filter(move |c| !c.is_satisfied(assignment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objective_keeps_families_apart() {
        let mut model = Model::new();
        let a = model.add_binary("a");
        let b = model.add_binary("b");
        let c = model.add_integer("c", 3);
        model.objective_mut().add_term(PenaltyFamily::Gap, a, 2);
        model.objective_mut().add_term(PenaltyFamily::SubjectSpread, c, 5);
        model.objective_mut().add_term(PenaltyFamily::Gap, b, 2);

        let mut assignment = Assignment::zeroed(&model);
        assignment.set(a, 1);
        assignment.set(c, 2);

        let objective = model.objective();
        assert_eq!(objective.terms(PenaltyFamily::Gap).len(), 2);
        assert!(objective.terms(PenaltyFamily::Contiguous).is_empty());
        assert_eq!(objective.family_value(PenaltyFamily::Gap, &assignment), 2);
        assert_eq!(objective.family_value(PenaltyFamily::SubjectSpread, &assignment), 10);
        assert_eq!(objective.value(&assignment), 12);
        assert_eq!(objective.expression().eval(&assignment), 12);
    }

    #[test]
    fn constraints_are_checked_against_assignment() {
        let mut model = Model::new();
        let x = model.add_binary("x");
        let y = model.add_binary("y");
        model.add_exactly_one(ConstraintKind::ExactlyOnePlacement, &[x, y]);
        model.add_constraint(
            ConstraintKind::GapLink,
            LinearExpr::new().term(x, 1).term(y, -1),
            Relation::Geq,
            0,
        );

        let mut assignment = Assignment::zeroed(&model);
        assert!(!model.is_satisfied_by(&assignment));

        assignment.set(y, 1);
        let violated: Vec<ConstraintKind> = model.violated_constraints(&assignment).map(|c| c.kind).collect();
        assert_eq!(violated, vec![ConstraintKind::GapLink]);

        assignment.set(y, 0);
        assignment.set(x, 1);
        assert!(model.is_satisfied_by(&assignment));
        assert_eq!(model.count_constraints(ConstraintKind::ExactlyOnePlacement), 1);
    }

    #[test]
    fn out_of_domain_values_are_rejected() {
        let mut model = Model::new();
        let x = model.add_binary("x");
        let n = model.add_integer("n", 2);

        let mut assignment = Assignment::zeroed(&model);
        assignment.set(n, 3);
        assert!(!model.is_satisfied_by(&assignment));

        assignment.set(n, 2);
        assignment.set(x, 2);
        assert!(!model.is_satisfied_by(&assignment));
    }

    #[test]
    fn empty_objective_evaluates_to_zero() {
        let model = Model::new();
        assert!(model.objective().is_empty());
        assert_eq!(model.objective().value(&Assignment::zeroed(&model)), 0);
    }
}
