//! CP model: variables, intervals, constraints and objective.

use super::{BoolVar, IntVar, IntervalId, IntervalVar, LinearExpr, Literal, VarId, WeightedSum};

/// Lower bound used for one-sided `<=` constraints.
pub const NEG_INF: i64 = i64::MIN;
/// Upper bound used for one-sided `>=` constraints.
pub const POS_INF: i64 = i64::MAX;

/// `lb <= expr <= ub`, enforced only when every enforcement literal holds.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    /// Constrained expression.
    pub expr: LinearExpr,
    /// Lower bound (`NEG_INF` for none).
    pub lb: i64,
    /// Upper bound (`POS_INF` for none).
    pub ub: i64,
    /// Conjunction of literals guarding the constraint.
    pub enforcement: Vec<Literal>,
}

impl LinearConstraint {
    /// Guards this constraint with an additional literal.
    pub fn only_enforce_if(&mut self, lit: impl Into<Literal>) -> &mut Self {
        self.enforcement.push(lit.into());
        self
    }

    /// Whether the constraint is satisfied by a full assignment.
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        let enforced = self
            .enforcement
            .iter()
            .all(|l| l.holds_for(values[l.var().index()]));
        if !enforced {
            return true;
        }
        let v = self.expr.evaluate(values);
        self.lb <= v && v <= self.ub
    }
}

/// Resource usage of a set of intervals bounded by a capacity.
#[derive(Debug, Clone)]
pub struct CumulativeConstraint {
    /// `(interval, demand)` pairs.
    pub demands: Vec<(IntervalId, i64)>,
    /// Maximum total demand of present intervals at any instant.
    pub capacity: i64,
}

/// Non-linear constraints.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// `target == max(vars)`.
    MaxEquality {
        /// Constrained variable.
        target: VarId,
        /// Candidates.
        vars: Vec<VarId>,
    },
    /// `target == min(vars)`.
    MinEquality {
        /// Constrained variable.
        target: VarId,
        /// Candidates.
        vars: Vec<VarId>,
    },
    /// Exactly one literal is true.
    ExactlyOne(Vec<Literal>),
    /// Cumulative resource constraint.
    Cumulative(CumulativeConstraint),
}

/// A constraint model over bounded integer variables.
///
/// # Example
/// ```
/// use u_stoch_schedule::cp::{CpModel, CpSolver, PumpkinSolver, SolverParams, WeightedSum};
///
/// let mut model = CpModel::new("demo");
/// let x = model.new_int_var(0, 10, "x");
/// let y = model.new_int_var(0, 10, "y");
/// model.add_ge(x, 3_i64);
/// model.add_le(x, y);
/// let mut obj = WeightedSum::new();
/// obj.add_term(1.0, y);
/// model.minimize(obj);
///
/// let solution = PumpkinSolver::new().solve(&model, &SolverParams::default());
/// assert_eq!(solution.value(y), Some(3));
/// ```
#[derive(Debug, Clone)]
pub struct CpModel {
    name: String,
    vars: Vec<IntVar>,
    booleans: Vec<bool>,
    intervals: Vec<IntervalVar>,
    linears: Vec<LinearConstraint>,
    constraints: Vec<Constraint>,
    objective: Option<WeightedSum>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            booleans: Vec::new(),
            intervals: Vec::new(),
            linears: Vec::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates an integer variable in `[lb, ub]`.
    pub fn new_int_var(&mut self, lb: i64, ub: i64, name: impl Into<String>) -> VarId {
        self.push_var(IntVar::new(name, lb, ub), false)
    }

    /// Creates a boolean variable.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        BoolVar(self.push_var(IntVar::new(name, 0, 1), true))
    }

    /// Creates a variable fixed to `value`.
    pub fn new_constant(&mut self, value: i64) -> VarId {
        self.push_var(IntVar::fixed(format!("const_{value}"), value), false)
    }

    fn push_var(&mut self, var: IntVar, boolean: bool) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(var);
        self.booleans.push(boolean);
        id
    }

    /// Creates a mandatory interval; adds `end == start + size`.
    pub fn new_interval(
        &mut self,
        start: VarId,
        size: i64,
        end: VarId,
        name: impl Into<String>,
    ) -> IntervalId {
        self.push_interval(start, size, end, None, name.into())
    }

    /// Creates a mandatory interval at a fixed position.
    pub fn new_fixed_interval(
        &mut self,
        start: i64,
        size: i64,
        name: impl Into<String>,
    ) -> IntervalId {
        let s = self.new_constant(start);
        let e = self.new_constant(start + size);
        self.new_interval(s, size, e, name)
    }

    /// Creates an optional interval; `end == start + size` holds only when
    /// `presence` is true.
    pub fn new_optional_interval(
        &mut self,
        start: VarId,
        size: i64,
        end: VarId,
        presence: impl Into<Literal>,
        name: impl Into<String>,
    ) -> IntervalId {
        self.push_interval(start, size, end, Some(presence.into()), name.into())
    }

    fn push_interval(
        &mut self,
        start: VarId,
        size: i64,
        end: VarId,
        presence: Option<Literal>,
        name: String,
    ) -> IntervalId {
        let c = self.add_eq(LinearExpr::from(end) - LinearExpr::from(start), size);
        if let Some(lit) = presence {
            c.only_enforce_if(lit);
        }
        let id = IntervalId(self.intervals.len());
        self.intervals.push(IntervalVar {
            name,
            start,
            end,
            size,
            presence,
        });
        id
    }

    /// Adds `lb <= expr <= ub`.
    pub fn add_linear(&mut self, expr: LinearExpr, lb: i64, ub: i64) -> &mut LinearConstraint {
        let idx = self.linears.len();
        self.linears.push(LinearConstraint {
            expr,
            lb,
            ub,
            enforcement: Vec::new(),
        });
        &mut self.linears[idx]
    }

    /// Adds `lhs == rhs`.
    pub fn add_eq(
        &mut self,
        lhs: impl Into<LinearExpr>,
        rhs: impl Into<LinearExpr>,
    ) -> &mut LinearConstraint {
        self.add_linear(lhs.into() - rhs.into(), 0, 0)
    }

    /// Adds `lhs <= rhs`.
    pub fn add_le(
        &mut self,
        lhs: impl Into<LinearExpr>,
        rhs: impl Into<LinearExpr>,
    ) -> &mut LinearConstraint {
        self.add_linear(lhs.into() - rhs.into(), NEG_INF, 0)
    }

    /// Adds `lhs >= rhs`.
    pub fn add_ge(
        &mut self,
        lhs: impl Into<LinearExpr>,
        rhs: impl Into<LinearExpr>,
    ) -> &mut LinearConstraint {
        self.add_linear(lhs.into() - rhs.into(), 0, POS_INF)
    }

    /// Adds `lhs > rhs`.
    pub fn add_gt(
        &mut self,
        lhs: impl Into<LinearExpr>,
        rhs: impl Into<LinearExpr>,
    ) -> &mut LinearConstraint {
        self.add_linear(lhs.into() - rhs.into(), 1, POS_INF)
    }

    /// Adds `target == max(vars)`.
    pub fn add_max_equality(&mut self, target: VarId, vars: Vec<VarId>) {
        self.constraints.push(Constraint::MaxEquality { target, vars });
    }

    /// Adds `target == min(vars)`.
    pub fn add_min_equality(&mut self, target: VarId, vars: Vec<VarId>) {
        self.constraints.push(Constraint::MinEquality { target, vars });
    }

    /// Adds "exactly one of `lits` is true".
    pub fn add_exactly_one(&mut self, lits: Vec<Literal>) {
        self.constraints.push(Constraint::ExactlyOne(lits));
    }

    /// Adds a cumulative constraint over `(interval, demand)` pairs.
    pub fn add_cumulative(&mut self, demands: Vec<(IntervalId, i64)>, capacity: i64) {
        self.constraints
            .push(Constraint::Cumulative(CumulativeConstraint { demands, capacity }));
    }

    /// Sets the objective to minimize.
    pub fn minimize(&mut self, objective: WeightedSum) {
        self.objective = Some(objective);
    }

    /// Declared variable.
    pub fn var(&self, id: VarId) -> &IntVar {
        &self.vars[id.index()]
    }

    /// Whether `id` was created by [`CpModel::new_bool_var`].
    pub fn is_bool(&self, id: VarId) -> bool {
        self.booleans[id.index()]
    }

    /// All declared variables.
    pub fn vars(&self) -> &[IntVar] {
        &self.vars
    }

    /// Declared interval.
    pub fn interval(&self, id: IntervalId) -> &IntervalVar {
        &self.intervals[id.index()]
    }

    /// All declared intervals.
    pub fn intervals(&self) -> &[IntervalVar] {
        &self.intervals
    }

    /// Linear constraints, including interval length constraints.
    pub fn linears(&self) -> &[LinearConstraint] {
        &self.linears
    }

    /// Non-linear constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The objective, if any.
    pub fn objective(&self) -> Option<&WeightedSum> {
        self.objective.as_ref()
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Number of intervals.
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Number of constraints of every kind.
    pub fn constraint_count(&self) -> usize {
        self.linears.len() + self.constraints.len()
    }
}
