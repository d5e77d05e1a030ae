//! Linear expressions over model variables.

use std::ops::{Add, Sub};

use super::VarId;

/// An integer linear expression `Σ coef·var + constant`.
///
/// Terms on the same variable are merged as they are added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    pub(crate) terms: Vec<(i64, VarId)>,
    pub(crate) constant: i64,
}

impl LinearExpr {
    /// Creates an empty expression (value 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a constant expression.
    pub fn constant(value: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Adds `coef·var`.
    pub fn term(mut self, coef: i64, var: VarId) -> Self {
        self.push_term(coef, var);
        self
    }

    /// Adds a constant offset.
    pub fn plus(mut self, value: i64) -> Self {
        self.constant += value;
        self
    }

    fn push_term(&mut self, coef: i64, var: VarId) {
        match self.terms.iter_mut().find(|(_, v)| *v == var) {
            Some(existing) => existing.0 += coef,
            None => self.terms.push((coef, var)),
        }
        self.terms.retain(|(c, _)| *c != 0);
    }

    /// The `(coefficient, variable)` terms.
    pub fn terms(&self) -> &[(i64, VarId)] {
        &self.terms
    }

    /// The constant part.
    pub fn offset(&self) -> i64 {
        self.constant
    }

    /// Evaluates the expression under a full assignment indexed by variable.
    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.terms
            .iter()
            .map(|&(c, v)| c * values[v.index()])
            .sum::<i64>()
            + self.constant
    }

    fn scaled(mut self, factor: i64) -> Self {
        for t in &mut self.terms {
            t.0 *= factor;
        }
        self.constant *= factor;
        self
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::new().term(1, var)
    }
}

impl From<i64> for LinearExpr {
    fn from(value: i64) -> Self {
        LinearExpr::constant(value)
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        for (c, v) in rhs.terms {
            self.push_term(c, v);
        }
        self.constant += rhs.constant;
        self
    }
}

impl Sub for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: LinearExpr) -> LinearExpr {
        self + rhs.scaled(-1)
    }
}

/// A real-weighted linear objective `Σ weight·var + offset`.
///
/// Scenario probabilities make objective weights fractional, so the
/// objective is kept apart from the integer constraint expressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedSum {
    pub(crate) terms: Vec<(f64, VarId)>,
    pub(crate) offset: f64,
}

impl WeightedSum {
    /// Creates an empty sum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `weight·var`, merging with an existing term on `var`.
    pub fn add_term(&mut self, weight: f64, var: VarId) {
        match self.terms.iter_mut().find(|(_, v)| *v == var) {
            Some(existing) => existing.0 += weight,
            None => self.terms.push((weight, var)),
        }
    }

    /// Adds a constant.
    pub fn add_offset(&mut self, value: f64) {
        self.offset += value;
    }

    /// The `(weight, variable)` terms.
    pub fn terms(&self) -> &[(f64, VarId)] {
        &self.terms
    }

    /// The constant part.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Evaluates the sum under a full assignment indexed by variable.
    pub fn evaluate(&self, values: &[i64]) -> f64 {
        self.terms
            .iter()
            .map(|&(w, v)| w * values[v.index()] as f64)
            .sum::<f64>()
            + self.offset
    }

    /// Smallest value the sum can take over the box `[lb, ub]`.
    pub fn lower_bound(&self, lb: &[i64], ub: &[i64]) -> f64 {
        self.terms
            .iter()
            .map(|&(w, v)| {
                let x = if w >= 0.0 { lb[v.index()] } else { ub[v.index()] };
                w * x as f64
            })
            .sum::<f64>()
            + self.offset
    }
}
