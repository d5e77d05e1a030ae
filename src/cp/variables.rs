//! CP variable types and handles.

use serde::{Deserialize, Serialize};

/// Handle of an integer variable inside a [`CpModel`](super::CpModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in the model's variable table.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A boolean variable: an integer variable with domain `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoolVar(pub(crate) VarId);

impl BoolVar {
    /// Underlying integer variable.
    #[inline]
    pub fn var(self) -> VarId {
        self.0
    }

    /// Positive literal of this variable.
    #[inline]
    pub fn lit(self) -> Literal {
        Literal {
            var: self.0,
            negated: false,
        }
    }

    /// Negated literal of this variable.
    #[inline]
    pub fn not(self) -> Literal {
        Literal {
            var: self.0,
            negated: true,
        }
    }
}

/// A possibly negated boolean variable, used as an enforcement condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    pub(crate) var: VarId,
    pub(crate) negated: bool,
}

impl Literal {
    /// Underlying integer variable.
    #[inline]
    pub fn var(self) -> VarId {
        self.var
    }

    /// Whether this literal is the negation of its variable.
    #[inline]
    pub fn is_negated(self) -> bool {
        self.negated
    }

    /// The opposite literal.
    #[inline]
    pub fn negate(self) -> Literal {
        Literal {
            var: self.var,
            negated: !self.negated,
        }
    }

    /// Truth value of the literal under a variable value.
    #[inline]
    pub fn holds_for(self, value: i64) -> bool {
        (value != 0) != self.negated
    }
}

impl From<BoolVar> for Literal {
    fn from(b: BoolVar) -> Self {
        b.lit()
    }
}

/// An integer variable with a domain `[min, max]`.
///
/// Declared bounds only; the solver keeps its own working domains.
#[derive(Debug, Clone)]
pub struct IntVar {
    /// Variable name (for diagnostics).
    pub name: String,
    /// Minimum value.
    pub min: i64,
    /// Maximum value.
    pub max: i64,
}

impl IntVar {
    /// Creates a new integer variable with the given bounds.
    pub fn new(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    /// Creates a variable fixed to a single value.
    pub fn fixed(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, value, value)
    }

    /// Whether this variable is fixed to a single value.
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Domain size (max - min + 1), zero for an empty domain.
    pub fn domain_size(&self) -> i64 {
        (self.max - self.min + 1).max(0)
    }
}

/// Handle of an interval inside a [`CpModel`](super::CpModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalId(pub(crate) usize);

impl IntervalId {
    /// Position of the interval in the model's interval table.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// An interval `[start, start + size)` with a fixed size.
///
/// `end = start + size` holds whenever the interval is present. Optional
/// intervals carry a presence literal; when it is false the interval
/// occupies nothing and its start/end are unconstrained by it.
#[derive(Debug, Clone)]
pub struct IntervalVar {
    /// Interval name.
    pub name: String,
    /// Start time variable.
    pub start: VarId,
    /// End time variable.
    pub end: VarId,
    /// Fixed length.
    pub size: i64,
    /// Presence literal, `None` for mandatory intervals.
    pub presence: Option<Literal>,
}

impl IntervalVar {
    /// Whether this interval is optional.
    pub fn is_optional(&self) -> bool {
        self.presence.is_some()
    }
}
