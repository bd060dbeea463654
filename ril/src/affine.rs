use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::space::VarId;

/// An affine integer expression: a sum of variable terms plus a constant.
///
/// Term order is insertion order, so a compilation pass always hands the
/// backend the same sequence for the same input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Affine {
    terms: IndexMap<VarId, i64, FxBuildHasher>,
    constant: i64,
}

impl Affine {
    pub fn constant(value: i64) -> Self {
        Self { terms: IndexMap::default(), constant: value }
    }

    pub fn var(var: VarId) -> Self {
        Self::term(var, 1)
    }

    pub fn term(var: VarId, coeff: i64) -> Self {
        Self::constant(0).plus_term(var, coeff)
    }

    pub fn offset(mut self, value: i64) -> Self {
        self.constant += value;
        self
    }

    pub fn plus_term(mut self, var: VarId, coeff: i64) -> Self {
        let total = {
            let entry = self.terms.entry(var).or_insert(0);
            *entry += coeff;
            *entry
        };
        // Cancelled terms are dropped so constants are recognizable as such.
        if total == 0 {
            self.terms.shift_remove(&var);
        }
        self
    }

    pub fn add(mut self, other: Self) -> Self {
        self.constant += other.constant;
        for (var, coeff) in other.terms {
            self = self.plus_term(var, coeff);
        }
        self
    }

    pub fn sub(mut self, other: Self) -> Self {
        self.constant -= other.constant;
        for (var, coeff) in other.terms {
            self = self.plus_term(var, -coeff);
        }
        self
    }

    pub fn as_constant(&self) -> Option<i64> {
        self.terms.is_empty().then_some(self.constant)
    }

    pub fn constant_part(&self) -> i64 {
        self.constant
    }

    pub fn terms(&self) -> impl Iterator<Item = (VarId, i64)> + '_ {
        self.terms.iter().map(|(&var, &coeff)| (var, coeff))
    }

    pub fn eval(&self, mut value_of: impl FnMut(VarId) -> i64) -> i64 {
        self.constant + self.terms.iter().map(|(&var, &coeff)| coeff * value_of(var)).sum::<i64>()
    }
}
