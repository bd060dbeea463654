use std::hash::Hash;

use crate::expr::{Expr, Repr};
use crate::Set;

impl<A> Expr<A> {
    /// Replaces every leaf with `f(atom)`, rebuilding bottom-up through the
    /// canonical constructors: a substitution can expose new reductions, so a
    /// structural copy would not stay canonical.
    pub fn bind<B>(self, mut f: impl FnMut(A) -> Expr<B>) -> Expr<B> {
        self.bind_inner(&mut f)
    }

    fn bind_inner<B>(self, f: &mut impl FnMut(A) -> Expr<B>) -> Expr<B> {
        match self.0 {
            Repr::True => Expr::TRUE,
            Repr::False => Expr::FALSE,
            Repr::Pred(a) => f(a),
            Repr::Not(x) => x.bind_inner(f).not(),
            Repr::And(xs) => Expr::and(xs.into_iter().map(|x| x.bind_inner(f))),
            Repr::Or(xs) => Expr::or(xs.into_iter().map(|x| x.bind_inner(f))),
            Repr::Xor(xs) => Expr::xor(xs.into_iter().map(|x| x.bind_inner(f))),
            Repr::Implies(p, q) => p.bind_inner(f).implies(q.bind_inner(f)),
            Repr::Eq(a, b) => a.bind_inner(f).eq(b.bind_inner(f)),
            Repr::SatCount { terms, min_sat, max_sat } => Expr::sat_count(
                terms.into_iter().map(|x| x.bind_inner(f)),
                min_sat as i64,
                max_sat as i64,
            ),
        }
    }

    pub fn map<B>(self, mut f: impl FnMut(A) -> B) -> Expr<B> {
        self.bind(|a| Expr::pred(f(a)))
    }

    /// Partial assignment: leaves for which `f` yields a replacement are
    /// spliced in, the rest stay as predicates.
    pub fn assign(self, mut f: impl FnMut(&A) -> Option<Expr<A>>) -> Expr<A> {
        self.bind(|a| f(&a).unwrap_or_else(|| Expr::pred(a)))
    }

    pub fn evaluate(&self, mut f: impl FnMut(&A) -> bool) -> bool {
        self.eval_inner(&mut f)
    }

    fn eval_inner(&self, f: &mut impl FnMut(&A) -> bool) -> bool {
        match &self.0 {
            Repr::True => true,
            Repr::False => false,
            Repr::Pred(a) => f(a),
            Repr::Not(x) => !x.eval_inner(f),
            Repr::And(xs) => xs.iter().all(|x| x.eval_inner(f)),
            Repr::Or(xs) => xs.iter().any(|x| x.eval_inner(f)),
            Repr::Xor(xs) => xs.iter().fold(false, |parity, x| parity ^ x.eval_inner(f)),
            Repr::Implies(p, q) => !p.eval_inner(f) || q.eval_inner(f),
            Repr::Eq(a, b) => a.eval_inner(f) == b.eval_inner(f),
            Repr::SatCount { terms, min_sat, max_sat } => {
                let count = terms.iter().filter(|x| x.eval_inner(f)).count();
                (*min_sat..=*max_sat).contains(&count)
            }
        }
    }

    pub fn eval_set(&self, trues: &Set<A>) -> bool
    where
        A: Hash + Eq,
    {
        self.evaluate(|a| trues.contains(a))
    }
}
