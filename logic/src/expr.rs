use std::fmt;

// Values are only ever built by the constructors below, which keep them fully
// reduced: `And`/`Or`/`Xor` are flat and constant-free, `Not` never stacks,
// `SatCount` bounds are tight and non-trivial.
#[derive(Clone, Debug)]
pub(crate) enum Repr<A> {
    True,
    False,
    Pred(A),
    Not(Box<Expr<A>>),
    And(Vec<Expr<A>>),
    Or(Vec<Expr<A>>),
    Xor(Vec<Expr<A>>),
    Implies(Box<Expr<A>>, Box<Expr<A>>),
    Eq(Box<Expr<A>>, Box<Expr<A>>),
    SatCount { terms: Vec<Expr<A>>, min_sat: usize, max_sat: usize },
}

/// A boolean expression over atoms of type `A`, canonical by construction.
///
/// Implements neither `PartialEq` nor `Hash`: structural identity is not
/// logical equivalence, so the naive capability is absent on purpose. Use
/// [`Expr::approx_eq`] for the explicit structural check and
/// [`Expr::is_true`]/[`Expr::is_false`] for the constants.
#[derive(Clone)]
pub struct Expr<A>(pub(crate) Repr<A>);

/// Borrowed view of an expression node, for consumers outside this crate.
#[derive(Clone, Copy, Debug)]
pub enum ExprKind<'a, A> {
    True,
    False,
    Pred(&'a A),
    Not(&'a Expr<A>),
    And(&'a [Expr<A>]),
    Or(&'a [Expr<A>]),
    Xor(&'a [Expr<A>]),
    Implies(&'a Expr<A>, &'a Expr<A>),
    Eq(&'a Expr<A>, &'a Expr<A>),
    SatCount { terms: &'a [Expr<A>], min_sat: usize, max_sat: usize },
}

impl<A> Expr<A> {
    pub const TRUE: Self = Expr(Repr::True);
    pub const FALSE: Self = Expr(Repr::False);

    pub fn pred(atom: A) -> Self {
        Expr(Repr::Pred(atom))
    }

    pub fn is_true(&self) -> bool {
        matches!(self.0, Repr::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self.0, Repr::False)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.0 {
            Repr::True => Some(true),
            Repr::False => Some(false),
            _ => None,
        }
    }

    pub fn kind(&self) -> ExprKind<'_, A> {
        match &self.0 {
            Repr::True => ExprKind::True,
            Repr::False => ExprKind::False,
            Repr::Pred(a) => ExprKind::Pred(a),
            Repr::Not(x) => ExprKind::Not(x),
            Repr::And(xs) => ExprKind::And(xs),
            Repr::Or(xs) => ExprKind::Or(xs),
            Repr::Xor(xs) => ExprKind::Xor(xs),
            Repr::Implies(p, q) => ExprKind::Implies(p, q),
            Repr::Eq(a, b) => ExprKind::Eq(a, b),
            Repr::SatCount { terms, min_sat, max_sat } => {
                ExprKind::SatCount { terms, min_sat: *min_sat, max_sat: *max_sat }
            }
        }
    }

    pub fn not(self) -> Self {
        match self.0 {
            Repr::True => Self::FALSE,
            Repr::False => Self::TRUE,
            Repr::Not(x) => *x,
            repr => Expr(Repr::Not(Box::new(Expr(repr)))),
        }
    }

    pub fn and(xs: impl IntoIterator<Item = Self>) -> Self {
        let mut out = Vec::new();
        for x in xs {
            match x.0 {
                Repr::True => {}
                Repr::False => return Self::FALSE,
                // Children of a canonical `And` are never `And` themselves,
                // so one level of splicing keeps the result flat.
                Repr::And(children) => out.extend(children),
                repr => out.push(Expr(repr)),
            }
        }
        match out.len() {
            0 => Self::TRUE,
            1 => out.pop().unwrap(),
            _ => Expr(Repr::And(out)),
        }
    }

    pub fn or(xs: impl IntoIterator<Item = Self>) -> Self {
        let mut out = Vec::new();
        for x in xs {
            match x.0 {
                Repr::False => {}
                Repr::True => return Self::TRUE,
                Repr::Or(children) => out.extend(children),
                repr => out.push(Expr(repr)),
            }
        }
        match out.len() {
            0 => Self::FALSE,
            1 => out.pop().unwrap(),
            _ => Expr(Repr::Or(out)),
        }
    }

    pub fn xor(xs: impl IntoIterator<Item = Self>) -> Self {
        let mut parity = false;
        let mut out = Vec::new();
        for x in xs {
            match x.0 {
                Repr::True => parity = !parity,
                Repr::False => {}
                Repr::Xor(children) => out.extend(children),
                repr => out.push(Expr(repr)),
            }
        }
        let expr = match out.len() {
            0 => return if parity { Self::TRUE } else { Self::FALSE },
            1 => out.pop().unwrap(),
            _ => Expr(Repr::Xor(out)),
        };
        if parity {
            expr.not()
        } else {
            expr
        }
    }

    pub fn implies(self, consequent: Self) -> Self {
        match (self.0, consequent.0) {
            (Repr::False, _) | (_, Repr::True) => Self::TRUE,
            (Repr::True, q) => Expr(q),
            (p, Repr::False) => Expr(p).not(),
            (p, q) => Expr(Repr::Implies(Box::new(Expr(p)), Box::new(Expr(q)))),
        }
    }

    pub fn eq(self, other: Self) -> Self {
        match (self.0, other.0) {
            (Repr::True, b) => Expr(b),
            (Repr::False, b) => Expr(b).not(),
            (a, Repr::True) => Expr(a),
            (a, Repr::False) => Expr(a).not(),
            (a, b) => Expr(Repr::Eq(Box::new(Expr(a)), Box::new(Expr(b)))),
        }
    }

    pub fn sat_count(xs: impl IntoIterator<Item = Self>, min_sat: i64, max_sat: i64) -> Self {
        let xs = xs.into_iter().collect::<Vec<_>>();
        let mut min = min_sat.max(0);
        let mut max = max_sat.min(xs.len() as i64);
        if min > max {
            return Self::FALSE;
        }

        // Fold constant terms into the bounds: a `True` satisfies one slot on
        // both sides, a `False` can never count.
        let mut terms = Vec::new();
        for x in xs {
            match x.0 {
                Repr::True => {
                    min -= 1;
                    max -= 1;
                    if max < 0 {
                        return Self::FALSE;
                    }
                }
                Repr::False => {}
                repr => terms.push(Expr(repr)),
            }
        }

        let n = terms.len() as i64;
        let min = min.max(0);
        let max = max.min(n);
        match () {
            _ if min > max => Self::FALSE,
            _ if min <= 0 && max >= n => Self::TRUE,
            _ if min == n => Self::and(terms),
            _ if min == 1 && max == n => Self::or(terms),
            _ => Self::sat_count_node(terms, min as usize, max as usize),
        }
    }

    // Direct node construction; bounds must already be tight.
    fn sat_count_node(terms: Vec<Self>, min_sat: usize, max_sat: usize) -> Self {
        assert!(min_sat <= max_sat && max_sat <= terms.len());
        Expr(Repr::SatCount { terms, min_sat, max_sat })
    }
}

impl<A> From<bool> for Expr<A> {
    fn from(value: bool) -> Self {
        if value {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }
}

impl<A: PartialEq> Expr<A> {
    /// Structural comparison: sufficient but not necessary for logical
    /// equivalence (`and(a, b)` and `and(b, a)` compare unequal).
    pub fn approx_eq(&self, other: &Self) -> bool {
        use Repr::*;
        match (&self.0, &other.0) {
            (True, True) | (False, False) => true,
            (Pred(a), Pred(b)) => a == b,
            (Not(x), Not(y)) => x.approx_eq(y),
            (And(xs), And(ys)) | (Or(xs), Or(ys)) | (Xor(xs), Xor(ys)) => all_approx_eq(xs, ys),
            (Implies(p1, q1), Implies(p2, q2)) | (Eq(p1, q1), Eq(p2, q2)) => {
                p1.approx_eq(p2) && q1.approx_eq(q2)
            }
            (
                SatCount { terms: xs, min_sat: min1, max_sat: max1 },
                SatCount { terms: ys, min_sat: min2, max_sat: max2 },
            ) => min1 == min2 && max1 == max2 && all_approx_eq(xs, ys),
            _ => false,
        }
    }
}

fn all_approx_eq<A: PartialEq>(xs: &[Expr<A>], ys: &[Expr<A>]) -> bool {
    xs.len() == ys.len() && std::iter::zip(xs, ys).all(|(x, y)| x.approx_eq(y))
}

impl<A: fmt::Debug> fmt::Debug for Expr<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
