use crate::affine::Affine;
use crate::space::{Rel, ScopeId, Space, VarKind};

// Both gadgets assume `big_m` strictly exceeds the magnitude the input can
// reach at any feasible point; that bound is the caller's obligation and is
// not checked here.

/// Fresh boolean pinned to the truth value of `w`: at every feasible point
/// `v = 1` iff `w >= 1`. A constant input folds away without auxiliaries.
pub fn clip(space: &mut Space, scope: ScopeId, big_m: i64, w: &Affine) -> Affine {
    if let Some(k) = w.as_constant() {
        return Affine::constant((k >= 1) as i64);
    }
    let v = space.new_var(scope, VarKind::Boolean, None, None);
    // M*v >= w: w >= 1 forces v = 1.
    space.add_constraint(scope, w.clone().plus_term(v, -big_m), Rel::Le, 0);
    // w >= 1 - M*(1 - v): w <= 0 forces v = 0.
    space.add_constraint(scope, w.clone().plus_term(v, -big_m), Rel::Ge, 1 - big_m);
    Affine::var(v)
}

/// Equality-to-zero witness: a fresh boolean `z` with `z = 1` iff `d = 0` at
/// every feasible point, built from two sign indicators.
///
/// Cost: the output, two auxiliaries, five constraints.
pub fn is_zero(space: &mut Space, scope: ScopeId, big_m: i64, d: &Affine) -> Affine {
    if let Some(k) = d.as_constant() {
        return Affine::constant((k == 0) as i64);
    }
    let neg = space.new_var(scope, VarKind::Boolean, None, None);
    let pos = space.new_var(scope, VarKind::Boolean, None, None);
    let z = space.new_var(scope, VarKind::Boolean, None, None);
    // -M*neg <= d: d < 0 forces neg = 1.
    space.add_constraint(scope, d.clone().plus_term(neg, big_m), Rel::Ge, 0);
    // M*(1 - neg) - 1 >= d: d >= 0 forces neg = 0.
    space.add_constraint(scope, d.clone().plus_term(neg, big_m), Rel::Le, big_m - 1);
    // M*pos >= d: d > 0 forces pos = 1.
    space.add_constraint(scope, d.clone().plus_term(pos, -big_m), Rel::Le, 0);
    // -M*(1 - pos) + 1 <= d: d <= 0 forces pos = 0.
    space.add_constraint(scope, d.clone().plus_term(pos, -big_m), Rel::Ge, 1 - big_m);
    // z = 1 - neg - pos.
    space.add_constraint(
        scope,
        Affine::var(z).plus_term(neg, 1).plus_term(pos, 1),
        Rel::Eq,
        1,
    );
    Affine::var(z)
}
