use itertools::Itertools;

use logic::Expr;

use crate::affine::Affine;
use crate::compile::{compile, CompileError, Ctx};
use crate::gadget::{clip, is_zero};
use crate::space::{Rel, Space, VarId, VarKind};
use crate::Map;

const M: i64 = 1 << 10;

fn p(name: &str) -> Expr<&str> {
    Expr::pred(name)
}

fn satisfies(space: &Space, assignment: &Map<VarId, i64>) -> bool {
    let bounds_ok = space.vars().all(|(v, var)| {
        let value = assignment[&v];
        var.lower.map_or(true, |lo| value >= lo) && var.upper.map_or(true, |hi| value <= hi)
    });
    bounds_ok
        && space.constraints().iter().all(|c| {
            let lhs = c.terms.eval(|v| assignment[&v]);
            match c.rel {
                Rel::Le => lhs <= c.rhs,
                Rel::Ge => lhs >= c.rhs,
                Rel::Eq => lhs == c.rhs,
            }
        })
}

// Witness values over every feasible completion of the unpinned variables,
// which must all be boolean so they can be enumerated.
fn feasible_values(space: &Space, witness: &Affine, pinned: &Map<VarId, i64>) -> Vec<i64> {
    let free = space
        .vars()
        .filter(|(v, _)| !pinned.contains_key(v))
        .map(|(v, var)| {
            assert_eq!(var.kind, VarKind::Boolean, "free variables must be enumerable");
            v
        })
        .collect::<Vec<_>>();

    let mut values = Vec::new();
    for bits in 0..1u32 << free.len() {
        let mut assignment = pinned.clone();
        for (i, &v) in free.iter().enumerate() {
            assignment.insert(v, (bits >> i & 1) as i64);
        }
        if satisfies(space, &assignment) {
            values.push(witness.eval(|v| assignment[&v]));
        }
    }
    values
}

fn compile_over<'a>(
    space: &mut Space,
    expr: &Expr<&str>,
    atoms: &[&'a str],
) -> (Map<&'a str, VarId>, Affine) {
    let root = space.root();
    let leaf_vars: Map<&str, VarId> =
        atoms.iter().map(|&a| (a, space.new_var(root, VarKind::Boolean, None, None))).collect();
    let mut ctx = Ctx { space, scope: root, big_m: M };
    let witness = compile(expr, &mut ctx, &mut |atom: &&str, _: &mut Ctx<'_>| {
        Ok(Affine::var(leaf_vars[atom]))
    })
    .unwrap();
    (leaf_vars, witness)
}

// For every leaf assignment, every feasible completion of the auxiliaries
// must put the witness on the side total evaluation predicts.
fn check_threshold(expr: &Expr<&str>, atoms: &[&str]) {
    let mut space = Space::new();
    let (leaf_vars, witness) = compile_over(&mut space, expr, atoms);

    for bits in atoms.iter().map(|_| [false, true]).multi_cartesian_product() {
        let pinned: Map<VarId, i64> =
            std::iter::zip(atoms, &bits).map(|(&a, &b)| (leaf_vars[a], b as i64)).collect();
        let values: Map<&str, bool> = std::iter::zip(atoms, &bits).map(|(&a, &b)| (a, b)).collect();
        let expected = expr.evaluate(|a| values[a]);

        let witnessed = feasible_values(&space, &witness, &pinned);
        assert!(!witnessed.is_empty(), "no feasible completion for {expr:?} under {values:?}");
        for value in witnessed {
            assert_eq!(
                value >= 1,
                expected,
                "witness {value} disagrees with {expr:?} under {values:?}"
            );
        }
    }
}

#[test]
fn threshold_contract() {
    let cases = vec![
        Expr::TRUE,
        Expr::FALSE,
        p("a"),
        p("a").not(),
        Expr::and([p("a"), p("b")]),
        Expr::and([p("a"), p("b"), p("c")]),
        Expr::or([p("a"), p("b")]),
        Expr::or([p("a"), p("b"), p("c")]),
        Expr::xor([p("a"), p("b")]),
        Expr::xor([p("a"), p("b"), p("c")]),
        p("a").implies(p("b")),
        p("a").eq(p("b")),
        Expr::sat_count([p("a"), p("b"), p("c")], 2, 2),
        Expr::sat_count([p("a"), p("b"), p("c")], 0, 1),
        Expr::sat_count([p("a"), p("b"), p("c")], 2, 3),
    ];
    for expr in &cases {
        check_threshold(expr, &["a", "b", "c"]);
    }
}

#[test]
fn threshold_contract_through_negation() {
    // Witnesses are read from both sides once `not` is involved, so the
    // encodings must stay exact either way.
    let cases = vec![
        Expr::and([p("a"), p("b")]).not(),
        Expr::or([p("a").not(), p("b")]).not(),
        Expr::xor([Expr::and([p("a"), p("b")]), p("c")]),
        p("a").implies(p("b")).eq(p("c")),
        Expr::sat_count([p("a"), p("b"), p("c")], 2, 2).not(),
    ];
    for expr in &cases {
        check_threshold(expr, &["a", "b", "c"]);
    }
}

#[test]
fn is_zero_tracks_the_sign_over_the_bound_range() {
    let m = 8;
    for d in -(m - 1)..m {
        let mut space = Space::new();
        let root = space.root();
        let x = space.new_var(root, VarKind::Integer, Some(-(m - 1)), Some(m - 1));
        let witness = is_zero(&mut space, root, m, &Affine::var(x));
        let pinned: Map<VarId, i64> = [(x, d)].into_iter().collect();
        // The sign indicators are forced, so exactly one completion remains.
        assert_eq!(feasible_values(&space, &witness, &pinned), [(d == 0) as i64], "d = {d}");
    }
}

#[test]
fn is_zero_cost() {
    let mut space = Space::new();
    let root = space.root();
    let x = space.new_var(root, VarKind::Integer, None, None);
    let _ = is_zero(&mut space, root, M, &Affine::var(x));
    // One output, two sign indicators, five rows.
    assert_eq!(space.vars().count(), 4);
    assert_eq!(space.constraints().len(), 5);
}

#[test]
fn clip_pins_the_indicator() {
    for w in [-5, -1, 0, 1, 2, 6] {
        let mut space = Space::new();
        let root = space.root();
        let x = space.new_var(root, VarKind::Integer, Some(-7), Some(7));
        let v = clip(&mut space, root, 8, &Affine::var(x));
        let pinned: Map<VarId, i64> = [(x, w)].into_iter().collect();
        assert_eq!(feasible_values(&space, &v, &pinned), [(w >= 1) as i64], "w = {w}");
    }
}

#[test]
fn constant_inputs_cost_nothing() {
    let mut space = Space::new();
    let root = space.root();
    assert_eq!(clip(&mut space, root, M, &Affine::constant(3)).as_constant(), Some(1));
    assert_eq!(clip(&mut space, root, M, &Affine::constant(0)).as_constant(), Some(0));
    assert_eq!(is_zero(&mut space, root, M, &Affine::constant(0)).as_constant(), Some(1));
    assert_eq!(is_zero(&mut space, root, M, &Affine::constant(-2)).as_constant(), Some(0));
    assert_eq!(space.vars().count(), 0);
    assert!(space.constraints().is_empty());
}

#[test]
fn general_forms_spend_one_clip_per_child() {
    let mut space = Space::new();
    compile_over(&mut space, &Expr::and([p("a"), p("b"), p("c")]), &["a", "b", "c"]);
    // 3 leaves + 3 clips of a boolean and two rows each.
    assert_eq!(space.vars().count(), 6);
    assert_eq!(space.constraints().len(), 6);

    let mut space = Space::new();
    compile_over(&mut space, &Expr::or([p("a"), p("b")]), &["a", "b"]);
    assert_eq!(space.vars().count(), 4);
    assert_eq!(space.constraints().len(), 4);

    // Negation is free.
    let mut space = Space::new();
    compile_over(&mut space, &Expr::and([p("a"), p("b")]).not(), &["a", "b"]);
    assert_eq!(space.vars().count(), 4);
    assert_eq!(space.constraints().len(), 4);
}

#[test]
fn xor_fold_cost() {
    let mut space = Space::new();
    compile_over(&mut space, &Expr::xor([p("a"), p("b"), p("c")]), &["a", "b", "c"]);
    // 3 leaves + 3 clips + 2 equality gadgets of 3 booleans and 5 rows each.
    assert_eq!(space.vars().count(), 12);
    assert_eq!(space.constraints().len(), 16);
}

#[test]
fn trivial_threshold_sides_drop_out() {
    // "At most 1 of 3": the lower side is decided, only the upper side pays.
    let mut space = Space::new();
    let expr = Expr::sat_count([p("a"), p("b"), p("c")], 0, 1);
    compile_over(&mut space, &expr, &["a", "b", "c"]);
    assert_eq!(space.vars().count(), 6);
    assert_eq!(space.constraints().len(), 6);
}

#[test]
fn repeated_compilations_never_share_auxiliaries() {
    let mut space = Space::new();
    let root = space.root();
    let a = space.new_var(root, VarKind::Boolean, None, None);
    let b = space.new_var(root, VarKind::Boolean, None, None);
    let vars: Map<&str, VarId> = [("a", a), ("b", b)].into_iter().collect();

    let expr = Expr::and([p("a"), p("b")]);
    let mut ctx = Ctx { space: &mut space, scope: root, big_m: M };
    let mut leaf = |atom: &&str, _: &mut Ctx<'_>| Ok(Affine::var(vars[atom]));
    let w1 = compile(&expr, &mut ctx, &mut leaf).unwrap();
    let w2 = compile(&expr, &mut ctx, &mut leaf).unwrap();

    // Same tree, same scope, but fresh clips on each pass.
    assert_ne!(w1, w2);
    assert_eq!(space.vars().count(), 6);
}

#[test]
fn compilation_is_deterministic() {
    let expr = Expr::xor([
        Expr::and([p("a"), p("b")]),
        Expr::sat_count([p("a"), p("b"), p("c")], 0, 1),
    ]);
    let run = || {
        let mut space = Space::new();
        let (_, witness) = compile_over(&mut space, &expr, &["a", "b", "c"]);
        (space, witness)
    };
    let (s1, w1) = run();
    let (s2, w2) = run();
    assert_eq!(w1, w2);
    assert_eq!(s1.constraints(), s2.constraints());
    assert_eq!(s1.vars().collect::<Vec<_>>(), s2.vars().collect::<Vec<_>>());
}

#[test]
fn pinning_the_witness_enforces_the_expression() {
    let mut space = Space::new();
    let expr = Expr::xor([p("a"), p("b")]);
    let (leaf_vars, witness) = compile_over(&mut space, &expr, &["a", "b"]);
    let root = space.root();
    space.add_constraint(root, witness, Rel::Ge, 1);

    // Encode each surviving (a, b) pair as a + 2b.
    let (a, b) = (leaf_vars["a"], leaf_vars["b"]);
    let mut solutions = feasible_values(&space, &Affine::var(a).plus_term(b, 2), &Map::default());
    solutions.sort_unstable();
    solutions.dedup();
    assert_eq!(solutions, [1, 2]);
}

#[test]
fn leaf_witnesses_need_not_be_unit() {
    // Leaves may compile to arbitrary affine forms; 2x - 1 is true iff x = 1.
    let mut space = Space::new();
    let root = space.root();
    let x = space.new_var(root, VarKind::Boolean, None, None);
    let y = space.new_var(root, VarKind::Boolean, None, None);
    let vars: Map<&str, VarId> = [("a", x), ("b", y)].into_iter().collect();

    let expr = Expr::and([p("a"), p("b")]);
    let mut ctx = Ctx { space: &mut space, scope: root, big_m: M };
    let witness = compile(&expr, &mut ctx, &mut |atom: &&str, _: &mut Ctx<'_>| {
        Ok(Affine::term(vars[atom], 2).offset(-1))
    })
    .unwrap();

    for (va, vb) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        let pinned: Map<VarId, i64> = [(x, va), (y, vb)].into_iter().collect();
        let witnessed = feasible_values(&space, &witness, &pinned);
        assert!(!witnessed.is_empty());
        for value in witnessed {
            assert_eq!(value >= 1, va == 1 && vb == 1);
        }
    }
}

#[test]
fn unbound_atoms_are_fatal() {
    let mut space = Space::new();
    let root = space.root();
    let mut ctx = Ctx { space: &mut space, scope: root, big_m: M };
    let expr = Expr::and([p("a"), p("missing")]);
    let err = compile(&expr, &mut ctx, &mut |atom: &&str, ctx: &mut Ctx<'_>| {
        if *atom == "a" {
            Ok(Affine::var(ctx.space.new_var(ctx.scope, VarKind::Boolean, None, None)))
        } else {
            Err(CompileError::UnboundAtom((*atom).to_owned()))
        }
    })
    .unwrap_err();
    assert!(matches!(err, CompileError::UnboundAtom(atom) if atom == "missing"));
}

#[test]
fn leaf_scope_collisions_propagate() {
    // A leaf compiler claiming a scope per atom trips over the repeated atom,
    // since repeated subtrees are not deduplicated.
    let mut space = Space::new();
    let root = space.root();
    let mut ctx = Ctx { space: &mut space, scope: root, big_m: M };
    let expr = Expr::and([p("x"), p("x")]);
    let err = compile(&expr, &mut ctx, &mut |atom: &&str, ctx: &mut Ctx<'_>| {
        let scope = ctx.space.child_scope(ctx.scope, atom)?;
        Ok(Affine::var(ctx.space.new_var(scope, VarKind::Boolean, None, None)))
    })
    .unwrap_err();
    assert!(matches!(err, CompileError::Space(_)));
}
