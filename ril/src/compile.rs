use either::Either;
use thiserror::Error;

use logic::{Expr, ExprKind};

use crate::affine::Affine;
use crate::gadget;
use crate::space::{ScopeId, Space, SpaceError};

#[derive(Debug, Error)]
pub enum CompileError {
    /// A leaf the caller's compiler cannot resolve: a missing integration,
    /// fatal and never retried.
    #[error("no leaf encoding for atom `{0}`")]
    UnboundAtom(String),
    #[error(transparent)]
    Space(#[from] SpaceError),
}

/// Everything a compilation needs from the outside: the namespace, the scope
/// owning this invocation's auxiliaries, and the ambient big-M bound.
pub struct Ctx<'s> {
    pub space: &'s mut Space,
    pub scope: ScopeId,
    pub big_m: i64,
}

impl Ctx<'_> {
    fn clip(&mut self, w: &Affine) -> Affine {
        gadget::clip(self.space, self.scope, self.big_m, w)
    }

    fn is_zero(&mut self, d: &Affine) -> Affine {
        gadget::is_zero(self.space, self.scope, self.big_m, d)
    }
}

/// Compiles `expr` to a witness: an affine expression that, at every feasible
/// point, is `>= 1` iff the expression holds and `<= 0` iff it does not.
///
/// Auxiliaries and constraints are registered in `ctx.scope` in depth-first,
/// left-to-right order. Nothing is memoized: compiling a subtree twice (as
/// `Eq` does with each operand) allocates independent auxiliaries.
pub fn compile<A, F>(
    expr: &Expr<A>,
    ctx: &mut Ctx<'_>,
    leaf: &mut F,
) -> Result<Affine, CompileError>
where
    F: FnMut(&A, &mut Ctx<'_>) -> Result<Affine, CompileError>,
{
    match expr.kind() {
        ExprKind::True => Ok(Affine::constant(1)),
        ExprKind::False => Ok(Affine::constant(0)),
        ExprKind::Pred(atom) => leaf(atom, ctx),
        ExprKind::Not(x) => Ok(Affine::constant(1).sub(compile(x, ctx, leaf)?)),
        ExprKind::And(xs) => {
            let ws = compile_all(xs, ctx, leaf)?;
            Ok(conj(ws, ctx))
        }
        ExprKind::Or(xs) => {
            let ws = compile_all(xs, ctx, leaf)?;
            Ok(disj(ws, ctx))
        }
        ExprKind::Xor(xs) => match xs {
            [] => Ok(Affine::constant(0)),
            [x] => compile(x, ctx, leaf),
            [first, rest @ ..] => {
                // Parity fold of the binary rule: the accumulator and each
                // clipped child are exact booleans, so EQZ(acc + v - 1) is
                // their xor.
                let w = compile(first, ctx, leaf)?;
                let mut acc = ctx.clip(&w);
                for x in rest {
                    let w = compile(x, ctx, leaf)?;
                    let v = ctx.clip(&w);
                    acc = ctx.is_zero(&acc.add(v).offset(-1));
                }
                Ok(acc)
            }
        },
        ExprKind::Implies(p, q) => implication(p, q, ctx, leaf),
        ExprKind::Eq(a, b) => {
            // and(implies(a, b), implies(b, a)), each side compiled afresh.
            let forward = implication(a, b, ctx, leaf)?;
            let backward = implication(b, a, ctx, leaf)?;
            Ok(conj(vec![forward, backward], ctx))
        }
        ExprKind::SatCount { terms, min_sat, max_sat } => {
            let lo = min_part(terms, min_sat, ctx, leaf)?;
            let hi = max_part(terms, max_sat, ctx, leaf)?;
            Ok(match (lo, hi) {
                (Either::Left(false), _) | (_, Either::Left(false)) => Affine::constant(0),
                (Either::Left(true), Either::Left(true)) => Affine::constant(1),
                (Either::Left(true), Either::Right(w)) => w,
                (Either::Right(w), Either::Left(true)) => w,
                (Either::Right(lo), Either::Right(hi)) => conj(vec![lo, hi], ctx),
            })
        }
    }
}

fn compile_all<A, F>(
    xs: &[Expr<A>],
    ctx: &mut Ctx<'_>,
    leaf: &mut F,
) -> Result<Vec<Affine>, CompileError>
where
    F: FnMut(&A, &mut Ctx<'_>) -> Result<Affine, CompileError>,
{
    xs.iter().map(|x| compile(x, ctx, leaf)).collect()
}

// Conjunction over already-compiled witnesses. Arity 0/1 costs nothing; the
// general form clips every operand and thresholds the sum against n.
fn conj(ws: Vec<Affine>, ctx: &mut Ctx<'_>) -> Affine {
    match ws.len() {
        0 => Affine::constant(1),
        1 => ws.into_iter().next().unwrap(),
        n => {
            let mut sum = Affine::constant(1 - n as i64);
            for w in &ws {
                sum = sum.add(ctx.clip(w));
            }
            sum
        }
    }
}

// Disjunction over already-compiled witnesses: the sum of the clipped
// operands is already thresholded at 1.
fn disj(ws: Vec<Affine>, ctx: &mut Ctx<'_>) -> Affine {
    match ws.len() {
        0 => Affine::constant(0),
        1 => ws.into_iter().next().unwrap(),
        _ => {
            let mut sum = Affine::constant(0);
            for w in &ws {
                sum = sum.add(ctx.clip(w));
            }
            sum
        }
    }
}

fn implication<A, F>(
    p: &Expr<A>,
    q: &Expr<A>,
    ctx: &mut Ctx<'_>,
    leaf: &mut F,
) -> Result<Affine, CompileError>
where
    F: FnMut(&A, &mut Ctx<'_>) -> Result<Affine, CompileError>,
{
    let not_p = Affine::constant(1).sub(compile(p, ctx, leaf)?);
    let wq = compile(q, ctx, leaf)?;
    Ok(disj(vec![not_p, wq], ctx))
}

// "At least k of terms". `Left` marks a trivially decided threshold.
fn min_part<A, F>(
    terms: &[Expr<A>],
    k: usize,
    ctx: &mut Ctx<'_>,
    leaf: &mut F,
) -> Result<Either<bool, Affine>, CompileError>
where
    F: FnMut(&A, &mut Ctx<'_>) -> Result<Affine, CompileError>,
{
    let n = terms.len();
    Ok(match k {
        0 => Either::Left(true),
        _ if k > n => Either::Left(false),
        _ if k == n => {
            let ws = compile_all(terms, ctx, leaf)?;
            Either::Right(conj(ws, ctx))
        }
        1 => {
            let ws = compile_all(terms, ctx, leaf)?;
            Either::Right(disj(ws, ctx))
        }
        _ => {
            // 1 - k + sum of clipped children.
            let mut sum = Affine::constant(1 - k as i64);
            for x in terms {
                let w = compile(x, ctx, leaf)?;
                sum = sum.add(ctx.clip(&w));
            }
            Either::Right(sum)
        }
    })
}

// "At most k of terms".
fn max_part<A, F>(
    terms: &[Expr<A>],
    k: usize,
    ctx: &mut Ctx<'_>,
    leaf: &mut F,
) -> Result<Either<bool, Affine>, CompileError>
where
    F: FnMut(&A, &mut Ctx<'_>) -> Result<Affine, CompileError>,
{
    Ok(if k >= terms.len() {
        Either::Left(true)
    } else {
        // 1 + k - sum of clipped children.
        let mut sum = Affine::constant(1 + k as i64);
        for x in terms {
            let w = compile(x, ctx, leaf)?;
            sum = sum.sub(ctx.clip(&w));
        }
        Either::Right(sum)
    })
}
