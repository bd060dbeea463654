pub mod eval;
pub mod expr;

pub use expr::{Expr, ExprKind};

pub type Set<T> = indexmap::IndexSet<T, rustc_hash::FxBuildHasher>;
