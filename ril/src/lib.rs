pub mod affine;
pub mod compile;
pub mod gadget;
pub mod index;
pub mod space;

#[cfg(test)]
mod test;

pub use affine::Affine;
pub use compile::{compile, CompileError, Ctx};
pub use space::{Rel, ScopeId, Space, SpaceError, Var, VarId, VarKind};

pub type Map<K, V> = rustc_hash::FxHashMap<K, V>;
