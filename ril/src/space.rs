use thiserror::Error;

use crate::affine::Affine;
use crate::index::{new_index, IndexedVec};
use crate::Map;

new_index!(pub index VarId);
new_index!(pub index ScopeId);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Boolean,
    Integer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rel {
    Le,
    Ge,
    Eq,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Var {
    pub scope: ScopeId,
    pub kind: VarKind,
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    pub scope: ScopeId,
    pub terms: Affine,
    pub rel: Rel,
    pub rhs: i64,
}

#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("scope `{name}` already exists under `{parent}`")]
    DuplicateScope { parent: String, name: String },
}

#[derive(Debug)]
struct ScopeData {
    name: String,
    parent: Option<ScopeId>,
    children: Map<String, ScopeId>,
}

/// The hierarchical variable/constraint namespace: a tree of uniquely named
/// scopes, a variable table, and an append-only constraint list.
///
/// Registration order is the only order there is, so whoever compiles into a
/// `Space` gets a deterministic layout to hand to a solver backend.
#[derive(Debug)]
pub struct Space {
    scopes: IndexedVec<ScopeId, ScopeData>,
    vars: IndexedVec<VarId, Var>,
    constraints: Vec<Constraint>,
}

impl Space {
    pub fn new() -> Self {
        let mut scopes = IndexedVec::new();
        scopes.push(ScopeData { name: "root".to_owned(), parent: None, children: Map::default() });
        Self { scopes, vars: IndexedVec::new(), constraints: Vec::new() }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn child_scope(&mut self, parent: ScopeId, name: &str) -> Result<ScopeId, SpaceError> {
        if self.scopes[parent].children.contains_key(name) {
            return Err(SpaceError::DuplicateScope {
                parent: self.path(parent),
                name: name.to_owned(),
            });
        }
        let id = self.scopes.push(ScopeData {
            name: name.to_owned(),
            parent: Some(parent),
            children: Map::default(),
        });
        self.scopes[parent].children.insert(name.to_owned(), id);
        Ok(id)
    }

    pub fn new_var(
        &mut self,
        scope: ScopeId,
        kind: VarKind,
        lower: Option<i64>,
        upper: Option<i64>,
    ) -> VarId {
        // Booleans are integers clamped to [0, 1] no matter what was asked.
        let (lower, upper) = match kind {
            VarKind::Boolean => (Some(0), Some(1)),
            VarKind::Integer => (lower, upper),
        };
        self.vars.push(Var { scope, kind, lower, upper })
    }

    pub fn add_constraint(&mut self, scope: ScopeId, terms: Affine, rel: Rel, rhs: i64) {
        self.constraints.push(Constraint { scope, terms, rel, rhs });
    }

    pub fn var(&self, var: VarId) -> &Var {
        &self.vars[var]
    }

    pub fn vars(&self) -> impl Iterator<Item = (VarId, &Var)> {
        self.vars.enumerate()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Dotted path of a scope, for diagnostics.
    pub fn path(&self, scope: ScopeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(scope);
        while let Some(scope) = current {
            names.push(self.scopes[scope].name.as_str());
            current = self.scopes[scope].parent;
        }
        names.reverse();
        names.join(".")
    }
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}
