use derive_more::derive::From;
use derive_visitor::{Drive, DriveMut};
use serde::{Deserialize, Serialize};

use super::class_or_object::ClassOrObjKey;
use super::expr::Expr;
use super::node::Node;

/// Binding targets of declarators, parameters and catch clauses.
#[derive(Clone, Debug, Drive, DriveMut, From, Serialize, Deserialize)]
#[serde(tag = "$t")]
pub enum Pat {
  Arr(Node<ArrPat>),
  Id(Node<IdPat>),
  Obj(Node<ObjPat>),
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ArrPatElem {
  pub target: Node<Pat>,
  pub default_value: Option<Node<Expr>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ArrPat {
  // None is a hole, e.g. `[, b]`.
  pub elements: Vec<Option<ArrPatElem>>,
  pub rest: Option<Node<Pat>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct IdPat {
  #[drive(skip)]
  pub name: String,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ObjPatProp {
  pub key: ClassOrObjKey,
  pub target: Node<Pat>,
  // `{a}` rather than `{a: a}`; only valid when the key is direct and the target is an identifier with that name.
  #[drive(skip)]
  pub shorthand: bool,
  pub default_value: Option<Node<Expr>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ObjPat {
  pub properties: Vec<Node<ObjPatProp>>,
  pub rest: Option<Node<IdPat>>,
}

impl Pat {
  /// Every identifier this pattern binds, in source order.
  pub fn bound_names(&self) -> Vec<String> {
    let mut names = Vec::new();
    self.collect_bound_names(&mut names);
    names
  }

  fn collect_bound_names(&self, out: &mut Vec<String>) {
    match self {
      Pat::Id(n) => out.push(n.stx.name.clone()),
      Pat::Arr(n) => {
        for elem in n.stx.elements.iter().flatten() {
          elem.target.stx.collect_bound_names(out);
        }
        if let Some(rest) = &n.stx.rest {
          rest.stx.collect_bound_names(out);
        }
      }
      Pat::Obj(n) => {
        for prop in n.stx.properties.iter() {
          prop.stx.target.stx.collect_bound_names(out);
        }
        if let Some(rest) = &n.stx.rest {
          out.push(rest.stx.name.clone());
        }
      }
    }
  }

  /// The identifier name if this is a plain binding.
  pub fn as_id(&self) -> Option<&str> {
    match self {
      Pat::Id(n) => Some(&n.stx.name),
      _ => None,
    }
  }
}

impl Node<Pat> {
  /// Reuses the pattern as the left side of an assignment, e.g. when a declarator is hoisted.
  pub fn into_assign_target(self) -> Node<Expr> {
    let id = self.id;
    let expr = match *self.stx {
      Pat::Id(n) => Expr::Id(n.map_stx(|p| super::expr::IdExpr { name: p.name })),
      Pat::Arr(n) => Expr::ArrPat(n),
      Pat::Obj(n) => Expr::ObjPat(n),
    };
    Node {
      id,
      stx: Box::new(expr),
    }
  }
}
