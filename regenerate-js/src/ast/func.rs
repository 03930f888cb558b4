use derive_more::derive::From;
use derive_visitor::{Drive, DriveMut};
use serde::{Deserialize, Serialize};

use super::expr::Expr;
use super::node::Node;
use super::pat::Pat;
use super::stmt::Stmt;

// One type for function declarations, function expressions and arrow functions, so the transform only has one shape to rewrite.
#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct Func {
  #[drive(skip)]
  pub arrow: bool,
  #[drive(skip)]
  pub async_: bool,
  #[drive(skip)]
  pub generator: bool,
  pub parameters: Vec<Node<ParamDecl>>,
  pub body: FuncBody,
}

#[derive(Clone, Debug, Drive, DriveMut, From, Serialize, Deserialize)]
pub enum FuncBody {
  Block(Vec<Node<Stmt>>),
  // If arrow function.
  Expression(Node<Expr>),
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ParamDecl {
  #[drive(skip)]
  pub rest: bool,
  pub pattern: Node<Pat>,
  pub default_value: Option<Node<Expr>>,
}
