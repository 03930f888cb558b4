use derive_more::derive::From;
use derive_visitor::{Drive, DriveMut};
use serde::{Deserialize, Serialize};

use crate::operator::OperatorName;

use super::class_or_object::{ClassMember, ObjMember};
use super::func::Func;
use super::node::Node;
use super::pat::{ArrPat, ObjPat};

// Each variant wraps a Node<T> so that visitors can target Node<T> and so every expression has its own id.
#[derive(Clone, Debug, Drive, DriveMut, From, Serialize, Deserialize)]
#[serde(tag = "$t")]
pub enum Expr {
  ArrowFunc(Node<ArrowFuncExpr>),
  Await(Node<AwaitExpr>),
  Binary(Node<BinaryExpr>),
  Call(Node<CallExpr>),
  Class(Node<ClassExpr>),
  ComputedMember(Node<ComputedMemberExpr>),
  Cond(Node<CondExpr>),
  Func(Node<FuncExpr>),
  Id(Node<IdExpr>),
  Member(Node<MemberExpr>),
  MetaProp(Node<MetaPropExpr>),
  New(Node<NewExpr>),
  This(Node<ThisExpr>),
  Unary(Node<UnaryExpr>),
  UnaryPostfix(Node<UnaryPostfixExpr>),
  Yield(Node<YieldExpr>),

  // Literals.
  LitArr(Node<LitArrExpr>),
  LitBool(Node<LitBoolExpr>),
  LitNull(Node<LitNullExpr>),
  LitNum(Node<LitNumExpr>),
  LitObj(Node<LitObjExpr>),
  LitRegex(Node<LitRegexExpr>),
  LitStr(Node<LitStrExpr>),
  LitTemplate(Node<LitTemplateExpr>),

  // Patterns, only valid as assignment targets.
  ArrPat(Node<ArrPat>),
  ObjPat(Node<ObjPat>),
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ArrowFuncExpr {
  pub func: Node<Func>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct AwaitExpr {
  pub argument: Node<Expr>,
}

// Assignments, logical operators and the comma operator are all binary expressions.
#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct BinaryExpr {
  #[drive(skip)]
  pub operator: OperatorName,
  pub left: Node<Expr>,
  pub right: Node<Expr>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct CallArg {
  #[drive(skip)]
  pub spread: bool,
  pub value: Node<Expr>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct CallExpr {
  pub callee: Node<Expr>,
  pub arguments: Vec<Node<CallArg>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ClassExpr {
  #[drive(skip)]
  pub name: Option<String>,
  pub extends: Option<Node<Expr>>,
  pub members: Vec<Node<ClassMember>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ComputedMemberExpr {
  pub object: Node<Expr>,
  pub member: Node<Expr>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct CondExpr {
  pub test: Node<Expr>,
  pub consequent: Node<Expr>,
  pub alternate: Node<Expr>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct FuncExpr {
  #[drive(skip)]
  pub name: Option<String>,
  pub func: Node<Func>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct IdExpr {
  #[drive(skip)]
  pub name: String,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct MemberExpr {
  pub left: Node<Expr>,
  #[drive(skip)]
  pub right: String,
}

// `function.sent`, `new.target`, `import.meta`.
#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct MetaPropExpr {
  #[drive(skip)]
  pub meta: String,
  #[drive(skip)]
  pub property: String,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct NewExpr {
  pub callee: Node<Expr>,
  pub arguments: Vec<Node<CallArg>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ThisExpr {}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct UnaryExpr {
  #[drive(skip)]
  pub operator: OperatorName,
  pub argument: Node<Expr>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct UnaryPostfixExpr {
  #[drive(skip)]
  pub operator: OperatorName,
  pub argument: Node<Expr>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct YieldExpr {
  pub argument: Option<Node<Expr>>,
  #[drive(skip)]
  pub delegate: bool,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub enum LitArrElem {
  Single(Node<Expr>),
  Rest(Node<Expr>),
  Empty,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct LitArrExpr {
  pub elements: Vec<LitArrElem>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct LitBoolExpr {
  #[drive(skip)]
  pub value: bool,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct LitNullExpr {}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct LitNumExpr {
  #[drive(skip)]
  pub value: f64,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct LitObjExpr {
  pub members: Vec<Node<ObjMember>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct LitStrExpr {
  #[drive(skip)]
  pub value: String,
}

// Source text including the slashes and flags, e.g. `/a+/g`.
#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct LitRegexExpr {
  #[drive(skip)]
  pub value: String,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub enum LitTemplatePart {
  Substitution(Node<Expr>),
  // Raw source text between substitutions, escapes left as written.
  String(#[drive(skip)] String),
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct LitTemplateExpr {
  pub parts: Vec<LitTemplatePart>,
}
