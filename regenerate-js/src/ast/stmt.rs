use derive_more::derive::From;
use derive_visitor::{Drive, DriveMut};
use serde::{Deserialize, Serialize};

use super::class_or_object::ClassMember;
use super::expr::Expr;
use super::func::Func;
use super::node::Node;
use super::pat::Pat;

#[derive(Clone, Debug, Drive, DriveMut, From, Serialize, Deserialize)]
#[serde(tag = "$t")]
pub enum Stmt {
  Block(Node<BlockStmt>),
  Break(Node<BreakStmt>),
  Continue(Node<ContinueStmt>),
  Debugger(Node<DebuggerStmt>),
  DoWhile(Node<DoWhileStmt>),
  Empty(Node<EmptyStmt>),
  Expr(Node<ExprStmt>),
  ForIn(Node<ForInStmt>),
  ForTriple(Node<ForTripleStmt>),
  If(Node<IfStmt>),
  Label(Node<LabelStmt>),
  Return(Node<ReturnStmt>),
  Switch(Node<SwitchStmt>),
  Throw(Node<ThrowStmt>),
  Try(Node<TryStmt>),
  While(Node<WhileStmt>),
  With(Node<WithStmt>),

  ClassDecl(Node<ClassDecl>),
  FunctionDecl(Node<FuncDecl>),
  VarDecl(Node<VarDecl>),
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct BlockStmt {
  pub body: Vec<Node<Stmt>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct BreakStmt {
  #[drive(skip)]
  pub label: Option<String>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ContinueStmt {
  #[drive(skip)]
  pub label: Option<String>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct DebuggerStmt {}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct DoWhileStmt {
  pub condition: Node<Expr>,
  pub body: Node<Stmt>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct EmptyStmt {}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ExprStmt {
  pub expr: Node<Expr>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub enum ForInLhs {
  Decl(Node<VarDecl>),
  Assign(Node<Expr>),
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ForInStmt {
  pub lhs: ForInLhs,
  pub rhs: Node<Expr>,
  pub body: Node<Stmt>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub enum ForTripleStmtInit {
  None,
  Expr(Node<Expr>),
  Decl(Node<VarDecl>),
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ForTripleStmt {
  pub init: ForTripleStmtInit,
  pub cond: Option<Node<Expr>>,
  pub post: Option<Node<Expr>>,
  pub body: Node<Stmt>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct IfStmt {
  pub test: Node<Expr>,
  pub consequent: Node<Stmt>,
  pub alternate: Option<Node<Stmt>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct LabelStmt {
  #[drive(skip)]
  pub name: String,
  pub statement: Node<Stmt>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ReturnStmt {
  pub value: Option<Node<Expr>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct SwitchBranch {
  // If None, it's `default`.
  pub case: Option<Node<Expr>>,
  pub body: Vec<Node<Stmt>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct SwitchStmt {
  pub test: Node<Expr>,
  pub branches: Vec<Node<SwitchBranch>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ThrowStmt {
  pub value: Node<Expr>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct CatchBlock {
  pub parameter: Option<Node<Pat>>,
  pub body: Vec<Node<Stmt>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct TryStmt {
  pub wrapped: Node<BlockStmt>,
  // One of these must be present.
  pub catch: Option<Node<CatchBlock>>,
  pub finally: Option<Node<BlockStmt>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct WhileStmt {
  pub condition: Node<Expr>,
  pub body: Node<Stmt>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct WithStmt {
  pub object: Node<Expr>,
  pub body: Node<Stmt>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ClassDecl {
  #[drive(skip)]
  pub name: String,
  pub extends: Option<Node<Expr>>,
  pub members: Vec<Node<ClassMember>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct FuncDecl {
  #[drive(skip)]
  pub name: String,
  pub function: Node<Func>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarDeclMode {
  Const,
  Let,
  Var,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct VarDeclarator {
  pub pattern: Node<Pat>,
  pub initializer: Option<Node<Expr>>,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct VarDecl {
  #[drive(skip)]
  pub mode: VarDeclMode,
  pub declarators: Vec<VarDeclarator>,
}
