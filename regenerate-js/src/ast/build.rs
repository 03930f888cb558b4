//! Shorthand constructors for synthesized syntax. Every call creates fresh nodes with fresh ids.

use super::expr::*;
use super::func::Func;
use super::func::ParamDecl;
use super::node::Node;
use super::pat::IdPat;
use super::pat::Pat;
use super::stmt::*;
use crate::operator::OperatorName;

pub fn id(name: impl Into<String>) -> Node<Expr> {
  Node::new(IdExpr { name: name.into() }).into_wrapped()
}

pub fn this() -> Node<Expr> {
  Node::new(ThisExpr {}).into_wrapped()
}

pub fn num(value: f64) -> Node<Expr> {
  Node::new(LitNumExpr { value }).into_wrapped()
}

pub fn str(value: impl Into<String>) -> Node<Expr> {
  Node::new(LitStrExpr {
    value: value.into(),
  })
  .into_wrapped()
}

pub fn bool(value: bool) -> Node<Expr> {
  Node::new(LitBoolExpr { value }).into_wrapped()
}

pub fn null() -> Node<Expr> {
  Node::new(LitNullExpr {}).into_wrapped()
}

pub fn arr(elements: Vec<LitArrElem>) -> Node<Expr> {
  Node::new(LitArrExpr { elements }).into_wrapped()
}

pub fn member(left: Node<Expr>, right: impl Into<String>) -> Node<Expr> {
  Node::new(MemberExpr {
    left,
    right: right.into(),
  })
  .into_wrapped()
}

pub fn computed_member(object: Node<Expr>, member: Node<Expr>) -> Node<Expr> {
  Node::new(ComputedMemberExpr { object, member }).into_wrapped()
}

pub fn binary(operator: OperatorName, left: Node<Expr>, right: Node<Expr>) -> Node<Expr> {
  Node::new(BinaryExpr {
    operator,
    left,
    right,
  })
  .into_wrapped()
}

pub fn assign(left: Node<Expr>, right: Node<Expr>) -> Node<Expr> {
  binary(OperatorName::Assignment, left, right)
}

/// Folds into a left-leaning comma sequence. Panics if `exprs` is empty.
pub fn seq(exprs: Vec<Node<Expr>>) -> Node<Expr> {
  let mut iter = exprs.into_iter();
  let first = iter.next().expect("empty sequence");
  iter.fold(first, |acc, e| binary(OperatorName::Comma, acc, e))
}

pub fn unary(operator: OperatorName, argument: Node<Expr>) -> Node<Expr> {
  Node::new(UnaryExpr { operator, argument }).into_wrapped()
}

pub fn not(argument: Node<Expr>) -> Node<Expr> {
  unary(OperatorName::LogicalNot, argument)
}

pub fn cond(test: Node<Expr>, consequent: Node<Expr>, alternate: Node<Expr>) -> Node<Expr> {
  Node::new(CondExpr {
    test,
    consequent,
    alternate,
  })
  .into_wrapped()
}

pub fn arg(value: Node<Expr>) -> Node<CallArg> {
  Node::new(CallArg {
    spread: false,
    value,
  })
}

pub fn call(callee: Node<Expr>, arguments: Vec<Node<Expr>>) -> Node<Expr> {
  Node::new(CallExpr {
    callee,
    arguments: arguments.into_iter().map(arg).collect(),
  })
  .into_wrapped()
}

pub fn func_expr(name: Option<String>, func: Node<Func>) -> Node<Expr> {
  Node::new(FuncExpr { name, func }).into_wrapped()
}

pub fn expr_stmt(expr: Node<Expr>) -> Node<Stmt> {
  Node::new(ExprStmt { expr }).into_wrapped()
}

pub fn block(body: Vec<Node<Stmt>>) -> Node<Stmt> {
  Node::new(BlockStmt { body }).into_wrapped()
}

pub fn ret(value: Option<Node<Expr>>) -> Node<Stmt> {
  Node::new(ReturnStmt { value }).into_wrapped()
}

pub fn throw(value: Node<Expr>) -> Node<Stmt> {
  Node::new(ThrowStmt { value }).into_wrapped()
}

pub fn if_(test: Node<Expr>, consequent: Node<Stmt>, alternate: Option<Node<Stmt>>) -> Node<Stmt> {
  Node::new(IfStmt {
    test,
    consequent,
    alternate,
  })
  .into_wrapped()
}

pub fn var(declarators: Vec<VarDeclarator>) -> Node<VarDecl> {
  Node::new(VarDecl {
    mode: VarDeclMode::Var,
    declarators,
  })
}

pub fn id_pat(name: impl Into<String>) -> Node<Pat> {
  Node::new(IdPat { name: name.into() }).into_wrapped()
}

pub fn param(name: impl Into<String>) -> Node<ParamDecl> {
  Node::new(ParamDecl {
    rest: false,
    pattern: id_pat(name),
    default_value: None,
  })
}

pub fn declarator(name: impl Into<String>, initializer: Option<Node<Expr>>) -> VarDeclarator {
  VarDeclarator {
    pattern: id_pat(name),
    initializer,
  }
}
