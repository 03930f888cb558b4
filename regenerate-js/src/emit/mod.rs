//! Minified JavaScript printer for the tree.
//!
//! Output is a single line with no whitespace except where two adjacent tokens
//! would otherwise lex as one (`return x`, `a- -b`, `a+ +b`). Parentheses are
//! derived from operator precedence, so trees built by the lowering pass never
//! need explicit grouping nodes.

mod emitter;
mod expr;
mod precedence;
mod stmt;

use std::fmt;

use crate::ast::expr::Expr;
use crate::ast::node::Node;
use crate::ast::node::NodeId;
use crate::ast::stmt::Stmt;
use crate::ast::stx::TopLevel;

pub use emitter::Emitter;
pub use expr::emit_expr;
pub use stmt::emit_stmt;
pub use stmt::emit_top_level;

#[derive(Debug)]
pub enum EmitErrorKind {
  Fmt(fmt::Error),
  Unsupported(&'static str),
}

#[derive(Debug)]
pub struct EmitError {
  pub kind: EmitErrorKind,
  pub node: Option<NodeId>,
}

impl EmitError {
  pub(crate) fn unsupported(message: &'static str) -> Self {
    Self {
      kind: EmitErrorKind::Unsupported(message),
      node: None,
    }
  }

  pub(crate) fn at(mut self, node: NodeId) -> Self {
    if self.node.is_none() {
      self.node = Some(node);
    }
    self
  }
}

impl From<fmt::Error> for EmitError {
  fn from(value: fmt::Error) -> Self {
    Self {
      kind: EmitErrorKind::Fmt(value),
      node: None,
    }
  }
}

impl fmt::Display for EmitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      EmitErrorKind::Fmt(_) => write!(f, "failed to write output")?,
      EmitErrorKind::Unsupported(message) => write!(f, "cannot print: {message}")?,
    };
    if let Some(node) = self.node {
      write!(f, " (at node {node:?})")?;
    }
    Ok(())
  }
}

impl std::error::Error for EmitError {}

pub type EmitResult = Result<(), EmitError>;

pub(crate) fn with_node_context<T>(
  node: NodeId,
  f: impl FnOnce() -> Result<T, EmitError>,
) -> Result<T, EmitError> {
  f().map_err(|err| err.at(node))
}

pub fn emit_program(top: &TopLevel) -> Result<String, EmitError> {
  let mut em = Emitter::new();
  emit_top_level(&mut em, top)?;
  Ok(em.into_string())
}

pub fn stmt_to_string(stmt: &Node<Stmt>) -> Result<String, EmitError> {
  let mut em = Emitter::new();
  emit_stmt(&mut em, stmt)?;
  Ok(em.into_string())
}

pub fn expr_to_string(expr: &Node<Expr>) -> Result<String, EmitError> {
  let mut em = Emitter::new();
  emit_expr(&mut em, expr)?;
  Ok(em.into_string())
}
