use crate::ast::node::NodeId;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Formatter;
use std::error::Error;
use std::fmt::Display;

/// Reasons a function cannot be lowered. These are contract violations by whoever produced the input tree; the lowering itself never recovers from them.
///
/// Diagnostic codes (prefix `RG`) are assigned per variant and are stable:
/// - `RG0001`: [`RegenErrorType::UnhoistedDeclaration`]
/// - `RG0002`: [`RegenErrorType::UnexpectedAwait`]
/// - `RG0003`: [`RegenErrorType::UnsupportedStatement`]
/// - `RG0004`: [`RegenErrorType::UnresolvedBreak`]
/// - `RG0005`: [`RegenErrorType::UnresolvedContinue`]
/// - `RG0006`: [`RegenErrorType::NotSuspendable`]
/// - `RG0007`: [`RegenErrorType::UnsupportedPattern`]
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum RegenErrorType {
  UnhoistedDeclaration,
  UnexpectedAwait,
  UnsupportedStatement(&'static str),
  UnresolvedBreak(Option<String>),
  UnresolvedContinue(Option<String>),
  NotSuspendable,
  UnsupportedPattern(&'static str),
}

impl RegenErrorType {
  pub fn code(&self) -> &'static str {
    match self {
      RegenErrorType::UnhoistedDeclaration => "RG0001",
      RegenErrorType::UnexpectedAwait => "RG0002",
      RegenErrorType::UnsupportedStatement(_) => "RG0003",
      RegenErrorType::UnresolvedBreak(_) => "RG0004",
      RegenErrorType::UnresolvedContinue(_) => "RG0005",
      RegenErrorType::NotSuspendable => "RG0006",
      RegenErrorType::UnsupportedPattern(_) => "RG0007",
    }
  }

  pub fn message(&self) -> String {
    match self {
      RegenErrorType::UnhoistedDeclaration => {
        "declaration reached the lowering stage without being hoisted".to_string()
      }
      RegenErrorType::UnexpectedAwait => {
        "await expression was not rewritten into a yield before lowering".to_string()
      }
      RegenErrorType::UnsupportedStatement(kind) => {
        format!("{kind} statement containing a suspension point cannot be lowered")
      }
      RegenErrorType::UnresolvedBreak(Some(label)) => format!("no enclosing target for `break {label}`"),
      RegenErrorType::UnresolvedBreak(None) => "no enclosing target for `break`".to_string(),
      RegenErrorType::UnresolvedContinue(Some(label)) => {
        format!("no enclosing loop for `continue {label}`")
      }
      RegenErrorType::UnresolvedContinue(None) => "no enclosing loop for `continue`".to_string(),
      RegenErrorType::NotSuspendable => "function is neither a generator nor async".to_string(),
      RegenErrorType::UnsupportedPattern(position) => {
        format!("destructuring {position} containing a suspension point cannot be lowered")
      }
    }
  }
}

#[derive(Clone)]
pub struct RegenError {
  pub typ: RegenErrorType,
  pub node: Option<NodeId>,
}

impl RegenError {
  pub fn new(typ: RegenErrorType, node: Option<NodeId>) -> RegenError {
    RegenError { typ, node }
  }
}

impl Debug for RegenError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self.node {
      Some(id) => write!(f, "{} at node {:?}", self, id),
      None => write!(f, "{}", self),
    }
  }
}

impl Display for RegenError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.typ.code(), self.typ.message())
  }
}

impl Error for RegenError {}

impl PartialEq for RegenError {
  fn eq(&self, other: &Self) -> bool {
    self.typ == other.typ
  }
}

impl Eq for RegenError {}

pub type RegenResult<T> = Result<T, RegenError>;
