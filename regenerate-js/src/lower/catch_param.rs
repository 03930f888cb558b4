use derive_visitor::DriveMut;
use derive_visitor::VisitorMut;

use crate::ast::build;
use crate::ast::expr::Expr;
use crate::ast::func::Func;
use crate::ast::node::Node;
use crate::ast::node::NodeId;
use crate::ast::pat::Pat;
use crate::ast::stmt::CatchBlock;
use crate::ast::stmt::Stmt;
use crate::error::RegenError;
use crate::error::RegenErrorType;
use crate::error::RegenResult;
use crate::hoist::declared_names;

type ExprNode = Node<Expr>;
type FuncNode = Node<Func>;
type CatchBlockNode = Node<CatchBlock>;
type PatNode = Node<Pat>;

// Catch bodies are split across dispatch cases, so the binding cannot live in a local variable.
#[derive(VisitorMut)]
#[visitor(ExprNode(enter), PatNode(enter), FuncNode, CatchBlockNode)]
struct RenameCatchParam<'a> {
  param: &'a str,
  context: &'a str,
  slot: &'a str,
  // One entry per enclosing nested scope; true if that scope rebinds the parameter name.
  shadowed: Vec<bool>,
  // A destructuring assignment target naming the parameter, which cannot become a member expression.
  pattern_target: Option<NodeId>,
}

impl RenameCatchParam<'_> {
  fn enter_pat_node(&mut self, node: &mut PatNode) {
    if self.shadowed.iter().any(|s| *s) || self.pattern_target.is_some() {
      return;
    }
    if node.stx.as_id() == Some(self.param) {
      self.pattern_target = Some(node.id);
    }
  }

  fn enter_expr_node(&mut self, node: &mut ExprNode) {
    if self.shadowed.iter().any(|s| *s) {
      return;
    }
    if let Expr::Id(id) = node.stx.as_ref() {
      if id.stx.name == self.param {
        *node = build::member(build::id(self.context), self.slot);
      }
    }
  }

  fn enter_func_node(&mut self, node: &mut FuncNode) {
    let shadows = declared_names(&node.stx).contains(self.param);
    self.shadowed.push(shadows);
  }

  fn exit_func_node(&mut self, _node: &mut FuncNode) {
    self.shadowed.pop();
  }

  fn enter_catch_block_node(&mut self, node: &mut CatchBlockNode) {
    let shadows = node
      .stx
      .parameter
      .as_ref()
      .is_some_and(|p| p.stx.bound_names().iter().any(|n| n == self.param));
    self.shadowed.push(shadows);
  }

  fn exit_catch_block_node(&mut self, _node: &mut CatchBlockNode) {
    self.shadowed.pop();
  }
}

/// Replaces references to the catch parameter `param` in `body` with the context slot `slot`, except inside nested functions or catch clauses that declare their own binding of the same name.
pub(super) fn rename_catch_param(
  body: &mut [Node<Stmt>],
  param: &str,
  context: &str,
  slot: &str,
) -> RegenResult<()> {
  let mut visitor = RenameCatchParam {
    param,
    context,
    slot,
    shadowed: Vec::new(),
    pattern_target: None,
  };
  for stmt in body.iter_mut() {
    stmt.drive_mut(&mut visitor);
  }
  match visitor.pattern_target {
    Some(id) => Err(RegenError::new(
      RegenErrorType::UnsupportedPattern("assignment target"),
      Some(id),
    )),
    None => Ok(()),
  }
}
