//! Rewrites applied to a function before its body is lowered.

use derive_visitor::DriveMut;
use derive_visitor::VisitorMut;

use crate::ast::build;
use crate::ast::expr::Expr;
use crate::ast::expr::YieldExpr;
use crate::ast::func::Func;
use crate::ast::node::Node;

type ExprNode = Node<Expr>;
type FuncNode = Node<Func>;

#[derive(VisitorMut)]
#[visitor(ExprNode(enter), FuncNode)]
struct AwaitToYield<'a> {
  runtime: &'a str,
  nested: usize,
}

impl AwaitToYield<'_> {
  fn enter_expr_node(&mut self, node: &mut ExprNode) {
    if self.nested > 0 || !matches!(node.stx.as_ref(), Expr::Await(_)) {
      return;
    }
    let taken = std::mem::replace(node, build::null());
    let Expr::Await(a) = *taken.stx else {
      unreachable!();
    };
    let awrap = build::call(build::member(build::id(self.runtime), "awrap"), vec![
      a.stx.argument,
    ]);
    *node = Node::new(YieldExpr {
      argument: Some(awrap),
      delegate: false,
    })
    .into_wrapped();
  }

  fn enter_func_node(&mut self, _node: &mut FuncNode) {
    self.nested += 1;
  }

  fn exit_func_node(&mut self, _node: &mut FuncNode) {
    self.nested -= 1;
  }
}

/// Rewrites `await x` into `yield <runtime>.awrap(x)` in the function's own body, so the runtime can tell awaited values from yielded ones.
pub fn await_to_yield(func: &mut Func, runtime: &str) {
  let mut visitor = AwaitToYield { runtime, nested: 0 };
  func.body.drive_mut(&mut visitor);
}

#[derive(VisitorMut)]
#[visitor(ExprNode(enter), FuncNode)]
struct FunctionSent<'a> {
  context: &'a str,
  nested: usize,
}

impl FunctionSent<'_> {
  fn enter_expr_node(&mut self, node: &mut ExprNode) {
    if self.nested > 0 {
      return;
    }
    let Expr::MetaProp(m) = node.stx.as_ref() else {
      return;
    };
    if m.stx.meta == "function" && m.stx.property == "sent" {
      *node = build::member(build::id(self.context), "_sent");
    }
  }

  fn enter_func_node(&mut self, _node: &mut FuncNode) {
    self.nested += 1;
  }

  fn exit_func_node(&mut self, _node: &mut FuncNode) {
    self.nested -= 1;
  }
}

/// Rewrites `function.sent` into `<context>._sent`, the value passed to the `next` call that resumed the generator, including the first one.
pub fn function_sent(func: &mut Func, context: &str) {
  let mut visitor = FunctionSent { context, nested: 0 };
  func.body.drive_mut(&mut visitor);
}

#[derive(VisitorMut)]
#[visitor(ExprNode(enter), FuncNode)]
struct RenameArguments<'a> {
  to: &'a str,
  // Depth of nested non-arrow functions, which have their own `arguments`.
  nested: usize,
  renamed: bool,
}

impl RenameArguments<'_> {
  fn enter_expr_node(&mut self, node: &mut ExprNode) {
    if self.nested > 0 {
      return;
    }
    if let Expr::Id(id) = node.stx.as_mut() {
      if id.stx.name == "arguments" {
        id.stx.name = self.to.to_string();
        self.renamed = true;
      }
    }
  }

  fn enter_func_node(&mut self, node: &mut FuncNode) {
    if !node.stx.arrow {
      self.nested += 1;
    }
  }

  fn exit_func_node(&mut self, node: &mut FuncNode) {
    if !node.stx.arrow {
      self.nested -= 1;
    }
  }
}

/// Renames references to `arguments` to `to`, including inside nested arrow functions. The body is about to move into an inner function with its own `arguments`.
/// Returns whether anything was renamed, in which case the caller must bind `to` to the outer `arguments`.
pub fn rename_arguments(func: &mut Func, to: &str) -> bool {
  let mut visitor = RenameArguments {
    to,
    nested: 0,
    renamed: false,
  };
  func.parameters.drive_mut(&mut visitor);
  func.body.drive_mut(&mut visitor);
  visitor.renamed
}
