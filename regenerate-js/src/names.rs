//! Fresh identifiers for synthesized bindings.

use ahash::HashSet;
use ahash::HashSetExt;
use derive_visitor::Drive;
use derive_visitor::Visitor;

use crate::ast::expr::ClassExpr;
use crate::ast::expr::FuncExpr;
use crate::ast::expr::IdExpr;
use crate::ast::node::Node;
use crate::ast::pat::IdPat;
use crate::ast::stmt::ClassDecl;
use crate::ast::stmt::FuncDecl;

type ClassDeclNode = Node<ClassDecl>;
type ClassExprNode = Node<ClassExpr>;
type FuncDeclNode = Node<FuncDecl>;
type FuncExprNode = Node<FuncExpr>;
type IdExprNode = Node<IdExpr>;
type IdPatNode = Node<IdPat>;

#[derive(Visitor)]
#[visitor(
  ClassDeclNode(enter),
  ClassExprNode(enter),
  FuncDeclNode(enter),
  FuncExprNode(enter),
  IdExprNode(enter),
  IdPatNode(enter)
)]
struct CollectNames<'a> {
  used: &'a mut HashSet<String>,
}

impl CollectNames<'_> {
  fn enter_class_decl_node(&mut self, node: &ClassDeclNode) {
    self.used.insert(node.stx.name.clone());
  }

  fn enter_class_expr_node(&mut self, node: &ClassExprNode) {
    if let Some(name) = &node.stx.name {
      self.used.insert(name.clone());
    }
  }

  fn enter_func_decl_node(&mut self, node: &FuncDeclNode) {
    self.used.insert(node.stx.name.clone());
  }

  fn enter_func_expr_node(&mut self, node: &FuncExprNode) {
    if let Some(name) = &node.stx.name {
      self.used.insert(name.clone());
    }
  }

  fn enter_id_expr_node(&mut self, node: &IdExprNode) {
    self.used.insert(node.stx.name.clone());
  }

  fn enter_id_pat_node(&mut self, node: &IdPatNode) {
    self.used.insert(node.stx.name.clone());
  }
}

/// Hands out identifiers that collide with nothing the program mentions and nothing handed out before.
///
/// A preferred name is used as is when free, then with a numeric suffix starting at 2: `_context`, `_context2`, `_context3`.
#[derive(Debug, Default)]
pub struct NameGen {
  used: HashSet<String>,
}

impl NameGen {
  pub fn new() -> NameGen {
    NameGen {
      used: HashSet::new(),
    }
  }

  /// Marks every identifier referenced or bound anywhere in `node` as taken.
  pub fn reserve_all<T: Drive>(&mut self, node: &T) {
    node.drive(&mut CollectNames {
      used: &mut self.used,
    });
  }

  pub fn reserve(&mut self, name: impl Into<String>) {
    self.used.insert(name.into());
  }

  pub fn generate(&mut self, preferred: &str) -> String {
    let mut name = preferred.to_string();
    let mut suffix = 2;
    while self.used.contains(&name) {
      name = format!("{preferred}{suffix}");
      suffix += 1;
    }
    self.used.insert(name.clone());
    name
  }
}
