use ahash::HashSet;
use ahash::HashSetExt;
use derive_visitor::Drive;
use derive_visitor::Visitor;

use crate::ast::build;
use crate::ast::expr::ClassExpr;
use crate::ast::expr::Expr;
use crate::ast::func::Func;
use crate::ast::func::FuncBody;
use crate::ast::node::Node;
use crate::ast::stmt::*;

type ClassDeclNode = Node<ClassDecl>;
type FuncNode = Node<Func>;
type FuncDeclNode = Node<FuncDecl>;

// Rewrites declarations into assignments and collects the declared names, in first-seen order.
struct Hoister {
  names: Vec<String>,
  seen: HashSet<String>,
}

impl Hoister {
  fn declare(&mut self, name: &str) {
    if self.seen.insert(name.to_string()) {
      self.names.push(name.to_string());
    }
  }

  // Returns None if nothing is left to evaluate.
  fn var_decl_to_expr(&mut self, decl: Node<VarDecl>, include_identifiers: bool) -> Option<Node<Expr>> {
    let mut exprs = Vec::new();
    for d in decl.stx.declarators {
      for name in d.pattern.stx.bound_names() {
        self.declare(&name);
      }
      match d.initializer {
        Some(init) => exprs.push(build::assign(d.pattern.into_assign_target(), init)),
        None if include_identifiers => exprs.push(d.pattern.into_assign_target()),
        None => {}
      };
    }
    if exprs.is_empty() {
      None
    } else {
      Some(build::seq(exprs))
    }
  }

  fn hoist_block(&mut self, body: &mut Vec<Node<Stmt>>) {
    let mut prepend = Vec::new();
    let mut rest = Vec::new();
    for stmt in std::mem::take(body) {
      if let Some(stmt) = self.rewrite(stmt, Some(&mut prepend)) {
        rest.push(stmt);
      };
    }
    prepend.extend(rest);
    *body = prepend;
  }

  // For statement positions that are not a statement list, e.g. a loop body.
  fn rewrite_single(&mut self, stmt: Node<Stmt>) -> Node<Stmt> {
    self
      .rewrite(stmt, None)
      .unwrap_or_else(|| Node::new(EmptyStmt {}).into_wrapped())
  }

  // `prepend` is the top of the enclosing block, if the statement is directly inside one.
  fn rewrite(
    &mut self,
    stmt: Node<Stmt>,
    prepend: Option<&mut Vec<Node<Stmt>>>,
  ) -> Option<Node<Stmt>> {
    let id = stmt.id;
    let rewritten: Stmt = match *stmt.stx {
      Stmt::VarDecl(decl) => {
        return self.var_decl_to_expr(decl, false).map(build::expr_stmt);
      }
      Stmt::FunctionDecl(decl) => {
        let FuncDecl { name, function } = *decl.stx;
        self.declare(&name);
        let assignment = build::expr_stmt(build::assign(
          build::id(name.clone()),
          build::func_expr(Some(name), function),
        ));
        return match prepend {
          Some(prepend) => {
            prepend.push(assignment);
            None
          }
          None => Some(assignment),
        };
      }
      // Classes are not hoisted, so the assignment stays where the declaration was.
      Stmt::ClassDecl(decl) => {
        let ClassDecl {
          name,
          extends,
          members,
        } = *decl.stx;
        self.declare(&name);
        let class = Node::new(ClassExpr {
          name: Some(name.clone()),
          extends,
          members,
        })
        .into_wrapped();
        return Some(build::expr_stmt(build::assign(build::id(name), class)));
      }
      Stmt::Block(mut n) => {
        self.hoist_block(&mut n.stx.body);
        Stmt::Block(n)
      }
      Stmt::If(n) => Stmt::If(n.map_stx(|s| IfStmt {
        test: s.test,
        consequent: self.rewrite_single(s.consequent),
        alternate: s.alternate.map(|a| self.rewrite_single(a)),
      })),
      Stmt::While(n) => Stmt::While(n.map_stx(|s| WhileStmt {
        condition: s.condition,
        body: self.rewrite_single(s.body),
      })),
      Stmt::DoWhile(n) => Stmt::DoWhile(n.map_stx(|s| DoWhileStmt {
        condition: s.condition,
        body: self.rewrite_single(s.body),
      })),
      Stmt::With(n) => Stmt::With(n.map_stx(|s| WithStmt {
        object: s.object,
        body: self.rewrite_single(s.body),
      })),
      Stmt::Label(n) => Stmt::Label(n.map_stx(|s| LabelStmt {
        name: s.name,
        statement: self.rewrite_single(s.statement),
      })),
      Stmt::ForTriple(n) => Stmt::ForTriple(n.map_stx(|s| ForTripleStmt {
        init: match s.init {
          ForTripleStmtInit::Decl(decl) => match self.var_decl_to_expr(decl, false) {
            Some(e) => ForTripleStmtInit::Expr(e),
            None => ForTripleStmtInit::None,
          },
          init => init,
        },
        cond: s.cond,
        post: s.post,
        body: self.rewrite_single(s.body),
      })),
      Stmt::ForIn(n) => Stmt::ForIn(n.map_stx(|s| ForInStmt {
        lhs: match s.lhs {
          ForInLhs::Decl(decl) => {
            // Declarators always yield at least their identifier here.
            let target = self
              .var_decl_to_expr(decl, true)
              .expect("for-in declaration without declarators");
            ForInLhs::Assign(target)
          }
          lhs => lhs,
        },
        rhs: s.rhs,
        body: self.rewrite_single(s.body),
      })),
      Stmt::Switch(mut n) => {
        for branch in n.stx.branches.iter_mut() {
          let body = std::mem::take(&mut branch.stx.body);
          branch.stx.body = body.into_iter().filter_map(|s| self.rewrite(s, None)).collect();
        }
        Stmt::Switch(n)
      }
      Stmt::Try(mut n) => {
        self.hoist_block(&mut n.stx.wrapped.stx.body);
        if let Some(c) = n.stx.catch.as_mut() {
          self.hoist_block(&mut c.stx.body);
        }
        if let Some(f) = n.stx.finally.as_mut() {
          self.hoist_block(&mut f.stx.body);
        }
        Stmt::Try(n)
      }
      other => other,
    };
    Some(Node {
      id,
      stx: Box::new(rewritten),
    })
  }
}

/// Replaces every declaration in the function's block body with an equivalent assignment, and returns a single `var` declaration of the names that must now be declared outside the body.
/// Nested functions are left alone. Names of parameters are not redeclared.
pub fn hoist(func: &mut Func) -> Option<Node<VarDecl>> {
  let FuncBody::Block(body) = &mut func.body else {
    panic!("hoisting requires a block body");
  };
  let mut hoister = Hoister {
    names: Vec::new(),
    seen: HashSet::new(),
  };
  hoister.hoist_block(body);
  let params: HashSet<String> = func
    .parameters
    .iter()
    .flat_map(|p| p.stx.pattern.stx.bound_names())
    .collect();
  let declarators: Vec<VarDeclarator> = hoister
    .names
    .into_iter()
    .filter(|n| !params.contains(n))
    .map(|n| build::declarator(n, None))
    .collect();
  if declarators.is_empty() {
    None
  } else {
    Some(build::var(declarators))
  }
}

#[derive(Visitor)]
#[visitor(FuncNode, ClassDeclNode(enter), FuncDeclNode(enter), VarDeclarator(enter))]
struct DeclaredNames {
  depth: usize,
  names: HashSet<String>,
}

impl DeclaredNames {
  fn enter_func_node(&mut self, _node: &FuncNode) {
    self.depth += 1;
  }

  fn exit_func_node(&mut self, _node: &FuncNode) {
    self.depth -= 1;
  }

  fn enter_class_decl_node(&mut self, node: &ClassDeclNode) {
    if self.depth == 0 {
      self.names.insert(node.stx.name.clone());
    }
  }

  fn enter_func_decl_node(&mut self, node: &FuncDeclNode) {
    if self.depth == 0 {
      self.names.insert(node.stx.name.clone());
    }
  }

  fn enter_var_declarator(&mut self, node: &VarDeclarator) {
    if self.depth == 0 {
      self.names.extend(node.pattern.stx.bound_names());
    }
  }
}

/// Names declared directly in a function's own scope: parameters, `var`/`let`/`const` anywhere in its body, and function and class declarations, but nothing from nested functions.
pub fn declared_names(func: &Func) -> HashSet<String> {
  let mut visitor = DeclaredNames {
    depth: 0,
    names: HashSet::new(),
  };
  for p in func.parameters.iter() {
    visitor.names.extend(p.stx.pattern.stx.bound_names());
  }
  func.body.drive(&mut visitor);
  visitor.names
}
