//! Structural predicates over statements and expressions, memoized per node.
//!
//! Nested function literals are opaque: their bodies never count towards the enclosing function, as they run in their own activation.

use ahash::HashMap;
use ahash::HashMapExt;

use crate::ast::class_or_object::ClassMember;
use crate::ast::class_or_object::ClassOrObjKey;
use crate::ast::class_or_object::ClassOrObjVal;
use crate::ast::class_or_object::ObjMemberType;
use crate::ast::expr::Expr;
use crate::ast::expr::LitArrElem;
use crate::ast::expr::LitTemplatePart;
use crate::ast::node::Node;
use crate::ast::node::NodeId;
use crate::ast::pat::ArrPat;
use crate::ast::pat::ObjPat;
use crate::ast::pat::Pat;
use crate::ast::stmt::ForInLhs;
use crate::ast::stmt::ForTripleStmtInit;
use crate::ast::stmt::Stmt;
use crate::ast::stmt::VarDecl;
use crate::operator::OperatorName;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Query {
  SideEffects,
  Leap,
}

enum Class {
  Opaque,
  Always,
  Recurse,
}

#[derive(Clone, Copy)]
enum Child<'a> {
  Expr(&'a Node<Expr>),
  Stmt(&'a Node<Stmt>),
}

fn push_key<'a>(out: &mut Vec<Child<'a>>, key: &'a ClassOrObjKey) {
  if let ClassOrObjKey::Computed(e) = key {
    out.push(Child::Expr(e));
  }
}

// Only what runs while the pattern is matched: computed keys and defaults.
fn push_arr_pat<'a>(out: &mut Vec<Child<'a>>, pat: &'a ArrPat) {
  for elem in pat.elements.iter().flatten() {
    push_pat(out, &elem.target);
    out.extend(elem.default_value.iter().map(Child::Expr));
  }
  if let Some(rest) = &pat.rest {
    push_pat(out, rest);
  }
}

fn push_obj_pat<'a>(out: &mut Vec<Child<'a>>, pat: &'a ObjPat) {
  for prop in pat.properties.iter() {
    push_key(out, &prop.stx.key);
    push_pat(out, &prop.stx.target);
    out.extend(prop.stx.default_value.iter().map(Child::Expr));
  }
}

fn push_pat<'a>(out: &mut Vec<Child<'a>>, pat: &'a Node<Pat>) {
  match pat.stx.as_ref() {
    Pat::Id(_) => {}
    Pat::Arr(n) => push_arr_pat(out, &n.stx),
    Pat::Obj(n) => push_obj_pat(out, &n.stx),
  };
}

// Method bodies run later, in their own activation; class field initializers run in the constructor.
fn push_class_members<'a>(
  out: &mut Vec<Child<'a>>,
  extends: &'a Option<Node<Expr>>,
  members: &'a [Node<ClassMember>],
) {
  out.extend(extends.iter().map(Child::Expr));
  for m in members.iter() {
    push_key(out, &m.stx.key);
  }
}

fn push_var_decl<'a>(out: &mut Vec<Child<'a>>, decl: &'a Node<VarDecl>) {
  for d in decl.stx.declarators.iter() {
    push_pat(out, &d.pattern);
    if let Some(init) = &d.initializer {
      out.push(Child::Expr(init));
    }
  }
}

fn classify_expr(expr: &Node<Expr>, query: Query) -> Class {
  match expr.stx.as_ref() {
    Expr::ArrowFunc(_) | Expr::Func(_) => Class::Opaque,
    Expr::Yield(_) | Expr::Await(_) => Class::Always,
    // Defining a class binds its inner name and may run static initializers.
    Expr::Class(_) => match query {
      Query::SideEffects => Class::Always,
      Query::Leap => Class::Recurse,
    },
    Expr::Call(_) | Expr::New(_) | Expr::Unary(_) | Expr::UnaryPostfix(_) => match query {
      Query::SideEffects => Class::Always,
      Query::Leap => Class::Recurse,
    },
    Expr::Binary(bin) => match (query, bin.stx.operator) {
      (_, OperatorName::LogicalAnd | OperatorName::LogicalOr | OperatorName::Comma) => {
        Class::Recurse
      }
      (Query::SideEffects, _) => Class::Always,
      (Query::Leap, _) => Class::Recurse,
    },
    _ => Class::Recurse,
  }
}

fn classify_stmt(stmt: &Node<Stmt>, query: Query) -> Class {
  match stmt.stx.as_ref() {
    Stmt::FunctionDecl(_) => Class::Opaque,
    Stmt::Break(_) | Stmt::Continue(_) | Stmt::Return(_) | Stmt::Throw(_) => Class::Always,
    Stmt::ForIn(_) | Stmt::ClassDecl(_) => match query {
      Query::SideEffects => Class::Always,
      Query::Leap => Class::Recurse,
    },
    _ => Class::Recurse,
  }
}

fn expr_children(expr: &Node<Expr>) -> Vec<Child<'_>> {
  let mut out = Vec::new();
  match expr.stx.as_ref() {
    Expr::Await(n) => out.push(Child::Expr(&n.stx.argument)),
    Expr::Binary(n) => {
      out.push(Child::Expr(&n.stx.left));
      out.push(Child::Expr(&n.stx.right));
    }
    Expr::Call(n) => {
      out.push(Child::Expr(&n.stx.callee));
      out.extend(n.stx.arguments.iter().map(|a| Child::Expr(&a.stx.value)));
    }
    Expr::New(n) => {
      out.push(Child::Expr(&n.stx.callee));
      out.extend(n.stx.arguments.iter().map(|a| Child::Expr(&a.stx.value)));
    }
    Expr::ComputedMember(n) => {
      out.push(Child::Expr(&n.stx.object));
      out.push(Child::Expr(&n.stx.member));
    }
    Expr::Cond(n) => {
      out.push(Child::Expr(&n.stx.test));
      out.push(Child::Expr(&n.stx.consequent));
      out.push(Child::Expr(&n.stx.alternate));
    }
    Expr::Member(n) => out.push(Child::Expr(&n.stx.left)),
    Expr::Unary(n) => out.push(Child::Expr(&n.stx.argument)),
    Expr::UnaryPostfix(n) => out.push(Child::Expr(&n.stx.argument)),
    Expr::Yield(n) => out.extend(n.stx.argument.iter().map(Child::Expr)),
    Expr::Class(n) => push_class_members(&mut out, &n.stx.extends, &n.stx.members),
    Expr::LitArr(n) => {
      for e in n.stx.elements.iter() {
        match e {
          LitArrElem::Single(e) | LitArrElem::Rest(e) => out.push(Child::Expr(e)),
          LitArrElem::Empty => {}
        };
      }
    }
    Expr::LitObj(n) => {
      for m in n.stx.members.iter() {
        match &m.stx.typ {
          ObjMemberType::Valued { key, val } => {
            push_key(&mut out, key);
            if let ClassOrObjVal::Prop(Some(value)) = val {
              out.push(Child::Expr(value));
            }
          }
          ObjMemberType::Rest { val } => out.push(Child::Expr(val)),
        };
      }
    }
    Expr::LitTemplate(n) => {
      for part in n.stx.parts.iter() {
        if let LitTemplatePart::Substitution(e) = part {
          out.push(Child::Expr(e));
        }
      }
    }
    Expr::ArrPat(n) => push_arr_pat(&mut out, &n.stx),
    Expr::ObjPat(n) => push_obj_pat(&mut out, &n.stx),
    Expr::ArrowFunc(_)
    | Expr::Func(_)
    | Expr::Id(_)
    | Expr::MetaProp(_)
    | Expr::This(_)
    | Expr::LitBool(_)
    | Expr::LitNull(_)
    | Expr::LitNum(_)
    | Expr::LitRegex(_)
    | Expr::LitStr(_) => {}
  };
  out
}

fn stmt_children(stmt: &Node<Stmt>) -> Vec<Child<'_>> {
  let mut out = Vec::new();
  match stmt.stx.as_ref() {
    Stmt::Block(n) => out.extend(n.stx.body.iter().map(Child::Stmt)),
    Stmt::DoWhile(n) => {
      out.push(Child::Stmt(&n.stx.body));
      out.push(Child::Expr(&n.stx.condition));
    }
    Stmt::Expr(n) => out.push(Child::Expr(&n.stx.expr)),
    Stmt::ForIn(n) => {
      match &n.stx.lhs {
        ForInLhs::Decl(d) => push_var_decl(&mut out, d),
        ForInLhs::Assign(e) => out.push(Child::Expr(e)),
      };
      out.push(Child::Expr(&n.stx.rhs));
      out.push(Child::Stmt(&n.stx.body));
    }
    Stmt::ForTriple(n) => {
      match &n.stx.init {
        ForTripleStmtInit::None => {}
        ForTripleStmtInit::Expr(e) => out.push(Child::Expr(e)),
        ForTripleStmtInit::Decl(d) => push_var_decl(&mut out, d),
      };
      out.extend(n.stx.cond.iter().map(Child::Expr));
      out.extend(n.stx.post.iter().map(Child::Expr));
      out.push(Child::Stmt(&n.stx.body));
    }
    Stmt::If(n) => {
      out.push(Child::Expr(&n.stx.test));
      out.push(Child::Stmt(&n.stx.consequent));
      out.extend(n.stx.alternate.iter().map(Child::Stmt));
    }
    Stmt::Label(n) => out.push(Child::Stmt(&n.stx.statement)),
    Stmt::Return(n) => out.extend(n.stx.value.iter().map(Child::Expr)),
    Stmt::Switch(n) => {
      out.push(Child::Expr(&n.stx.test));
      for b in n.stx.branches.iter() {
        out.extend(b.stx.case.iter().map(Child::Expr));
        out.extend(b.stx.body.iter().map(Child::Stmt));
      }
    }
    Stmt::Throw(n) => out.push(Child::Expr(&n.stx.value)),
    Stmt::Try(n) => {
      out.extend(n.stx.wrapped.stx.body.iter().map(Child::Stmt));
      if let Some(c) = &n.stx.catch {
        if let Some(param) = &c.stx.parameter {
          push_pat(&mut out, param);
        }
        out.extend(c.stx.body.iter().map(Child::Stmt));
      }
      if let Some(f) = &n.stx.finally {
        out.extend(f.stx.body.iter().map(Child::Stmt));
      }
    }
    Stmt::While(n) => {
      out.push(Child::Expr(&n.stx.condition));
      out.push(Child::Stmt(&n.stx.body));
    }
    Stmt::With(n) => {
      out.push(Child::Expr(&n.stx.object));
      out.push(Child::Stmt(&n.stx.body));
    }
    Stmt::VarDecl(n) => push_var_decl(&mut out, n),
    Stmt::ClassDecl(n) => push_class_members(&mut out, &n.stx.extends, &n.stx.members),
    Stmt::Break(_)
    | Stmt::Continue(_)
    | Stmt::Debugger(_)
    | Stmt::Empty(_)
    | Stmt::FunctionDecl(_) => {}
  };
  out
}

/// Memo tables for the side-effect and leap predicates. Results are keyed by node id, so a `Meta` must not outlive mutations of the nodes it has seen.
#[derive(Default)]
pub struct Meta {
  memo: HashMap<(NodeId, Query), bool>,
}

impl Meta {
  pub fn new() -> Meta {
    Meta {
      memo: HashMap::new(),
    }
  }

  pub fn has_side_effects(&mut self, expr: &Node<Expr>) -> bool {
    self.check(Child::Expr(expr), Query::SideEffects)
  }

  pub fn stmt_has_side_effects(&mut self, stmt: &Node<Stmt>) -> bool {
    self.check(Child::Stmt(stmt), Query::SideEffects)
  }

  /// Whether evaluating the expression may suspend or transfer control out of it.
  pub fn contains_leap(&mut self, expr: &Node<Expr>) -> bool {
    self.check(Child::Expr(expr), Query::Leap)
  }

  pub fn stmt_contains_leap(&mut self, stmt: &Node<Stmt>) -> bool {
    self.check(Child::Stmt(stmt), Query::Leap)
  }

  /// Like `contains_leap`, but ignores the kind of the expression itself and only looks at its immediate children.
  pub fn children_contain_leap(&mut self, expr: &Node<Expr>) -> bool {
    if matches!(classify_expr(expr, Query::Leap), Class::Opaque) {
      return false;
    }
    expr_children(expr)
      .into_iter()
      .any(|c| self.check(c, Query::Leap))
  }

  fn check(&mut self, node: Child<'_>, query: Query) -> bool {
    let id = match node {
      Child::Expr(e) => e.id,
      Child::Stmt(s) => s.id,
    };
    if let Some(&v) = self.memo.get(&(id, query)) {
      return v;
    }
    let (class, children) = match node {
      Child::Expr(e) => (classify_expr(e, query), expr_children(e)),
      Child::Stmt(s) => (classify_stmt(s, query), stmt_children(s)),
    };
    let result = match class {
      Class::Opaque => false,
      Class::Always => true,
      Class::Recurse => children.into_iter().any(|c| self.check(c, query)),
    };
    self.memo.insert((id, query), result);
    result
  }
}
