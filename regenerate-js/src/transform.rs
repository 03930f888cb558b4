//! Finds the generator and async functions of a program and lowers each of them, innermost first.

use derive_visitor::DriveMut;
use derive_visitor::VisitorMut;
use tracing::debug_span;
use tracing::trace;

use crate::ast::build;
use crate::ast::class_or_object::ClassMember;
use crate::ast::class_or_object::ClassOrObjVal;
use crate::ast::class_or_object::ObjMember;
use crate::ast::class_or_object::ObjMemberType;
use crate::ast::expr::Expr;
use crate::ast::expr::LitArrElem;
use crate::ast::func::Func;
use crate::ast::func::FuncBody;
use crate::ast::node::Node;
use crate::ast::stmt::BlockStmt;
use crate::ast::stmt::CatchBlock;
use crate::ast::stmt::FuncDecl;
use crate::ast::stmt::Stmt;
use crate::ast::stx::TopLevel;
use crate::driver::lower_function;
use crate::error::RegenError;
use crate::error::RegenResult;
use crate::names::NameGen;
use crate::options::RegenOptions;

type ExprNode = Node<Expr>;
type FuncDeclNode = Node<FuncDecl>;
type BlockStmtNode = Node<BlockStmt>;
type CatchBlockNode = Node<CatchBlock>;
type ClassMemberNode = Node<ClassMember>;
type ObjMemberNode = Node<ObjMember>;

// Generator function declarations of one statement list, marked together by a single `var _marked = [...].map(<runtime>.mark)`.
#[derive(Default)]
struct MarkScope {
  var_name: Option<String>,
  functions: Vec<String>,
}

#[derive(VisitorMut)]
#[visitor(
  TopLevel,
  BlockStmtNode,
  CatchBlockNode,
  FuncBody,
  FuncDeclNode(exit),
  ExprNode(exit),
  ObjMemberNode(exit),
  ClassMemberNode(exit)
)]
struct Regenerate<'a> {
  options: &'a RegenOptions,
  scopes: Vec<MarkScope>,
  names: NameGen,
  // Visitor callbacks cannot return errors; the first one is kept and everything after it is skipped.
  error: Option<RegenError>,
}

impl Regenerate<'_> {
  fn lower(&mut self, func: &mut Func, name: &str, outer_self: Option<Node<Expr>>) -> bool {
    match lower_function(func, name, outer_self, self.options, &mut self.names) {
      Ok(()) => true,
      Err(err) => {
        self.error = Some(err);
        false
      }
    }
  }

  fn enter_scope(&mut self) {
    self.scopes.push(MarkScope::default());
  }

  fn exit_scope(&mut self, body: &mut Vec<Node<Stmt>>) {
    let scope = self.scopes.pop().expect("unbalanced mark scopes");
    let Some(var_name) = scope.var_name else {
      return;
    };
    let functions = scope
      .functions
      .into_iter()
      .map(|f| LitArrElem::Single(build::id(f)))
      .collect();
    let mark = build::member(build::id(self.options.runtime.clone()), "mark");
    let marked = build::call(build::member(build::arr(functions), "map"), vec![mark]);
    let decl = build::var(vec![build::declarator(var_name, Some(marked))]);
    // After any directive prologue.
    let at = body
      .iter()
      .take_while(|s| match s.stx.as_ref() {
        Stmt::Expr(e) => matches!(e.stx.expr.stx.as_ref(), Expr::LitStr(_)),
        _ => false,
      })
      .count();
    body.insert(at, decl.into_wrapped());
  }

  /// Registers a generator declaration with the innermost statement list and returns the expression that refers to its marked function object.
  fn register_marked(&mut self, name: &str) -> Node<Expr> {
    let names = &mut self.names;
    let scope = self.scopes.last_mut().expect("declaration outside any statement list");
    let var_name = scope
      .var_name
      .get_or_insert_with(|| names.generate("_marked"))
      .clone();
    let index = scope.functions.len();
    scope.functions.push(name.to_string());
    build::computed_member(build::id(var_name), build::num(index as f64))
  }

  fn enter_top_level(&mut self, _node: &mut TopLevel) {
    self.enter_scope();
  }

  fn exit_top_level(&mut self, node: &mut TopLevel) {
    self.exit_scope(&mut node.body);
  }

  fn enter_block_stmt_node(&mut self, _node: &mut BlockStmtNode) {
    self.enter_scope();
  }

  fn exit_block_stmt_node(&mut self, node: &mut BlockStmtNode) {
    self.exit_scope(&mut node.stx.body);
  }

  fn enter_catch_block_node(&mut self, _node: &mut CatchBlockNode) {
    self.enter_scope();
  }

  fn exit_catch_block_node(&mut self, node: &mut CatchBlockNode) {
    self.exit_scope(&mut node.stx.body);
  }

  fn enter_func_body(&mut self, _node: &mut FuncBody) {
    self.enter_scope();
  }

  fn exit_func_body(&mut self, node: &mut FuncBody) {
    match node {
      FuncBody::Block(body) => self.exit_scope(body),
      FuncBody::Expression(_) => {
        self.scopes.pop();
      }
    };
  }

  fn exit_func_decl_node(&mut self, node: &mut FuncDeclNode) {
    if self.error.is_some() {
      return;
    }
    let decl = &mut *node.stx;
    let func = &mut *decl.function.stx;
    if !self.options.should_lower(func.generator, func.async_) {
      return;
    }
    let outer_self = func.generator.then(|| self.register_marked(&decl.name));
    self.lower(func, &decl.name, outer_self);
  }

  // Lowers a function expression and, if it was a generator, marks it in place.
  fn lower_func_expr(&mut self, node: &mut ExprNode) {
    let Expr::Func(fe) = node.stx.as_mut() else {
      return;
    };
    let func = &mut *fe.stx.func.stx;
    if !self.options.should_lower(func.generator, func.async_) {
      if func.generator || func.async_ {
        trace!("function expression left as is");
      }
      return;
    }
    let was_generator = func.generator;
    // The function needs a name to refer to itself from inside the wrapper.
    let name = match &fe.stx.name {
      Some(name) => name.clone(),
      None => {
        let name = self.names.generate("_callee");
        fe.stx.name = Some(name.clone());
        name
      }
    };
    let func = &mut *fe.stx.func.stx;
    if !self.lower(func, &name, Some(build::id(name.clone()))) {
      return;
    }
    if was_generator {
      let lowered = std::mem::replace(node, build::null());
      let mark = build::member(build::id(self.options.runtime.clone()), "mark");
      *node = build::call(mark, vec![lowered]);
    }
  }

  // Methods have no binding of their own name, so the wrapper gets no reference to the function object.
  fn lower_method(&mut self, func: &mut Func) {
    if !self.options.should_lower(func.generator, func.async_) {
      return;
    }
    let name = self.names.generate("_callee");
    self.lower(func, &name, None);
  }

  fn exit_expr_node(&mut self, node: &mut ExprNode) {
    if self.error.is_some() {
      return;
    }
    if matches!(node.stx.as_ref(), Expr::Func(_)) {
      self.lower_func_expr(node);
      return;
    }
    let Expr::ArrowFunc(af) = node.stx.as_mut() else {
      return;
    };
    let func = &mut *af.stx.func.stx;
    if !self.options.should_lower(func.generator, func.async_) {
      if func.async_ {
        trace!("arrow function left as is");
      }
      return;
    }
    let name = self.names.generate("_callee");
    self.lower(func, &name, None);
  }

  fn exit_obj_member_node(&mut self, node: &mut ObjMemberNode) {
    if self.error.is_some() {
      return;
    }
    let ObjMemberType::Valued { val, .. } = &mut node.stx.typ else {
      return;
    };
    let ClassOrObjVal::Method(method) = val else {
      return;
    };
    if !method.stx.generator {
      self.lower_method(&mut method.stx);
      return;
    }
    if !self.options.should_lower(method.stx.generator, method.stx.async_) {
      return;
    }
    // `*m() {}` becomes `m: function* () {}` so the generator can be marked like any other function expression.
    let ClassOrObjVal::Method(method) = std::mem::replace(val, ClassOrObjVal::Prop(None)) else {
      unreachable!();
    };
    let mut func_expr = build::func_expr(None, method);
    self.lower_func_expr(&mut func_expr);
    *val = ClassOrObjVal::Prop(Some(func_expr));
  }

  fn exit_class_member_node(&mut self, node: &mut ClassMemberNode) {
    if self.error.is_some() {
      return;
    }
    if let ClassOrObjVal::Method(method) = &mut node.stx.val {
      self.lower_method(&mut method.stx);
    }
  }
}

/// Lowers every generator and async function in the program that `options` enables.
pub fn regenerate(top: &mut TopLevel, options: &RegenOptions) -> RegenResult<()> {
  let span = debug_span!("regenerate", runtime = options.runtime.as_str());
  let _guard = span.enter();
  let mut names = NameGen::new();
  names.reserve_all(&*top);
  names.reserve(options.runtime.clone());
  let mut visitor = Regenerate {
    options,
    scopes: Vec::new(),
    names,
    error: None,
  };
  top.drive_mut(&mut visitor);
  match visitor.error {
    Some(err) => Err(err),
    None => Ok(()),
  }
}
