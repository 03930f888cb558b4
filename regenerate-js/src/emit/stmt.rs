use crate::ast::expr::Expr;
use crate::ast::node::Node;
use crate::ast::stmt::*;
use crate::ast::stx::TopLevel;
use crate::operator::OperatorName;

use super::emitter::Emitter;
use super::expr::emit_class;
use super::expr::emit_expr;
use super::expr::emit_expr_with_min_prec;
use super::expr::emit_func;
use super::expr::emit_pat;
use super::expr::starts_ambiguously;
use super::precedence::ASSIGNMENT_PRECEDENCE;
use super::with_node_context;
use super::EmitResult;

pub fn emit_top_level(em: &mut Emitter, top: &TopLevel) -> EmitResult {
  for stmt in &top.body {
    emit_stmt(em, stmt)?;
  }
  Ok(())
}

pub fn emit_stmt(em: &mut Emitter, stmt: &Node<Stmt>) -> EmitResult {
  with_node_context(stmt.id, || match stmt.stx.as_ref() {
    Stmt::Block(block) => emit_block(em, &block.stx.body),
    Stmt::Break(brk) => emit_jump(em, "break", brk.stx.label.as_deref()),
    Stmt::Continue(cont) => emit_jump(em, "continue", cont.stx.label.as_deref()),
    Stmt::Debugger(_) => {
      em.write_keyword("debugger");
      em.write_punct(";");
      Ok(())
    }
    Stmt::DoWhile(do_while) => {
      em.write_keyword("do");
      emit_stmt(em, &do_while.stx.body)?;
      em.write_keyword("while");
      emit_paren_expr(em, &do_while.stx.condition)?;
      em.write_punct(";");
      Ok(())
    }
    Stmt::Empty(_) => {
      em.write_punct(";");
      Ok(())
    }
    Stmt::Expr(expr) => emit_expr_stmt(em, &expr.stx.expr),
    Stmt::ForIn(for_in) => emit_for_in(em, for_in),
    Stmt::ForTriple(for_triple) => emit_for_triple(em, for_triple),
    Stmt::If(if_stmt) => emit_if(em, if_stmt),
    Stmt::Label(label) => {
      em.write_identifier(&label.stx.name);
      em.write_punct(":");
      emit_stmt(em, &label.stx.statement)
    }
    Stmt::Return(ret) => {
      em.write_keyword("return");
      if let Some(value) = &ret.stx.value {
        emit_expr(em, value)?;
      }
      em.write_punct(";");
      Ok(())
    }
    Stmt::Switch(switch) => emit_switch(em, switch),
    Stmt::Throw(throw) => {
      em.write_keyword("throw");
      emit_expr(em, &throw.stx.value)?;
      em.write_punct(";");
      Ok(())
    }
    Stmt::Try(try_stmt) => emit_try(em, try_stmt),
    Stmt::While(while_stmt) => {
      em.write_keyword("while");
      emit_paren_expr(em, &while_stmt.stx.condition)?;
      emit_stmt(em, &while_stmt.stx.body)
    }
    Stmt::With(with) => {
      em.write_keyword("with");
      emit_paren_expr(em, &with.stx.object)?;
      emit_stmt(em, &with.stx.body)
    }
    Stmt::ClassDecl(decl) => emit_class(
      em,
      Some(decl.stx.name.as_str()),
      decl.stx.extends.as_ref(),
      &decl.stx.members,
    ),
    Stmt::FunctionDecl(decl) => emit_func(em, Some(decl.stx.name.as_str()), &decl.stx.function),
    Stmt::VarDecl(decl) => {
      emit_var_decl(em, decl, false)?;
      em.write_punct(";");
      Ok(())
    }
  })
}

fn emit_block(em: &mut Emitter, body: &[Node<Stmt>]) -> EmitResult {
  em.write_punct("{");
  for stmt in body {
    emit_stmt(em, stmt)?;
  }
  em.write_punct("}");
  Ok(())
}

fn emit_jump(em: &mut Emitter, keyword: &str, label: Option<&str>) -> EmitResult {
  em.write_keyword(keyword);
  if let Some(label) = label {
    em.write_identifier(label);
  }
  em.write_punct(";");
  Ok(())
}

fn emit_paren_expr(em: &mut Emitter, expr: &Node<Expr>) -> EmitResult {
  em.write_punct("(");
  emit_expr(em, expr)?;
  em.write_punct(")");
  Ok(())
}

fn emit_expr_stmt(em: &mut Emitter, expr: &Node<Expr>) -> EmitResult {
  if starts_ambiguously(expr) {
    emit_paren_expr(em, expr)?;
  } else {
    emit_expr(em, expr)?;
  }
  em.write_punct(";");
  Ok(())
}

/// `in` inside a for-loop head would be read as a for-in loop.
fn contains_in(expr: &Node<Expr>) -> bool {
  match expr.stx.as_ref() {
    Expr::Binary(binary) => {
      binary.stx.operator == OperatorName::In
        || contains_in(&binary.stx.left)
        || contains_in(&binary.stx.right)
    }
    Expr::Cond(cond) => {
      contains_in(&cond.stx.test)
        || contains_in(&cond.stx.consequent)
        || contains_in(&cond.stx.alternate)
    }
    Expr::Unary(unary) => contains_in(&unary.stx.argument),
    Expr::Await(await_) => contains_in(&await_.stx.argument),
    Expr::Yield(yield_) => yield_.stx.argument.as_ref().is_some_and(contains_in),
    _ => false,
  }
}

fn emit_for_head_expr(em: &mut Emitter, expr: &Node<Expr>, force_parens: bool) -> EmitResult {
  if force_parens || contains_in(expr) {
    emit_paren_expr(em, expr)
  } else {
    emit_expr(em, expr)
  }
}

fn emit_var_decl(em: &mut Emitter, decl: &Node<VarDecl>, in_for_head: bool) -> EmitResult {
  em.write_keyword(match decl.stx.mode {
    VarDeclMode::Const => "const",
    VarDeclMode::Let => "let",
    VarDeclMode::Var => "var",
  });
  for (idx, declarator) in decl.stx.declarators.iter().enumerate() {
    if idx > 0 {
      em.write_punct(",");
    }
    emit_pat(em, &declarator.pattern)?;
    if let Some(init) = &declarator.initializer {
      em.write_punct("=");
      if in_for_head && contains_in(init) {
        emit_paren_expr(em, init)?;
      } else {
        emit_expr_with_min_prec(em, init, ASSIGNMENT_PRECEDENCE)?;
      }
    }
  }
  Ok(())
}

fn emit_for_in(em: &mut Emitter, for_in: &Node<ForInStmt>) -> EmitResult {
  em.write_keyword("for");
  em.write_punct("(");
  match &for_in.stx.lhs {
    ForInLhs::Decl(decl) => emit_var_decl(em, decl, true)?,
    // A call or other non-primary target is still valid when parenthesized.
    ForInLhs::Assign(target) => emit_for_head_expr(
      em,
      target,
      !matches!(
        target.stx.as_ref(),
        Expr::Id(_) | Expr::Member(_) | Expr::ComputedMember(_) | Expr::ArrPat(_) | Expr::ObjPat(_)
      ),
    )?,
  };
  em.write_keyword("in");
  emit_expr(em, &for_in.stx.rhs)?;
  em.write_punct(")");
  emit_stmt(em, &for_in.stx.body)
}

fn emit_for_triple(em: &mut Emitter, for_triple: &Node<ForTripleStmt>) -> EmitResult {
  em.write_keyword("for");
  em.write_punct("(");
  match &for_triple.stx.init {
    ForTripleStmtInit::None => {}
    ForTripleStmtInit::Expr(expr) => emit_for_head_expr(em, expr, starts_ambiguously(expr))?,
    ForTripleStmtInit::Decl(decl) => emit_var_decl(em, decl, true)?,
  };
  em.write_punct(";");
  if let Some(cond) = &for_triple.stx.cond {
    emit_expr(em, cond)?;
  }
  em.write_punct(";");
  if let Some(post) = &for_triple.stx.post {
    emit_expr(em, post)?;
  }
  em.write_punct(")");
  emit_stmt(em, &for_triple.stx.body)
}

fn emit_if(em: &mut Emitter, if_stmt: &Node<IfStmt>) -> EmitResult {
  em.write_keyword("if");
  emit_paren_expr(em, &if_stmt.stx.test)?;
  match &if_stmt.stx.alternate {
    None => emit_stmt(em, &if_stmt.stx.consequent),
    Some(alternate) => {
      // Braces stop a nested else-less `if` from capturing our `else`.
      if matches!(if_stmt.stx.consequent.stx.as_ref(), Stmt::Block(_)) {
        emit_stmt(em, &if_stmt.stx.consequent)?;
      } else {
        em.write_punct("{");
        emit_stmt(em, &if_stmt.stx.consequent)?;
        em.write_punct("}");
      }
      em.write_keyword("else");
      emit_stmt(em, alternate)
    }
  }
}

fn emit_switch(em: &mut Emitter, switch: &Node<SwitchStmt>) -> EmitResult {
  em.write_keyword("switch");
  emit_paren_expr(em, &switch.stx.test)?;
  em.write_punct("{");
  for branch in &switch.stx.branches {
    match &branch.stx.case {
      Some(case) => {
        em.write_keyword("case");
        emit_expr(em, case)?;
      }
      None => em.write_keyword("default"),
    };
    em.write_punct(":");
    for stmt in &branch.stx.body {
      emit_stmt(em, stmt)?;
    }
  }
  em.write_punct("}");
  Ok(())
}

fn emit_try(em: &mut Emitter, try_stmt: &Node<TryStmt>) -> EmitResult {
  em.write_keyword("try");
  emit_block(em, &try_stmt.stx.wrapped.stx.body)?;
  if let Some(catch) = &try_stmt.stx.catch {
    em.write_keyword("catch");
    if let Some(param) = &catch.stx.parameter {
      em.write_punct("(");
      emit_pat(em, param)?;
      em.write_punct(")");
    }
    emit_block(em, &catch.stx.body)?;
  }
  if let Some(finally) = &try_stmt.stx.finally {
    em.write_keyword("finally");
    emit_block(em, &finally.stx.body)?;
  }
  Ok(())
}
