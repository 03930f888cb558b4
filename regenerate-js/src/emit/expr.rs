use crate::ast::class_or_object::ClassMember;
use crate::ast::class_or_object::ClassOrObjKey;
use crate::ast::class_or_object::ClassOrObjVal;
use crate::ast::class_or_object::ObjMemberType;
use crate::ast::expr::*;
use crate::ast::func::Func;
use crate::ast::func::FuncBody;
use crate::ast::node::Node;
use crate::ast::pat::ArrPat;
use crate::ast::pat::ObjPat;
use crate::ast::pat::Pat;
use crate::operator::OperatorName;

use super::emitter::quote_string;
use super::emitter::Emitter;
use super::precedence::child_min_prec_for_binary;
use super::precedence::expr_prec;
use super::precedence::leftmost;
use super::precedence::needs_parens;
use super::precedence::Prec;
use super::precedence::Side;
use super::precedence::ASSIGNMENT_PRECEDENCE;
use super::precedence::CALL_MEMBER_PRECEDENCE;
use super::precedence::UNARY_PRECEDENCE;
use super::stmt::emit_stmt;
use super::with_node_context;
use super::EmitError;
use super::EmitResult;

pub fn emit_expr(em: &mut Emitter, expr: &Node<Expr>) -> EmitResult {
  emit_expr_with_min_prec(em, expr, Prec::new(1))
}

pub(super) fn emit_expr_with_min_prec(
  em: &mut Emitter,
  expr: &Node<Expr>,
  min_prec: Prec,
) -> EmitResult {
  if needs_parens(expr_prec(expr), min_prec) {
    em.write_punct("(");
    emit_expr_no_parens(em, expr)?;
    em.write_punct(")");
    Ok(())
  } else {
    emit_expr_no_parens(em, expr)
  }
}

/// Expressions that would be misread when they open a statement or an arrow body.
pub(super) fn starts_ambiguously(expr: &Node<Expr>) -> bool {
  matches!(
    leftmost(expr).stx.as_ref(),
    Expr::Class(_) | Expr::Func(_) | Expr::LitObj(_) | Expr::ObjPat(_)
  )
}

fn emit_expr_no_parens(em: &mut Emitter, expr: &Node<Expr>) -> EmitResult {
  with_node_context(expr.id, || match expr.stx.as_ref() {
    Expr::ArrowFunc(arrow) => emit_func(em, None, &arrow.stx.func),
    Expr::Await(await_) => {
      em.write_keyword("await");
      emit_expr_with_min_prec(em, &await_.stx.argument, UNARY_PRECEDENCE)
    }
    Expr::Binary(binary) => emit_binary(em, binary),
    Expr::Call(call) => {
      emit_expr_with_min_prec(em, &call.stx.callee, CALL_MEMBER_PRECEDENCE)?;
      emit_args(em, &call.stx.arguments)
    }
    Expr::Class(class) => emit_class(
      em,
      class.stx.name.as_deref(),
      class.stx.extends.as_ref(),
      &class.stx.members,
    ),
    Expr::ComputedMember(member) => {
      emit_member_object(em, &member.stx.object)?;
      em.write_punct("[");
      emit_expr(em, &member.stx.member)?;
      em.write_punct("]");
      Ok(())
    }
    Expr::Cond(cond) => {
      let prec = Prec::new(crate::operator::OPERATORS[&OperatorName::Conditional].precedence);
      emit_expr_with_min_prec(em, &cond.stx.test, prec.tighter())?;
      em.write_punct("?");
      emit_expr_with_min_prec(em, &cond.stx.consequent, ASSIGNMENT_PRECEDENCE)?;
      em.write_punct(":");
      emit_expr_with_min_prec(em, &cond.stx.alternate, ASSIGNMENT_PRECEDENCE)
    }
    Expr::Func(func) => emit_func(em, func.stx.name.as_deref(), &func.stx.func),
    Expr::Id(id) => {
      if id.stx.name.is_empty() {
        return Err(EmitError::unsupported("empty identifier"));
      }
      em.write_identifier(&id.stx.name);
      Ok(())
    }
    Expr::Member(member) => {
      emit_member_object(em, &member.stx.left)?;
      emit_property_access(em, &member.stx.right);
      Ok(())
    }
    Expr::MetaProp(meta) => {
      em.write_keyword(&meta.stx.meta);
      em.write_punct(".");
      em.write_identifier(&meta.stx.property);
      Ok(())
    }
    Expr::New(new) => {
      em.write_keyword("new");
      // `new f()()` and `new (f())()` differ, so a callee holding a call keeps its own parentheses.
      if contains_call(&new.stx.callee) {
        em.write_punct("(");
        emit_expr(em, &new.stx.callee)?;
        em.write_punct(")");
      } else {
        emit_expr_with_min_prec(em, &new.stx.callee, CALL_MEMBER_PRECEDENCE)?;
      }
      emit_args(em, &new.stx.arguments)
    }
    Expr::This(_) => {
      em.write_keyword("this");
      Ok(())
    }
    Expr::Unary(unary) => {
      let op = unary.stx.operator;
      match op {
        OperatorName::Delete | OperatorName::Typeof | OperatorName::Void => {
          em.write_keyword(op.text())
        }
        _ => em.write_punct(op.text()),
      };
      emit_expr_with_min_prec(em, &unary.stx.argument, UNARY_PRECEDENCE)
    }
    Expr::UnaryPostfix(unary) => {
      emit_expr_with_min_prec(em, &unary.stx.argument, CALL_MEMBER_PRECEDENCE)?;
      em.write_punct(unary.stx.operator.text());
      Ok(())
    }
    Expr::Yield(yield_) => {
      em.write_keyword("yield");
      if yield_.stx.delegate {
        em.write_punct("*");
      }
      match &yield_.stx.argument {
        Some(argument) => emit_expr_with_min_prec(em, argument, ASSIGNMENT_PRECEDENCE),
        None => Ok(()),
      }
    }
    Expr::LitArr(arr) => emit_lit_arr(em, arr),
    Expr::LitBool(lit) => {
      em.write_keyword(if lit.stx.value { "true" } else { "false" });
      Ok(())
    }
    Expr::LitNull(_) => {
      em.write_keyword("null");
      Ok(())
    }
    Expr::LitNum(lit) => {
      emit_number(em, lit.stx.value);
      Ok(())
    }
    Expr::LitObj(obj) => {
      em.write_punct("{");
      for (idx, member) in obj.stx.members.iter().enumerate() {
        if idx > 0 {
          em.write_punct(",");
        }
        match &member.stx.typ {
          ObjMemberType::Valued { key, val } => emit_member(em, key, val, false)?,
          ObjMemberType::Rest { val } => {
            em.write_punct("...");
            emit_expr_with_min_prec(em, val, ASSIGNMENT_PRECEDENCE)?;
          }
        };
      }
      em.write_punct("}");
      Ok(())
    }
    Expr::LitRegex(lit) => {
      em.write_regex(&lit.stx.value);
      Ok(())
    }
    Expr::LitStr(lit) => {
      em.write_string_literal(&quote_string(&lit.stx.value));
      Ok(())
    }
    Expr::LitTemplate(lit) => {
      em.write_template("`");
      for part in lit.stx.parts.iter() {
        match part {
          LitTemplatePart::String(raw) => em.write_template(raw),
          LitTemplatePart::Substitution(expr) => {
            em.write_template("${");
            emit_expr(em, expr)?;
            em.write_template("}");
          }
        };
      }
      em.write_template("`");
      Ok(())
    }
    Expr::ArrPat(pat) => emit_arr_pat(em, &pat.stx),
    Expr::ObjPat(pat) => emit_obj_pat(em, &pat.stx),
  })
}

fn emit_binary(em: &mut Emitter, binary: &Node<BinaryExpr>) -> EmitResult {
  let op = binary.stx.operator;
  emit_expr_with_min_prec(
    em,
    &binary.stx.left,
    child_min_prec_for_binary(op, Side::Left),
  )?;
  match op {
    OperatorName::In | OperatorName::Instanceof => em.write_keyword(op.text()),
    _ => em.write_punct(op.text()),
  };
  emit_expr_with_min_prec(
    em,
    &binary.stx.right,
    child_min_prec_for_binary(op, Side::Right),
  )
}

fn emit_member_object(em: &mut Emitter, object: &Node<Expr>) -> EmitResult {
  // `1.toString` would lex the dot as part of the number.
  if matches!(object.stx.as_ref(), Expr::LitNum(_)) {
    em.write_punct("(");
    emit_expr(em, object)?;
    em.write_punct(")");
    return Ok(());
  }
  emit_expr_with_min_prec(em, object, CALL_MEMBER_PRECEDENCE)
}

fn emit_args(em: &mut Emitter, args: &[Node<CallArg>]) -> EmitResult {
  em.write_punct("(");
  for (idx, arg) in args.iter().enumerate() {
    if idx > 0 {
      em.write_punct(",");
    }
    if arg.stx.spread {
      em.write_punct("...");
    }
    emit_expr_with_min_prec(em, &arg.stx.value, ASSIGNMENT_PRECEDENCE)?;
  }
  em.write_punct(")");
  Ok(())
}

fn emit_lit_arr(em: &mut Emitter, arr: &Node<LitArrExpr>) -> EmitResult {
  em.write_punct("[");
  let elements = &arr.stx.elements;
  for (idx, elem) in elements.iter().enumerate() {
    if idx > 0 {
      em.write_punct(",");
    }
    match elem {
      LitArrElem::Single(expr) => emit_expr_with_min_prec(em, expr, ASSIGNMENT_PRECEDENCE)?,
      LitArrElem::Rest(expr) => {
        em.write_punct("...");
        emit_expr_with_min_prec(em, expr, ASSIGNMENT_PRECEDENCE)?;
      }
      LitArrElem::Empty => {}
    };
  }
  // A trailing hole is only kept if followed by a comma.
  if matches!(elements.last(), Some(LitArrElem::Empty)) {
    em.write_punct(",");
  }
  em.write_punct("]");
  Ok(())
}

fn emit_number(em: &mut Emitter, value: f64) {
  if value.is_nan() {
    em.write_punct("(");
    em.write_number("0");
    em.write_punct("/");
    em.write_number("0");
    em.write_punct(")");
    return;
  }
  if value.is_sign_negative() {
    em.write_punct("-");
  }
  let abs = value.abs();
  if abs.is_infinite() {
    em.write_punct("(");
    em.write_number("1");
    em.write_punct("/");
    em.write_number("0");
    em.write_punct(")");
  } else {
    // Display prints integral floats without a fractional part.
    em.write_number(&abs.to_string());
  }
}

pub(super) fn is_identifier_name(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
    _ => return false,
  };
  chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn emit_property_access(em: &mut Emitter, name: &str) {
  if is_identifier_name(name) {
    em.write_punct(".");
    em.write_identifier(name);
  } else {
    em.write_punct("[");
    em.write_string_literal(&quote_string(name));
    em.write_punct("]");
  }
}

fn emit_property_key(em: &mut Emitter, key: &ClassOrObjKey) -> EmitResult {
  match key {
    ClassOrObjKey::Direct(name) if is_identifier_name(name) => em.write_identifier(name),
    ClassOrObjKey::Direct(name) => em.write_string_literal(&quote_string(name)),
    ClassOrObjKey::Computed(expr) => {
      em.write_punct("[");
      emit_expr_with_min_prec(em, expr, ASSIGNMENT_PRECEDENCE)?;
      em.write_punct("]");
    }
  };
  Ok(())
}

// A member of an object literal or class body, after any `static`.
fn emit_member(em: &mut Emitter, key: &ClassOrObjKey, val: &ClassOrObjVal, in_class: bool) -> EmitResult {
  match val {
    ClassOrObjVal::Prop(value) => {
      emit_property_key(em, key)?;
      match (value, in_class) {
        (Some(value), false) => {
          em.write_punct(":");
          emit_expr_with_min_prec(em, value, ASSIGNMENT_PRECEDENCE)?;
        }
        (Some(value), true) => {
          em.write_punct("=");
          emit_expr_with_min_prec(em, value, ASSIGNMENT_PRECEDENCE)?;
        }
        (None, false) => return Err(EmitError::unsupported("object property without a value")),
        (None, true) => {}
      };
      if in_class {
        em.write_punct(";");
      }
      Ok(())
    }
    ClassOrObjVal::Getter(func) => {
      em.write_keyword("get");
      emit_property_key(em, key)?;
      emit_params_and_body(em, func)
    }
    ClassOrObjVal::Setter(func) => {
      em.write_keyword("set");
      emit_property_key(em, key)?;
      emit_params_and_body(em, func)
    }
    ClassOrObjVal::Method(func) => {
      if func.stx.async_ {
        em.write_keyword("async");
      }
      if func.stx.generator {
        em.write_punct("*");
      }
      emit_property_key(em, key)?;
      emit_params_and_body(em, func)
    }
  }
}

/// Prints a class expression, or (with a name) the body of a class declaration.
pub(super) fn emit_class(
  em: &mut Emitter,
  name: Option<&str>,
  extends: Option<&Node<Expr>>,
  members: &[Node<ClassMember>],
) -> EmitResult {
  em.write_keyword("class");
  if let Some(name) = name {
    em.write_identifier(name);
  }
  if let Some(extends) = extends {
    em.write_keyword("extends");
    emit_expr_with_min_prec(em, extends, CALL_MEMBER_PRECEDENCE)?;
  }
  em.write_punct("{");
  for member in members {
    with_node_context(member.id, || {
      if member.stx.static_ {
        em.write_keyword("static");
      }
      emit_member(em, &member.stx.key, &member.stx.val, true)
    })?;
  }
  em.write_punct("}");
  Ok(())
}

fn emit_default(em: &mut Emitter, default_value: Option<&Node<Expr>>) -> EmitResult {
  if let Some(default_value) = default_value {
    em.write_punct("=");
    emit_expr_with_min_prec(em, default_value, ASSIGNMENT_PRECEDENCE)?;
  }
  Ok(())
}

fn emit_arr_pat(em: &mut Emitter, pat: &ArrPat) -> EmitResult {
  em.write_punct("[");
  for (idx, elem) in pat.elements.iter().enumerate() {
    if idx > 0 {
      em.write_punct(",");
    }
    if let Some(elem) = elem {
      emit_pat(em, &elem.target)?;
      emit_default(em, elem.default_value.as_ref())?;
    }
  }
  match &pat.rest {
    Some(rest) => {
      if !pat.elements.is_empty() {
        em.write_punct(",");
      }
      em.write_punct("...");
      emit_pat(em, rest)?;
    }
    None if matches!(pat.elements.last(), Some(None)) => em.write_punct(","),
    None => {}
  };
  em.write_punct("]");
  Ok(())
}

fn emit_obj_pat(em: &mut Emitter, pat: &ObjPat) -> EmitResult {
  em.write_punct("{");
  for (idx, prop) in pat.properties.iter().enumerate() {
    if idx > 0 {
      em.write_punct(",");
    }
    let prop = prop.stx.as_ref();
    let shorthand = match (&prop.key, prop.target.stx.as_id()) {
      (ClassOrObjKey::Direct(key), Some(name)) => prop.shorthand && key == name,
      _ => false,
    };
    if !shorthand {
      emit_property_key(em, &prop.key)?;
      em.write_punct(":");
    }
    emit_pat(em, &prop.target)?;
    emit_default(em, prop.default_value.as_ref())?;
  }
  if let Some(rest) = &pat.rest {
    if !pat.properties.is_empty() {
      em.write_punct(",");
    }
    em.write_punct("...");
    em.write_identifier(&rest.stx.name);
  }
  em.write_punct("}");
  Ok(())
}

pub(super) fn emit_pat(em: &mut Emitter, pat: &Node<Pat>) -> EmitResult {
  with_node_context(pat.id, || match pat.stx.as_ref() {
    Pat::Id(id) => {
      em.write_identifier(&id.stx.name);
      Ok(())
    }
    Pat::Arr(arr) => emit_arr_pat(em, &arr.stx),
    Pat::Obj(obj) => emit_obj_pat(em, &obj.stx),
  })
}

fn contains_call(expr: &Node<Expr>) -> bool {
  match expr.stx.as_ref() {
    Expr::Call(_) => true,
    Expr::Member(member) => contains_call(&member.stx.left),
    Expr::ComputedMember(member) => contains_call(&member.stx.object),
    _ => false,
  }
}

/// Prints a function expression, arrow function or (with a name) declaration.
pub(super) fn emit_func(em: &mut Emitter, name: Option<&str>, func: &Node<Func>) -> EmitResult {
  with_node_context(func.id, || {
    let f = func.stx.as_ref();
    if f.async_ {
      em.write_keyword("async");
    }
    if !f.arrow {
      em.write_keyword("function");
      if f.generator {
        em.write_punct("*");
      }
      if let Some(name) = name {
        em.write_identifier(name);
      }
    }
    emit_params_and_body(em, func)
  })
}

fn emit_params_and_body(em: &mut Emitter, func: &Node<Func>) -> EmitResult {
  let func = func.stx.as_ref();
  em.write_punct("(");
  for (idx, param) in func.parameters.iter().enumerate() {
    if idx > 0 {
      em.write_punct(",");
    }
    let param = param.stx.as_ref();
    if param.rest {
      if param.default_value.is_some() {
        return Err(EmitError::unsupported("rest parameter with default value"));
      }
      em.write_punct("...");
    }
    emit_pat(em, &param.pattern)?;
    emit_default(em, param.default_value.as_ref())?;
  }
  em.write_punct(")");
  if func.arrow {
    em.write_punct("=>");
  }
  match &func.body {
    FuncBody::Block(body) => {
      em.write_punct("{");
      for stmt in body {
        emit_stmt(em, stmt)?;
      }
      em.write_punct("}");
      Ok(())
    }
    FuncBody::Expression(expr) if func.arrow => {
      if starts_ambiguously(expr) {
        em.write_punct("(");
        emit_expr(em, expr)?;
        em.write_punct(")");
        Ok(())
      } else {
        emit_expr_with_min_prec(em, expr, ASSIGNMENT_PRECEDENCE)
      }
    }
    FuncBody::Expression(_) => Err(EmitError::unsupported(
      "expression body on a non-arrow function",
    )),
  }
}
