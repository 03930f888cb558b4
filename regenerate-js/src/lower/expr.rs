use crate::ast::build;
use crate::ast::class_or_object::ClassMember;
use crate::ast::class_or_object::ClassOrObjKey;
use crate::ast::class_or_object::ClassOrObjVal;
use crate::ast::class_or_object::ObjMember;
use crate::ast::class_or_object::ObjMemberType;
use crate::ast::expr::*;
use crate::ast::node::Node;
use crate::error::RegenError;
use crate::error::RegenErrorType;
use crate::error::RegenResult;
use crate::operator::OperatorName;

use super::Lowerer;

fn is_literal(expr: &Node<Expr>) -> bool {
  matches!(
    expr.stx.as_ref(),
    Expr::LitNum(_) | Expr::LitStr(_) | Expr::LitBool(_) | Expr::LitNull(_)
  )
}

fn is_member(expr: &Node<Expr>) -> bool {
  matches!(expr.stx.as_ref(), Expr::Member(_) | Expr::ComputedMember(_))
}

enum Property {
  Named(String),
  Computed(Node<Expr>),
}

impl Lowerer {
  /// Lowers an expression for its value.
  pub fn explode_value(&mut self, expr: Node<Expr>) -> RegenResult<Node<Expr>> {
    Ok(
      self
        .explode_expression(expr, false)?
        .expect("exploding for a value always produces one"),
    )
  }

  /// Lowers an expression, emitting whatever must run before its value is available.
  /// With `ignore_result`, the expression is emitted for its side effects only and usually nothing is returned.
  pub fn explode_expression(
    &mut self,
    expr: Node<Expr>,
    ignore_result: bool,
  ) -> RegenResult<Option<Node<Expr>>> {
    if !self.meta.contains_leap(&expr) {
      return Ok(self.finish_expr(expr, ignore_result));
    }

    // Once any child leaps, sibling subexpressions are stored in temps so their side effects keep their order relative to the leap.
    let has_leaping_children = self.meta.children_contain_leap(&expr);

    let id = expr.id;
    match *expr.stx {
      Expr::Member(n) => {
        let MemberExpr { left, right } = *n.stx;
        let object = self.explode_value(left)?;
        Ok(self.finish_expr(build::member(object, right), ignore_result))
      }
      Expr::ComputedMember(n) => {
        let ComputedMemberExpr { object, member } = *n.stx;
        let object = self.explode_value(object)?;
        let member = self.explode_via_temp_var(None, member, has_leaping_children)?;
        Ok(self.finish_expr(build::computed_member(object, member), ignore_result))
      }
      Expr::Call(n) => {
        let call = self.explode_call(*n.stx, has_leaping_children)?;
        Ok(self.finish_expr(call, ignore_result))
      }
      Expr::New(n) => {
        let NewExpr { callee, arguments } = *n.stx;
        let callee = self.explode_via_temp_var(None, callee, has_leaping_children)?;
        let arguments = self.explode_arguments(arguments, has_leaping_children)?;
        let new = Node::new(NewExpr { callee, arguments }).into_wrapped();
        Ok(self.finish_expr(new, ignore_result))
      }
      Expr::LitObj(n) => {
        let mut members = Vec::new();
        for member in n.stx.members {
          let typ = match member.stx.typ {
            ObjMemberType::Valued { key, val } => {
              let key = self.explode_key(key, has_leaping_children)?;
              let val = match val {
                ClassOrObjVal::Prop(Some(value)) => ClassOrObjVal::Prop(Some(
                  self.explode_via_temp_var(None, value, has_leaping_children)?,
                )),
                val => val,
              };
              ObjMemberType::Valued { key, val }
            }
            ObjMemberType::Rest { val } => ObjMemberType::Rest {
              val: self.explode_via_temp_var(None, val, has_leaping_children)?,
            },
          };
          members.push(Node {
            id: member.id,
            stx: Box::new(ObjMember { typ }),
          });
        }
        let obj = Node::new(LitObjExpr { members }).into_wrapped();
        Ok(self.finish_expr(obj, ignore_result))
      }
      Expr::LitArr(n) => {
        let mut elements = Vec::new();
        for elem in n.stx.elements {
          elements.push(match elem {
            LitArrElem::Single(e) => {
              LitArrElem::Single(self.explode_via_temp_var(None, e, has_leaping_children)?)
            }
            LitArrElem::Rest(e) => {
              LitArrElem::Rest(self.explode_via_temp_var(None, e, has_leaping_children)?)
            }
            LitArrElem::Empty => LitArrElem::Empty,
          });
        }
        Ok(self.finish_expr(build::arr(elements), ignore_result))
      }
      Expr::LitTemplate(n) => {
        let mut parts = Vec::new();
        for part in n.stx.parts {
          parts.push(match part {
            LitTemplatePart::Substitution(e) => LitTemplatePart::Substitution(
              self.explode_via_temp_var(None, e, has_leaping_children)?,
            ),
            part => part,
          });
        }
        let template = Node::new(LitTemplateExpr { parts }).into_wrapped();
        Ok(self.finish_expr(template, ignore_result))
      }
      // Only the heritage and computed keys run at definition time; member bodies stay as written.
      Expr::Class(n) => {
        let ClassExpr {
          name,
          extends,
          members,
        } = *n.stx;
        let extends = match extends {
          Some(e) => Some(self.explode_via_temp_var(None, e, has_leaping_children)?),
          None => None,
        };
        let mut new_members = Vec::new();
        for member in members {
          let member_id = member.id;
          let ClassMember { key, static_, val } = *member.stx;
          let key = self.explode_key(key, has_leaping_children)?;
          new_members.push(Node {
            id: member_id,
            stx: Box::new(ClassMember { key, static_, val }),
          });
        }
        let class = Node::new(ClassExpr {
          name,
          extends,
          members: new_members,
        })
        .into_wrapped();
        Ok(self.finish_expr(class, ignore_result))
      }
      // Defaults inside a pattern run between the reads of its properties, which cannot be split into dispatch cases.
      Expr::ArrPat(_) | Expr::ObjPat(_) => Err(RegenError::new(
        RegenErrorType::UnsupportedPattern("assignment target"),
        Some(id),
      )),
      Expr::Binary(n) => {
        let BinaryExpr {
          operator,
          left,
          right,
        } = *n.stx;
        match operator {
          OperatorName::Comma => {
            self.explode_expression(left, true)?;
            self.explode_expression(right, ignore_result)
          }
          OperatorName::LogicalAnd | OperatorName::LogicalOr => {
            let after = self.loc();
            let result = (!ignore_result).then(|| self.make_temp_var());
            let left = self.explode_via_temp_var(result.clone(), left, has_leaping_children)?;
            if operator == OperatorName::LogicalAnd {
              self.jump_if_not(left, after);
            } else {
              self.jump_if(left, after);
            }
            self.explode_branch(result.clone(), right, has_leaping_children)?;
            self.mark(after);
            Ok(result)
          }
          op if op.is_assignment() => {
            let left = self.explode_value(left)?;
            let right = self.explode_value(right)?;
            Ok(self.finish_expr(build::binary(op, left, right), ignore_result))
          }
          op => {
            let left = self.explode_via_temp_var(None, left, has_leaping_children)?;
            let right = self.explode_via_temp_var(None, right, has_leaping_children)?;
            Ok(self.finish_expr(build::binary(op, left, right), ignore_result))
          }
        }
      }
      Expr::Cond(n) => {
        let CondExpr {
          test,
          consequent,
          alternate,
        } = *n.stx;
        let else_loc = self.loc();
        let after = self.loc();
        let test = self.explode_value(test)?;
        self.jump_if_not(test, else_loc);
        let result = (!ignore_result).then(|| self.make_temp_var());
        self.explode_branch(result.clone(), consequent, has_leaping_children)?;
        self.jump(after);
        self.mark(else_loc);
        self.explode_branch(result.clone(), alternate, has_leaping_children)?;
        self.mark(after);
        Ok(result)
      }
      // The argument cannot be split further, e.g. `delete a[b]` must stay intact.
      Expr::Unary(n) => {
        let UnaryExpr { operator, argument } = *n.stx;
        let argument = self.explode_value(argument)?;
        Ok(self.finish_expr(build::unary(operator, argument), ignore_result))
      }
      Expr::UnaryPostfix(n) => {
        let UnaryPostfixExpr { operator, argument } = *n.stx;
        let argument = self.explode_value(argument)?;
        let update = Node::new(UnaryPostfixExpr { operator, argument }).into_wrapped();
        Ok(self.finish_expr(update, ignore_result))
      }
      Expr::Yield(n) => {
        let YieldExpr { argument, delegate } = *n.stx;
        let after = self.loc();
        let argument = match argument {
          Some(a) => Some(self.explode_value(a)?),
          None => None,
        };
        match (argument, delegate) {
          (Some(argument), true) => {
            let result = self.make_temp_name();
            let after_expr = self.loc_expr(after);
            let delegate = build::call(self.context_property("delegateYield"), vec![
              argument,
              build::str(result.clone()),
              after_expr,
            ]);
            self.emit(build::ret(Some(delegate)));
            self.mark(after);
            Ok(Some(self.context_property(&result)))
          }
          (argument, _) => {
            let after_expr = self.loc_expr(after);
            self.emit_assign(self.context_property("next"), after_expr);
            self.emit(build::ret(argument));
            self.mark(after);
            Ok(Some(self.context_property("sent")))
          }
        }
      }
      Expr::Await(_) => Err(RegenError::new(RegenErrorType::UnexpectedAwait, Some(id))),
      // These never contain leaps, so they were returned above.
      Expr::ArrowFunc(_)
      | Expr::Func(_)
      | Expr::Id(_)
      | Expr::MetaProp(_)
      | Expr::This(_)
      | Expr::LitBool(_)
      | Expr::LitNull(_)
      | Expr::LitNum(_)
      | Expr::LitRegex(_)
      | Expr::LitStr(_) => unreachable!(),
    }
  }

  fn finish_expr(&mut self, expr: Node<Expr>, ignore_result: bool) -> Option<Node<Expr>> {
    if ignore_result {
      self.emit_expr(expr);
      None
    } else {
      Some(expr)
    }
  }

  /// Lowers a child for its value. If `temp` is given, the value is always stored there; otherwise it is stored in a fresh temp only if a sibling leaps and the value is not a literal.
  fn explode_via_temp_var(
    &mut self,
    temp: Option<Node<Expr>>,
    child: Node<Expr>,
    has_leaping_children: bool,
  ) -> RegenResult<Node<Expr>> {
    let result = self.explode_value(child)?;
    if temp.is_some() || (has_leaping_children && !is_literal(&result)) {
      let temp = match temp {
        Some(temp) => temp,
        None => self.make_temp_var(),
      };
      Ok(self.emit_assign(temp, result))
    } else {
      Ok(result)
    }
  }

  // A branch of `&&`, `||` or `?:`: stored into the shared result temp, or emitted for effect when the result is unused.
  fn explode_branch(
    &mut self,
    result: Option<Node<Expr>>,
    child: Node<Expr>,
    has_leaping_children: bool,
  ) -> RegenResult<()> {
    match result {
      Some(result) => {
        self.explode_via_temp_var(Some(result), child, has_leaping_children)?;
      }
      None => {
        self.explode_expression(child, true)?;
      }
    };
    Ok(())
  }

  fn explode_key(
    &mut self,
    key: ClassOrObjKey,
    has_leaping_children: bool,
  ) -> RegenResult<ClassOrObjKey> {
    Ok(match key {
      ClassOrObjKey::Computed(e) => {
        ClassOrObjKey::Computed(self.explode_via_temp_var(None, e, has_leaping_children)?)
      }
      key => key,
    })
  }

  fn explode_arguments(
    &mut self,
    arguments: Vec<Node<CallArg>>,
    has_leaping_children: bool,
  ) -> RegenResult<Vec<Node<CallArg>>> {
    let mut out = Vec::with_capacity(arguments.len());
    for arg in arguments {
      let CallArg { spread, value } = *arg.stx;
      let value = self.explode_via_temp_var(None, value, has_leaping_children)?;
      out.push(Node::new(CallArg { spread, value }));
    }
    Ok(out)
  }

  fn explode_call(&mut self, call: CallExpr, has_leaping_children: bool) -> RegenResult<Node<Expr>> {
    let CallExpr { callee, arguments } = call;
    let has_leaping_args = arguments
      .iter()
      .any(|a| self.meta.contains_leap(&a.stx.value));

    let mut new_args = Vec::new();
    let new_callee = if is_member(&callee) {
      if has_leaping_args {
        // The callee must be evaluated before the arguments, but its object must still be bound as `this` for the call.
        let (object, property) = match *callee.stx {
          Expr::Member(m) => (m.stx.left, Property::Named(m.stx.right)),
          Expr::ComputedMember(m) => (m.stx.object, Property::Computed(m.stx.member)),
          _ => unreachable!(),
        };
        let object_temp = self.make_temp_var();
        let new_object = self.explode_via_temp_var(Some(object_temp), object, has_leaping_children)?;
        let function = match property {
          Property::Named(name) => build::member(new_object.clone(), name),
          Property::Computed(member) => {
            let member = self.explode_via_temp_var(None, member, has_leaping_children)?;
            build::computed_member(new_object.clone(), member)
          }
        };
        new_args.push(build::arg(new_object));
        build::member(function, "call")
      } else {
        self.explode_value(callee)?
      }
    } else {
      let new_callee = self.explode_via_temp_var(None, callee, has_leaping_children)?;
      if is_member(&new_callee) {
        // An unqualified call whose callee became a temp slot must not receive the context object as `this`.
        build::seq(vec![build::num(0.0), new_callee])
      } else {
        new_callee
      }
    };

    new_args.extend(self.explode_arguments(arguments, has_leaping_children)?);
    Ok(
      Node::new(CallExpr {
        callee: new_callee,
        arguments: new_args,
      })
      .into_wrapped(),
    )
  }
}
