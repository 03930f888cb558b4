use crate::ast::expr::Expr;
use crate::ast::node::Node;
use crate::operator::Associativity;
use crate::operator::OperatorName;
use crate::operator::OPERATORS;

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct Prec(u8);

impl Prec {
  pub const fn new(value: u8) -> Self {
    Prec(value)
  }

  pub const fn tighter(self) -> Self {
    Prec(self.0 + 1)
  }
}

/// Anything that may appear as a call argument, array element or initializer.
pub const ASSIGNMENT_PRECEDENCE: Prec = Prec::new(2);
/// `yield` and arrow functions bind as loosely as assignment.
pub const YIELD_PRECEDENCE: Prec = ASSIGNMENT_PRECEDENCE;
pub const UNARY_PRECEDENCE: Prec = Prec::new(15);
pub const CALL_MEMBER_PRECEDENCE: Prec = Prec::new(18);
pub const PRIMARY_PRECEDENCE: Prec = Prec::new(19);

#[derive(Clone, Copy, Debug)]
pub enum Side {
  Left,
  Right,
}

fn operator_prec(op: OperatorName) -> Prec {
  Prec::new(OPERATORS[&op].precedence)
}

pub fn needs_parens(child_prec: Prec, min_prec: Prec) -> bool {
  child_prec < min_prec
}

pub fn child_min_prec_for_binary(op: OperatorName, side: Side) -> Prec {
  let operator = &OPERATORS[&op];
  let prec = Prec::new(operator.precedence);
  // `-a ** b` is a syntax error, so the base of an exponent must bind tighter than any unary operator.
  if op == OperatorName::Exponentiation {
    return match side {
      Side::Left => UNARY_PRECEDENCE.tighter(),
      Side::Right => prec,
    };
  }
  match (operator.associativity, side) {
    (Associativity::Left, Side::Left) | (Associativity::Right, Side::Right) => prec,
    (Associativity::Left, Side::Right) | (Associativity::Right, Side::Left) => prec.tighter(),
  }
}

pub fn expr_prec(expr: &Node<Expr>) -> Prec {
  match expr.stx.as_ref() {
    Expr::Binary(binary) => operator_prec(binary.stx.operator),
    Expr::Cond(_) => operator_prec(OperatorName::Conditional),
    Expr::Unary(unary) => operator_prec(unary.stx.operator),
    Expr::UnaryPostfix(unary) => operator_prec(unary.stx.operator),
    Expr::Await(_) => UNARY_PRECEDENCE,
    Expr::Yield(_) => YIELD_PRECEDENCE,
    Expr::ArrowFunc(_) => ASSIGNMENT_PRECEDENCE,
    Expr::Call(_) | Expr::Member(_) | Expr::ComputedMember(_) | Expr::New(_) => {
      CALL_MEMBER_PRECEDENCE
    }
    // Printed with a leading minus sign.
    Expr::LitNum(num) if num.stx.value.is_sign_negative() && !num.stx.value.is_nan() => {
      UNARY_PRECEDENCE
    }
    Expr::ArrPat(_)
    | Expr::Class(_)
    | Expr::Func(_)
    | Expr::Id(_)
    | Expr::MetaProp(_)
    | Expr::ObjPat(_)
    | Expr::This(_)
    | Expr::LitArr(_)
    | Expr::LitBool(_)
    | Expr::LitNull(_)
    | Expr::LitNum(_)
    | Expr::LitObj(_)
    | Expr::LitRegex(_)
    | Expr::LitStr(_)
    | Expr::LitTemplate(_) => PRIMARY_PRECEDENCE,
  }
}

/// The expression whose first token starts the printed text of `expr`.
pub fn leftmost(expr: &Node<Expr>) -> &Node<Expr> {
  match expr.stx.as_ref() {
    Expr::Binary(binary) => leftmost(&binary.stx.left),
    Expr::Call(call) => leftmost(&call.stx.callee),
    Expr::ComputedMember(member) => leftmost(&member.stx.object),
    Expr::Cond(cond) => leftmost(&cond.stx.test),
    Expr::Member(member) => leftmost(&member.stx.left),
    Expr::UnaryPostfix(unary) => leftmost(&unary.stx.argument),
    _ => expr,
  }
}
