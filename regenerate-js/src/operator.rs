use ahash::HashMap;
use ahash::HashMapExt;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorName {
  Addition,
  Assignment,
  AssignmentAddition,
  AssignmentBitwiseAnd,
  AssignmentBitwiseLeftShift,
  AssignmentBitwiseOr,
  AssignmentBitwiseRightShift,
  AssignmentBitwiseUnsignedRightShift,
  AssignmentBitwiseXor,
  AssignmentDivision,
  AssignmentExponentiation,
  AssignmentMultiplication,
  AssignmentRemainder,
  AssignmentSubtraction,
  BitwiseAnd,
  BitwiseLeftShift,
  BitwiseNot,
  BitwiseOr,
  BitwiseRightShift,
  BitwiseUnsignedRightShift,
  BitwiseXor,
  Comma,
  Conditional,
  Delete,
  Division,
  Equality,
  Exponentiation,
  GreaterThan,
  GreaterThanOrEqual,
  In,
  Inequality,
  Instanceof,
  LessThan,
  LessThanOrEqual,
  LogicalAnd,
  LogicalNot,
  LogicalOr,
  Multiplication,
  PostfixDecrement,
  PostfixIncrement,
  PrefixDecrement,
  PrefixIncrement,
  Remainder,
  StrictEquality,
  StrictInequality,
  Subtraction,
  Typeof,
  UnaryNegation,
  UnaryPlus,
  Void,
}

impl OperatorName {
  pub fn is_assignment(self) -> bool {
    matches!(
      self,
      OperatorName::Assignment
        | OperatorName::AssignmentAddition
        | OperatorName::AssignmentBitwiseAnd
        | OperatorName::AssignmentBitwiseLeftShift
        | OperatorName::AssignmentBitwiseOr
        | OperatorName::AssignmentBitwiseRightShift
        | OperatorName::AssignmentBitwiseUnsignedRightShift
        | OperatorName::AssignmentBitwiseXor
        | OperatorName::AssignmentDivision
        | OperatorName::AssignmentExponentiation
        | OperatorName::AssignmentMultiplication
        | OperatorName::AssignmentRemainder
        | OperatorName::AssignmentSubtraction
    )
  }

  pub fn is_logical(self) -> bool {
    matches!(self, OperatorName::LogicalAnd | OperatorName::LogicalOr)
  }

  /// Source text of the operator. Word operators do not include the separating space.
  pub fn text(self) -> &'static str {
    match self {
      OperatorName::Addition | OperatorName::UnaryPlus => "+",
      OperatorName::Assignment => "=",
      OperatorName::AssignmentAddition => "+=",
      OperatorName::AssignmentBitwiseAnd => "&=",
      OperatorName::AssignmentBitwiseLeftShift => "<<=",
      OperatorName::AssignmentBitwiseOr => "|=",
      OperatorName::AssignmentBitwiseRightShift => ">>=",
      OperatorName::AssignmentBitwiseUnsignedRightShift => ">>>=",
      OperatorName::AssignmentBitwiseXor => "^=",
      OperatorName::AssignmentDivision => "/=",
      OperatorName::AssignmentExponentiation => "**=",
      OperatorName::AssignmentMultiplication => "*=",
      OperatorName::AssignmentRemainder => "%=",
      OperatorName::AssignmentSubtraction => "-=",
      OperatorName::BitwiseAnd => "&",
      OperatorName::BitwiseLeftShift => "<<",
      OperatorName::BitwiseNot => "~",
      OperatorName::BitwiseOr => "|",
      OperatorName::BitwiseRightShift => ">>",
      OperatorName::BitwiseUnsignedRightShift => ">>>",
      OperatorName::BitwiseXor => "^",
      OperatorName::Comma => ",",
      OperatorName::Conditional => "?",
      OperatorName::Delete => "delete",
      OperatorName::Division => "/",
      OperatorName::Equality => "==",
      OperatorName::Exponentiation => "**",
      OperatorName::GreaterThan => ">",
      OperatorName::GreaterThanOrEqual => ">=",
      OperatorName::In => "in",
      OperatorName::Inequality => "!=",
      OperatorName::Instanceof => "instanceof",
      OperatorName::LessThan => "<",
      OperatorName::LessThanOrEqual => "<=",
      OperatorName::LogicalAnd => "&&",
      OperatorName::LogicalNot => "!",
      OperatorName::LogicalOr => "||",
      OperatorName::Multiplication => "*",
      OperatorName::PostfixDecrement | OperatorName::PrefixDecrement => "--",
      OperatorName::PostfixIncrement | OperatorName::PrefixIncrement => "++",
      OperatorName::Remainder => "%",
      OperatorName::StrictEquality => "===",
      OperatorName::StrictInequality => "!==",
      OperatorName::Subtraction | OperatorName::UnaryNegation => "-",
      OperatorName::Typeof => "typeof",
      OperatorName::Void => "void",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Associativity {
  Left,
  Right,
}

pub struct Operator {
  pub name: OperatorName,
  pub precedence: u8,
  pub associativity: Associativity,
}

// Precedence levels, lowest binding first. Call and member access sit at 18, primary expressions at 19.
const PRECEDENCE_LEVELS: &[(&[OperatorName], Associativity)] = &[
  (&[OperatorName::Comma], Associativity::Left),
  (
    &[
      OperatorName::Assignment,
      OperatorName::AssignmentAddition,
      OperatorName::AssignmentBitwiseAnd,
      OperatorName::AssignmentBitwiseLeftShift,
      OperatorName::AssignmentBitwiseOr,
      OperatorName::AssignmentBitwiseRightShift,
      OperatorName::AssignmentBitwiseUnsignedRightShift,
      OperatorName::AssignmentBitwiseXor,
      OperatorName::AssignmentDivision,
      OperatorName::AssignmentExponentiation,
      OperatorName::AssignmentMultiplication,
      OperatorName::AssignmentRemainder,
      OperatorName::AssignmentSubtraction,
    ],
    Associativity::Right,
  ),
  (&[OperatorName::Conditional], Associativity::Right),
  (&[OperatorName::LogicalOr], Associativity::Left),
  (&[OperatorName::LogicalAnd], Associativity::Left),
  (&[OperatorName::BitwiseOr], Associativity::Left),
  (&[OperatorName::BitwiseXor], Associativity::Left),
  (&[OperatorName::BitwiseAnd], Associativity::Left),
  (
    &[
      OperatorName::Equality,
      OperatorName::Inequality,
      OperatorName::StrictEquality,
      OperatorName::StrictInequality,
    ],
    Associativity::Left,
  ),
  (
    &[
      OperatorName::LessThan,
      OperatorName::LessThanOrEqual,
      OperatorName::GreaterThan,
      OperatorName::GreaterThanOrEqual,
      OperatorName::In,
      OperatorName::Instanceof,
    ],
    Associativity::Left,
  ),
  (
    &[
      OperatorName::BitwiseLeftShift,
      OperatorName::BitwiseRightShift,
      OperatorName::BitwiseUnsignedRightShift,
    ],
    Associativity::Left,
  ),
  (
    &[OperatorName::Addition, OperatorName::Subtraction],
    Associativity::Left,
  ),
  (
    &[
      OperatorName::Multiplication,
      OperatorName::Division,
      OperatorName::Remainder,
    ],
    Associativity::Left,
  ),
  (&[OperatorName::Exponentiation], Associativity::Right),
  (
    &[
      OperatorName::BitwiseNot,
      OperatorName::Delete,
      OperatorName::LogicalNot,
      OperatorName::PrefixDecrement,
      OperatorName::PrefixIncrement,
      OperatorName::Typeof,
      OperatorName::UnaryNegation,
      OperatorName::UnaryPlus,
      OperatorName::Void,
    ],
    Associativity::Right,
  ),
  (
    &[OperatorName::PostfixDecrement, OperatorName::PostfixIncrement],
    Associativity::Left,
  ),
];

pub static OPERATORS: Lazy<HashMap<OperatorName, Operator>> = Lazy::new(|| {
  let mut map = HashMap::<OperatorName, Operator>::new();
  for (i, (names, associativity)) in PRECEDENCE_LEVELS.iter().enumerate() {
    let precedence = (i + 1) as u8;
    for &name in names.iter() {
      map.insert(name, Operator {
        name,
        precedence,
        associativity: *associativity,
      });
    }
  }
  map
});
