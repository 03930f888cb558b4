use derive_visitor::{Drive, DriveMut};
use serde::{Deserialize, Serialize};

use super::expr::Expr;
use super::func::Func;
use super::node::Node;

// Shared by object literals, object patterns and class bodies.
#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub enum ClassOrObjKey {
  // Identifier names, and string or number keys already normalized to their property name.
  Direct(#[drive(skip)] String),
  Computed(Node<Expr>),
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub enum ClassOrObjVal {
  Getter(Node<Func>),
  Setter(Node<Func>),
  Method(Node<Func>),
  // Class fields may omit the initializer; object properties always have one.
  Prop(Option<Node<Expr>>),
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub enum ObjMemberType {
  Valued { key: ClassOrObjKey, val: ClassOrObjVal },
  Rest { val: Node<Expr> },
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ObjMember {
  pub typ: ObjMemberType,
}

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct ClassMember {
  pub key: ClassOrObjKey,
  #[drive(skip)]
  pub static_: bool,
  pub val: ClassOrObjVal,
}
