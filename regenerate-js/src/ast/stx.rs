use super::node::Node;
use super::stmt::Stmt;
use derive_visitor::Drive;
use derive_visitor::DriveMut;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Drive, DriveMut, Serialize, Deserialize)]
pub struct TopLevel {
  pub body: Vec<Node<Stmt>>,
}
