use derive_visitor::{Drive, DriveMut};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a node, used to key side tables (memoized analysis, location placeholders).
/// Ids are unique per process; a cloned node keeps the id of the node it was cloned from, so it shares any memoized facts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
  pub fn fresh() -> NodeId {
    NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
  }
}

impl Debug for NodeId {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

#[derive(Clone, Drive, DriveMut)]
pub struct Node<S: Drive + DriveMut> {
  // Synthesized nodes get ids too, so there is no separate "no id" state.
  #[drive(skip)]
  pub id: NodeId,
  pub stx: Box<S>,
}

impl<S: Drive + DriveMut> Node<S> {
  pub fn new(stx: S) -> Node<S> {
    Node {
      id: NodeId::fresh(),
      stx: Box::new(stx),
    }
  }

  /// Maps the syntax, keeping the id.
  pub fn map_stx<T: Drive + DriveMut, F: FnOnce(S) -> T>(self, f: F) -> Node<T> {
    Node {
      id: self.id,
      stx: Box::new(f(*self.stx)),
    }
  }

  /// Wraps the node in the enum variant that holds it, e.g. `Node<IdExpr>` into `Node<Expr>`.
  pub fn into_wrapped<T: From<Node<S>> + Drive + DriveMut>(self) -> Node<T> {
    Node::new(T::from(self))
  }
}

impl<S: Debug + Drive + DriveMut> Debug for Node<S> {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    self.stx.fmt(f)
  }
}

impl<S: Serialize + Drive + DriveMut> Serialize for Node<S> {
  fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
    self.stx.serialize(serializer)
  }
}

impl<'de, S: Deserialize<'de> + Drive + DriveMut> Deserialize<'de> for Node<S> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    S::deserialize(deserializer).map(Node::new)
  }
}
