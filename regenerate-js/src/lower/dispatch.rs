//! Turns a lowered listing into the re-entrant dispatch loop:
//!
//! ```text
//! while (1) switch (ctx.prev = ctx.next) {
//!   case 0: ...
//!   case N:
//!   case "end": return ctx.stop();
//! }
//! ```

use itertools::Itertools;
use std::collections::BTreeSet;

use crate::ast::build;
use crate::ast::expr::Expr;
use crate::ast::expr::LitArrElem;
use crate::ast::node::Node;
use crate::ast::stmt::Stmt;
use crate::ast::stmt::SwitchBranch;
use crate::ast::stmt::SwitchStmt;
use crate::ast::stmt::WhileStmt;

use super::ResolvedTryEntry;

fn is_completion(stmt: &Node<Stmt>) -> bool {
  matches!(
    stmt.stx.as_ref(),
    Stmt::Break(_) | Stmt::Continue(_) | Stmt::Return(_) | Stmt::Throw(_)
  )
}

/// Builds the dispatch loop. Each marked index starts a case; statements after a completion statement in the same case are unreachable and dropped.
pub fn dispatch_loop(
  listing: Vec<Node<Stmt>>,
  marked: &BTreeSet<usize>,
  final_loc: usize,
  context: &str,
) -> Node<Stmt> {
  let ctx = |name: &str| build::member(build::id(context), name);

  let mut branches: Vec<Node<SwitchBranch>> = Vec::new();
  let mut already_ended = false;
  for (i, stmt) in listing.into_iter().enumerate() {
    if marked.contains(&i) {
      branches.push(Node::new(SwitchBranch {
        case: Some(build::num(i as f64)),
        body: Vec::new(),
      }));
      already_ended = false;
    }
    if already_ended {
      continue;
    }
    let ended = is_completion(&stmt);
    branches
      .last_mut()
      .expect("index 0 is always marked")
      .stx
      .body
      .push(stmt);
    already_ended = ended;
  }

  // Falls through to "end", so the runtime can jump to the end without knowing the final offset.
  branches.push(Node::new(SwitchBranch {
    case: Some(build::num(final_loc as f64)),
    body: Vec::new(),
  }));
  branches.push(Node::new(SwitchBranch {
    case: Some(build::str("end")),
    body: vec![build::ret(Some(build::call(ctx("stop"), vec![])))],
  }));

  let switch: Node<Stmt> = Node::new(SwitchStmt {
    test: build::assign(ctx("prev"), ctx("next")),
    branches,
  })
  .into_wrapped();
  Node::new(WhileStmt {
    condition: build::num(1.0),
    body: switch,
  })
  .into_wrapped()
}

/// `[[try, catch, finally, after], ...]`, with a hole for a missing catch and the last two omitted without a finally. None if there are no try statements.
pub fn try_locs_list(entries: &[ResolvedTryEntry]) -> Option<Node<Expr>> {
  if entries.is_empty() {
    return None;
  }
  assert!(
    entries.iter().tuple_windows().all(|(a, b)| a.try_loc <= b.try_loc),
    "try entries out of order"
  );
  let lists = entries
    .iter()
    .map(|e| {
      let mut locs = vec![
        LitArrElem::Single(build::num(e.try_loc as f64)),
        match e.catch_loc {
          Some(c) => LitArrElem::Single(build::num(c as f64)),
          None => LitArrElem::Empty,
        },
      ];
      if let (Some(f), Some(a)) = (e.finally_loc, e.after_loc) {
        locs.push(LitArrElem::Single(build::num(f as f64)));
        locs.push(LitArrElem::Single(build::num(a as f64)));
      }
      LitArrElem::Single(build::arr(locs))
    })
    .collect();
  Some(build::arr(lists))
}
