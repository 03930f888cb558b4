//! Lowering of one function body into a flat listing of statements addressed by integer locations.
//!
//! Every jump target is a [`Location`], a write-once cell that is fixed to the index of the next statement appended to the listing.
//! Code referencing a location before it is fixed gets a numeric literal placeholder that is patched when lowering finishes.

mod catch_param;
pub mod dispatch;
mod expr;

use ahash::HashMap;
use ahash::HashMapExt;
use derive_visitor::DriveMut;
use derive_visitor::VisitorMut;
use std::collections::BTreeSet;

use crate::ast::build;
use crate::ast::expr::Expr;
use crate::ast::expr::LitNumExpr;
use crate::ast::node::Node;
use crate::ast::node::NodeId;
use crate::ast::stmt::*;
use crate::error::RegenError;
use crate::error::RegenErrorType;
use crate::error::RegenResult;
use crate::leap::CatchEntry;
use crate::leap::Entry;
use crate::leap::FinallyEntry;
use crate::leap::LeapManager;
use crate::leap::Location;
use crate::leap::TryEntry;
use crate::meta::Meta;
use crate::operator::OperatorName;

use catch_param::rename_catch_param;

/// A try statement's locations, fixed to listing indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedTryEntry {
  pub try_loc: usize,
  pub catch_loc: Option<usize>,
  pub finally_loc: Option<usize>,
  pub after_loc: Option<usize>,
}

/// Result of lowering one function body.
#[derive(Debug)]
pub struct Lowered {
  pub listing: Vec<Node<Stmt>>,
  /// Listing indices that start a dispatch case. Always contains 0.
  pub marked: BTreeSet<usize>,
  pub try_entries: Vec<ResolvedTryEntry>,
  /// Index one past the last listing statement; jumping here ends the machine.
  pub final_loc: usize,
  pub temp_count: usize,
}

pub enum Completion {
  Break { target: Location },
  Continue { target: Location },
  Return { value: Option<Node<Expr>> },
}

type LitNumExprNode = Node<LitNumExpr>;

#[derive(VisitorMut)]
#[visitor(LitNumExprNode(enter))]
struct PatchLocations<'a> {
  placeholders: &'a HashMap<NodeId, Location>,
  values: &'a [Option<usize>],
}

impl PatchLocations<'_> {
  fn enter_lit_num_expr_node(&mut self, node: &mut LitNumExprNode) {
    if let Some(loc) = self.placeholders.get(&node.id) {
      let value = self.values[loc.0].expect("location referenced but never fixed");
      node.stx.value = value as f64;
    }
  }
}

pub struct Lowerer {
  meta: Meta,
  context: String,
  runtime: String,
  next_temp_id: usize,
  listing: Vec<Node<Stmt>>,
  marked: BTreeSet<usize>,
  locations: Vec<Option<usize>>,
  placeholders: HashMap<NodeId, Location>,
  final_loc: Location,
  try_entries: Vec<TryEntry>,
  leap_manager: LeapManager,
}

impl Lowerer {
  pub fn new(context: impl Into<String>, runtime: impl Into<String>) -> Lowerer {
    let final_loc = Location(0);
    Lowerer {
      meta: Meta::new(),
      context: context.into(),
      runtime: runtime.into(),
      next_temp_id: 0,
      listing: Vec::new(),
      marked: BTreeSet::from([0]),
      locations: vec![None],
      placeholders: HashMap::new(),
      final_loc,
      try_entries: Vec::new(),
      leap_manager: LeapManager::new(final_loc),
    }
  }

  pub fn leap_depth(&self) -> usize {
    self.leap_manager.depth()
  }

  pub fn loc(&mut self) -> Location {
    self.locations.push(None);
    Location(self.locations.len() - 1)
  }

  pub fn loc_value(&self, loc: Location) -> Option<usize> {
    self.locations[loc.0]
  }

  fn fix(&mut self, loc: Location, index: usize) {
    let cell = &mut self.locations[loc.0];
    match *cell {
      None => *cell = Some(index),
      // Locations can be marked redundantly, but their values cannot change once set.
      Some(existing) => assert_eq!(existing, index, "location fixed twice to different values"),
    };
  }

  /// Fixes the location to the next listing index and makes that index a dispatch case.
  pub fn mark(&mut self, loc: Location) -> Location {
    let index = self.listing.len();
    self.fix(loc, index);
    self.marked.insert(index);
    loc
  }

  pub fn loc_expr(&mut self, loc: Location) -> Node<Expr> {
    assert!(loc.0 < self.locations.len(), "foreign location");
    let lit = Node::new(LitNumExpr { value: -1.0 });
    self.placeholders.insert(lit.id, loc);
    lit.into_wrapped()
  }

  pub fn emit(&mut self, stmt: Node<Stmt>) {
    self.listing.push(stmt);
  }

  pub fn emit_expr(&mut self, expr: Node<Expr>) {
    self.emit(build::expr_stmt(expr));
  }

  /// Emits `lhs = rhs;` and returns `lhs` for further use.
  pub fn emit_assign(&mut self, lhs: Node<Expr>, rhs: Node<Expr>) -> Node<Expr> {
    self.emit_expr(build::assign(lhs.clone(), rhs));
    lhs
  }

  pub fn context_property(&self, name: &str) -> Node<Expr> {
    build::member(build::id(self.context.clone()), name)
  }

  // `catch` must be accessed with brackets for old engines that reject reserved words as property names.
  pub fn context_property_computed(&self, name: &str) -> Node<Expr> {
    build::computed_member(build::id(self.context.clone()), build::str(name))
  }

  pub fn runtime_property(&self, name: &str) -> Node<Expr> {
    build::member(build::id(self.runtime.clone()), name)
  }

  pub fn jump(&mut self, to: Location) {
    let target = self.loc_expr(to);
    self.jump_to(target);
  }

  /// Unconditional jump to a computed target.
  pub fn jump_to(&mut self, target: Node<Expr>) {
    self.emit_assign(self.context_property("next"), target);
    self.emit(Node::new(BreakStmt { label: None }).into_wrapped());
  }

  fn jump_block(&mut self, to: Location) -> Node<Stmt> {
    let target = self.loc_expr(to);
    build::block(vec![
      build::expr_stmt(build::assign(self.context_property("next"), target)),
      Node::new(BreakStmt { label: None }).into_wrapped(),
    ])
  }

  pub fn jump_if(&mut self, test: Node<Expr>, to: Location) {
    let block = self.jump_block(to);
    self.emit(build::if_(test, block, None));
  }

  pub fn jump_if_not(&mut self, test: Node<Expr>, to: Location) {
    let negated = match *test.stx {
      Expr::Unary(u) if u.stx.operator == OperatorName::LogicalNot => u.stx.argument,
      stx => build::not(Node {
        id: test.id,
        stx: Box::new(stx),
      }),
    };
    let block = self.jump_block(to);
    self.emit(build::if_(negated, block, None));
  }

  pub fn make_temp_name(&mut self) -> String {
    let name = format!("t{}", self.next_temp_id);
    self.next_temp_id += 1;
    name
  }

  /// A fresh slot on the context object. Slots are never reused within a function.
  pub fn make_temp_var(&mut self) -> Node<Expr> {
    let name = self.make_temp_name();
    self.context_property(&name)
  }

  /// The current listing position as a location, without making it a dispatch case.
  pub fn get_unmarked_current_loc(&mut self) -> Location {
    let loc = self.loc();
    let index = self.listing.len();
    self.fix(loc, index);
    loc
  }

  /// Emits `ctx.prev = loc` so the runtime knows where execution fell into a try, catch or finally region without jumping.
  pub fn update_context_prev_loc(&mut self, loc: Option<Location>) {
    let loc = match loc {
      Some(loc) => {
        let index = self.listing.len();
        self.fix(loc, index);
        loc
      }
      None => self.get_unmarked_current_loc(),
    };
    let value = self.loc_expr(loc);
    self.emit_assign(self.context_property("prev"), value);
  }

  pub fn clear_pending_exception(&mut self, try_loc: Location, assignee: Option<Node<Expr>>) {
    let try_loc = self.loc_expr(try_loc);
    let catch_call = build::call(self.context_property_computed("catch"), vec![try_loc]);
    match assignee {
      Some(assignee) => {
        self.emit_assign(assignee, catch_call);
      }
      None => self.emit_expr(catch_call),
    };
  }

  pub fn emit_abrupt_completion(&mut self, completion: Completion) {
    let args = match completion {
      Completion::Break { target } => vec![build::str("break"), self.loc_expr(target)],
      Completion::Continue { target } => vec![build::str("continue"), self.loc_expr(target)],
      Completion::Return { value } => {
        let mut args = vec![build::str("return")];
        args.extend(value);
        args
      }
    };
    let call = build::call(self.context_property("abrupt"), args);
    self.emit(build::ret(Some(call)));
  }

  /// Runs `f` with `entry` pushed on the leap stack. The entry is popped on every exit path, including errors.
  pub fn with_entry<T>(
    &mut self,
    entry: Entry,
    f: impl FnOnce(&mut Lowerer) -> RegenResult<T>,
  ) -> RegenResult<T> {
    self.leap_manager.push(entry.clone());
    let res = f(self);
    self.leap_manager.pop(&entry);
    res
  }

  pub fn lower_body(&mut self, body: Vec<Node<Stmt>>) -> RegenResult<()> {
    self.explode_statements(body)
  }

  fn explode_statements(&mut self, body: Vec<Node<Stmt>>) -> RegenResult<()> {
    for stmt in body {
      self.explode_statement(stmt, None)?;
    }
    Ok(())
  }

  /// `label` is set when the statement is the body of a labeled statement, so loops can resolve labeled `continue`.
  pub fn explode_statement(&mut self, stmt: Node<Stmt>, label: Option<String>) -> RegenResult<()> {
    if matches!(stmt.stx.as_ref(), Stmt::Block(_)) {
      let Stmt::Block(block) = *stmt.stx else {
        unreachable!();
      };
      // Braces are not needed in the listing.
      return self.explode_statements(block.stx.body);
    }
    if matches!(
      stmt.stx.as_ref(),
      Stmt::VarDecl(_) | Stmt::FunctionDecl(_) | Stmt::ClassDecl(_)
    ) {
      return Err(RegenError::new(
        RegenErrorType::UnhoistedDeclaration,
        Some(stmt.id),
      ));
    }
    if !self.meta.stmt_contains_leap(&stmt) {
      // Leap-free statements keep their structure, even if they have no side effects.
      self.emit(stmt);
      return Ok(());
    }

    let id = stmt.id;
    match *stmt.stx {
      Stmt::Expr(n) => {
        self.explode_expression(n.stx.expr, true)?;
      }
      Stmt::Label(n) => {
        let LabelStmt { name, statement } = *n.stx;
        let after = self.loc();
        // A labeled loop ends up with both this entry and its own loop entry carrying the label.
        self.with_entry(
          Entry::Labeled {
            break_loc: after,
            label: name.clone(),
          },
          |this| this.explode_statement(statement, Some(name)),
        )?;
        self.mark(after);
      }
      Stmt::While(n) => {
        let WhileStmt { condition, body } = *n.stx;
        let before = self.loc();
        let after = self.loc();
        self.mark(before);
        let test = self.explode_value(condition)?;
        self.jump_if_not(test, after);
        self.with_entry(
          Entry::Loop {
            break_loc: after,
            continue_loc: before,
            label,
          },
          |this| this.explode_statement(body, None),
        )?;
        self.jump(before);
        self.mark(after);
      }
      Stmt::DoWhile(n) => {
        let DoWhileStmt { condition, body } = *n.stx;
        let first = self.loc();
        let test = self.loc();
        let after = self.loc();
        self.mark(first);
        self.with_entry(
          Entry::Loop {
            break_loc: after,
            continue_loc: test,
            label,
          },
          |this| this.explode_statement(body, None),
        )?;
        self.mark(test);
        let cond = self.explode_value(condition)?;
        self.jump_if(cond, first);
        self.mark(after);
      }
      Stmt::ForTriple(n) => {
        let ForTripleStmt {
          init,
          cond,
          post,
          body,
        } = *n.stx;
        let head = self.loc();
        let update = self.loc();
        let after = self.loc();
        match init {
          ForTripleStmtInit::None => {}
          ForTripleStmtInit::Expr(e) => {
            self.explode_expression(e, true)?;
          }
          ForTripleStmtInit::Decl(d) => {
            return Err(RegenError::new(
              RegenErrorType::UnhoistedDeclaration,
              Some(d.id),
            ));
          }
        };
        self.mark(head);
        if let Some(cond) = cond {
          let test = self.explode_value(cond)?;
          self.jump_if_not(test, after);
        }
        self.with_entry(
          Entry::Loop {
            break_loc: after,
            continue_loc: update,
            label,
          },
          |this| this.explode_statement(body, None),
        )?;
        self.mark(update);
        if let Some(post) = post {
          self.explode_expression(post, true)?;
        }
        self.jump(head);
        self.mark(after);
      }
      Stmt::ForIn(n) => {
        let ForInStmt { lhs, rhs, body } = *n.stx;
        let head = self.loc();
        let after = self.loc();
        let key_iter_next = self.make_temp_var();
        let object = self.explode_value(rhs)?;
        let keys = build::call(self.runtime_property("keys"), vec![object]);
        self.emit_assign(key_iter_next.clone(), keys);
        self.mark(head);
        let key_info = self.make_temp_var();
        let next = build::call(key_iter_next, vec![]);
        let done = build::member(build::assign(key_info.clone(), next), "done");
        self.jump_if(done, after);
        let target = match lhs {
          ForInLhs::Assign(target) => target,
          ForInLhs::Decl(d) => {
            return Err(RegenError::new(
              RegenErrorType::UnhoistedDeclaration,
              Some(d.id),
            ));
          }
        };
        self.emit_assign(target, build::member(key_info, "value"));
        self.with_entry(
          Entry::Loop {
            break_loc: after,
            continue_loc: head,
            label,
          },
          |this| this.explode_statement(body, None),
        )?;
        self.jump(head);
        self.mark(after);
      }
      Stmt::Break(n) => {
        let target = self
          .leap_manager
          .break_loc(n.stx.label.as_deref())
          .ok_or_else(|| {
            RegenError::new(RegenErrorType::UnresolvedBreak(n.stx.label.clone()), Some(id))
          })?;
        self.emit_abrupt_completion(Completion::Break { target });
      }
      Stmt::Continue(n) => {
        let target = self
          .leap_manager
          .continue_loc(n.stx.label.as_deref())
          .ok_or_else(|| {
            RegenError::new(RegenErrorType::UnresolvedContinue(n.stx.label.clone()), Some(id))
          })?;
        self.emit_abrupt_completion(Completion::Continue { target });
      }
      Stmt::Switch(n) => self.explode_switch(*n.stx)?,
      Stmt::If(n) => {
        let IfStmt {
          test,
          consequent,
          alternate,
        } = *n.stx;
        let else_loc = alternate.as_ref().map(|_| self.loc());
        let after = self.loc();
        let test = self.explode_value(test)?;
        self.jump_if_not(test, else_loc.unwrap_or(after));
        self.explode_statement(consequent, None)?;
        if let (Some(else_loc), Some(alternate)) = (else_loc, alternate) {
          self.jump(after);
          self.mark(else_loc);
          self.explode_statement(alternate, None)?;
        }
        self.mark(after);
      }
      Stmt::Return(n) => {
        let value = match n.stx.value {
          Some(v) => Some(self.explode_value(v)?),
          None => None,
        };
        self.emit_abrupt_completion(Completion::Return { value });
      }
      Stmt::With(_) => {
        return Err(RegenError::new(
          RegenErrorType::UnsupportedStatement("with"),
          Some(id),
        ));
      }
      Stmt::Try(n) => self.explode_try(*n.stx)?,
      Stmt::Throw(n) => {
        let value = self.explode_value(n.stx.value)?;
        self.emit(build::throw(value));
      }
      Stmt::Block(_)
      | Stmt::ClassDecl(_)
      | Stmt::Debugger(_)
      | Stmt::Empty(_)
      | Stmt::FunctionDecl(_)
      | Stmt::VarDecl(_) => unreachable!(),
    };
    Ok(())
  }

  fn explode_switch(&mut self, stmt: SwitchStmt) -> RegenResult<()> {
    let SwitchStmt { test, branches } = stmt;
    // Saved once, as case tests may overwrite values like `ctx.sent`.
    let disc_temp = self.make_temp_var();
    let disc_value = self.explode_value(test)?;
    let disc = self.emit_assign(disc_temp, disc_value);

    let after = self.loc();
    let default_loc = self.loc();
    let mut condition = self.loc_expr(default_loc);
    let mut case_locs = vec![default_loc; branches.len()];
    let mut bodies = Vec::with_capacity(branches.len());
    let mut tests = Vec::with_capacity(branches.len());
    for branch in branches {
      let SwitchBranch { case, body } = *branch.stx;
      tests.push(case);
      bodies.push(body);
    }
    for (i, case) in tests.into_iter().enumerate().rev() {
      if let Some(case) = case {
        let case_loc = self.loc();
        case_locs[i] = case_loc;
        let target = self.loc_expr(case_loc);
        condition = build::cond(
          build::binary(OperatorName::StrictEquality, disc.clone(), case),
          target,
          condition,
        );
      };
    }
    let target = self.explode_value(condition)?;
    self.jump_to(target);

    self.with_entry(Entry::Switch { break_loc: after }, |this| {
      for (i, body) in bodies.into_iter().enumerate() {
        this.mark(case_locs[i]);
        this.explode_statements(body)?;
      }
      Ok(())
    })?;

    self.mark(after);
    if self.loc_value(default_loc).is_none() {
      // Without a default case, the synthesized default falls through to after the switch.
      self.mark(default_loc);
      assert_eq!(self.loc_value(after), self.loc_value(default_loc));
    }
    Ok(())
  }

  fn explode_try(&mut self, stmt: TryStmt) -> RegenResult<()> {
    let TryStmt {
      wrapped,
      catch,
      finally,
    } = stmt;
    let after = self.loc();

    // The parameter lives in a context slot once lowered, which only works for a plain binding.
    let param = match catch.as_ref().and_then(|c| c.stx.parameter.as_ref()) {
      None => None,
      Some(p) => match p.stx.as_id() {
        Some(name) => Some(name.to_string()),
        None => {
          return Err(RegenError::new(
            RegenErrorType::UnsupportedPattern("catch parameter"),
            Some(p.id),
          ));
        }
      },
    };
    let catch_entry = catch.as_ref().map(|_| CatchEntry {
      first_loc: self.loc(),
      param: param.clone(),
    });
    let finally_entry = finally.as_ref().map(|_| FinallyEntry {
      first_loc: self.loc(),
      after_loc: after,
    });
    let first_loc = self.get_unmarked_current_loc();
    let try_entry = TryEntry::new(first_loc, catch_entry.clone(), finally_entry.clone());

    self.try_entries.push(try_entry.clone());
    self.update_context_prev_loc(Some(first_loc));

    self.with_entry(Entry::Try(try_entry), |this| {
      this.explode_statements(wrapped.stx.body)?;

      if let (Some(catch_entry), Some(catch)) = (catch_entry, catch) {
        match &finally_entry {
          // The catch block is emitted first, so jump over it to the finally block.
          Some(f) => this.jump(f.first_loc),
          None => this.jump(after),
        };

        this.mark(catch_entry.first_loc);
        this.update_context_prev_loc(Some(catch_entry.first_loc));

        let CatchBlock { mut body, .. } = *catch.stx;
        match &catch_entry.param {
          Some(param) => {
            let safe_param = this.make_temp_name();
            let assignee = this.context_property(&safe_param);
            this.clear_pending_exception(first_loc, Some(assignee));
            rename_catch_param(&mut body, param, &this.context, &safe_param)?;
          }
          None => this.clear_pending_exception(first_loc, None),
        };

        this.with_entry(Entry::Catch(catch_entry), |this| {
          this.explode_statements(body)
        })?;
      }

      if let (Some(finally_entry), Some(finally)) = (finally_entry, finally) {
        this.mark(finally_entry.first_loc);
        this.update_context_prev_loc(Some(finally_entry.first_loc));
        let finally_loc = finally_entry.first_loc;
        this.with_entry(Entry::Finally(finally_entry), |this| {
          this.explode_statements(finally.stx.body)
        })?;
        let finally_loc = this.loc_expr(finally_loc);
        let finish = build::call(this.context_property("finish"), vec![finally_loc]);
        this.emit(build::ret(Some(finish)));
      }
      Ok(())
    })?;

    self.mark(after);
    Ok(())
  }

  /// Fixes the final location and resolves every location placeholder in the listing.
  pub fn finish(mut self) -> Lowered {
    assert_eq!(self.leap_manager.depth(), 1, "unbalanced leap entries");
    let final_index = self.listing.len();
    self.fix(self.final_loc, final_index);

    let mut patcher = PatchLocations {
      placeholders: &self.placeholders,
      values: &self.locations,
    };
    for stmt in self.listing.iter_mut() {
      stmt.drive_mut(&mut patcher);
    }

    let resolve = |loc: Location| self.locations[loc.0].expect("try location never fixed");
    let try_entries = self
      .try_entries
      .iter()
      .map(|e| ResolvedTryEntry {
        try_loc: resolve(e.first_loc),
        catch_loc: e.catch.as_ref().map(|c| resolve(c.first_loc)),
        finally_loc: e.finally.as_ref().map(|f| resolve(f.first_loc)),
        after_loc: e.finally.as_ref().map(|f| resolve(f.after_loc)),
      })
      .collect();

    Lowered {
      listing: self.listing,
      marked: self.marked,
      try_entries,
      final_loc: final_index,
      temp_count: self.next_temp_id,
    }
  }
}
