//! The stack of constructs that `break`, `continue` and `return` can leave, innermost last.

/// Handle to a program counter cell owned by the lowering of one function. The value is fixed once, when the listing reaches the instruction it denotes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Location(pub(crate) usize);

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CatchEntry {
  pub first_loc: Location,
  // None for `catch {}` without a binding.
  pub param: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FinallyEntry {
  pub first_loc: Location,
  pub after_loc: Location,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TryEntry {
  pub first_loc: Location,
  pub catch: Option<CatchEntry>,
  pub finally: Option<FinallyEntry>,
}

impl TryEntry {
  pub fn new(first_loc: Location, catch: Option<CatchEntry>, finally: Option<FinallyEntry>) -> TryEntry {
    assert!(
      catch.is_some() || finally.is_some(),
      "try entry needs a catch or a finally"
    );
    TryEntry {
      first_loc,
      catch,
      finally,
    }
  }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Entry {
  Function {
    return_loc: Location,
  },
  Loop {
    break_loc: Location,
    continue_loc: Location,
    label: Option<String>,
  },
  Switch {
    break_loc: Location,
  },
  Labeled {
    break_loc: Location,
    label: String,
  },
  Catch(CatchEntry),
  Finally(FinallyEntry),
  Try(TryEntry),
}

#[derive(Clone, Copy)]
enum Target {
  Break,
  Continue,
}

impl Entry {
  fn target(&self, target: Target) -> Option<Location> {
    match (self, target) {
      (Entry::Loop { break_loc, .. }, Target::Break) => Some(*break_loc),
      (Entry::Loop { continue_loc, .. }, Target::Continue) => Some(*continue_loc),
      (Entry::Switch { break_loc }, Target::Break) => Some(*break_loc),
      (Entry::Labeled { break_loc, .. }, Target::Break) => Some(*break_loc),
      _ => None,
    }
  }

  fn label(&self) -> Option<&str> {
    match self {
      Entry::Loop { label, .. } => label.as_deref(),
      Entry::Labeled { label, .. } => Some(label),
      _ => None,
    }
  }
}

pub struct LeapManager {
  entries: Vec<Entry>,
}

impl LeapManager {
  pub fn new(return_loc: Location) -> LeapManager {
    LeapManager {
      entries: vec![Entry::Function { return_loc }],
    }
  }

  pub fn push(&mut self, entry: Entry) {
    self.entries.push(entry);
  }

  /// Pops the innermost entry, which must be `expected`.
  pub fn pop(&mut self, expected: &Entry) {
    let popped = self.entries.pop();
    assert_eq!(popped.as_ref(), Some(expected), "leap entries popped out of order");
  }

  pub fn depth(&self) -> usize {
    self.entries.len()
  }

  fn find(&self, target: Target, label: Option<&str>) -> Option<Location> {
    for entry in self.entries.iter().rev() {
      let Some(loc) = entry.target(target) else {
        continue;
      };
      match label {
        Some(label) => {
          if entry.label() == Some(label) {
            return Some(loc);
          }
        }
        // An unlabeled break never targets a plain labeled statement.
        None => {
          if !matches!(entry, Entry::Labeled { .. }) {
            return Some(loc);
          }
        }
      };
    }
    None
  }

  pub fn break_loc(&self, label: Option<&str>) -> Option<Location> {
    self.find(Target::Break, label)
  }

  pub fn continue_loc(&self, label: Option<&str>) -> Option<Location> {
    self.find(Target::Continue, label)
  }
}
