//! A parser front end, interpreter and runtime for checking lowered programs by running them.
#![allow(dead_code)]

mod convert;
pub mod runtime;

pub use convert::parse;
pub use interp::Machine;
pub use interp::Value;
pub use runtime::resume;
pub use runtime::Method;

use regenerate_js::ast::stx::TopLevel;
use regenerate_js::emit_program;
use regenerate_js::regenerate;
use regenerate_js::RegenOptions;

pub fn lower_source(src: &str) -> TopLevel {
  let mut top = parse(src);
  regenerate(&mut top, &RegenOptions::new()).expect("lowering failed");
  top
}

pub fn lower_to_string(src: &str) -> String {
  emit_program(&lower_source(src)).expect("printing failed")
}

/// Lowers `src`, prints it, parses the printed code back and runs it. Going through
/// text checks that the printer's output means what the lowered tree means.
pub fn run(src: &str) -> Machine {
  run_lowered(lower_source(src))
}

/// Like [`run`], for a tree that has already been lowered.
pub fn run_lowered(top: TopLevel) -> Machine {
  let printed = emit_program(&top).expect("printing failed");
  let top = parse(&printed);
  let mut machine = Machine::new();
  if let Err(err) = machine.run(&top) {
    panic!("uncaught exception {err:?} in:\n{printed}");
  }
  machine
}

pub fn call_global(m: &mut Machine, name: &str, args: Vec<Value>) -> Result<Value, Value> {
  let f = m.global(name);
  m.call(&f, Value::Undefined, args)
}

pub fn num(n: f64) -> Value {
  Value::Num(n)
}

/// Steps a generator to completion with `next()`, collecting every yielded value and the return value.
pub fn drain(m: &mut Machine, gen: &Value) -> (Vec<Value>, Value) {
  let mut yielded = Vec::new();
  loop {
    let (value, done) = resume(m, gen, Method::Next, Value::Undefined).expect("generator threw");
    if done {
      return (yielded, value);
    }
    yielded.push(value);
  }
}
