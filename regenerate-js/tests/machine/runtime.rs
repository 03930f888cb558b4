//! Native `regeneratorRuntime` for the test interpreter. Promises are modelled as
//! already-settled objects, so async functions run to completion synchronously.

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::interp::type_error;
use super::interp::Eval;
use super::interp::Machine;
use super::interp::ObjKind;
use super::interp::Value;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum GenState {
  SuspendedStart,
  SuspendedYield,
  Executing,
  Completed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Method {
  Next,
  Throw,
  Return,
}

impl Method {
  pub fn name(self) -> &'static str {
    match self {
      Method::Next => "next",
      Method::Throw => "throw",
      Method::Return => "return",
    }
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum RecordType {
  Normal,
  Throw,
  Return,
  Break,
  Continue,
}

struct Record {
  ty: RecordType,
  arg: Value,
}

impl Record {
  fn normal() -> Record {
    Record {
      ty: RecordType::Normal,
      arg: Value::Undefined,
    }
  }
}

struct TryEntry {
  // None for the root entry, which catches whatever escapes every real try.
  try_loc: Option<f64>,
  catch_loc: Option<f64>,
  finally_loc: Option<f64>,
  after_loc: Option<Value>,
  completion: Record,
}

#[derive(Clone)]
struct Delegate {
  iterator: Value,
  result_name: String,
  next_loc: Value,
}

struct GenContext {
  ctx: Value,
  entries: Vec<TryEntry>,
  state: GenState,
  method: Method,
  arg: Value,
  done: bool,
  rval: Value,
  delegate: Option<Delegate>,
}

type Shared = Rc<RefCell<GenContext>>;

pub fn prop(object: &Value, key: &str) -> Value {
  match object {
    Value::Obj(o) => o
      .borrow()
      .props
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.clone())
      .unwrap_or(Value::Undefined),
    _ => Value::Undefined,
  }
}

fn set_prop(object: &Value, key: &str, value: Value) {
  if let Value::Obj(o) = object {
    let mut o = o.borrow_mut();
    match o.props.iter_mut().find(|(k, _)| k == key) {
      Some((_, slot)) => *slot = value,
      None => o.props.push((key.to_string(), value)),
    };
  }
}

pub fn array_items(value: &Value) -> Vec<Value> {
  match value {
    Value::Obj(o) => match &o.borrow().kind {
      ObjKind::Array(items) => items.clone(),
      _ => Vec::new(),
    },
    _ => Vec::new(),
  }
}

fn first(args: Vec<Value>) -> Value {
  args.into_iter().next().unwrap_or(Value::Undefined)
}

fn loc_of(value: Option<&Value>) -> Option<f64> {
  match value {
    None | Some(Value::Undefined) => None,
    Some(v) => Some(v.to_number()),
  }
}

pub fn iter_result(value: Value, done: bool) -> Value {
  Value::object(vec![("value", value), ("done", Value::Bool(done))])
}

// Locations are numbers except "end", which compares false against everything.
fn prev_loc(g: &GenContext) -> f64 {
  prop(&g.ctx, "prev").to_number()
}

fn dispatch_exception(g: &Shared, exception: Value) -> Result<(), Value> {
  let mut g = g.borrow_mut();
  if g.done {
    return Err(exception);
  }
  let prev = prev_loc(&g);
  for i in (0..g.entries.len()).rev() {
    let (try_loc, catch_loc, finally_loc) = {
      let e = &g.entries[i];
      (e.try_loc, e.catch_loc, e.finally_loc)
    };
    let handler = match try_loc {
      None => Some((Value::str("end"), false)),
      Some(try_loc) if try_loc <= prev => match (catch_loc, finally_loc) {
        (Some(c), _) if prev < c => Some((Value::Num(c), true)),
        (_, Some(f)) if prev < f => Some((Value::Num(f), false)),
        (None, None) => return Err(type_error("try statement without catch or finally")),
        _ => None,
      },
      Some(_) => None,
    };
    if let Some((loc, caught)) = handler {
      g.entries[i].completion = Record {
        ty: RecordType::Throw,
        arg: exception,
      };
      set_prop(&g.ctx, "next", loc);
      if caught {
        g.method = Method::Next;
        g.arg = Value::Undefined;
      }
      return Ok(());
    }
  }
  Ok(())
}

fn complete(g: &mut GenContext, record: Record, after_loc: Option<Value>) -> Eval {
  match record.ty {
    RecordType::Throw => return Err(record.arg),
    RecordType::Break | RecordType::Continue => set_prop(&g.ctx, "next", record.arg),
    RecordType::Return => {
      g.rval = record.arg.clone();
      g.arg = record.arg;
      g.method = Method::Return;
      set_prop(&g.ctx, "next", Value::str("end"));
    }
    RecordType::Normal => {
      if let Some(after) = after_loc {
        set_prop(&g.ctx, "next", after);
      }
    }
  };
  Ok(Value::ContinueSentinel)
}

fn abrupt(g: &Shared, ty: RecordType, arg: Value) -> Eval {
  let mut g = g.borrow_mut();
  let prev = prev_loc(&g);
  let mut finally_idx = g.entries.iter().rposition(|e| match (e.try_loc, e.finally_loc) {
    (Some(t), Some(f)) => t <= prev && prev < f,
    _ => false,
  });
  // A jump that stays inside the try region does not run the finalizer.
  if let Some(i) = finally_idx {
    if matches!(ty, RecordType::Break | RecordType::Continue) {
      let target = arg.to_number();
      let e = &g.entries[i];
      if e.try_loc.is_some_and(|t| t <= target) && e.finally_loc.is_some_and(|f| target <= f) {
        finally_idx = None;
      }
    }
  }
  let record = Record { ty, arg };
  match finally_idx {
    Some(i) => {
      let finally_loc = g.entries[i].finally_loc.unwrap_or(f64::NAN);
      g.entries[i].completion = record;
      g.method = Method::Next;
      set_prop(&g.ctx, "next", Value::Num(finally_loc));
      Ok(Value::ContinueSentinel)
    }
    None => complete(&mut g, record, None),
  }
}

fn finish(g: &Shared, finally_loc: f64) -> Eval {
  let mut g = g.borrow_mut();
  let Some(i) = g.entries.iter().rposition(|e| e.finally_loc == Some(finally_loc)) else {
    return Ok(Value::Undefined);
  };
  let record = std::mem::replace(&mut g.entries[i].completion, Record::normal());
  let after = g.entries[i].after_loc.clone();
  complete(&mut g, record, after)
}

fn catch(g: &Shared, try_loc: f64) -> Eval {
  let mut g = g.borrow_mut();
  let Some(entry) = g
    .entries
    .iter_mut()
    .rev()
    .find(|e| e.try_loc == Some(try_loc))
  else {
    return Err(type_error("illegal catch attempt"));
  };
  if entry.completion.ty == RecordType::Throw {
    Ok(std::mem::replace(&mut entry.completion, Record::normal()).arg)
  } else {
    Ok(Value::Undefined)
  }
}

fn stop(g: &Shared) -> Eval {
  let mut g = g.borrow_mut();
  g.done = true;
  let root = &g.entries[0].completion;
  if root.ty == RecordType::Throw {
    return Err(root.arg.clone());
  }
  Ok(g.rval.clone())
}

fn values(iterable: &Value) -> Result<Value, Value> {
  if !matches!(prop(iterable, "next"), Value::Undefined) {
    return Ok(iterable.clone());
  }
  let Value::Obj(o) = iterable else {
    return Err(type_error("value is not iterable"));
  };
  if !matches!(o.borrow().kind, ObjKind::Array(_)) {
    return Err(type_error("value is not iterable"));
  }
  let items = array_items(iterable);
  let index = Rc::new(Cell::new(0));
  Ok(Value::object(vec![(
    "next",
    Value::native(move |_, _, _| {
      let i = index.get();
      index.set(i + 1);
      Ok(match items.get(i) {
        Some(v) => iter_result(v.clone(), false),
        None => iter_result(Value::Undefined, true),
      })
    }),
  )]))
}

fn delegate_yield(g: &Shared, iterable: Value, result_name: String, next_loc: Value) -> Eval {
  let iterator = values(&iterable)?;
  let mut g = g.borrow_mut();
  g.delegate = Some(Delegate {
    iterator,
    result_name,
    next_loc,
  });
  if g.method == Method::Next {
    g.arg = Value::Undefined;
  }
  Ok(Value::ContinueSentinel)
}

enum DelegateStep {
  Continue,
  Yield(Value),
}

fn maybe_invoke_delegate(m: &mut Machine, g: &Shared, delegate: Delegate) -> Result<DelegateStep, Value> {
  let (method, arg) = {
    let g = g.borrow();
    (g.method, g.arg.clone())
  };
  let f = m.get(&delegate.iterator, method.name())?;
  if matches!(f, Value::Undefined) {
    g.borrow_mut().delegate = None;
    if method == Method::Throw {
      // Give the inner iterator a chance to clean up before reporting the missing method.
      if !matches!(m.get(&delegate.iterator, "return")?, Value::Undefined) {
        {
          let mut g = g.borrow_mut();
          g.method = Method::Return;
          g.arg = Value::Undefined;
        }
        maybe_invoke_delegate(m, g, delegate)?;
        if g.borrow().method == Method::Throw {
          return Ok(DelegateStep::Continue);
        }
      }
      let mut g = g.borrow_mut();
      g.method = Method::Throw;
      g.arg = type_error("the iterator does not provide a 'throw' method");
    }
    return Ok(DelegateStep::Continue);
  }

  let info = match m.call(&f, delegate.iterator.clone(), vec![arg]) {
    Ok(info @ Value::Obj(_)) => Ok(info),
    Ok(_) => Err(type_error("iterator result is not an object")),
    Err(e) => Err(e),
  };
  let info = match info {
    Ok(info) => info,
    Err(e) => {
      let mut g = g.borrow_mut();
      g.method = Method::Throw;
      g.arg = e;
      g.delegate = None;
      return Ok(DelegateStep::Continue);
    }
  };
  if !m.get(&info, "done")?.truthy() {
    return Ok(DelegateStep::Yield(m.get(&info, "value")?));
  }
  let value = m.get(&info, "value")?;
  let mut g = g.borrow_mut();
  set_prop(&g.ctx, &delegate.result_name, value);
  set_prop(&g.ctx, "next", delegate.next_loc);
  if g.method != Method::Return {
    g.method = Method::Next;
    g.arg = Value::Undefined;
  }
  g.delegate = None;
  Ok(DelegateStep::Continue)
}

/// Resumes the generator. Returns the yielded or returned value and whether the generator is done.
fn invoke(
  m: &mut Machine,
  g: &Shared,
  inner: &Value,
  self_: &Value,
  method: Method,
  arg: Value,
) -> Result<(Value, bool), Value> {
  {
    let mut g = g.borrow_mut();
    match g.state {
      GenState::Executing => return Err(type_error("generator is already running")),
      GenState::Completed if method == Method::Throw => return Err(arg),
      GenState::Completed => return Ok((Value::Undefined, true)),
      GenState::SuspendedStart | GenState::SuspendedYield => {}
    };
    g.method = method;
    g.arg = arg;
  }

  loop {
    let delegate = g.borrow().delegate.clone();
    if let Some(delegate) = delegate {
      match maybe_invoke_delegate(m, g, delegate)? {
        DelegateStep::Continue => continue,
        DelegateStep::Yield(value) => return Ok((value, false)),
      }
    }

    let (method, arg, state, ctx) = {
      let g = g.borrow();
      (g.method, g.arg.clone(), g.state, g.ctx.clone())
    };
    match method {
      Method::Next => {
        set_prop(&ctx, "sent", arg.clone());
        set_prop(&ctx, "_sent", arg);
      }
      Method::Throw if state == GenState::SuspendedStart => {
        g.borrow_mut().state = GenState::Completed;
        return Err(arg);
      }
      Method::Throw => dispatch_exception(g, arg)?,
      Method::Return => {
        abrupt(g, RecordType::Return, arg)?;
      }
    };

    g.borrow_mut().state = GenState::Executing;
    match m.call(inner, self_.clone(), vec![ctx]) {
      Ok(value) => {
        let mut g = g.borrow_mut();
        g.state = if g.done {
          GenState::Completed
        } else {
          GenState::SuspendedYield
        };
        if matches!(value, Value::ContinueSentinel) {
          continue;
        }
        return Ok((value, g.done));
      }
      Err(e) => {
        // Completed until the exception is dispatched, so a failed dispatch leaves the generator finished.
        let mut g = g.borrow_mut();
        g.state = GenState::Completed;
        g.method = Method::Throw;
        g.arg = e;
      }
    }
  }
}

fn context_native(g: &Shared, f: impl Fn(&Shared, Vec<Value>) -> Eval + 'static) -> Value {
  let g = g.clone();
  Value::native(move |_, _, args| f(&g, args))
}

fn record_type(name: &str) -> Result<RecordType, Value> {
  match name {
    "throw" => Ok(RecordType::Throw),
    "return" => Ok(RecordType::Return),
    "break" => Ok(RecordType::Break),
    "continue" => Ok(RecordType::Continue),
    "normal" => Ok(RecordType::Normal),
    other => Err(type_error(&format!("unknown completion type {other}"))),
  }
}

fn make_generator(inner: Value, self_: Value, try_locs: &Value) -> Value {
  let mut entries = vec![TryEntry {
    try_loc: None,
    catch_loc: None,
    finally_loc: None,
    after_loc: None,
    completion: Record::normal(),
  }];
  for locs in array_items(try_locs) {
    let locs = array_items(&locs);
    entries.push(TryEntry {
      try_loc: loc_of(locs.first()),
      catch_loc: loc_of(locs.get(1)),
      finally_loc: loc_of(locs.get(2)),
      after_loc: locs.get(3).cloned(),
      completion: Record::normal(),
    });
  }
  let ctx = Value::object(vec![
    ("prev", Value::Num(0.0)),
    ("next", Value::Num(0.0)),
    ("sent", Value::Undefined),
    ("_sent", Value::Undefined),
  ]);
  let g: Shared = Rc::new(RefCell::new(GenContext {
    ctx: ctx.clone(),
    entries,
    state: GenState::SuspendedStart,
    method: Method::Next,
    arg: Value::Undefined,
    done: false,
    rval: Value::Undefined,
    delegate: None,
  }));

  set_prop(
    &ctx,
    "abrupt",
    context_native(&g, |g, args| {
      let mut args = args.into_iter();
      let ty = record_type(&args.next().unwrap_or(Value::Undefined).to_js_string())?;
      abrupt(g, ty, args.next().unwrap_or(Value::Undefined))
    }),
  );
  set_prop(
    &ctx,
    "catch",
    context_native(&g, |g, args| catch(g, first(args).to_number())),
  );
  set_prop(
    &ctx,
    "finish",
    context_native(&g, |g, args| finish(g, first(args).to_number())),
  );
  set_prop(&ctx, "stop", context_native(&g, |g, _| stop(g)));
  set_prop(
    &ctx,
    "delegateYield",
    context_native(&g, |g, args| {
      let mut args = args.into_iter();
      let iterable = args.next().unwrap_or(Value::Undefined);
      let result_name = args.next().unwrap_or(Value::Undefined).to_js_string();
      let next_loc = args.next().unwrap_or(Value::Undefined);
      delegate_yield(g, iterable, result_name, next_loc)
    }),
  );

  let method = |method: Method| {
    let (g, inner, self_) = (g.clone(), inner.clone(), self_.clone());
    Value::native(move |m, _, args| {
      let (value, done) = invoke(m, &g, &inner, &self_, method, first(args))?;
      Ok(iter_result(value, done))
    })
  };
  Value::object(vec![
    ("next", method(Method::Next)),
    ("throw", method(Method::Throw)),
    ("return", method(Method::Return)),
  ])
}

pub fn settled(fulfilled: bool, value: Value) -> Value {
  let status = if fulfilled { "fulfilled" } else { "rejected" };
  Value::object(vec![("__status", Value::str(status)), ("__value", value)])
}

/// The outcome of a settled promise, or None if `value` is not one.
pub fn promise_outcome(value: &Value) -> Option<Result<Value, Value>> {
  match prop(value, "__status") {
    Value::Str(s) if &*s == "fulfilled" => Some(Ok(prop(value, "__value"))),
    Value::Str(s) if &*s == "rejected" => Some(Err(prop(value, "__value"))),
    _ => None,
  }
}

/// Calls `method` on a generator object and splits the iterator result.
pub fn resume(m: &mut Machine, gen: &Value, method: Method, arg: Value) -> Result<(Value, bool), Value> {
  let f = m.get(gen, method.name())?;
  let result = m.call(&f, gen.clone(), vec![arg])?;
  Ok((prop(&result, "value"), prop(&result, "done").truthy()))
}

fn awaited(value: &Value) -> Option<Value> {
  match value {
    Value::Obj(o) => o
      .borrow()
      .props
      .iter()
      .find(|(k, _)| k == "__await")
      .map(|(_, v)| v.clone()),
    _ => None,
  }
}

// Steps the generator past every awaited value until it yields for real or finishes.
fn drive_async(m: &mut Machine, gen: &Value, mut method: Method, mut arg: Value, iterator: bool) -> Value {
  loop {
    match resume(m, gen, method, arg) {
      Err(e) => return settled(false, e),
      Ok((value, done)) => match awaited(&value) {
        Some(awaited) if !done => {
          (method, arg) = match promise_outcome(&awaited).unwrap_or(Ok(awaited)) {
            Ok(v) => (Method::Next, v),
            Err(reason) => (Method::Throw, reason),
          };
        }
        _ if iterator => return settled(true, iter_result(value, done)),
        _ => return settled(true, value),
      },
    }
  }
}

pub fn runtime_object() -> Value {
  Value::object(vec![
    (
      "wrap",
      Value::native(|_, _, args| {
        let mut args = args.into_iter();
        let inner = args.next().unwrap_or(Value::Undefined);
        let _outer = args.next();
        let self_ = args.next().unwrap_or(Value::Undefined);
        let try_locs = args.next().unwrap_or(Value::Undefined);
        Ok(make_generator(inner, self_, &try_locs))
      }),
    ),
    (
      "async",
      Value::native(|m, _, args| {
        let mut args = args.into_iter();
        let inner = args.next().unwrap_or(Value::Undefined);
        let outer = args.next().unwrap_or(Value::Undefined);
        let self_ = args.next().unwrap_or(Value::Undefined);
        let try_locs = args.next().unwrap_or(Value::Undefined);
        let gen = make_generator(inner, self_, &try_locs);
        if !prop(&outer, "__marked").truthy() {
          return Ok(drive_async(m, &gen, Method::Next, Value::Undefined, false));
        }
        // Async generators hand back an iterator whose methods return promises.
        let method = |method: Method| {
          let gen = gen.clone();
          Value::native(move |m, _, args| Ok(drive_async(m, &gen, method, first(args), true)))
        };
        Ok(Value::object(vec![
          ("next", method(Method::Next)),
          ("throw", method(Method::Throw)),
          ("return", method(Method::Return)),
        ]))
      }),
    ),
    (
      "mark",
      Value::native(|_, _, args| {
        let f = first(args);
        set_prop(&f, "__marked", Value::Bool(true));
        Ok(f)
      }),
    ),
    (
      "awrap",
      Value::native(|_, _, args| Ok(Value::object(vec![("__await", first(args))]))),
    ),
    (
      "keys",
      Value::native(|m, _, args| {
        let object = first(args);
        let pending = Rc::new(RefCell::new(m.own_keys(&object).into_iter().collect::<VecDeque<_>>()));
        Ok(Value::native(move |m, _, _| {
          loop {
            let Some(key) = pending.borrow_mut().pop_front() else {
              return Ok(iter_result(Value::Undefined, true));
            };
            // Keys deleted during iteration are skipped.
            if m.own_keys(&object).contains(&key) {
              return Ok(iter_result(Value::str(&key), false));
            }
          }
        }))
      }),
    ),
  ])
}
