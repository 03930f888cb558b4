use tracing::debug;
use tracing::debug_span;

use crate::ast::build;
use crate::ast::expr::Expr;
use crate::ast::func::Func;
use crate::ast::func::FuncBody;
use crate::ast::node::Node;
use crate::ast::stmt::Stmt;
use crate::error::RegenError;
use crate::error::RegenErrorType;
use crate::error::RegenResult;
use crate::hoist::hoist;
use crate::lower::dispatch::dispatch_loop;
use crate::lower::dispatch::try_locs_list;
use crate::lower::Lowerer;
use crate::names::NameGen;
use crate::options::RegenOptions;
use crate::prepass::await_to_yield;
use crate::prepass::function_sent;
use crate::prepass::rename_arguments;

pub const ARGS_NAME: &str = "_args";

fn is_directive(stmt: &Node<Stmt>) -> bool {
  let Stmt::Expr(e) = stmt.stx.as_ref() else {
    return false;
  };
  matches!(e.stx.expr.stx.as_ref(), Expr::LitStr(_))
}

/// Lowers one generator or async function in place. Its body becomes
///
/// ```text
/// <directives>
/// var <hoisted>;
/// return <runtime>.wrap(function <name>$(<ctx>) { <dispatch loop> }, <outer_self>, this, <try locs>);
/// ```
///
/// using `<runtime>.async` instead of `wrap` for async functions. `outer_self` refers to the function object itself and is only used by generators; it defaults to `null`.
///
/// The carrier `<ctx>` and the alias for `arguments` are drawn from `names`, so they never capture a binding of the program or of another lowered function.
pub fn lower_function(
  func: &mut Func,
  name: &str,
  outer_self: Option<Node<Expr>>,
  options: &RegenOptions,
  names: &mut NameGen,
) -> RegenResult<()> {
  if !func.generator && !func.async_ {
    return Err(RegenError::new(RegenErrorType::NotSuspendable, None));
  }
  let span = debug_span!(
    "lower_function",
    name,
    generator = func.generator,
    async_ = func.async_
  );
  let _guard = span.enter();

  names.reserve_all(&*func);
  let context_name = names.generate(&options.context_name);
  let args_name = names.generate(ARGS_NAME);

  if let FuncBody::Expression(_) = &func.body {
    let FuncBody::Expression(e) = std::mem::replace(&mut func.body, FuncBody::Block(Vec::new())) else {
      unreachable!();
    };
    func.body = FuncBody::Block(vec![build::ret(Some(e))]);
  }

  if func.async_ {
    await_to_yield(func, &options.runtime);
  }
  function_sent(func, &context_name);

  // Directive prologue stays in the outer function.
  let FuncBody::Block(body) = &mut func.body else {
    unreachable!();
  };
  let directive_count = body.iter().take_while(|s| is_directive(s)).count();
  let mut outer_body: Vec<Node<Stmt>> = body.drain(..directive_count).collect();

  let mut vars = hoist(func);
  if rename_arguments(func, &args_name) {
    let decl = vars.get_or_insert_with(|| build::var(Vec::new()));
    decl
      .stx
      .declarators
      .push(build::declarator(args_name, Some(build::id("arguments"))));
  }

  let FuncBody::Block(body) = std::mem::replace(&mut func.body, FuncBody::Block(Vec::new())) else {
    unreachable!();
  };
  let mut lowerer = Lowerer::new(context_name.clone(), options.runtime.clone());
  lowerer.lower_body(body)?;
  let lowered = lowerer.finish();
  debug!(
    listing = lowered.listing.len(),
    cases = lowered.marked.len(),
    temps = lowered.temp_count,
    try_entries = lowered.try_entries.len(),
    "lowered function body"
  );

  let tries = try_locs_list(&lowered.try_entries);
  let machine = dispatch_loop(
    lowered.listing,
    &lowered.marked,
    lowered.final_loc,
    &context_name,
  );
  let inner = Node::new(Func {
    arrow: false,
    async_: false,
    generator: false,
    parameters: vec![build::param(context_name)],
    body: FuncBody::Block(vec![machine]),
  });

  // Async functions that are not generators are never marked and don't inherit from the outer function's prototype.
  let self_ref = match (func.generator, outer_self) {
    (true, Some(outer_self)) => outer_self,
    _ => build::null(),
  };
  let mut wrap_args = vec![
    build::func_expr(Some(format!("{name}$")), inner),
    self_ref,
    build::this(),
  ];
  wrap_args.extend(tries);
  let wrapper = if func.async_ { "async" } else { "wrap" };
  let wrap_call = build::call(
    build::member(build::id(options.runtime.clone()), wrapper),
    wrap_args,
  );

  if let Some(vars) = vars.filter(|v| !v.stx.declarators.is_empty()) {
    outer_body.push(vars.into_wrapped());
  }
  outer_body.push(build::ret(Some(wrap_call)));

  func.body = FuncBody::Block(outer_body);
  func.generator = false;
  func.async_ = false;
  Ok(())
}
