use ast::stx::TopLevel;

pub mod ast;
pub mod driver;
pub mod emit;
pub mod error;
pub mod hoist;
pub mod leap;
pub mod lower;
pub mod meta;
pub mod names;
pub mod operator;
pub mod options;
pub mod prepass;
pub mod transform;

pub use emit::emit_program;
pub use emit::EmitError;
pub use error::RegenError;
pub use error::RegenResult;
pub use options::RegenOptions;
pub use transform::regenerate;

/// Lowers every generator and async function in `top` in place, then prints the result.
///
/// The tree is left partially rewritten if lowering fails, so callers that need
/// an untouched copy should clone it first.
pub fn regenerate_to_string(
  top: &mut TopLevel,
  options: &RegenOptions,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
  regenerate(top, options)?;
  Ok(emit_program(top)?)
}
