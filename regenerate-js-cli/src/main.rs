use clap::Parser;
use regenerate_js::ast::stx::TopLevel;
use regenerate_js::emit_program;
use regenerate_js::regenerate;
use regenerate_js::RegenOptions;
use std::fs::File;
use std::io::stdin;
use std::io::stdout;
use std::io::Read;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(
  name = "regenerate-js",
  about = "Lowers generator and async functions in a JSON-serialized program tree"
)]
struct Cli {
  /// JSON program tree to transform; omit for stdin.
  #[arg(short, long)]
  input: Option<PathBuf>,

  /// Output destination for the printed JavaScript; omit for stdout.
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Name of the runtime object the generated code calls into.
  #[arg(long, default_value = "regeneratorRuntime")]
  runtime: String,

  /// Parameter name of the generated state carrier.
  #[arg(long, default_value = "_context")]
  context: String,

  /// Leave plain generator functions untouched.
  #[arg(long)]
  no_generators: bool,

  /// Leave async functions untouched.
  #[arg(long)]
  no_async: bool,

  /// Leave async generator functions untouched.
  #[arg(long)]
  no_async_generators: bool,

  /// Emit JSON tracing spans and events to stderr.
  #[arg(long)]
  trace: bool,
}

fn init_tracing(enabled: bool) {
  if !enabled {
    return;
  }
  let _ = tracing_subscriber::fmt()
    .with_span_events(FmtSpan::CLOSE)
    .with_max_level(Level::DEBUG)
    .json()
    .with_ansi(false)
    .with_writer(std::io::stderr)
    .try_init();
}

fn exit_with_error(context: &str, message: impl std::fmt::Display) -> ! {
  eprintln!("{context}: {message}");
  process::exit(1);
}

fn main() {
  let args = Cli::parse();
  init_tracing(args.trace);

  let input_name = args
    .input
    .as_ref()
    .map(|p| p.display().to_string())
    .unwrap_or_else(|| "<stdin>".to_string());
  let mut input = Vec::new();
  let mut input_file: Box<dyn Read> = match args.input.as_ref() {
    Some(p) => match File::open(p) {
      Ok(f) => Box::new(f),
      Err(err) => exit_with_error(&input_name, format!("failed to open: {err}")),
    },
    None => Box::new(stdin()),
  };
  if let Err(err) = input_file.read_to_end(&mut input) {
    exit_with_error(&input_name, format!("failed to read input: {err}"));
  }
  let mut top: TopLevel = match serde_json::from_slice(&input) {
    Ok(top) => top,
    Err(err) => exit_with_error(&input_name, format!("invalid program tree: {err}")),
  };

  let options = RegenOptions::new()
    .with_runtime(args.runtime)
    .with_context_name(args.context)
    .with_generators(!args.no_generators)
    .with_async_functions(!args.no_async)
    .with_async_generators(!args.no_async_generators);
  if let Err(err) = regenerate(&mut top, &options) {
    exit_with_error(&input_name, err);
  }
  let mut output = match emit_program(&top) {
    Ok(output) => output,
    Err(err) => exit_with_error(&input_name, err),
  };
  output.push('\n');

  let write_result = match args.output.as_ref() {
    Some(p) => File::create(p)
      .and_then(|mut file| file.write_all(output.as_bytes()))
      .map_err(|err| (p.display().to_string(), err)),
    None => stdout()
      .write_all(output.as_bytes())
      .map_err(|err| ("<stdout>".to_string(), err)),
  };
  if let Err((dest, err)) = write_result {
    exit_with_error(&dest, format!("failed to write output: {err}"));
  }
}
