/// Controls which functions are lowered and which names the generated code refers to.
#[derive(Clone, Debug)]
pub struct RegenOptions {
  /// Identifier of the runtime object providing `wrap`, `mark`, `async`, `awrap` and `keys`.
  pub runtime: String,
  /// Parameter name of the state carrier inside generated inner functions.
  pub context_name: String,
  pub generators: bool,
  pub async_functions: bool,
  pub async_generators: bool,
}

impl Default for RegenOptions {
  fn default() -> Self {
    Self {
      runtime: "regeneratorRuntime".to_string(),
      context_name: "_context".to_string(),
      generators: true,
      async_functions: true,
      async_generators: true,
    }
  }
}

impl RegenOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
    self.runtime = runtime.into();
    self
  }

  pub fn with_context_name(mut self, context_name: impl Into<String>) -> Self {
    self.context_name = context_name.into();
    self
  }

  pub fn with_generators(mut self, enabled: bool) -> Self {
    self.generators = enabled;
    self
  }

  pub fn with_async_functions(mut self, enabled: bool) -> Self {
    self.async_functions = enabled;
    self
  }

  pub fn with_async_generators(mut self, enabled: bool) -> Self {
    self.async_generators = enabled;
    self
  }

  /// Whether a function with these flags should be lowered.
  pub fn should_lower(&self, generator: bool, async_: bool) -> bool {
    match (generator, async_) {
      (true, true) => self.async_generators,
      (true, false) => self.generators,
      (false, true) => self.async_functions,
      (false, false) => false,
    }
  }
}
