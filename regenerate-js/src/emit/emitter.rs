//! Output buffer that tracks the kind of the last token written, inserting a
//! single space only when the next token would otherwise merge with it.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Boundary {
  #[default]
  None,
  Word,
  Plus,
  PlusPlus,
  Minus,
  MinusMinus,
  Slash,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Leading {
  Word,
  Plus,
  Minus,
  Slash,
  Other,
}

#[derive(Debug, Default)]
pub struct Emitter {
  out: String,
  trailing: Boundary,
}

impl Emitter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn as_str(&self) -> &str {
    &self.out
  }

  pub fn into_string(self) -> String {
    self.out
  }

  pub fn write_keyword(&mut self, keyword: &str) {
    self.write_token(keyword, Leading::Word, Boundary::Word);
  }

  pub fn write_identifier(&mut self, identifier: &str) {
    self.write_token(identifier, Leading::Word, Boundary::Word);
  }

  /// Numbers lex like words as far as adjacency goes: `return 1`, `1 in x`.
  pub fn write_number(&mut self, number: &str) {
    self.write_token(number, Leading::Word, Boundary::Word);
  }

  pub fn write_punct(&mut self, punct: &str) {
    let leading = match punct.as_bytes().first() {
      Some(b'+') => Leading::Plus,
      Some(b'-') => Leading::Minus,
      _ => Leading::Other,
    };
    let trailing = match punct {
      "+" => Boundary::Plus,
      "++" => Boundary::PlusPlus,
      "-" => Boundary::Minus,
      "--" => Boundary::MinusMinus,
      "/" => Boundary::Slash,
      _ => Boundary::None,
    };
    self.write_token(punct, leading, trailing);
  }

  /// Writes an already escaped string literal. Quotes never need separating.
  pub fn write_string_literal(&mut self, literal: &str) {
    self.write_token(literal, Leading::Other, Boundary::None);
  }

  /// Regex literals start with a slash that must not join a preceding division into a comment, and end in flags that lex like a word.
  pub fn write_regex(&mut self, regex: &str) {
    self.write_token(regex, Leading::Slash, Boundary::Word);
  }

  /// Writes a piece of a template literal (backticks, raw text, `${` and `}`) verbatim.
  pub fn write_template(&mut self, text: &str) {
    self.write_token(text, Leading::Other, Boundary::None);
  }

  fn write_token(&mut self, text: &str, leading: Leading, trailing: Boundary) {
    if text.is_empty() {
      return;
    }
    if needs_space(self.trailing, leading) {
      self.out.push(' ');
    }
    self.out.push_str(text);
    self.trailing = trailing;
  }
}

fn needs_space(prev: Boundary, next: Leading) -> bool {
  matches!(
    (prev, next),
    (Boundary::Word, Leading::Word)
      | (Boundary::Plus, Leading::Plus)
      | (Boundary::PlusPlus, Leading::Plus)
      | (Boundary::Minus, Leading::Minus)
      | (Boundary::MinusMinus, Leading::Minus)
      | (Boundary::Slash, Leading::Slash)
  )
}

/// Double-quoted JavaScript string literal.
pub fn quote_string(value: &str) -> String {
  let mut out = String::with_capacity(value.len() + 2);
  out.push('"');
  let mut chars = value.chars().peekable();
  while let Some(ch) = chars.next() {
    match ch {
      '\\' => out.push_str("\\\\"),
      '"' => out.push_str("\\\""),
      '\n' => out.push_str("\\n"),
      '\r' => out.push_str("\\r"),
      '\t' => out.push_str("\\t"),
      '\0' => {
        // `\0` followed by a digit would read as a legacy octal escape.
        if chars.peek().is_some_and(|c| c.is_ascii_digit()) {
          out.push_str("\\x00");
        } else {
          out.push_str("\\0");
        }
      }
      '\u{2028}' => out.push_str("\\u2028"),
      '\u{2029}' => out.push_str("\\u2029"),
      ch if ch < '\u{20}' => out.push_str(&format!("\\x{:02X}", ch as u32)),
      ch => out.push(ch),
    }
  }
  out.push('"');
  out
}
