//! Safe arithmetic expression evaluation.
//!
//! Student answers arrive as decorated numeric strings ("4-2*arctan(2)",
//! "π/2", "sqrt(2)e"). The evaluator is a plain tokenizer + recursive-descent
//! parser over `+ - * / ( )`, numeric literals, the constants `pi` and `e`,
//! and a fixed whitelist of unary functions. There is no dynamic evaluation
//! facility anywhere in this path.
//!
//! Sanitation rules, matching the answer-entry UI:
//!   - whitespace and commas are ignored
//!   - unknown identifier runs and stray symbols are skipped entirely
//!   - implicit multiplication is inserted between a value and a following
//!     function, constant, or parenthesis ("2arctan(2)" reads as 2*arctan(2))

use std::f64::consts::{E, PI};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
  #[error("empty expression")]
  Empty,
  #[error("unexpected end of expression")]
  UnexpectedEnd,
  /// Character offset into the sanitized input.
  #[error("invalid numeric literal at character {0}")]
  InvalidNumber(usize),
  /// Index into the token stream, not the input string.
  #[error("unexpected token at position {0}")]
  UnexpectedToken(usize),
  #[error("unbalanced parentheses")]
  UnbalancedParens,
  #[error("unknown variable '{0}'")]
  UnknownVariable(String),
  #[error("expression did not evaluate to a finite number")]
  NotFinite,
}

/// Whitelisted unary functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Func {
  Sqrt,
  Arctan,
  Arcsin,
  Arccos,
  Ln,
  Log10,
  Exp,
  Sin,
  Cos,
  Tan,
}

impl Func {
  fn apply(self, v: f64) -> f64 {
    match self {
      Func::Sqrt => v.sqrt(),
      Func::Arctan => v.atan(),
      Func::Arcsin => v.asin(),
      Func::Arccos => v.acos(),
      Func::Ln => v.ln(),
      Func::Log10 => v.log10(),
      Func::Exp => v.exp(),
      Func::Sin => v.sin(),
      Func::Cos => v.cos(),
      Func::Tan => v.tan(),
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
  Num(f64),
  Var,
  Op(char),
  LParen,
  RParen,
  Func(Func),
}

/// Longest identifiers first so "arctan" is not read as "arc" + "tan".
fn classify_ident(ident: &str) -> Option<Token> {
  match ident {
    "pi" => Some(Token::Num(PI)),
    "e" => Some(Token::Num(E)),
    "x" => Some(Token::Var),
    "sqrt" => Some(Token::Func(Func::Sqrt)),
    "arctan" | "atan" => Some(Token::Func(Func::Arctan)),
    "arcsin" | "asin" => Some(Token::Func(Func::Arcsin)),
    "arccos" | "acos" => Some(Token::Func(Func::Arccos)),
    "ln" => Some(Token::Func(Func::Ln)),
    "log" => Some(Token::Func(Func::Log10)),
    "exp" => Some(Token::Func(Func::Exp)),
    "sin" => Some(Token::Func(Func::Sin)),
    "cos" => Some(Token::Func(Func::Cos)),
    "tan" => Some(Token::Func(Func::Tan)),
    _ => None,
  }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
  let chars: Vec<char> = input.chars().collect();
  let mut tokens = Vec::new();
  let mut i = 0;
  while i < chars.len() {
    let c = chars[i];
    match c {
      ' ' | '\t' | '\n' | '\r' | ',' => i += 1,
      '+' | '-' | '*' | '/' => {
        tokens.push(Token::Op(c));
        i += 1;
      }
      '(' => {
        tokens.push(Token::LParen);
        i += 1;
      }
      ')' => {
        tokens.push(Token::RParen);
        i += 1;
      }
      'π' => {
        tokens.push(Token::Num(PI));
        i += 1;
      }
      '√' => {
        tokens.push(Token::Func(Func::Sqrt));
        i += 1;
      }
      '0'..='9' | '.' => {
        let start = i;
        while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
          i += 1;
        }
        let lit: String = chars[start..i].iter().collect();
        let num = lit.parse::<f64>().map_err(|_| ExprError::InvalidNumber(start))?;
        tokens.push(Token::Num(num));
      }
      c if c.is_alphabetic() => {
        let start = i;
        while i < chars.len() && chars[i].is_alphabetic() {
          i += 1;
        }
        let ident: String = chars[start..i].iter().collect();
        if let Some(tok) = classify_ident(&ident.to_lowercase()) {
          tokens.push(tok);
        }
        // Unknown identifier runs are dropped, like any other stray symbol.
      }
      // Anything else ("=", "^", "$", currency junk) is stripped.
      _ => i += 1,
    }
  }
  Ok(tokens)
}

struct Parser<'a> {
  tokens: &'a [Token],
  pos: usize,
  x: Option<f64>,
}

impl<'a> Parser<'a> {
  fn peek(&self) -> Option<Token> {
    self.tokens.get(self.pos).cloned()
  }

  fn next(&mut self) -> Option<Token> {
    let t = self.tokens.get(self.pos).cloned();
    if t.is_some() {
      self.pos += 1;
    }
    t
  }

  // expr := term (('+' | '-') term)*
  fn expr(&mut self) -> Result<f64, ExprError> {
    let mut acc = self.term()?;
    while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
      self.pos += 1;
      let rhs = self.term()?;
      if op == '+' {
        acc += rhs;
      } else {
        acc -= rhs;
      }
    }
    Ok(acc)
  }

  // term := unary (('*' | '/' | <implicit>) unary)*
  fn term(&mut self) -> Result<f64, ExprError> {
    let mut acc = self.unary()?;
    loop {
      match self.peek() {
        Some(Token::Op(op @ ('*' | '/'))) => {
          self.pos += 1;
          let rhs = self.unary()?;
          if op == '*' {
            acc *= rhs;
          } else {
            acc /= rhs;
          }
        }
        // Implicit multiplication: a value directly followed by the start
        // of another primary ("2pi", "2arctan(2)", "3(1+1)").
        Some(Token::Num(_) | Token::Var | Token::Func(_) | Token::LParen) => {
          let rhs = self.unary()?;
          acc *= rhs;
        }
        _ => break,
      }
    }
    Ok(acc)
  }

  // unary := ('-' | '+') unary | primary
  fn unary(&mut self) -> Result<f64, ExprError> {
    match self.peek() {
      Some(Token::Op('-')) => {
        self.pos += 1;
        Ok(-self.unary()?)
      }
      Some(Token::Op('+')) => {
        self.pos += 1;
        self.unary()
      }
      _ => self.primary(),
    }
  }

  // primary := number | 'x' | func '(' expr ')' | func unary | '(' expr ')'
  fn primary(&mut self) -> Result<f64, ExprError> {
    match self.next() {
      Some(Token::Num(v)) => Ok(v),
      Some(Token::Var) => self.x.ok_or_else(|| ExprError::UnknownVariable("x".into())),
      Some(Token::Func(f)) => {
        // Parenthesized argument preferred; "sqrt2" style also accepted.
        if matches!(self.peek(), Some(Token::LParen)) {
          self.pos += 1;
          let arg = self.expr()?;
          match self.next() {
            Some(Token::RParen) => Ok(f.apply(arg)),
            _ => Err(ExprError::UnbalancedParens),
          }
        } else {
          let arg = self.unary()?;
          Ok(f.apply(arg))
        }
      }
      Some(Token::LParen) => {
        let v = self.expr()?;
        match self.next() {
          Some(Token::RParen) => Ok(v),
          _ => Err(ExprError::UnbalancedParens),
        }
      }
      Some(_) => Err(ExprError::UnexpectedToken(self.pos - 1)),
      None => Err(ExprError::UnexpectedEnd),
    }
  }
}

fn evaluate_tokens(tokens: &[Token], x: Option<f64>) -> Result<f64, ExprError> {
  if tokens.is_empty() {
    return Err(ExprError::Empty);
  }
  let mut parser = Parser { tokens, pos: 0, x };
  let value = parser.expr()?;
  if parser.pos != tokens.len() {
    return Err(ExprError::UnexpectedToken(parser.pos));
  }
  if !value.is_finite() {
    return Err(ExprError::NotFinite);
  }
  Ok(value)
}

/// Evaluate a constant expression (the numeric answer path).
pub fn evaluate(input: &str) -> Result<f64, ExprError> {
  evaluate_tokens(&tokenize(input)?, None)
}

/// Evaluate an expression with `x` bound (the plotting path).
pub fn evaluate_at(input: &str, x: f64) -> Result<f64, ExprError> {
  evaluate_tokens(&tokenize(input)?, Some(x))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
  }

  #[test]
  fn evaluates_plain_arithmetic() {
    assert!(close(evaluate("1+2*3").unwrap(), 7.0));
    assert!(close(evaluate("(1+2)*3").unwrap(), 9.0));
    assert!(close(evaluate("10/4").unwrap(), 2.5));
    assert!(close(evaluate("-3+5").unwrap(), 2.0));
  }

  #[test]
  fn evaluates_constants_and_functions() {
    assert!(close(evaluate("pi").unwrap(), PI));
    assert!(close(evaluate("π/2").unwrap(), PI / 2.0));
    assert!(close(evaluate("e").unwrap(), E));
    assert!(close(evaluate("sqrt(4)").unwrap(), 2.0));
    assert!(close(evaluate("√(9)").unwrap(), 3.0));
    assert!(close(evaluate("ln(e)").unwrap(), 1.0));
    assert!(close(evaluate("log(100)").unwrap(), 2.0));
    assert!(close(evaluate("arctan(1)").unwrap(), PI / 4.0));
    assert!(close(evaluate("atan(1)").unwrap(), PI / 4.0));
  }

  #[test]
  fn implicit_multiplication() {
    assert!(close(evaluate("2pi").unwrap(), 2.0 * PI));
    assert!(close(evaluate("4-2arctan(2)").unwrap(), 4.0 - 2.0 * 2.0_f64.atan()));
    assert!(close(evaluate("3(1+1)").unwrap(), 6.0));
  }

  #[test]
  fn strips_junk_and_unknown_identifiers() {
    // "= " and unknown words vanish before parsing.
    assert!(close(evaluate("answer = 42").unwrap(), 42.0));
    assert!(close(evaluate(" 1 , 5 ").unwrap(), 1.0 * 5.0));
  }

  #[test]
  fn rejects_unusable_input() {
    assert_eq!(evaluate(""), Err(ExprError::Empty));
    assert_eq!(evaluate("hello there"), Err(ExprError::Empty));
    assert_eq!(evaluate("(1+2"), Err(ExprError::UnbalancedParens));
    assert_eq!(evaluate("1+"), Err(ExprError::UnexpectedEnd));
    assert_eq!(evaluate("1.2.3"), Err(ExprError::InvalidNumber(0)));
    assert!(matches!(evaluate("1/0"), Err(ExprError::NotFinite)));
    assert!(matches!(evaluate("sqrt(-1)"), Err(ExprError::NotFinite)));
  }

  #[test]
  fn variable_binding_only_on_plot_path() {
    assert!(close(evaluate_at("x*x", 3.0).unwrap(), 9.0));
    assert!(close(evaluate_at("sin(x)", 0.0).unwrap(), 0.0));
    assert!(matches!(evaluate("x+1"), Err(ExprError::UnknownVariable(_))));
  }
}
