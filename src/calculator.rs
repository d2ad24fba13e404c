//! Numeric evaluation of arithmetic expressions for the calculator tool.
//!
//! Supports the notation a language model tends to emit for school math:
//! `+ - * / %`, powers with `^` or `**`, parentheses, postfix `!`, the
//! constants `pi` and `e`, and a handful of common functions.

use crate::error::{CurioError, Result};
use std::f64::consts;

/// Evaluate an expression and format the result for display.
pub fn evaluate(expression: &str) -> Result<String> {
    let value = evaluate_number(expression)?;
    Ok(format_number(value))
}

/// Evaluate an expression to a finite number.
fn evaluate_number(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CurioError::Calculation("empty expression".to_string()));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;

    if let Some(token) = parser.peek() {
        return Err(CurioError::Calculation(format!(
            "unexpected '{}' after expression",
            token
        )));
    }

    if !value.is_finite() {
        return Err(CurioError::Calculation(
            "result is not a finite number".to_string(),
        ));
    }

    Ok(value)
}

/// Format a number with up to 15 significant digits.
///
/// Whole numbers print without a decimal point; trailing zeros are dropped.
fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }

    let magnitude = value.abs().log10().floor() as i32;
    if !(-5..15).contains(&magnitude) {
        let formatted = format!("{:.14e}", value);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                format!("{}e{}", trim_fraction(mantissa), exponent)
            }
            None => formatted,
        };
    }

    let decimals = (14 - magnitude).max(0) as usize;
    trim_fraction(&format!("{:.*}", decimals, value)).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
    LParen,
    RParen,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", format_number(*n)),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Caret => write!(f, "^"),
            Token::Bang => write!(f, "!"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent part, only when digits actually follow
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse::<f64>().map_err(|_| {
                    CurioError::Calculation(format!("invalid number '{}'", text))
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(name.to_lowercase()));
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::Caret);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' | '−' => Token::Minus,
                    '×' => Token::Star,
                    '/' | '÷' => Token::Slash,
                    '%' => Token::Percent,
                    '^' => Token::Caret,
                    '!' => Token::Bang,
                    '(' | '[' => Token::LParen,
                    ')' | ']' => Token::RParen,
                    ',' => Token::Comma,
                    other => {
                        return Err(CurioError::Calculation(format!(
                            "unexpected character '{}'",
                            other
                        )))
                    }
                };
                tokens.push(token);
                i += 1;
            }
        }
    }

    Ok(tokens)
}

/// Deepest nesting of parentheses, signs and powers the parser accepts.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.next() {
            Some(ref t) if t == expected => Ok(()),
            Some(t) => Err(CurioError::Calculation(format!(
                "expected '{}' but found '{}'",
                expected, t
            ))),
            None => Err(CurioError::Calculation(format!(
                "expected '{}' but the expression ended",
                expected
            ))),
        }
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            if self.eat(&Token::Plus) {
                value += self.term()?;
            } else if self.eat(&Token::Minus) {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        loop {
            if self.eat(&Token::Star) {
                value *= self.unary()?;
            } else if self.eat(&Token::Slash) {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err(CurioError::Calculation("division by zero".to_string()));
                }
                value /= divisor;
            } else if self.eat(&Token::Percent) {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err(CurioError::Calculation("modulo by zero".to_string()));
                }
                value = value.rem_euclid(divisor);
            } else {
                return Ok(value);
            }
        }
    }

    // Every recursive rule passes through here.
    fn unary(&mut self) -> Result<f64> {
        if self.depth >= MAX_DEPTH {
            return Err(CurioError::Calculation(
                "expression is nested too deeply".to_string(),
            ));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    // unary := ('-' | '+') unary | power
    fn signed(&mut self) -> Result<f64> {
        if self.eat(&Token::Minus) {
            return Ok(-self.unary()?);
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.power()
    }

    // power := postfix ('^' unary)?   (right associative)
    fn power(&mut self) -> Result<f64> {
        let base = self.postfix()?;
        if self.eat(&Token::Caret) {
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // postfix := primary '!'*
    fn postfix(&mut self) -> Result<f64> {
        let mut value = self.primary()?;
        while self.eat(&Token::Bang) {
            value = factorial(value)?;
        }
        Ok(value)
    }

    fn primary(&mut self) -> Result<f64> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.eat(&Token::LParen) {
                    let args = self.arguments()?;
                    call_function(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(t) => Err(CurioError::Calculation(format!("unexpected '{}'", t))),
            None => Err(CurioError::Calculation(
                "the expression ended too early".to_string(),
            )),
        }
    }

    fn arguments(&mut self) -> Result<Vec<f64>> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen)?;
            return Ok(args);
        }
    }
}

fn constant(name: &str) -> Result<f64> {
    match name {
        "pi" | "π" => Ok(consts::PI),
        "e" => Ok(consts::E),
        "tau" => Ok(consts::TAU),
        _ => Err(CurioError::Calculation(format!("unknown name '{}'", name))),
    }
}

fn call_function(name: &str, args: &[f64]) -> Result<f64> {
    let one = |f: fn(f64) -> f64| -> Result<f64> {
        match args {
            [x] => Ok(f(*x)),
            _ => Err(CurioError::Calculation(format!(
                "{}() takes 1 argument, got {}",
                name,
                args.len()
            ))),
        }
    };

    match name {
        "sqrt" => match args {
            [x] if *x < 0.0 => Err(CurioError::Calculation(
                "square root of a negative number".to_string(),
            )),
            _ => one(f64::sqrt),
        },
        "cbrt" => one(f64::cbrt),
        "abs" => one(f64::abs),
        "exp" => one(f64::exp),
        "ln" => positive_log(name, args, f64::ln),
        "log2" => positive_log(name, args, f64::log2),
        "log" => match args {
            [x, base] => {
                if *x <= 0.0 || *base <= 0.0 || *base == 1.0 {
                    Err(CurioError::Calculation(
                        "logarithm is undefined for these values".to_string(),
                    ))
                } else {
                    Ok(x.log(*base))
                }
            }
            _ => positive_log(name, args, f64::log10),
        },
        "sin" => one(f64::sin),
        "cos" => one(f64::cos),
        "tan" => one(f64::tan),
        "asin" => one(f64::asin),
        "acos" => one(f64::acos),
        "atan" => one(f64::atan),
        "sinh" => one(f64::sinh),
        "cosh" => one(f64::cosh),
        "tanh" => one(f64::tanh),
        "floor" => one(f64::floor),
        "ceil" | "ceiling" => one(f64::ceil),
        "round" => one(f64::round),
        "factorial" => match args {
            [x] => factorial(*x),
            _ => Err(CurioError::Calculation(format!(
                "factorial() takes 1 argument, got {}",
                args.len()
            ))),
        },
        "min" if !args.is_empty() => Ok(args.iter().cloned().fold(f64::INFINITY, f64::min)),
        "max" if !args.is_empty() => Ok(args.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
        _ => Err(CurioError::Calculation(format!(
            "unknown function '{}'",
            name
        ))),
    }
}

fn positive_log(name: &str, args: &[f64], f: fn(f64) -> f64) -> Result<f64> {
    match args {
        [x] if *x > 0.0 => Ok(f(*x)),
        [_] => Err(CurioError::Calculation(
            "logarithm of a number that is not positive".to_string(),
        )),
        _ => Err(CurioError::Calculation(format!(
            "{}() takes 1 argument, got {}",
            name,
            args.len()
        ))),
    }
}

fn factorial(n: f64) -> Result<f64> {
    if n < 0.0 || n.fract() != 0.0 {
        return Err(CurioError::Calculation(
            "factorial needs a whole number that is not negative".to_string(),
        ));
    }
    if n > 170.0 {
        return Err(CurioError::Calculation("factorial is too large".to_string()));
    }
    Ok((1..=n as u32).fold(1.0, |acc, k| acc * k as f64))
}
