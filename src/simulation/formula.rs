//! Restricted arithmetic formulas
//!
//! Event formulas are parsed into a small expression tree and evaluated over
//! exactly two inputs: `rnd` (the uniform draw) and `value` (the event's base
//! value). Anything outside the grammar is rejected at parse time.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('^' unary)?
//! primary := number | 'rnd' | 'value' | func '(' expr (',' expr)* ')' | '(' expr ')'
//! func    := sqrt | exp | ln | log10 | abs | floor | ceil | round | min | max | pow
//! ```
//!
//! # Example
//!
//! ```
//! use outfall::simulation::formula::Formula;
//!
//! let f = Formula::parse("value + rnd * 5").unwrap();
//! assert_eq!(f.evaluate(0.5, 10.0).unwrap(), 12.5);
//! assert!(Formula::parse("value; drop()").is_err());
//! ```

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a formula could not be parsed or evaluated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("empty formula")]
    Empty,
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unknown identifier '{0}' (allowed: rnd, value)")]
    UnknownIdentifier(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("function '{name}' takes {expected} argument(s), got {got}")]
    Arity {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    #[error("result is not a finite number")]
    NonFinite,
}

/// Allow-listed functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sqrt,
    Exp,
    Ln,
    Log10,
    Abs,
    Floor,
    Ceil,
    Round,
    Min,
    Max,
    Pow,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        let f = match name {
            "sqrt" => Self::Sqrt,
            "exp" => Self::Exp,
            "ln" => Self::Ln,
            "log10" => Self::Log10,
            "abs" => Self::Abs,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            "min" => Self::Min,
            "max" => Self::Max,
            "pow" => Self::Pow,
            _ => return None,
        };
        Some(f)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Sqrt => "sqrt",
            Self::Exp => "exp",
            Self::Ln => "ln",
            Self::Log10 => "log10",
            Self::Abs => "abs",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Min => "min",
            Self::Max => "max",
            Self::Pow => "pow",
        }
    }

    fn arity(self) -> usize {
        match self {
            Self::Min | Self::Max | Self::Pow => 2,
            _ => 1,
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        match self {
            Self::Sqrt => args[0].sqrt(),
            Self::Exp => args[0].exp(),
            Self::Ln => args[0].ln(),
            Self::Log10 => args[0].log10(),
            Self::Abs => args[0].abs(),
            Self::Floor => args[0].floor(),
            Self::Ceil => args[0].ceil(),
            Self::Round => args[0].round(),
            Self::Min => args[0].min(args[1]),
            Self::Max => args[0].max(args[1]),
            Self::Pow => args[0].powf(args[1]),
        }
    }
}

/// The two formula inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Rnd,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Var(Variable),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    fn eval(&self, rnd: f64, value: f64) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::Var(Variable::Rnd) => rnd,
            Expr::Var(Variable::Value) => value,
            Expr::Neg(inner) => -inner.eval(rnd, value),
            Expr::Binary(op, lhs, rhs) => {
                let (a, b) = (lhs.eval(rnd, value), rhs.eval(rnd, value));
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Expr::Call(func, args) => {
                let values: Vec<f64> = args.iter().map(|a| a.eval(rnd, value)).collect();
                func.apply(&values)
            }
        }
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
    Caret,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, FormulaError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' | '-' | '*' | '/' | '^' | '(' | ')' | ',' => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '^' => Token::Caret,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    _ => Token::Comma,
                });
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent part: e/E followed by optional sign and digits
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
                let n = text.parse::<f64>().map_err(|_| FormulaError::InvalidNumber(text.clone()))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(FormulaError::UnexpectedChar { ch: other, pos: i }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(FormulaError::UnexpectedToken(tok.to_string())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.call(&name)
                } else {
                    match name.as_str() {
                        "rnd" => Ok(Expr::Var(Variable::Rnd)),
                        "value" => Ok(Expr::Var(Variable::Value)),
                        _ => Err(FormulaError::UnknownIdentifier(name)),
                    }
                }
            }
            Some(tok) => Err(FormulaError::UnexpectedToken(tok.to_string())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    /// Arguments of a call; the opening parenthesis is already consumed
    fn call(&mut self, name: &str) -> Result<Expr, FormulaError> {
        let func = Function::lookup(name).ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;
        let mut args = vec![self.expr()?];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            args.push(self.expr()?);
        }
        self.expect(Token::RParen)?;

        if args.len() != func.arity() {
            return Err(FormulaError::Arity {
                name: func.name(),
                expected: func.arity(),
                got: args.len(),
            });
        }
        Ok(Expr::Call(func, args))
    }
}

/// A parsed, validated formula
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse a formula, rejecting anything outside the grammar
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(FormulaError::Empty);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        if let Some(tok) = parser.peek() {
            return Err(FormulaError::UnexpectedToken(tok.to_string()));
        }
        Ok(Self {
            source: source.trim().to_string(),
            expr,
        })
    }

    /// Evaluate for one draw and base value
    pub fn evaluate(&self, rnd: f64, value: f64) -> Result<f64, FormulaError> {
        let result = self.expr.eval(rnd, value);
        if result.is_finite() {
            Ok(result)
        } else {
            Err(FormulaError::NonFinite)
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str, rnd: f64, value: f64) -> Result<f64, FormulaError> {
        Formula::parse(src)?.evaluate(rnd, value)
    }

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(eval("value + rnd * 5", 0.5, 5.0).unwrap(), 7.5);
        assert_eq!(eval("value - rnd * 3", 0.5, 10.0).unwrap(), 8.5);
        assert_eq!(eval("(value + 1) * 2", 0.0, 3.0).unwrap(), 8.0);
        assert_eq!(eval("10 / 4", 0.0, 0.0).unwrap(), 2.5);
        assert_eq!(eval("1.5e2", 0.0, 0.0).unwrap(), 150.0);
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("2 + 3 * 4", 0.0, 0.0).unwrap(), 14.0);
        assert_eq!(eval("10 - 4 - 3", 0.0, 0.0).unwrap(), 3.0);
        assert_eq!(eval("2 ^ 3 ^ 2", 0.0, 0.0).unwrap(), 512.0);
        assert_eq!(eval("-2 ^ 2", 0.0, 0.0).unwrap(), -4.0);
        assert_eq!(eval("2 ^ -1", 0.0, 0.0).unwrap(), 0.5);
        assert_eq!(eval("--3", 0.0, 0.0).unwrap(), 3.0);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("sqrt(value)", 0.0, 16.0).unwrap(), 4.0);
        assert_eq!(eval("max(rnd, value)", 0.3, 0.1).unwrap(), 0.3);
        assert_eq!(eval("min(rnd, value)", 0.3, 0.1).unwrap(), 0.1);
        assert_eq!(eval("pow(2, 10)", 0.0, 0.0).unwrap(), 1024.0);
        assert_eq!(eval("round(value * rnd)", 0.26, 10.0).unwrap(), 3.0);
        assert!((eval("ln(exp(2))", 0.0, 0.0).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_unknown_names() {
        assert_eq!(Formula::parse("valor + 1"), Err(FormulaError::UnknownIdentifier("valor".into())));
        assert_eq!(Formula::parse("system(1)"), Err(FormulaError::UnknownFunction("system".into())));
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert_eq!(Formula::parse(""), Err(FormulaError::Empty));
        assert_eq!(Formula::parse("   "), Err(FormulaError::Empty));
        assert_eq!(Formula::parse("value +"), Err(FormulaError::UnexpectedEnd));
        assert_eq!(Formula::parse("(value"), Err(FormulaError::UnexpectedEnd));
        assert!(matches!(Formula::parse("value; 1"), Err(FormulaError::UnexpectedChar { ch: ';', pos: 5 })));
        assert!(matches!(Formula::parse("value 2"), Err(FormulaError::UnexpectedToken(_))));
        assert!(matches!(Formula::parse("1..2"), Err(FormulaError::InvalidNumber(_))));
    }

    #[test]
    fn test_arity_checked_at_parse_time() {
        assert_eq!(
            Formula::parse("max(1)"),
            Err(FormulaError::Arity {
                name: "max",
                expected: 2,
                got: 1,
            })
        );
        assert!(matches!(Formula::parse("sqrt(1, 2)"), Err(FormulaError::Arity { .. })));
    }

    #[test]
    fn test_non_finite_results_fail() {
        assert_eq!(eval("value / rnd", 0.0, 1.0), Err(FormulaError::NonFinite));
        assert_eq!(eval("ln(rnd - 1)", 0.5, 0.0), Err(FormulaError::NonFinite));
        assert_eq!(eval("sqrt(-1)", 0.0, 0.0), Err(FormulaError::NonFinite));
    }

    #[test]
    fn test_from_str_and_source() {
        let f: Formula = " value * 2 ".parse().unwrap();
        assert_eq!(f.source(), "value * 2");
        assert_eq!(f.evaluate(0.0, 4.0).unwrap(), 8.0);
    }
}
