//! Drag-constraint expressions: `"x = 0, y = y / 2"` style clause lists
//! restricting where a dragged object may go.
//!
//! Clauses are parsed once into an AST and evaluated per pointer move,
//! never through any dynamic code path. The grammar is arithmetic over
//! the three position components: `+ - * /`, unary minus, parentheses,
//! numeric literals, and the variables `x`, `y`, `z`. Clauses apply in
//! order, each seeing the assignments made before it.

use std::fmt;

use glam::Vec3;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("clause has no '='")]
    MissingEquals,
    #[error("assignment target must be x, y or z, got '{0}'")]
    BadTarget(String),
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("expression ended unexpectedly")]
    UnexpectedEnd,
    #[error("unexpected token after expression")]
    TrailingInput,
    #[error("malformed number '{0}'")]
    BadNumber(String),
}

/// One of the three position components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    X,
    Y,
    Z,
}

impl Component {
    fn read(self, v: Vec3) -> f32 {
        match self {
            Component::X => v.x,
            Component::Y => v.y,
            Component::Z => v.z,
        }
    }

    fn write(self, v: &mut Vec3, value: f32) {
        match self {
            Component::X => v.x = value,
            Component::Y => v.y = value,
            Component::Z => v.z = value,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Component::X),
            "y" => Some(Component::Y),
            "z" => Some(Component::Z),
            _ => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::X => write!(f, "x"),
            Component::Y => write!(f, "y"),
            Component::Z => write!(f, "z"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f32),
    Var(Component),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

fn eval(expr: &Expr, env: Vec3) -> f32 {
    match expr {
        Expr::Number(v) => *v,
        Expr::Var(c) => c.read(env),
        Expr::Neg(e) => -eval(e, env),
        Expr::Add(a, b) => eval(a, env) + eval(b, env),
        Expr::Sub(a, b) => eval(a, env) - eval(b, env),
        Expr::Mul(a, b) => eval(a, env) * eval(b, env),
        Expr::Div(a, b) => eval(a, env) / eval(b, env),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    target: Component,
    expr: Expr,
}

/// A parsed list of constraint clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    clauses: Vec<Clause>,
}

impl ConstraintSet {
    /// Parse a comma-separated clause list. A malformed clause is logged
    /// and dropped; the remaining clauses still apply.
    pub fn parse(source: &str) -> Self {
        let mut clauses = Vec::new();
        for raw in source.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match parse_clause(raw) {
                Ok(clause) => clauses.push(clause),
                Err(e) => log::warn!("ignoring drag constraint '{raw}': {e}"),
            }
        }
        Self { clauses }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Apply every clause in order to a candidate position. A clause
    /// evaluating to a non-finite value leaves its component untouched.
    pub fn apply(&self, position: Vec3) -> Vec3 {
        let mut env = position;
        for clause in &self.clauses {
            let value = eval(&clause.expr, env);
            if value.is_finite() {
                clause.target.write(&mut env, value);
            } else {
                log::trace!("constraint on {} produced {}, skipped", clause.target, value);
            }
        }
        env
    }
}

fn parse_clause(raw: &str) -> Result<Clause, ParseError> {
    let (lhs, rhs) = raw.split_once('=').ok_or(ParseError::MissingEquals)?;
    let target =
        Component::from_name(lhs.trim()).ok_or_else(|| ParseError::BadTarget(lhs.trim().into()))?;
    let tokens = tokenize(rhs)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::TrailingInput);
    }
    Ok(Clause { target, expr })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f32),
    Var(Component),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &src[start..end];
                let value: f32 = text
                    .parse()
                    .map_err(|_| ParseError::BadNumber(text.into()))?;
                tokens.push(Token::Number(value));
            }
            'a'..='z' | 'A'..='Z' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let name = &src[start..end];
                let var = Component::from_name(name)
                    .ok_or_else(|| ParseError::UnknownVariable(name.into()))?;
                tokens.push(Token::Var(var));
            }
            other => return Err(ParseError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let token = self.peek().ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.pos += 1;
                    lhs = Expr::Add(Box::new(lhs), Box::new(self.term()?));
                }
                Token::Minus => {
                    self.pos += 1;
                    lhs = Expr::Sub(Box::new(lhs), Box::new(self.term()?));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.pos += 1;
                    lhs = Expr::Mul(Box::new(lhs), Box::new(self.unary()?));
                }
                Token::Slash => {
                    self.pos += 1;
                    lhs = Expr::Div(Box::new(lhs), Box::new(self.unary()?));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.peek() == Some(Token::Minus) {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.advance()? {
            Token::Number(v) => Ok(Expr::Number(v)),
            Token::Var(c) => Ok(Expr::Var(c)),
            Token::LParen => {
                let inner = self.expr()?;
                if self.advance()? != Token::RParen {
                    return Err(ParseError::TrailingInput);
                }
                Ok(inner)
            }
            _ => Err(ParseError::UnexpectedEnd),
        }
    }
}
