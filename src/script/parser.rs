//! Schema script parser
//!
//! A script is a sequence of method-chain statements rooted at a bound variable:
//!
//! ```text
//! // comments are allowed
//! schema.propertyKey("name").asText().ifNotExist().create();
//! schema.vertexLabel("person")
//!       .properties("name", "age")
//!       .primaryKeys("name")
//!       .create()
//! ```
//!
//! Statements end at `;` or where a chain stops continuing with `.`.

use crate::error::LoadError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(s) => write!(f, "\"{}\"", s),
            Arg::Int(i) => write!(f, "{}", i),
            Arg::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub args: Vec<Arg>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub receiver: String,
    pub calls: Vec<Call>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Dot,
    LParen,
    RParen,
    Comma,
    Semi,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::Str(s) => write!(f, "string \"{}\"", s),
            Token::Int(i) => write!(f, "number {}", i),
            Token::Dot => f.write_str("'.'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::Semi => f.write_str("';'"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, LoadError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                let start = line;
                chars.next();
                let mut prev = '\0';
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                    }
                    if prev == '*' && c == '/' {
                        closed = true;
                        break;
                    }
                    prev = c;
                }
                if !closed {
                    return Err(LoadError::script(start, "Unterminated block comment"));
                }
            }
            '.' => tokens.push((Token::Dot, line)),
            '(' => tokens.push((Token::LParen, line)),
            ')' => tokens.push((Token::RParen, line)),
            ',' => tokens.push((Token::Comma, line)),
            ';' => tokens.push((Token::Semi, line)),
            '"' | '\'' => {
                let quote = c;
                let start = line;
                let mut value = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some(other) => value.push(other),
                            None => break,
                        },
                        '\n' => {
                            return Err(LoadError::script(start, "Unterminated string literal"));
                        }
                        c if c == quote => {
                            closed = true;
                            break;
                        }
                        c => value.push(c),
                    }
                }
                if !closed {
                    return Err(LoadError::script(start, "Unterminated string literal"));
                }
                tokens.push((Token::Str(value), start));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut digits = c.to_string();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_digit() {
                        digits.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| LoadError::script(line, format!("Invalid number '{}'", digits)))?;
                tokens.push((Token::Int(value), line));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = c.to_string();
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' || next == '$' {
                        ident.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(ident), line));
            }
            other => {
                return Err(LoadError::script(line, format!("Unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, l)| *l)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<usize, LoadError> {
        match self.next() {
            Some((token, line)) if token == expected => Ok(line),
            Some((token, line)) => Err(LoadError::script(
                line,
                format!("Expected {} but found {}", expected, token),
            )),
            None => Err(LoadError::script(
                self.line(),
                format!("Expected {} but reached end of script", expected),
            )),
        }
    }

    fn ident(&mut self) -> Result<(String, usize), LoadError> {
        match self.next() {
            Some((Token::Ident(name), line)) => Ok((name, line)),
            Some((token, line)) => Err(LoadError::script(
                line,
                format!("Expected identifier but found {}", token),
            )),
            None => Err(LoadError::script(
                self.line(),
                "Expected identifier but reached end of script",
            )),
        }
    }

    fn args(&mut self) -> Result<Vec<Arg>, LoadError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.next();
            return Ok(args);
        }
        loop {
            let arg = match self.next() {
                Some((Token::Str(s), _)) => Arg::Str(s),
                Some((Token::Int(i), _)) => Arg::Int(i),
                Some((Token::Ident(word), _)) if word == "true" => Arg::Bool(true),
                Some((Token::Ident(word), _)) if word == "false" => Arg::Bool(false),
                Some((token, line)) => {
                    return Err(LoadError::script(
                        line,
                        format!("Unsupported argument {}", token),
                    ))
                }
                None => {
                    return Err(LoadError::script(
                        self.line(),
                        "Unclosed argument list at end of script",
                    ))
                }
            };
            args.push(arg);
            match self.next() {
                Some((Token::Comma, _)) => continue,
                Some((Token::RParen, _)) => return Ok(args),
                Some((token, line)) => {
                    return Err(LoadError::script(
                        line,
                        format!("Expected ',' or ')' but found {}", token),
                    ))
                }
                None => {
                    return Err(LoadError::script(
                        self.line(),
                        "Unclosed argument list at end of script",
                    ))
                }
            }
        }
    }

    fn statement(&mut self) -> Result<Statement, LoadError> {
        let (receiver, line) = self.ident()?;
        let mut calls = Vec::new();
        while self.peek() == Some(&Token::Dot) {
            self.next();
            let (method, call_line) = self.ident()?;
            let args = self.args()?;
            calls.push(Call {
                method,
                args,
                line: call_line,
            });
        }
        if calls.is_empty() {
            return Err(LoadError::script(
                line,
                format!("Statement '{}' does not call any method", receiver),
            ));
        }
        if self.peek() == Some(&Token::Semi) {
            self.next();
        }
        Ok(Statement {
            receiver,
            calls,
            line,
        })
    }
}

/// Parse a whole script into statements
pub fn parse(source: &str) -> Result<Vec<Statement>, LoadError> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        pos: 0,
    };
    let mut statements = Vec::new();
    while let Some(token) = parser.peek() {
        if *token == Token::Semi {
            parser.next();
            continue;
        }
        statements.push(parser.statement()?);
    }
    Ok(statements)
}
