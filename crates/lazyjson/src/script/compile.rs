//! Infix to RPN.

use alloc::{format, string::ToString, sync::Arc, vec::Vec};

use bstr::{BStr, ByteSlice};

use super::{Registry, Token};
use crate::{
    Error, PathErrorKind, Value,
    classes::{
        ACT_CLOSE, ACT_NUMBER, ACT_OPEN, ACT_OPERATOR, ACT_PATH, ACT_SIGN, ACT_STRING, ACT_WORD,
        X_OPERAND, X_OPERATOR, classify, expr_next, is_word,
    },
    escape::unescape,
    jsonpath::Path,
    scanner::Scanner,
    script::{Function, Operation},
};

type Result<T> = core::result::Result<T, Error>;

/// Entries of the operator stack.
enum Pending {
    Open,
    Function { name: Arc<str>, function: Function },
    Operation { symbol: Arc<str>, operation: Operation },
    Sign { negate: bool },
}

impl Pending {
    fn into_token(self) -> Option<Token> {
        Some(match self {
            Pending::Open => return None,
            Pending::Function { name, function } => Token::Function { name, function },
            Pending::Operation { symbol, operation } => Token::Operation { symbol, operation },
            Pending::Sign { negate } => Token::Sign { negate },
        })
    }
}

struct Compiler<'a> {
    registry: &'a Registry,
    scanner: Scanner<'a>,
    output: Vec<Token>,
    stack: Vec<Pending>,
    state: i8,
}

pub(super) fn to_rpn(expression: &str, registry: &Registry) -> Result<Vec<Token>> {
    let mut compiler = Compiler {
        registry,
        scanner: Scanner::new(expression.as_bytes()),
        output: Vec::new(),
        stack: Vec::new(),
        state: X_OPERAND,
    };
    compiler.run()?;
    Ok(compiler.output)
}

fn formula_error(message: impl Into<alloc::string::String>) -> Error {
    Error::path(PathErrorKind::MalformedFormula, message)
}

impl<'a> Compiler<'a> {
    fn run(&mut self) -> Result<()> {
        while let Ok(byte) = self.scanner.first_non_space() {
            let start = self.scanner.index();
            match expr_next(self.state, classify(byte)) {
                ACT_NUMBER => self.number(start)?,
                ACT_STRING => self.string(start, byte)?,
                ACT_PATH => self.path(start)?,
                ACT_WORD => self.word(start)?,
                ACT_OPEN => {
                    self.stack.push(Pending::Open);
                    self.scanner.seek(start + 1);
                }
                ACT_CLOSE => self.close(start)?,
                ACT_SIGN => self.sign(start, byte)?,
                ACT_OPERATOR => self.operator(start)?,
                _ if byte == b')' => {
                    return Err(formula_error("wrong position for closing parenthesis").at(start));
                }
                _ => {
                    return Err(Error::path(
                        PathErrorKind::UnknownToken,
                        format!("unexpected '{}'", BStr::new(&[byte])),
                    )
                    .at(start));
                }
            }
        }

        if self.output.is_empty() && self.stack.is_empty() {
            return Err(Error::path(PathErrorKind::EmptyRequest, "expression is empty"));
        }
        if self.state == X_OPERAND {
            return Err(formula_error("expression ends where an operand is expected")
                .at(self.scanner.index()));
        }
        while let Some(pending) = self.stack.pop() {
            let token = pending
                .into_token()
                .ok_or_else(|| formula_error("formula has no open parenthesis"))?;
            self.output.push(token);
        }
        Ok(())
    }

    fn literal(&mut self, start: usize, value: Value) {
        let text = self.scanner.since(start).to_str_lossy();
        self.output.push(Token::Literal {
            text: Arc::from(text.as_ref()),
            value,
        });
        self.state = X_OPERATOR;
    }

    fn number(&mut self, start: usize) -> Result<()> {
        self.scanner.consume_numeric()?;
        let text = self.scanner.since(start);
        let value = text
            .to_str()
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| formula_error(format!("bad number {}", BStr::new(text))).at(start))?;
        self.literal(start, Value::Number(value));
        Ok(())
    }

    fn string(&mut self, start: usize, quote: u8) -> Result<()> {
        self.scanner.consume_string(quote)?;
        let end = self.scanner.index();
        let body = &self.scanner.data()[start + 1..end - 1];
        let value = unescape(body, start + 1)?.into_owned();
        self.literal(start, Value::String(value));
        Ok(())
    }

    /// A sub-path runs over names, dots, bracket groups and `*` right after
    /// a dot, so `@.a*2` stops before the multiplication.
    fn path(&mut self, start: usize) -> Result<()> {
        self.scanner.seek(start + 1);
        let mut after_dot = false;
        while let Some(b) = self.scanner.peek() {
            match b {
                b'[' => self.scanner.consume_balanced(b'[', b']')?,
                b'.' => {
                    self.scanner.seek(self.scanner.index() + 1);
                    after_dot = true;
                    continue;
                }
                b'*' if after_dot => self.scanner.seek(self.scanner.index() + 1),
                b if is_word(b) => {
                    self.scanner.word();
                }
                _ => break,
            }
            after_dot = false;
        }
        let text = self.scanner.since(start);
        let text = text.to_str().map_err(|_| self.scanner.error_symbol())?;
        let path = Path::parse_with(text, self.registry).map_err(|err| {
            let offset = start + err.offset().unwrap_or(0);
            err.at(offset)
        })?;
        let length_of = text
            .strip_suffix(".length")
            .map(|parent| Path::parse_with(parent, self.registry))
            .transpose()?;
        self.output.push(Token::Path { path, length_of });
        self.state = X_OPERATOR;
        Ok(())
    }

    /// A word is a function when an opening parenthesis follows, a constant
    /// otherwise.
    fn word(&mut self, start: usize) -> Result<()> {
        let word = self.scanner.word().to_str_lossy().to_string();
        let registry = self.registry;
        if self.scanner.first_non_space().ok() == Some(b'(') {
            let function = registry.function(&word).ok_or_else(|| {
                Error::path(PathErrorKind::UnknownToken, format!("unknown function '{word}'")).at(start)
            })?;
            self.stack.push(Pending::Function {
                name: Arc::from(word.to_ascii_lowercase()),
                function: function.clone(),
            });
            self.stack.push(Pending::Open);
            self.scanner.seek(self.scanner.index() + 1);
            return Ok(());
        }
        let value = registry.constant(&word).cloned().ok_or_else(|| {
            Error::path(PathErrorKind::UnknownToken, format!("unknown constant '{word}'")).at(start)
        })?;
        self.output.push(Token::Literal {
            text: Arc::from(word),
            value,
        });
        self.state = X_OPERATOR;
        Ok(())
    }

    fn close(&mut self, start: usize) -> Result<()> {
        loop {
            match self.stack.pop() {
                None => {
                    return Err(formula_error("wrong position for closing parenthesis").at(start));
                }
                Some(Pending::Open) => break,
                Some(pending) => self.output.extend(pending.into_token()),
            }
        }
        if matches!(self.stack.last(), Some(Pending::Function { .. })) {
            self.output.extend(self.stack.pop().and_then(Pending::into_token));
        }
        self.scanner.seek(start + 1);
        self.state = X_OPERATOR;
        Ok(())
    }

    /// A sign directly in front of a number is part of the literal;
    /// anywhere else it is a prefix operator. The prefix form binds tighter
    /// than every binary operator except the right-associative ones, so
    /// `-@.a ** 2` negates the power.
    fn sign(&mut self, start: usize, byte: u8) -> Result<()> {
        let next = self.scanner.data().get(start + 1).copied();
        if next.is_some_and(|b| b.is_ascii_digit() || b == b'.') {
            return self.number(start);
        }
        self.stack.push(Pending::Sign {
            negate: byte == b'-',
        });
        self.scanner.seek(start + 1);
        Ok(())
    }

    fn operator(&mut self, start: usize) -> Result<()> {
        let run = self.scanner.operator_run().to_str_lossy().to_string();
        let registry = self.registry;
        let (symbol, operation) = registry.longest_operation(&run).ok_or_else(|| {
            Error::path(PathErrorKind::UnknownToken, format!("unknown operator '{run}'")).at(start)
        })?;
        self.scanner.seek(start + symbol.len());

        while let Some(top) = self.stack.last() {
            let pops = match top {
                Pending::Sign { .. } => !operation.right_assoc,
                Pending::Operation { operation: above, .. } => {
                    above.priority > operation.priority
                        || (above.priority == operation.priority && !above.right_assoc)
                }
                Pending::Open | Pending::Function { .. } => false,
            };
            if !pops {
                break;
            }
            self.output.extend(self.stack.pop().and_then(Pending::into_token));
        }
        self.stack.push(Pending::Operation {
            symbol: Arc::from(symbol),
            operation: operation.clone(),
        });
        self.state = X_OPERAND;
        Ok(())
    }
}
