//! Expression language used by JSONPath filters and scripts.
//!
//! What it does
//! - Tokenizes an infix expression with the expression state table: number
//!   and string literals, `$`/`@` sub-paths, constants, one-argument
//!   functions, registered operators, parentheses and prefix signs.
//! - Reorders the tokens into Reverse Polish Notation with the
//!   shunting-yard algorithm. Priorities and associativity come from the
//!   [`Registry`].
//! - Evaluates the RPN on a value stack with `@` bound to a node.
//!
//! Example
//! ```
//! use lazyjson::Script;
//!
//! let script = Script::parse("3 + 4 * 2 / (1 - 5) ** 2").unwrap();
//! assert_eq!(script.to_string(), "3 4 2 * 1 5 - 2 ** / +");
//! assert_eq!(script.evaluate_standalone().unwrap().as_f64(), Some(3.5));
//! ```

mod builtins;
mod compile;
pub mod registry;

use alloc::{format, sync::Arc, vec::Vec};
use core::fmt;

pub use registry::{Apply, Function, Operation, Registry};

use crate::{Document, Error, NodeRef, PathErrorKind, Value, jsonpath::Path};

type Result<T> = core::result::Result<T, Error>;

/// One RPN instruction.
#[derive(Clone)]
pub(crate) enum Token {
    /// A number, string or constant; `text` is how it was written.
    Literal { text: Arc<str>, value: Value },
    /// A sub-path. `length_of` is the path without a trailing `.length`
    /// member, used when that member does not exist.
    Path { path: Path, length_of: Option<Path> },
    Function { name: Arc<str>, function: Function },
    Operation { symbol: Arc<str>, operation: Operation },
    /// Prefix `-` (`negate == true`) or `+`.
    Sign { negate: bool },
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal { text, .. } => f.write_str(text),
            Token::Path { path, .. } => write!(f, "{path}"),
            Token::Function { name, .. } => f.write_str(name),
            Token::Operation { symbol, .. } => f.write_str(symbol),
            Token::Sign { negate: true } => f.write_str("neg"),
            Token::Sign { negate: false } => f.write_str("pos"),
        }
    }
}

/// A compiled expression.
///
/// `Display` prints the postfix form with tokens separated by spaces.
#[derive(Clone)]
pub struct Script {
    source: Arc<str>,
    rpn: Vec<Token>,
}

impl Script {
    /// Compiles `expression` against the standard registry.
    pub fn parse(expression: &str) -> Result<Self> {
        Self::parse_with(expression, Registry::standard())
    }

    /// Compiles `expression` against `registry`.
    pub fn parse_with(expression: &str, registry: &Registry) -> Result<Self> {
        let rpn = compile::to_rpn(expression, registry)?;
        tracing::trace!(expression, tokens = rpn.len(), "compiled expression");
        Ok(Self {
            source: Arc::from(expression),
            rpn,
        })
    }

    /// The expression as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluates with `@` bound to `current` and `$` to its document's root.
    pub fn evaluate(&self, current: NodeRef<'_>) -> Result<Value> {
        self.run(Some(current))
    }

    /// Evaluates without a node. Sub-paths evaluate against an empty
    /// document.
    pub fn evaluate_standalone(&self) -> Result<Value> {
        self.run(None)
    }

    fn run(&self, current: Option<NodeRef<'_>>) -> Result<Value> {
        let empty;
        let current = match current {
            Some(node) => node,
            None => {
                empty = Document::new();
                empty.root()
            }
        };

        let mut stack: Vec<Value> = Vec::with_capacity(self.rpn.len());
        for token in &self.rpn {
            let value = match token {
                Token::Literal { value, .. } => value.clone(),
                Token::Path { path, length_of } => sub_path(current, path, length_of.as_ref())?,
                Token::Function { function, .. } => {
                    let arg = self.pop(&mut stack, token)?;
                    function(&arg)?
                }
                Token::Operation { operation, .. } => {
                    let right = self.pop(&mut stack, token)?;
                    let left = self.pop(&mut stack, token)?;
                    (operation.apply)(&left, &right)?
                }
                Token::Sign { negate } => match self.pop(&mut stack, token)? {
                    Value::Number(n) if *negate => Value::Number(-n),
                    Value::Number(n) => Value::Number(n),
                    other => {
                        return Err(Error::wrong_type(format!(
                            "sign applied to {}",
                            other.type_name()
                        )));
                    }
                },
            };
            stack.push(value);
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(value), true) => Ok(value),
            _ => Err(Error::path(
                PathErrorKind::MalformedFormula,
                format!("'{}' does not reduce to one value", self.source),
            )),
        }
    }

    fn pop(&self, stack: &mut Vec<Value>, token: &Token) -> Result<Value> {
        stack.pop().ok_or_else(|| {
            Error::path(
                PathErrorKind::MalformedFormula,
                format!("missing operand for '{token}' in '{}'", self.source),
            )
        })
    }
}

/// Value of a sub-path: `null` for no match, the node's value for one,
/// an array of values for several.
fn sub_path(current: NodeRef<'_>, path: &Path, length_of: Option<&Path>) -> Result<Value> {
    let nodes = path.evaluate_from(current)?;
    match nodes.as_slice() {
        [] => {
            if let Some(parent) = length_of {
                if let [array] = parent.evaluate_from(current)?.as_slice() {
                    if array.is_array() {
                        #[allow(clippy::cast_precision_loss)]
                        return Ok(Value::Number(array.len() as f64));
                    }
                }
            }
            Ok(Value::Null)
        }
        [node] => node.unpack(),
        many => Ok(Value::Array(
            many.iter().map(NodeRef::unpack).collect::<Result<_>>()?,
        )),
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.rpn.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("source", &self.source)
            .field("rpn", &format!("{self}"))
            .finish()
    }
}

/// Evaluates `expression` with `@` bound to `node`.
pub fn eval(node: NodeRef<'_>, expression: &str) -> Result<Value> {
    Script::parse(expression)?.evaluate(node)
}
