//! Name tables consulted by the expression compiler.
//!
//! A [`Registry`] maps names to one-argument functions, operator symbols to
//! binary operations, and names to constants. Function and constant names
//! are matched case-insensitively; operator symbols exactly. Compiled
//! scripts keep their own handles to what they use, so a registry can be
//! dropped or changed after compilation.

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    sync::Arc,
};
use core::fmt;
use std::sync::LazyLock;

use crate::{Error, Value};

/// A one-argument function callable from expressions.
pub type Function = Arc<dyn Fn(&Value) -> Result<Value, Error> + Send + Sync>;

/// The body of a binary operator: `(left, right) -> result`.
pub type Apply = Arc<dyn Fn(&Value, &Value) -> Result<Value, Error> + Send + Sync>;

/// A binary operator with its precedence.
#[derive(Clone)]
pub struct Operation {
    /// Higher binds tighter.
    pub priority: u8,
    /// Whether `a op b op c` groups as `a op (b op c)`.
    pub right_assoc: bool,
    /// Computes the result.
    pub apply: Apply,
}

impl Operation {
    /// A left-associative operator.
    pub fn new(
        priority: u8,
        apply: impl Fn(&Value, &Value) -> Result<Value, Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            priority,
            right_assoc: false,
            apply: Arc::new(apply),
        }
    }

    /// Makes the operator right-associative.
    #[must_use]
    pub fn right_assoc(mut self) -> Self {
        self.right_assoc = true;
        self
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("priority", &self.priority)
            .field("right_assoc", &self.right_assoc)
            .finish_non_exhaustive()
    }
}

/// Functions, operators and constants available to expressions.
///
/// # Examples
///
/// ```
/// use lazyjson::{Registry, Script, Value};
///
/// let registry = Registry::default()
///     .with_function("double", |v: &Value| match v {
///         Value::Number(n) => Ok(Value::Number(n * 2.0)),
///         _ => Ok(Value::Null),
///     })
///     .with_constant("answer", 21.0);
/// let script = Script::parse_with("Double(ANSWER)", &registry).unwrap();
/// assert_eq!(script.evaluate_standalone().unwrap(), Value::Number(42.0));
/// ```
#[derive(Clone)]
pub struct Registry {
    functions: BTreeMap<String, Function>,
    operations: BTreeMap<String, Operation>,
    constants: BTreeMap<String, Value>,
}

static STANDARD: LazyLock<Registry> = LazyLock::new(|| {
    let registry = super::builtins::install(Registry::empty());
    tracing::debug!(
        functions = registry.functions.len(),
        operations = registry.operations.len(),
        constants = registry.constants.len(),
        "built standard registry"
    );
    registry
});

impl Registry {
    /// A registry with nothing in it.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
            operations: BTreeMap::new(),
            constants: BTreeMap::new(),
        }
    }

    /// The shared prebuilt registry with the standard operators, math
    /// functions and constants.
    #[must_use]
    pub fn standard() -> &'static Registry {
        &STANDARD
    }

    /// Adds or replaces a function.
    #[must_use]
    pub fn with_function(
        mut self,
        name: &str,
        function: impl Fn(&Value) -> Result<Value, Error> + Send + Sync + 'static,
    ) -> Self {
        self.functions.insert(name.to_ascii_lowercase(), Arc::new(function));
        self
    }

    /// Adds or replaces an operator.
    #[must_use]
    pub fn with_operation(mut self, symbol: &str, operation: Operation) -> Self {
        self.operations.insert(symbol.to_string(), operation);
        self
    }

    /// Adds or replaces a constant.
    #[must_use]
    pub fn with_constant(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.constants.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Looks up a function, ignoring case.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(&name.to_ascii_lowercase())
    }

    /// Looks up an operator by its exact symbol.
    #[must_use]
    pub fn operation(&self, symbol: &str) -> Option<&Operation> {
        self.operations.get(symbol)
    }

    /// Looks up a constant, ignoring case.
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(&name.to_ascii_lowercase())
    }

    /// The longest registered operator symbol that `run` starts with.
    pub(crate) fn longest_operation<'r>(&'r self, run: &str) -> Option<(&'r str, &'r Operation)> {
        (1..=run.len())
            .rev()
            .filter(|&len| run.is_char_boundary(len))
            .find_map(|len| self.operations.get_key_value(&run[..len]))
            .map(|(symbol, op)| (symbol.as_str(), op))
    }
}

/// A copy of [`Registry::standard`].
impl Default for Registry {
    fn default() -> Self {
        STANDARD.clone()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("functions", &self.functions.keys().collect::<alloc::vec::Vec<_>>())
            .field("operations", &self.operations)
            .field("constants", &self.constants)
            .finish()
    }
}
