//! JSONPath queries over a [`Document`].
//!
//! A [`Path`] is compiled once into a list of [`Selector`]s and can then be
//! evaluated against any document. Evaluation starts from the root (`$`) or
//! from a given node (`@`) and maps the current result set through each
//! selector in turn. Nodes a selector does not apply to are dropped without
//! an error.
//!
//! Supported syntax
//! - `$`, `@` as the first token
//! - `.name`, `['name']`, `["name"]`
//! - `.*`, `[*]`
//! - `..` recursive descent (the node itself and all of its descendants)
//! - `[0]`, `[-1]`, `[0,'a',2]` unions; integer keys and indices are
//!   interchangeable
//! - `[start:stop:step]` slices with Python semantics
//! - `[?(expr)]` filters and `[(expr)]` computed keys, see [`Script`]
//!
//! ```
//! use lazyjson::{Document, Path};
//!
//! let doc = Document::parse(br#"{"a": [{"b": 1}, {"b": 2}, {"c": 3}]}"#).unwrap();
//! let path = Path::parse("$.a[?(@.b > 1)].b").unwrap();
//! let found: Vec<_> = path.evaluate(&doc).unwrap().iter().map(|n| n.to_string()).collect();
//! assert_eq!(found, ["2"]);
//! ```

mod compile;
mod select;

use alloc::{sync::Arc, vec::Vec};
use core::fmt;

use crate::{Document, Error, NodeRef, Registry, Script};

type Result<T> = core::result::Result<T, Error>;

/// One member of a `[...]` union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A member name, quoted or bare.
    Key(Arc<str>),
    /// An integer position; negative counts from the end.
    Index(i64),
}

/// One compiled step of a [`Path`].
#[derive(Debug, Clone)]
pub enum Selector {
    /// `$`
    Root,
    /// `@`
    Current,
    /// `.name` or `['name']`
    Child(Arc<str>),
    /// `*`
    Wildcard,
    /// `..`
    Descent,
    /// `[a,b,...]` with one or more items
    Union(Vec<Item>),
    /// `[start:stop:step]`; the step is never zero.
    Slice {
        /// First position, inclusive.
        start: Option<i64>,
        /// Last position, exclusive.
        stop: Option<i64>,
        /// Stride; negative walks backwards.
        step: i64,
    },
    /// `[?(expr)]`
    Filter(Script),
    /// `[(expr)]`
    Script(Script),
}

/// A compiled JSONPath.
#[derive(Clone)]
pub struct Path {
    source: Arc<str>,
    selectors: Vec<Selector>,
}

impl Path {
    /// Compiles `path`; expressions inside it use the standard registry.
    pub fn parse(path: &str) -> Result<Self> {
        Self::parse_with(path, Registry::standard())
    }

    /// Compiles `path`; expressions inside it use `registry`.
    pub fn parse_with(path: &str, registry: &Registry) -> Result<Self> {
        let selectors = compile::selectors(path, registry)?;
        tracing::debug!(path, selectors = selectors.len(), "compiled path");
        Ok(Self {
            source: Arc::from(path),
            selectors,
        })
    }

    /// The path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compiled steps.
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Evaluates the path from the document root. A leading `@` also
    /// starts at the root.
    pub fn evaluate<'a>(&self, doc: &'a Document<'a>) -> Result<Vec<NodeRef<'a>>> {
        self.evaluate_from(doc.root())
    }

    /// Evaluates the path with `@` bound to `current`.
    pub fn evaluate_from<'a>(&self, current: NodeRef<'a>) -> Result<Vec<NodeRef<'a>>> {
        select::run(&self.selectors, current)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("source", &self.source)
            .field("selectors", &self.selectors)
            .finish()
    }
}

#[cfg(test)]
mod tests;
