//! A lazily decoded, zero-copy JSON tree with a JSONPath query engine.
//!
//! [`parse`] validates the input in one table-driven pass and builds an
//! arena of nodes that only record their type and byte range. Scalar
//! values are decoded the first time they are read and then cached.
//! Unmodified subtrees are written back verbatim, so formatting survives a
//! parse, edit, serialize cycle everywhere except along edited paths.
//!
//! ```
//! use lazyjson::{Value, parse, query};
//!
//! let mut doc = parse(br#"{"store": {"book": [{"price": 8.95}, {"price": 22.99}]}}"#).unwrap();
//! let cheap = doc.root().query("$..book[?(@.price < 10)].price").unwrap();
//! assert_eq!(cheap[0].get_numeric().unwrap(), 8.95);
//!
//! let book = doc.root().query("$.store.book").unwrap()[0].id();
//! let extra = doc.new_numeric(5.0);
//! doc.append_array(book, extra).unwrap();
//! assert_eq!(
//!     doc.to_bytes().unwrap(),
//!     br#"{"store":{"book":[{"price": 8.95},{"price": 22.99},5]}}"#
//! );
//!
//! let total = query(br#"[1, 2, 3]"#, "$[1:]").unwrap();
//! assert_eq!(total.values().unwrap(), [Value::Number(2.0), Value::Number(3.0)]);
//! ```

extern crate alloc;

mod classes;
mod decoder;
mod encoder;
mod error;
mod escape;
pub mod jsonpath;
pub mod must;
mod node;
mod options;
mod query;
mod scanner;
pub mod script;
mod value;

#[cfg(test)]
mod tests;

use alloc::vec::Vec;

pub use error::{Error, ErrorKind, PathErrorKind};
pub use jsonpath::Path;
pub use node::{Children, Document, Input, MAX_UNPACK_DEPTH, NodeId, NodeRef, NodeType, NodeValue};
pub use options::ParserOptions;
pub use query::{Selection, query};
pub use script::{Apply, Function, Operation, Registry, Script, eval};
pub use value::{Array, Map, Value};

/// Parses `input` into a [`Document`]. Borrowed input is not copied.
pub fn parse<'src>(input: impl Input<'src>) -> Result<Document<'src>, Error> {
    Document::parse(input)
}

/// Parses `input` with explicit [`ParserOptions`].
pub fn parse_with<'src>(
    input: impl Input<'src>,
    options: ParserOptions,
) -> Result<Document<'src>, Error> {
    Document::parse_with(input, options)
}

/// Writes the subtree under `node` as JSON.
pub fn serialize(node: NodeRef<'_>) -> Result<Vec<u8>, Error> {
    node.to_bytes()
}

/// Compiles a JSONPath against the standard [`Registry`].
pub fn compile_path(path: &str) -> Result<Path, Error> {
    Path::parse(path)
}

/// Evaluates a compiled path from the root of `doc`.
pub fn evaluate<'a>(path: &Path, doc: &'a Document<'a>) -> Result<Vec<NodeRef<'a>>, Error> {
    path.evaluate(doc)
}
