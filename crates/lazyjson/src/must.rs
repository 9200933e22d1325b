//! Panicking shortcuts for callers that already know the shape of their
//! data: tests, examples and hard-coded documents.
//!
//! Every function here wraps a fallible counterpart and panics with that
//! function's [`Error`](crate::Error) message instead of returning it.
//!
//! ```
//! let doc = lazyjson::must::parse(br#"{"n": 2}"#);
//! assert_eq!(doc.root().must_get("n").must_numeric(), 2.0);
//! ```

#![allow(clippy::must_use_candidate)]

use alloc::vec::Vec;
use core::fmt::Display;

use crate::{Document, Input, NodeRef, Path, Value};

#[track_caller]
fn must<T, E: Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}

/// # Panics
///
/// If `input` is not valid JSON.
#[track_caller]
pub fn parse<'src>(input: impl Input<'src>) -> Document<'src> {
    must(Document::parse(input))
}

/// # Panics
///
/// If `path` does not compile.
#[track_caller]
pub fn compile_path(path: &str) -> Path {
    must(Path::parse(path))
}

/// # Panics
///
/// If the subtree cannot be written as JSON.
#[track_caller]
pub fn serialize(node: NodeRef<'_>) -> Vec<u8> {
    must(node.to_bytes())
}

/// # Panics
///
/// If `expression` does not compile or fails to evaluate.
#[track_caller]
pub fn eval(node: NodeRef<'_>, expression: &str) -> Value {
    must(node.eval(expression))
}

impl<'a> NodeRef<'a> {
    /// # Panics
    ///
    /// If the node is not an object or has no member `key`.
    #[track_caller]
    pub fn must_get(&self, key: &str) -> NodeRef<'a> {
        match self.get(key) {
            Some(child) => child,
            None => panic!("{} has no member '{key}'", self.path()),
        }
    }

    /// # Panics
    ///
    /// If the node is not an array or `index` is out of range.
    #[track_caller]
    pub fn must_at(&self, index: isize) -> NodeRef<'a> {
        match self.at(index) {
            Some(child) => child,
            None => panic!("{} has no element {index}", self.path()),
        }
    }

    /// # Panics
    ///
    /// If the node is not null.
    #[track_caller]
    pub fn must_null(&self) {
        must(self.get_null());
    }

    /// # Panics
    ///
    /// If the node is not a number.
    #[track_caller]
    pub fn must_numeric(&self) -> f64 {
        must(self.get_numeric())
    }

    /// # Panics
    ///
    /// If the node is not a string.
    #[track_caller]
    pub fn must_string(&self) -> &'a str {
        must(self.get_string())
    }

    /// # Panics
    ///
    /// If the node is not a boolean.
    #[track_caller]
    pub fn must_bool(&self) -> bool {
        must(self.get_bool())
    }

    /// # Panics
    ///
    /// If the node is not an array.
    #[track_caller]
    pub fn must_array(&self) -> Vec<NodeRef<'a>> {
        must(self.get_array())
    }

    /// # Panics
    ///
    /// If the node is not an object.
    #[track_caller]
    pub fn must_object(&self) -> Vec<(&'a str, NodeRef<'a>)> {
        must(self.get_object())
    }

    /// # Panics
    ///
    /// If any value in the subtree fails to decode.
    #[track_caller]
    pub fn must_unpack(&self) -> Value {
        must(self.unpack())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_return_values() {
        let doc = parse(br#"{"s": "x", "a": [true, null]}"#);
        let root = doc.root();
        assert_eq!(root.must_get("s").must_string(), "x");
        assert!(root.must_get("a").must_at(0).must_bool());
        root.must_get("a").must_at(-1).must_null();
        assert_eq!(root.must_object().len(), 2);
        assert_eq!(serialize(root.must_get("a")), b"[true, null]");
        assert_eq!(eval(root, "length(@.a)"), Value::Number(2.0));
        assert_eq!(compile_path("$.a[0]").to_string(), "$.a[0]");
    }

    #[test]
    #[should_panic(expected = "wrong type")]
    fn wrong_type_panics() {
        parse(b"[1]").root().must_string();
    }

    #[test]
    #[should_panic(expected = "has no member 'x'")]
    fn missing_member_panics() {
        parse(b"{}").root().must_get("x");
    }
}
