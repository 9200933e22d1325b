//! One-shot parse and select.

use alloc::vec::Vec;

use crate::{Document, Error, Input, NodeId, NodeRef, Path, Value};

type Result<T> = core::result::Result<T, Error>;

/// A parsed document together with the nodes a path selected from it.
///
/// ```
/// let found = lazyjson::query(br#"{"a": [1, 2, 3]}"#, "$.a[1:]").unwrap();
/// assert_eq!(found.len(), 2);
/// assert_eq!(found.to_bytes().unwrap(), b"[2,3]");
/// ```
#[derive(Debug)]
pub struct Selection<'src> {
    document: Document<'src>,
    ids: Vec<NodeId>,
}

impl<'src> Selection<'src> {
    /// The parsed document.
    #[must_use]
    pub fn document(&self) -> &Document<'src> {
        &self.document
    }

    /// Handles of the selected nodes.
    #[must_use]
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Number of selected nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The selected nodes in result order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> + '_ {
        self.ids.iter().map(|&id| NodeRef::new(&self.document, id))
    }

    /// Decodes every selected node.
    pub fn values(&self) -> Result<Vec<Value>> {
        self.nodes().map(|node| node.unpack()).collect()
    }

    /// The selected nodes as one compact JSON array. Each element keeps its
    /// source formatting when clean.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::from(*b"[");
        for (i, node) in self.nodes().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            out.extend_from_slice(&node.to_bytes()?);
        }
        out.push(b']');
        Ok(out)
    }

    /// Hands back the document; the ids stay valid for it.
    #[must_use]
    pub fn into_parts(self) -> (Document<'src>, Vec<NodeId>) {
        (self.document, self.ids)
    }
}

/// Parses `input` and evaluates `path` on it.
pub fn query<'src>(input: impl Input<'src>, path: &str) -> Result<Selection<'src>> {
    let path = Path::parse(path)?;
    let document = Document::parse(input)?;
    let ids = path.evaluate(&document)?.iter().map(NodeRef::id).collect();
    Ok(Selection { document, ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn selection_owns_its_document() {
        let selection = query(String::from(r#"{"k": {"v": "x"}}"#), "$..v").unwrap();
        assert!(!selection.document().is_borrowed());
        assert_eq!(selection.values().unwrap(), [Value::from("x")]);
        let (doc, ids) = selection.into_parts();
        assert_eq!(doc.node(ids[0]).unwrap().path(), "$['k']['v']");
    }

    #[test]
    fn empty_selection() {
        let selection = query(b"[]", "$[0]").unwrap();
        assert!(selection.is_empty());
        assert_eq!(selection.to_bytes().unwrap(), b"[]");
    }

    #[test]
    fn path_errors_come_before_parsing() {
        let err = query(b"not json", "$[").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEndOfInput);
        assert_eq!(query(b"not json", "$").unwrap_err().kind(), ErrorKind::WrongSymbol);
    }
}
