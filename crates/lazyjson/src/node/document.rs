use alloc::{borrow::Cow, format, string::String, vec, vec::Vec};
use core::fmt;

use bstr::{BStr, ByteSlice};

use super::{Links, NodeData, NodeId, NodeRef, NodeType, Scalar, Slot, Text};
use crate::{Error, ParserOptions, decoder, encoder, escape::unescape};

type Result<T> = core::result::Result<T, Error>;

/// Byte buffers a [`Document`] can be parsed from.
///
/// Borrowed buffers are referenced, owned ones are moved in.
pub trait Input<'src> {
    /// The buffer, borrowed or owned.
    fn into_source(self) -> Cow<'src, [u8]>;
}

impl<'src> Input<'src> for &'src [u8] {
    fn into_source(self) -> Cow<'src, [u8]> {
        Cow::Borrowed(self)
    }
}

impl<'src, const N: usize> Input<'src> for &'src [u8; N] {
    fn into_source(self) -> Cow<'src, [u8]> {
        Cow::Borrowed(self)
    }
}

impl<'src> Input<'src> for &'src str {
    fn into_source(self) -> Cow<'src, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl<'src> Input<'src> for &'src Vec<u8> {
    fn into_source(self) -> Cow<'src, [u8]> {
        Cow::Borrowed(self)
    }
}

impl Input<'static> for Vec<u8> {
    fn into_source(self) -> Cow<'static, [u8]> {
        Cow::Owned(self)
    }
}

impl Input<'static> for String {
    fn into_source(self) -> Cow<'static, [u8]> {
        Cow::Owned(self.into_bytes())
    }
}

impl<'src> Input<'src> for Cow<'src, [u8]> {
    fn into_source(self) -> Cow<'src, [u8]> {
        self
    }
}

/// A parsed (or constructed) JSON document.
///
/// The document keeps the input it was parsed from; borrowed input is never
/// copied. Every node reads its value out of that buffer on demand.
///
/// # Examples
///
/// ```
/// use lazyjson::parse;
///
/// let doc = parse(br#"{"a": [1, 2, {"b": "c"}]}"#).unwrap();
/// let b = doc.root().get("a").unwrap().at(2).unwrap().get("b").unwrap();
/// assert_eq!(b.get_string().unwrap(), "c");
/// assert_eq!(b.path(), "$['a'][2]['b']");
/// ```
pub struct Document<'src> {
    pub(super) source: Cow<'src, [u8]>,
    pub(super) nodes: Vec<NodeData>,
    pub(super) root: NodeId,
}

impl<'src> Document<'src> {
    /// Parses `input` with default options.
    ///
    /// Borrowed input is referenced in place; owned input moves into the
    /// document.
    pub fn parse(input: impl Input<'src>) -> Result<Self> {
        Self::parse_with(input, ParserOptions::default())
    }

    /// Parses `input` with explicit options.
    pub fn parse_with(input: impl Input<'src>, options: ParserOptions) -> Result<Self> {
        let source = input.into_source();
        let nodes = decoder::decode(&source, options)?;
        Ok(Self {
            source,
            nodes,
            root: NodeId(0),
        })
    }

    /// An empty document whose root is a detached `null`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: Cow::Borrowed(&[]),
            nodes: vec![NodeData::scalar(Scalar::Null)],
            root: NodeId(0),
        }
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef::new(self, self.root)
    }

    /// Handle of the root node.
    #[must_use]
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Looks up a node by handle.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.nodes.len()).then(|| NodeRef::new(self, id))
    }

    /// Looks up a node by handle, failing on handles from another document.
    pub fn node(&self, id: NodeId) -> Result<NodeRef<'_>> {
        self.get(id).ok_or_else(|| unknown_node(id))
    }

    /// The bytes the document was parsed from.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Whether the document still references the caller's buffer.
    #[must_use]
    pub fn is_borrowed(&self) -> bool {
        matches!(self.source, Cow::Borrowed(_))
    }

    /// Copies a borrowed source so the document no longer depends on it.
    #[must_use]
    pub fn into_owned(self) -> Document<'static> {
        Document {
            source: Cow::Owned(self.source.into_owned()),
            nodes: self.nodes,
            root: self.root,
        }
    }

    /// Serializes the root node.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encoder::encode(self, self.root)
    }

    /// Number of nodes in the arena, detached ones included.
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn data(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes.get(id.0).ok_or_else(|| unknown_node(id))
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.nodes.get_mut(id.0).ok_or_else(|| unknown_node(id))
    }

    /// Source bytes of a parsed node.
    pub(crate) fn span_bytes(&self, node: &NodeData) -> Option<&[u8]> {
        node.span.map(|span| &self.source[span.range()])
    }

    /// The decoded value of a scalar node, decoding it on first use.
    ///
    /// Decoding failures are not cached; every access reports them again.
    pub(crate) fn scalar(&self, id: NodeId) -> Result<&Scalar> {
        let node = self.data(id)?;
        if let Some(value) = node.cache.get() {
            return Ok(value);
        }
        let decoded = self.decode_scalar(node)?;
        Ok(node.cache.get_or_init(|| decoded))
    }

    fn decode_scalar(&self, node: &NodeData) -> Result<Scalar> {
        let Some(span) = node.span else {
            return Err(Error::wrong_request("node is not closed"));
        };
        let bytes = &self.source[span.range()];
        Ok(match node.kind {
            NodeType::Null => Scalar::Null,
            NodeType::Bool => Scalar::Bool(bytes.first().is_some_and(|b| b.eq_ignore_ascii_case(&b't'))),
            NodeType::Numeric => Scalar::Numeric(decode_numeric(bytes, span.start)?),
            NodeType::String => {
                let body = &bytes[1..bytes.len() - 1];
                match unescape(body, span.start + 1)? {
                    Cow::Borrowed(_) => Scalar::String(Text::Verbatim),
                    Cow::Owned(s) => Scalar::String(Text::Owned(s)),
                }
            }
            kind @ (NodeType::Array | NodeType::Object) => {
                return Err(Error::wrong_type(format!("{kind} has no scalar value")));
            }
        })
    }

    /// Text of a string node, borrowed from the source when no escapes were
    /// present.
    pub(crate) fn text(&self, id: NodeId) -> Result<&str> {
        let node = self.data(id)?;
        if node.kind != NodeType::String {
            return Err(Error::wrong_type(format!("expected string, found {}", node.kind)));
        }
        match self.scalar(id)? {
            Scalar::String(Text::Owned(s)) => Ok(s),
            Scalar::String(Text::Verbatim) => {
                let span = node.span.ok_or_else(|| Error::wrong_request("node is not closed"))?;
                let body = &self.source[span.start + 1..span.end - 1];
                // Validated when the cache was filled.
                body.to_str().map_err(|e| {
                    Error::wrong_symbol(span.start + 1 + e.valid_up_to(), body[e.valid_up_to()])
                })
            }
            other => Err(Error::wrong_type(format!(
                "expected string, found {}",
                other.node_type()
            ))),
        }
    }

    /// Normalized path of a node, e.g. `$['store']['book'][0]`.
    pub(crate) fn path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(at) = current {
            let Some(node) = self.nodes.get(at.0) else { break };
            segments.push(&node.slot);
            current = node.parent;
        }
        let mut out = String::from("$");
        for slot in segments.into_iter().rev() {
            match slot {
                Slot::Free => {}
                Slot::Key(key) => {
                    out.push_str("['");
                    for c in key.chars() {
                        if matches!(c, '\'' | '\\') {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push_str("']");
                }
                Slot::Index(index) => out.push_str(&format!("[{index}]")),
            }
        }
        out
    }

    /// Whether `ancestor` is `id` or lies on the parent chain above it.
    pub(crate) fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(at) = current {
            if at == ancestor {
                return true;
            }
            current = self.nodes.get(at.0).and_then(|n| n.parent);
        }
        false
    }

    pub(crate) fn links(&self, id: NodeId) -> &Links {
        static NONE: Links = Links::None;
        self.nodes.get(id.0).map_or(&NONE, |n| &n.links)
    }
}

impl Default for Document<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("source", &BStr::new(&self.source))
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .finish()
    }
}

fn decode_numeric(bytes: &[u8], offset: usize) -> Result<f64> {
    bytes
        .to_str()
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| {
            Error::wrong_type(format!("cannot decode numeric literal {}", BStr::new(bytes))).at(offset)
        })
}

fn unknown_node(id: NodeId) -> Error {
    Error::wrong_request(format!("node {} does not belong to this document", id.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn borrowed_input_is_not_copied() {
        let input = br#"{"a":"b"}"#.to_vec();
        let doc = Document::parse(&input).unwrap();
        assert!(doc.is_borrowed());
        assert_eq!(doc.source().as_ptr(), input.as_ptr());

        let owned = Document::parse(input.clone()).unwrap();
        assert!(!owned.is_borrowed());
        let detached = doc.into_owned();
        assert_eq!(detached.root().get("a").unwrap().get_string().unwrap(), "b");
    }

    #[test]
    fn unescaped_strings_borrow_from_source() {
        let doc = Document::parse(br#"["plain","esc\naped"]"#).unwrap();
        let root = doc.root();
        let plain = root.at(0).unwrap();
        assert_eq!(plain.get_string().unwrap(), "plain");
        assert!(matches!(doc.scalar(plain.id()).unwrap(), Scalar::String(Text::Verbatim)));
        let escaped = root.at(1).unwrap();
        assert_eq!(escaped.get_string().unwrap(), "esc\naped");
        assert!(matches!(doc.scalar(escaped.id()).unwrap(), Scalar::String(Text::Owned(_))));
    }

    #[test]
    fn numeric_decode_errors_are_not_cached() {
        let doc = Document::parse(b"[1.123e3.456]").unwrap();
        let n = doc.root().at(0).unwrap();
        assert_eq!(n.source(), Some(&b"1.123e3.456"[..]));
        for _ in 0..2 {
            let err = n.get_numeric().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::WrongType);
            assert_eq!(err.offset(), Some(1));
        }
    }

    #[test]
    fn foreign_handles_are_rejected() {
        let doc = Document::parse(b"[]").unwrap();
        assert!(doc.get(NodeId(5)).is_none());
        assert_eq!(doc.node(NodeId(5)).unwrap_err().kind(), ErrorKind::WrongRequest);
    }

    #[test]
    fn paths_quote_keys() {
        let doc = Document::parse(br#"{"it's":[0,{"x":1}]}"#).unwrap();
        let x = doc.root().get("it's").unwrap().at(1).unwrap().get("x").unwrap();
        assert_eq!(x.path(), r"$['it\'s'][1]['x']");
        assert_eq!(doc.root().path(), "$");
    }
}
