use alloc::{format, string::String, vec, vec::Vec};
use core::fmt;

use bstr::BStr;

use super::{Document, Links, NodeData, NodeId, NodeType, Scalar, Slot};
use crate::{Error, Map, Value, encoder, jsonpath};

type Result<T> = core::result::Result<T, Error>;

/// Deepest nesting [`NodeRef::unpack`] turns into a [`Value`].
pub const MAX_UNPACK_DEPTH: usize = 512;

/// A borrowed view of one node of a [`Document`].
///
/// `NodeRef` is `Copy`; all read operations go through it. Mutation goes
/// through the owning document by [`NodeId`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document<'a>,
    id: NodeId,
}

/// A single level of a node's value: scalars decoded, containers as views of
/// their children.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue<'a> {
    /// `null`
    Null,
    /// A decoded number.
    Numeric(f64),
    /// A decoded string.
    String(&'a str),
    /// A boolean.
    Bool(bool),
    /// The elements, in order.
    Array(Vec<NodeRef<'a>>),
    /// The members, in storage order.
    Object(Vec<(&'a str, NodeRef<'a>)>),
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(doc: &'a Document<'a>, id: NodeId) -> Self {
        Self { doc, id }
    }

    fn data(&self) -> &'a NodeData {
        // `NodeRef`s are only built for ids inside the arena.
        &self.doc.nodes[self.id.0]
    }

    /// Handle of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The owning document.
    #[must_use]
    pub fn document(&self) -> &'a Document<'a> {
        self.doc
    }

    /// Type of the node.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.data().kind
    }

    /// Returns `true` for `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.node_type() == NodeType::Null
    }

    /// Returns `true` for numbers.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.node_type() == NodeType::Numeric
    }

    /// Returns `true` for strings.
    #[must_use]
    pub fn is_string(&self) -> bool {
        self.node_type() == NodeType::String
    }

    /// Returns `true` for booleans.
    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.node_type() == NodeType::Bool
    }

    /// Returns `true` for arrays.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.node_type() == NodeType::Array
    }

    /// Returns `true` for objects.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.node_type() == NodeType::Object
    }

    /// The key under which this node sits in its parent object.
    #[must_use]
    pub fn key(&self) -> Option<&'a str> {
        match &self.data().slot {
            Slot::Key(key) => Some(&**key),
            _ => None,
        }
    }

    /// The position of this node in its parent array.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self.data().slot {
            Slot::Index(index) => Some(index),
            _ => None,
        }
    }

    /// The containing node, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.map(|id| Self::new(self.doc, id))
    }

    /// Whether this node is the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.id == self.doc.root
    }

    /// Whether the node or one of its descendants was mutated.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.data().dirty
    }

    /// The exact source bytes of a clean, parsed node.
    #[must_use]
    pub fn source(&self) -> Option<&'a [u8]> {
        let data = self.data();
        if data.dirty {
            None
        } else {
            self.doc.span_bytes(data)
        }
    }

    /// Number of children; zero for scalars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data().links.len()
    }

    /// Whether the node has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Child of an object by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<NodeRef<'a>> {
        match &self.data().links {
            Links::Object(members) => members.get(key).map(|&id| Self::new(self.doc, id)),
            _ => None,
        }
    }

    /// Child of an array by position. Negative positions count from the end.
    #[must_use]
    pub fn at(&self, index: isize) -> Option<NodeRef<'a>> {
        match &self.data().links {
            Links::Array(items) => {
                let index = normalize_index(index, items.len())?;
                Some(Self::new(self.doc, items[index]))
            }
            _ => None,
        }
    }

    /// Whether an object has a member `key`.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Object keys in storage order.
    #[must_use]
    pub fn keys(&self) -> Vec<&'a str> {
        match &self.data().links {
            Links::Object(members) => members.keys().map(|k| &**k).collect(),
            _ => Vec::new(),
        }
    }

    /// Children in order: array elements by index, object members in storage
    /// order.
    #[must_use]
    pub fn children(&self) -> Children<'a> {
        Children {
            doc: self.doc,
            ids: self.data().links.ids().collect::<Vec<_>>().into_iter(),
        }
    }

    /// Decodes one level of the node.
    pub fn value(&self) -> Result<NodeValue<'a>> {
        Ok(match self.node_type() {
            NodeType::Null => NodeValue::Null,
            NodeType::Numeric => NodeValue::Numeric(self.get_numeric()?),
            NodeType::String => NodeValue::String(self.get_string()?),
            NodeType::Bool => NodeValue::Bool(self.get_bool()?),
            NodeType::Array => NodeValue::Array(self.children().collect()),
            NodeType::Object => NodeValue::Object(
                self.children()
                    .map(|child| (child.key().unwrap_or_default(), child))
                    .collect(),
            ),
        })
    }

    fn expect_type(&self, expected: NodeType) -> Result<()> {
        let found = self.node_type();
        if found == expected {
            Ok(())
        } else {
            Err(Error::wrong_type(format!("expected {expected}, found {found}")))
        }
    }

    /// Succeeds for `null`.
    pub fn get_null(&self) -> Result<()> {
        self.expect_type(NodeType::Null)
    }

    /// The number. A literal that does not parse as one is a
    /// [`WrongType`](crate::ErrorKind::WrongType) error.
    pub fn get_numeric(&self) -> Result<f64> {
        self.expect_type(NodeType::Numeric)?;
        match self.doc.scalar(self.id)? {
            Scalar::Numeric(n) => Ok(*n),
            other => Err(Error::wrong_type(format!("expected numeric, found {}", other.node_type()))),
        }
    }

    /// The decoded string. Borrowed from the source unless the literal
    /// contained escapes.
    pub fn get_string(&self) -> Result<&'a str> {
        self.doc.text(self.id)
    }

    /// The boolean.
    pub fn get_bool(&self) -> Result<bool> {
        self.expect_type(NodeType::Bool)?;
        match self.doc.scalar(self.id)? {
            Scalar::Bool(b) => Ok(*b),
            other => Err(Error::wrong_type(format!("expected bool, found {}", other.node_type()))),
        }
    }

    /// The elements of an array.
    pub fn get_array(&self) -> Result<Vec<NodeRef<'a>>> {
        self.expect_type(NodeType::Array)?;
        Ok(self.children().collect())
    }

    /// The members of an object, in storage order.
    pub fn get_object(&self) -> Result<Vec<(&'a str, NodeRef<'a>)>> {
        self.expect_type(NodeType::Object)?;
        match self.value()? {
            NodeValue::Object(members) => Ok(members),
            _ => Ok(Vec::new()),
        }
    }

    /// Recursively converts the subtree into an owned [`Value`].
    ///
    /// Subtrees nested deeper than [`MAX_UNPACK_DEPTH`] containers fail with
    /// [`WrongRequest`](crate::ErrorKind::WrongRequest); they can still be
    /// read node by node and serialized.
    pub fn unpack(&self) -> Result<Value> {
        self.check_nesting()?;
        self.unpack_within()
    }

    fn unpack_within(&self) -> Result<Value> {
        Ok(match self.value()? {
            NodeValue::Null => Value::Null,
            NodeValue::Numeric(n) => Value::Number(n),
            NodeValue::String(s) => Value::String(s.into()),
            NodeValue::Bool(b) => Value::Bool(b),
            NodeValue::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(item.unpack_within()?);
                }
                Value::Array(values)
            }
            NodeValue::Object(members) => {
                let mut map = Map::with_capacity(members.len());
                for (key, child) in members {
                    map.insert(key.into(), child.unpack_within()?);
                }
                Value::Object(map)
            }
        })
    }

    /// Number of nested containers from this node down, counting itself.
    #[must_use]
    pub fn nesting(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.id, 1usize)];
        while let Some((id, depth)) = stack.pop() {
            let links = self.doc.links(id);
            if matches!(links, Links::None) {
                continue;
            }
            deepest = deepest.max(depth);
            stack.extend(links.ids().map(|child| (child, depth + 1)));
        }
        deepest
    }

    fn check_nesting(&self) -> Result<()> {
        let nesting = self.nesting();
        if nesting > MAX_UNPACK_DEPTH {
            return Err(Error::wrong_request(format!(
                "{nesting} nested levels exceed the limit of {MAX_UNPACK_DEPTH}"
            )));
        }
        Ok(())
    }

    /// Normalized JSONPath of the node from the root of its tree, e.g.
    /// `$['store']['book'][0]`.
    #[must_use]
    pub fn path(&self) -> String {
        self.doc.path_of(self.id)
    }

    /// Serializes the subtree.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encoder::encode(self.doc, self.id)
    }

    /// Runs a JSONPath query with `@` bound to this node and `$` bound to
    /// the document root.
    pub fn query(&self, path: &str) -> Result<Vec<NodeRef<'a>>> {
        let compiled = jsonpath::Path::parse(path)?;
        compiled.evaluate_from(*self)
    }

    /// Evaluates an expression with `@` bound to this node.
    pub fn eval(&self, expression: &str) -> Result<Value> {
        crate::script::Script::parse(expression)?.evaluate(*self)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("NodeRef");
        s.field("id", &self.id.0).field("type", &self.node_type());
        match &self.data().slot {
            Slot::Key(key) => s.field("key", key),
            Slot::Index(index) => s.field("index", index),
            Slot::Free => &mut s,
        };
        if let Some(bytes) = self.source() {
            s.field("source", &BStr::new(bytes));
        } else {
            s.field("dirty", &true);
        }
        s.finish()
    }
}

/// Writes the serialized subtree.
impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_bytes().map_err(|_| fmt::Error)?;
        write!(f, "{}", BStr::new(&bytes))
    }
}

/// Fails like [`NodeRef::unpack`] on subtrees nested too deeply.
#[cfg(feature = "serde")]
impl serde::Serialize for NodeRef<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        use serde::ser::Error as _;

        self.check_nesting().map_err(S::Error::custom)?;
        Tree(*self).serialize(serializer)
    }
}

/// A subtree whose nesting was already checked.
#[cfg(feature = "serde")]
struct Tree<'a>(NodeRef<'a>);

#[cfg(feature = "serde")]
impl serde::Serialize for Tree<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        use serde::ser::{Error as _, SerializeMap, SerializeSeq};

        match self.0.value().map_err(S::Error::custom)? {
            NodeValue::Null => serializer.serialize_unit(),
            NodeValue::Numeric(n) => serializer.serialize_f64(n),
            NodeValue::String(s) => serializer.serialize_str(s),
            NodeValue::Bool(b) => serializer.serialize_bool(b),
            NodeValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&Tree(item))?;
                }
                seq.end()
            }
            NodeValue::Object(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for (key, child) in members {
                    map.serialize_entry(key, &Tree(child))?;
                }
                map.end()
            }
        }
    }
}

/// Iterator over the children of a node.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    doc: &'a Document<'a>,
    ids: alloc::vec::IntoIter<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ids.next().map(|id| NodeRef::new(self.doc, id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

/// Resolves a possibly negative index against `len`.
pub(crate) fn normalize_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())?
    } else {
        index.unsigned_abs()
    };
    (resolved < len).then_some(resolved)
}
