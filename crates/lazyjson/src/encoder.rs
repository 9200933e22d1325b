//! Encoder: serializes a subtree back to JSON bytes.
//!
//! Clean nodes are written as a verbatim copy of their source span, which
//! keeps the input formatting. Dirty nodes are rendered compactly, with
//! clean descendants still copied from source. The walk keeps its own stack,
//! so nesting depth is bounded by memory only.

use alloc::{format, vec, vec::Vec};

use crate::{
    Error,
    escape::quote,
    node::{Document, Links, NodeId, NodeType, Scalar},
};

type Result<T> = core::result::Result<T, Error>;

/// Pending output of the writer, innermost last.
enum Work<'d> {
    Node(NodeId),
    Key(&'d str),
    Byte(u8),
}

pub(crate) fn encode(doc: &Document<'_>, id: NodeId) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut work = vec![Work::Node(id)];
    while let Some(next) = work.pop() {
        match next {
            Work::Node(id) => write_node(doc, id, &mut out, &mut work)?,
            Work::Key(key) => {
                out.extend_from_slice(quote(key).as_bytes());
                out.push(b':');
            }
            Work::Byte(b) => out.push(b),
        }
    }
    Ok(out)
}

/// Writes a clean node or a scalar right away. A dirty container writes its
/// opening bracket and schedules the rest.
fn write_node<'d>(
    doc: &'d Document<'_>,
    id: NodeId,
    out: &mut Vec<u8>,
    work: &mut Vec<Work<'d>>,
) -> Result<()> {
    let node = doc.data(id)?;
    if !node.dirty {
        let bytes = doc
            .span_bytes(node)
            .ok_or_else(|| Error::wrong_request("node is not closed"))?;
        out.extend_from_slice(bytes);
        return Ok(());
    }

    match &node.links {
        Links::Array(items) => {
            out.push(b'[');
            work.push(Work::Byte(b']'));
            for (i, &item) in items.iter().enumerate().rev() {
                work.push(Work::Node(item));
                if i > 0 {
                    work.push(Work::Byte(b','));
                }
            }
        }
        Links::Object(members) => {
            out.push(b'{');
            work.push(Work::Byte(b'}'));
            for (i, (key, &child)) in members.iter().enumerate().rev() {
                work.push(Work::Node(child));
                work.push(Work::Key(&**key));
                if i > 0 {
                    work.push(Work::Byte(b','));
                }
            }
        }
        Links::None if node.kind.is_container() => {
            return Err(Error::wrong_request(format!("{} without children", node.kind)));
        }
        Links::None => write_scalar(doc, id, out)?,
    }
    Ok(())
}

fn write_scalar(doc: &Document<'_>, id: NodeId, out: &mut Vec<u8>) -> Result<()> {
    match doc.scalar(id)? {
        Scalar::Null => out.extend_from_slice(b"null"),
        Scalar::Bool(true) => out.extend_from_slice(b"true"),
        Scalar::Bool(false) => out.extend_from_slice(b"false"),
        Scalar::Numeric(n) if !n.is_finite() => {
            return Err(Error::wrong_request(format!("{n} cannot be written as JSON")));
        }
        Scalar::Numeric(n) => out.extend_from_slice(format!("{n}").as_bytes()),
        Scalar::String(_) => out.extend_from_slice(quote(doc.text(id)?).as_bytes()),
    }
    Ok(())
}
