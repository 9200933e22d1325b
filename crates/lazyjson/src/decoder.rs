//! Decoder: turns a byte slice into the node arena.
//!
//! The structural grammar is driven by the transition table in
//! [`classes`](crate::classes). Tokens (strings, numbers, literals) are
//! consumed by the [`Scanner`] primitives; only their spans are recorded.
//! String values are validated here but unescaped later, on first access.
//! Object keys are unescaped right away since lookups need them.

use alloc::{format, sync::Arc, vec::Vec};

use crate::{
    Error, ParserOptions,
    classes::{
        ACT_ARRAY_CLOSE, ACT_ARRAY_OPEN, ACT_COLON, ACT_COMMA, ACT_EMPTY_OBJECT_CLOSE, ACT_LITERAL,
        ACT_OBJECT_CLOSE, ACT_OBJECT_OPEN, AR, CO, E1, FR, IN, INVALID, KE, MI, OB, OK, ST, VA,
        ZE, classify, json_next,
    },
    escape::unescape,
    node::{Links, NodeData, NodeId, NodeType, Slot, Span},
    scanner::Scanner,
};

type Result<T> = core::result::Result<T, Error>;

struct Builder<'a> {
    scanner: Scanner<'a>,
    nodes: Vec<NodeData>,
    /// Open containers, innermost last.
    stack: Vec<NodeId>,
    /// Key read for the member whose value comes next.
    key: Option<Arc<str>>,
    state: i8,
    options: ParserOptions,
}

/// Builds the arena for `data`. The root is always the first node.
pub(crate) fn decode(data: &[u8], options: ParserOptions) -> Result<Vec<NodeData>> {
    let mut builder = Builder {
        scanner: Scanner::new(data),
        nodes: Vec::new(),
        stack: Vec::new(),
        key: None,
        state: crate::classes::GO,
        options,
    };
    match builder.run() {
        Ok(()) => {
            tracing::debug!(bytes = data.len(), nodes = builder.nodes.len(), "decoded document");
            Ok(builder.nodes)
        }
        Err(err) => {
            tracing::debug!(bytes = data.len(), error = %err, "rejected document");
            Err(err)
        }
    }
}

impl Builder<'_> {
    fn run(&mut self) -> Result<()> {
        while let Ok(byte) = self.scanner.first_non_space() {
            let start = self.scanner.index();
            match json_next(self.state, classify(byte)) {
                INVALID => return Err(self.scanner.error_symbol()),
                ACT_OBJECT_OPEN => self.open(NodeType::Object, start, OB)?,
                ACT_ARRAY_OPEN => self.open(NodeType::Array, start, AR)?,
                ACT_OBJECT_CLOSE | ACT_EMPTY_OBJECT_CLOSE => self.close(NodeType::Object, start)?,
                ACT_ARRAY_CLOSE => self.close(NodeType::Array, start)?,
                ACT_COMMA => {
                    let top = self.top().ok_or_else(|| self.scanner.error_symbol())?;
                    self.state = if self.nodes[top.0].kind == NodeType::Object { KE } else { VA };
                    self.scanner.seek(start + 1);
                }
                ACT_COLON => {
                    self.state = VA;
                    self.scanner.seek(start + 1);
                }
                ACT_LITERAL => {
                    let (word, kind) = match byte.to_ascii_lowercase() {
                        b'n' => (&b"null"[..], NodeType::Null),
                        b't' => (&b"true"[..], NodeType::Bool),
                        _ => (&b"false"[..], NodeType::Bool),
                    };
                    self.scanner.consume_literal(word)?;
                    self.leaf(kind, start)?;
                }
                ST if matches!(self.state, OB | KE) => {
                    self.scanner.consume_json_string()?;
                    let end = self.scanner.index();
                    let body = &self.scanner.data()[start + 1..end - 1];
                    self.key = Some(Arc::from(unescape(body, start + 1)?.as_ref()));
                    self.state = CO;
                }
                ST => {
                    self.scanner.consume_json_string()?;
                    self.leaf(NodeType::String, start)?;
                }
                MI | ZE | IN | FR | E1 => {
                    self.scanner.consume_numeric()?;
                    self.leaf(NodeType::Numeric, start)?;
                }
                _ => return Err(self.scanner.error_symbol()),
            }
        }

        if self.state == OK && self.stack.is_empty() && !self.nodes.is_empty() {
            Ok(())
        } else {
            Err(self.scanner.error_eof())
        }
    }

    fn top(&self) -> Option<NodeId> {
        self.stack.last().copied()
    }

    /// Creates a node under the innermost open container.
    fn push(&mut self, kind: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = self.top();
        let mut replaced = None;
        let slot = match parent.map(|parent| &mut self.nodes[parent.0].links) {
            Some(Links::Array(items)) => {
                items.push(id);
                Slot::Index(items.len() - 1)
            }
            Some(Links::Object(members)) => {
                let key = self.key.take().unwrap_or_else(|| Arc::from(""));
                replaced = members.insert(key.clone(), id);
                Slot::Key(key)
            }
            Some(Links::None) | None => Slot::Free,
        };
        // The last duplicate key wins; the earlier value is orphaned.
        if let Some(old) = replaced {
            let old = &mut self.nodes[old.0];
            old.parent = None;
            old.slot = Slot::Free;
        }
        self.nodes.push(NodeData::parsed(kind, parent, slot));
        id
    }

    fn leaf(&mut self, kind: NodeType, start: usize) -> Result<()> {
        let id = self.push(kind);
        self.nodes[id.0].span = Some(Span {
            start,
            end: self.scanner.index(),
        });
        self.state = OK;
        Ok(())
    }

    fn open(&mut self, kind: NodeType, start: usize, state: i8) -> Result<()> {
        if let Some(max) = self.options.max_depth {
            if self.stack.len() >= max {
                return Err(
                    Error::wrong_request(format!("nesting deeper than {max} levels")).at(start)
                );
            }
        }
        let id = self.push(kind);
        // Provisional span so the start survives until the container closes.
        self.nodes[id.0].span = Some(Span { start, end: start });
        self.stack.push(id);
        self.state = state;
        self.scanner.seek(start + 1);
        Ok(())
    }

    fn close(&mut self, kind: NodeType, start: usize) -> Result<()> {
        let top = self
            .top()
            .filter(|top| self.nodes[top.0].kind == kind)
            .ok_or_else(|| self.scanner.error_symbol())?;
        self.stack.pop();
        if let Some(span) = &mut self.nodes[top.0].span {
            span.end = start + 1;
        }
        self.state = OK;
        self.scanner.seek(start + 1);
        Ok(())
    }
}
