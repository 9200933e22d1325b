//! Tree editing.
//!
//! All edits go through the owning [`Document`] by [`NodeId`]. Every edit
//! marks the edited node dirty and propagates the flag up the parent chain,
//! stopping at the first ancestor that is already dirty. Edits that fail
//! leave the tree untouched.

use alloc::{format, string::String, sync::Arc, vec, vec::Vec};
use std::sync::OnceLock;

use super::{Document, Links, Members, NodeData, NodeId, NodeType, Scalar, Slot, Text, node_ref::normalize_index};
use crate::Error;

type Result<T> = core::result::Result<T, Error>;

impl Document<'_> {
    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    /// Creates a detached `null`.
    pub fn new_null(&mut self) -> NodeId {
        self.push_node(NodeData::scalar(Scalar::Null))
    }

    /// Creates a detached number.
    pub fn new_numeric(&mut self, value: f64) -> NodeId {
        self.push_node(NodeData::scalar(Scalar::Numeric(value)))
    }

    /// Creates a detached string.
    pub fn new_string(&mut self, value: impl Into<String>) -> NodeId {
        self.push_node(NodeData::scalar(Scalar::String(Text::Owned(value.into()))))
    }

    /// Creates a detached boolean.
    pub fn new_bool(&mut self, value: bool) -> NodeId {
        self.push_node(NodeData::scalar(Scalar::Bool(value)))
    }

    /// Creates a detached array holding `items`, which are moved out of
    /// their current parents.
    pub fn new_array(&mut self, items: impl IntoIterator<Item = NodeId>) -> Result<NodeId> {
        let id = self.push_node(NodeData::container(NodeType::Array));
        self.set_array(id, items)?;
        Ok(id)
    }

    /// Creates a detached object holding `members`, which are moved out of
    /// their current parents. A repeated key keeps the last node.
    pub fn new_object<K: Into<Arc<str>>>(
        &mut self,
        members: impl IntoIterator<Item = (K, NodeId)>,
    ) -> Result<NodeId> {
        let id = self.push_node(NodeData::container(NodeType::Object));
        self.set_object(id, members)?;
        Ok(id)
    }

    /// Replaces the node with `null`.
    pub fn set_null(&mut self, id: NodeId) -> Result<()> {
        self.set_scalar(id, Scalar::Null)
    }

    /// Replaces the node with a number.
    pub fn set_numeric(&mut self, id: NodeId, value: f64) -> Result<()> {
        self.set_scalar(id, Scalar::Numeric(value))
    }

    /// Replaces the node with a string.
    pub fn set_string(&mut self, id: NodeId, value: impl Into<String>) -> Result<()> {
        self.set_scalar(id, Scalar::String(Text::Owned(value.into())))
    }

    /// Replaces the node with a boolean.
    pub fn set_bool(&mut self, id: NodeId, value: bool) -> Result<()> {
        self.set_scalar(id, Scalar::Bool(value))
    }

    /// Replaces the node with a scalar. Former children become detached.
    fn set_scalar(&mut self, id: NodeId, value: Scalar) -> Result<()> {
        self.data(id)?;
        self.release_children(id);
        let node = &mut self.nodes[id.0];
        node.kind = value.node_type();
        node.links = Links::None;
        node.cache = OnceLock::from(value);
        self.mark_dirty(id);
        Ok(())
    }

    /// Turns the node into an array of `items`.
    ///
    /// Fails without touching anything if an item is the node itself or one
    /// of its ancestors, or appears twice.
    pub fn set_array(&mut self, id: NodeId, items: impl IntoIterator<Item = NodeId>) -> Result<()> {
        let items: Vec<NodeId> = items.into_iter().collect();
        self.check_adoptable(id, &items)?;

        self.release_children(id);
        for &item in &items {
            self.detach(item);
        }
        for (index, &item) in items.iter().enumerate() {
            let child = &mut self.nodes[item.0];
            child.parent = Some(id);
            child.slot = Slot::Index(index);
        }
        self.become_container(id, Links::Array(items));
        Ok(())
    }

    /// Turns the node into an object of `members`.
    ///
    /// Fails like [`set_array`](Self::set_array). A repeated key keeps the
    /// last node; earlier ones end up detached.
    pub fn set_object<K: Into<Arc<str>>>(
        &mut self,
        id: NodeId,
        members: impl IntoIterator<Item = (K, NodeId)>,
    ) -> Result<()> {
        let members: Vec<(Arc<str>, NodeId)> = members.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let ids: Vec<NodeId> = members.iter().map(|(_, v)| *v).collect();
        self.check_adoptable(id, &ids)?;

        self.release_children(id);
        let mut map = Members::with_capacity(members.len());
        for (key, child) in members {
            self.detach(child);
            if let Some(old) = map.insert(key.clone(), child) {
                self.release(old);
            }
            let node = &mut self.nodes[child.0];
            node.parent = Some(id);
            node.slot = Slot::Key(key);
        }
        self.become_container(id, Links::Object(map));
        Ok(())
    }

    /// Appends `child` to the array `id`, moving it out of its current
    /// parent.
    pub fn append_array(&mut self, id: NodeId, child: NodeId) -> Result<()> {
        self.expect_kind(id, NodeType::Array)?;
        self.check_adoptable(id, &[child])?;
        self.detach(child);
        let Links::Array(items) = &mut self.nodes[id.0].links else {
            return Err(Error::wrong_type("expected array"));
        };
        let index = items.len();
        items.push(child);
        let node = &mut self.nodes[child.0];
        node.parent = Some(id);
        node.slot = Slot::Index(index);
        self.mark_dirty(id);
        Ok(())
    }

    /// Stores `child` under `key` in the object `id`. A previous occupant of
    /// the key is detached.
    pub fn append_object(&mut self, id: NodeId, key: impl Into<Arc<str>>, child: NodeId) -> Result<()> {
        self.expect_kind(id, NodeType::Object)?;
        self.check_adoptable(id, &[child])?;
        let key = key.into();
        self.detach(child);
        let Links::Object(members) = &mut self.nodes[id.0].links else {
            return Err(Error::wrong_type("expected object"));
        };
        let previous = members.insert(key.clone(), child);
        if let Some(old) = previous.filter(|&old| old != child) {
            self.release(old);
        }
        let node = &mut self.nodes[child.0];
        node.parent = Some(id);
        node.slot = Slot::Key(key);
        self.mark_dirty(id);
        Ok(())
    }

    /// Detaches `child` from `parent`. Following array elements shift down.
    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.data(parent)?;
        if self.data(child)?.parent != Some(parent) {
            return Err(Error::wrong_request(format!(
                "node {} is not a child of node {}",
                child.0, parent.0
            )));
        }
        self.detach(child);
        Ok(())
    }

    /// Detaches the node from its parent.
    pub fn delete(&mut self, id: NodeId) -> Result<()> {
        match self.data(id)?.parent {
            Some(parent) => self.remove(parent, id),
            None => Err(Error::wrong_request("node has no parent")),
        }
    }

    /// Detaches the member stored under `key`.
    pub fn delete_key(&mut self, id: NodeId, key: &str) -> Result<()> {
        self.pop_key(id, key).map(|_| ())
    }

    /// Detaches and returns the member stored under `key`.
    pub fn pop_key(&mut self, id: NodeId, key: &str) -> Result<NodeId> {
        self.expect_kind(id, NodeType::Object)?;
        let child = match &self.nodes[id.0].links {
            Links::Object(members) => members.get(key).copied(),
            _ => None,
        };
        let child = child.ok_or_else(|| Error::wrong_request(format!("key '{key}' not found")))?;
        self.detach(child);
        Ok(child)
    }

    /// Detaches the element at `index`.
    pub fn delete_index(&mut self, id: NodeId, index: isize) -> Result<()> {
        self.pop_index(id, index).map(|_| ())
    }

    /// Detaches and returns the element at `index`; negative indexes count
    /// from the end.
    pub fn pop_index(&mut self, id: NodeId, index: isize) -> Result<NodeId> {
        self.expect_kind(id, NodeType::Array)?;
        let child = match &self.nodes[id.0].links {
            Links::Array(items) => normalize_index(index, items.len()).map(|i| items[i]),
            _ => None,
        };
        let child = child.ok_or_else(|| Error::wrong_request(format!("index {index} out of range")))?;
        self.detach(child);
        Ok(child)
    }

    /// Gives `target` a deep copy of `source`'s type and value. The source is
    /// left as it is.
    pub fn set_node(&mut self, target: NodeId, source: NodeId) -> Result<()> {
        self.data(target)?;
        if target == source {
            return Ok(());
        }
        match self.data(source)?.links.clone() {
            Links::None => {
                let value = self.owned_scalar(source)?;
                self.set_scalar(target, value)
            }
            Links::Array(items) => {
                let copies: Vec<NodeId> = items.into_iter().map(|item| self.copy_subtree(item)).collect();
                self.set_array(target, copies)
            }
            Links::Object(members) => {
                let copies: Vec<(Arc<str>, NodeId)> = members
                    .into_iter()
                    .map(|(key, child)| (key, self.copy_subtree(child)))
                    .collect();
                self.set_object(target, copies)
            }
        }
    }

    /// Makes the detached node `id` the document root.
    pub fn set_root(&mut self, id: NodeId) -> Result<()> {
        if self.data(id)?.parent.is_some() {
            return Err(Error::wrong_request("the new root must be detached"));
        }
        self.root = id;
        Ok(())
    }

    /// Copies the subtree at `id` of another document into this one and
    /// returns the detached copy.
    ///
    /// The copy is fully dirty. If a string in the subtree fails to decode
    /// nothing is added to this document.
    pub fn import(&mut self, other: &Document<'_>, id: NodeId) -> Result<NodeId> {
        let mark = self.nodes.len();
        let imported = self.import_tree(other, id);
        if imported.is_err() {
            self.nodes.truncate(mark);
        }
        imported
    }

    fn import_tree(&mut self, other: &Document<'_>, id: NodeId) -> Result<NodeId> {
        let root = self.import_node(other, id)?;
        let mut pending = vec![(id, root)];
        while let Some((from, copy)) = pending.pop() {
            let links = match &other.data(from)?.links {
                Links::None => continue,
                Links::Array(items) => {
                    let mut copies = Vec::with_capacity(items.len());
                    for (index, &item) in items.iter().enumerate() {
                        let child = self.import_node(other, item)?;
                        self.adopt(child, copy, Slot::Index(index));
                        pending.push((item, child));
                        copies.push(child);
                    }
                    Links::Array(copies)
                }
                Links::Object(members) => {
                    let mut copies = Members::with_capacity(members.len());
                    for (key, &item) in members {
                        let child = self.import_node(other, item)?;
                        self.adopt(child, copy, Slot::Key(key.clone()));
                        pending.push((item, child));
                        copies.insert(key.clone(), child);
                    }
                    Links::Object(copies)
                }
            };
            self.nodes[copy.0].links = links;
        }
        Ok(root)
    }

    /// A detached, dirty copy of one node of `other`, without its children.
    fn import_node(&mut self, other: &Document<'_>, id: NodeId) -> Result<NodeId> {
        let kind = other.data(id)?.kind;
        let data = if kind.is_container() {
            NodeData::container(kind)
        } else {
            NodeData::scalar(other.owned_scalar(id)?)
        };
        Ok(self.push_node(data))
    }

    /// Clones the subtree at `id` into new detached nodes of this document.
    /// Clean nodes keep their spans, so they still serialize from source.
    fn copy_subtree(&mut self, id: NodeId) -> NodeId {
        let root = self.copy_node(id, None, Slot::Free);
        let mut pending = vec![(id, root)];
        while let Some((from, copy)) = pending.pop() {
            let links = match self.nodes[from.0].links.clone() {
                Links::None => continue,
                Links::Array(items) => Links::Array(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| {
                            let child = self.copy_node(item, Some(copy), Slot::Index(index));
                            pending.push((item, child));
                            child
                        })
                        .collect(),
                ),
                Links::Object(members) => Links::Object(
                    members
                        .into_iter()
                        .map(|(key, item)| {
                            let child = self.copy_node(item, Some(copy), Slot::Key(key.clone()));
                            pending.push((item, child));
                            (key, child)
                        })
                        .collect(),
                ),
            };
            self.nodes[copy.0].links = links;
        }
        root
    }

    /// One node of this document copied without its children.
    fn copy_node(&mut self, id: NodeId, parent: Option<NodeId>, slot: Slot) -> NodeId {
        let from = &self.nodes[id.0];
        let data = NodeData {
            kind: from.kind,
            span: from.span,
            parent,
            slot,
            links: Links::None,
            cache: from.cache.clone(),
            dirty: from.dirty,
        };
        self.push_node(data)
    }

    fn adopt(&mut self, child: NodeId, parent: NodeId, slot: Slot) {
        let node = &mut self.nodes[child.0];
        node.parent = Some(parent);
        node.slot = slot;
    }

    /// Drops every node that is not reachable from the root and renumbers
    /// the rest in document order. Returns the number of nodes dropped.
    ///
    /// Detached nodes are gone afterwards and every [`NodeId`] obtained
    /// before the call is stale; `remap` receives each surviving node as
    /// `(old, new)`.
    pub fn compact(&mut self, mut remap: impl FnMut(NodeId, NodeId)) -> usize {
        let mut renumbered: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if renumbered[id.0].is_some() {
                continue;
            }
            renumbered[id.0] = Some(NodeId(order.len()));
            order.push(id);
            let children: Vec<NodeId> = self.nodes[id.0].links.ids().collect();
            stack.extend(children.into_iter().rev());
        }

        let before = self.nodes.len();
        let mut old: Vec<Option<NodeData>> = core::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        let moved = |id: NodeId| renumbered[id.0].unwrap_or(id);
        for &id in &order {
            let Some(mut data) = old[id.0].take() else { continue };
            data.parent = data.parent.map(&moved);
            match &mut data.links {
                Links::Array(items) => items.iter_mut().for_each(|item| *item = moved(*item)),
                Links::Object(members) => members.values_mut().for_each(|child| *child = moved(*child)),
                Links::None => {}
            }
            remap(id, moved(id));
            self.nodes.push(data);
        }
        self.root = NodeId(0);
        let dropped = before - self.nodes.len();
        tracing::debug!(kept = self.nodes.len(), dropped, "compacted arena");
        dropped
    }

    /// The decoded scalar, detached from the source span.
    fn owned_scalar(&self, id: NodeId) -> Result<Scalar> {
        Ok(match self.scalar(id)? {
            Scalar::String(Text::Verbatim) => Scalar::String(Text::Owned(self.text(id)?.into())),
            value => value.clone(),
        })
    }

    fn expect_kind(&self, id: NodeId, expected: NodeType) -> Result<()> {
        let found = self.data(id)?.kind;
        if found == expected {
            Ok(())
        } else {
            Err(Error::wrong_type(format!("expected {expected}, found {found}")))
        }
    }

    /// Rejects children that do not exist, repeat, or would create a cycle
    /// under `id`.
    fn check_adoptable(&self, id: NodeId, children: &[NodeId]) -> Result<()> {
        self.data(id)?;
        for (position, &child) in children.iter().enumerate() {
            self.data(child)?;
            if children[..position].contains(&child) {
                return Err(Error::wrong_request(format!("node {} is listed twice", child.0)));
            }
            if self.is_ancestor(child, id) {
                return Err(Error::wrong_request(format!(
                    "node {} cannot become a descendant of itself",
                    child.0
                )));
            }
        }
        Ok(())
    }

    /// Turns `id` into a container with the given (already adopted) links.
    fn become_container(&mut self, id: NodeId, links: Links) {
        let node = &mut self.nodes[id.0];
        node.kind = match links {
            Links::Object(_) => NodeType::Object,
            _ => NodeType::Array,
        };
        node.links = links;
        node.cache = OnceLock::new();
        self.mark_dirty(id);
    }

    /// Clears the parent link of every child of `id`.
    fn release_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.nodes[id.0].links.ids().collect();
        for child in children {
            self.release(child);
        }
        match &mut self.nodes[id.0].links {
            Links::Array(items) => items.clear(),
            Links::Object(members) => members.clear(),
            Links::None => {}
        }
    }

    fn release(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        node.parent = None;
        node.slot = Slot::Free;
    }

    /// Removes `id` from its parent's children, if it has a parent, and marks
    /// the parent dirty.
    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let slot = core::mem::replace(&mut self.nodes[id.0].slot, Slot::Free);
        self.nodes[id.0].parent = None;
        let mut shifted = Vec::new();
        match (&mut self.nodes[parent.0].links, slot) {
            (Links::Array(items), slot) => {
                let position = match slot {
                    Slot::Index(index) if items.get(index) == Some(&id) => Some(index),
                    _ => items.iter().position(|&item| item == id),
                };
                if let Some(position) = position {
                    items.remove(position);
                    shifted.extend(items[position..].iter().enumerate().map(|(i, &item)| (item, position + i)));
                }
            }
            (Links::Object(members), Slot::Key(key)) => {
                if members.get(&*key) == Some(&id) {
                    members.shift_remove(&*key);
                }
            }
            _ => {}
        }
        for (item, index) in shifted {
            self.nodes[item.0].slot = Slot::Index(index);
        }
        self.mark_dirty(parent);
    }

    /// Sets the dirty flag on `id` and its ancestors, stopping at the first
    /// one that already has it.
    fn mark_dirty(&mut self, id: NodeId) {
        let mut marked = 0usize;
        let mut current = Some(id);
        while let Some(at) = current {
            let node = &mut self.nodes[at.0];
            if node.dirty {
                break;
            }
            node.dirty = true;
            marked += 1;
            current = node.parent;
        }
        tracing::trace!(node = id.0, marked, "marked dirty");
    }
}
