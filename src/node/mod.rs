//! Auto-vivifying nested nodes.
//!
//! A [`Node`] is an ordered string-keyed mapping. Reading a missing key from
//! an unfrozen node hands out a detached child that remembers where it came
//! from; the child is installed into its parent only once something is
//! written into it, so lookups alone never grow the tree:
//!
//! ```
//! use dragon_cfg::Node;
//!
//! let root = Node::new();
//! let leaf = root.child("a")?.child("b")?;
//! assert!(!root.contains_key("a"));
//!
//! leaf.set("c", 1)?;
//! assert_eq!(root.child("a")?.child("b")?.get("c")?, 1.into());
//! # Ok::<(), dragon_cfg::NodeError>(())
//! ```

mod error;
mod io;
mod lint;
mod plain;
mod state;
mod value;

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use error::NodeError;
pub use io::{DumpOptions, Format, LoadOptions, Source};
pub use lint::{lint, Diagnostic, Severity};
pub use plain::Plain;
pub use state::NodeState;
pub use value::Value;

use value::Memo;

/// Stands in for a node inside itself when printing for humans.
const CYCLE_MARKER: &str = "<cycle>";

/// What plain conversion does on reaching a node already being converted.
#[derive(Debug, Clone, Copy)]
pub(crate) enum OnCycle {
    Fail,
    Mark,
}

/// Names that [`Node::set_attr`] refuses, since they name node operations.
const RESERVED_ATTRS: &[&str] = &[
    "get",
    "child",
    "set",
    "remove",
    "set_default",
    "contains_key",
    "len",
    "is_empty",
    "keys",
    "entries",
    "get_attr",
    "set_attr",
    "del_attr",
    "freeze",
    "unfreeze",
    "is_frozen",
    "to_plain",
    "copy",
    "deep_copy",
    "update",
    "merge",
    "merge_in_place",
    "merged_with",
    "combine",
    "load",
    "load_with",
    "dump",
    "dump_with",
    "dump_to",
    "dump_to_with",
    "state",
];

/// A nested mapping with lazy child creation, deferred attachment and deep freeze.
///
/// `Node` is a shared handle: `clone()` yields another handle to the same
/// mapping. Use [`copy`](Self::copy) or [`deep_copy`](Self::deep_copy) for
/// independent data.
#[derive(Clone, Default)]
pub struct Node(Rc<RefCell<Inner>>);

#[derive(Default)]
struct Inner {
    entries: IndexMap<String, Value>,
    frozen: bool,
    pending: Option<Pending>,
}

/// Where a detached node goes once it receives content.
struct Pending {
    parent: Node,
    key: String,
}

impl Node {
    /// Creates an empty, unfrozen root node.
    pub fn new() -> Self {
        Self::default()
    }

    fn detached(parent: &Node, key: &str) -> Self {
        Node(Rc::new(RefCell::new(Inner {
            pending: Some(Pending {
                parent: parent.clone(),
                key: key.to_owned(),
            }),
            ..Inner::default()
        })))
    }

    /// Builds a node from a plain mapping, hooking nested mappings into nodes.
    pub fn from_map(map: IndexMap<String, Plain>) -> Self {
        let entries = map.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
        Node(Rc::new(RefCell::new(Inner {
            entries,
            ..Inner::default()
        })))
    }

    /// Builds a node from key/value pairs; later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Node(Rc::new(RefCell::new(Inner {
            entries,
            ..Inner::default()
        })))
    }

    /// Builds a node from a parsed document.
    ///
    /// A null document is an empty node, and a sequence of `[key, value]`
    /// pairs is accepted as a mapping.
    pub fn from_plain(plain: Plain) -> Result<Self, NodeError> {
        match plain {
            Plain::Null => Ok(Self::new()),
            Plain::Map(map) => Ok(Self::from_map(map)),
            Plain::List(items) | Plain::Tuple(items) => {
                let mut pairs = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Plain::List(mut pair) | Plain::Tuple(mut pair) if pair.len() == 2 => {
                            let value = pair.pop().unwrap_or_default();
                            match pair.pop() {
                                Some(Plain::Str(key)) => pairs.push((key, Value::from(value))),
                                _ => return Err(NodeError::NotAMapping("sequence")),
                            }
                        }
                        _ => return Err(NodeError::NotAMapping("sequence")),
                    }
                }
                Ok(Self::from_pairs(pairs))
            }
            other => Err(NodeError::NotAMapping(other.kind_name())),
        }
    }

    /// Reads `key`.
    ///
    /// A missing key on an unfrozen node yields a new detached node that is
    /// attached under `key` on its first write. A missing key on a frozen
    /// node is an error.
    pub fn get(&self, key: &str) -> Result<Value, NodeError> {
        let inner = self.0.borrow();
        if let Some(value) = inner.entries.get(key) {
            return Ok(value.clone());
        }
        if inner.frozen {
            return Err(NodeError::KeyNotFound(key.to_owned()));
        }
        drop(inner);
        Ok(Value::Node(Node::detached(self, key)))
    }

    /// Like [`get`](Self::get), but requires the value to be a node.
    pub fn child(&self, key: &str) -> Result<Node, NodeError> {
        match self.get(key)? {
            Value::Node(node) => Ok(node),
            _ => Err(NodeError::NotANode(key.to_owned())),
        }
    }

    /// Writes `key`, then attaches this node (and its detached ancestors).
    ///
    /// A frozen node accepts writes to existing keys only.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), NodeError> {
        let key = key.into();
        {
            let mut inner = self.0.borrow_mut();
            if inner.frozen && !inner.entries.contains_key(&key) {
                return Err(NodeError::KeyNotFound(key));
            }
            inner.entries.insert(key, value.into());
        }
        self.attach()
    }

    fn attach(&self) -> Result<(), NodeError> {
        let pending = self.0.borrow_mut().pending.take();
        let Some(Pending { parent, key }) = pending else {
            return Ok(());
        };
        tracing::trace!(key = %key, "attaching node to its parent");
        if let Err(err) = parent.set(key.clone(), Value::Node(self.clone())) {
            self.0.borrow_mut().pending = Some(Pending { parent, key });
            return Err(err);
        }
        Ok(())
    }

    /// Removes `key`. Allowed on frozen nodes.
    pub fn remove(&self, key: &str) -> Result<Value, NodeError> {
        self.0
            .borrow_mut()
            .entries
            .shift_remove(key)
            .ok_or_else(|| NodeError::KeyNotFound(key.to_owned()))
    }

    /// Returns the value under `key`, storing `default` first if it is missing.
    pub fn set_default(&self, key: &str, default: impl Into<Value>) -> Result<Value, NodeError> {
        if let Some(value) = self.0.borrow().entries.get(key) {
            return Ok(value.clone());
        }
        let default = default.into();
        self.set(key, default.clone())?;
        Ok(default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().entries.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().entries.keys().cloned().collect()
    }

    /// Snapshot of the entries in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Attribute-style read; same as [`get`](Self::get).
    pub fn get_attr(&self, name: &str) -> Result<Value, NodeError> {
        self.get(name)
    }

    /// Attribute-style write; names of node operations are read-only.
    pub fn set_attr(&self, name: &str, value: impl Into<Value>) -> Result<(), NodeError> {
        if RESERVED_ATTRS.contains(&name) {
            return Err(NodeError::ReadOnlyAttribute(name.to_owned()));
        }
        self.set(name, value)
    }

    /// Attribute-style delete; same as [`remove`](Self::remove).
    pub fn del_attr(&self, name: &str) -> Result<Value, NodeError> {
        self.remove(name)
    }

    /// Sets the frozen flag on this node and every node currently below it.
    pub fn freeze(&self, frozen: bool) {
        let mut seen = HashSet::new();
        self.freeze_with(frozen, &mut seen);
    }

    fn freeze_with(&self, frozen: bool, seen: &mut HashSet<*const ()>) {
        if !seen.insert(self.id()) {
            return;
        }
        let children: Vec<Node> = {
            let mut inner = self.0.borrow_mut();
            inner.frozen = frozen;
            inner.entries.values().filter_map(Value::as_node).cloned().collect()
        };
        for child in children {
            child.freeze_with(frozen, seen);
        }
    }

    pub fn unfreeze(&self) {
        self.freeze(false);
    }

    pub fn is_frozen(&self) -> bool {
        self.0.borrow().frozen
    }

    /// Recursively converts into a plain mapping.
    ///
    /// A node that contains itself has no plain form and fails with `Cyclic`.
    pub fn to_plain(&self) -> Result<Plain, NodeError> {
        self.plain_with(&mut Vec::new(), OnCycle::Fail)
    }

    /// `path` holds the nodes currently being converted, outermost first.
    pub(crate) fn plain_with(
        &self,
        path: &mut Vec<*const ()>,
        on_cycle: OnCycle,
    ) -> Result<Plain, NodeError> {
        if path.contains(&self.id()) {
            return match on_cycle {
                OnCycle::Fail => Err(NodeError::Cyclic),
                OnCycle::Mark => Ok(Plain::Str(CYCLE_MARKER.to_owned())),
            };
        }
        path.push(self.id());
        let inner = self.0.borrow();
        let mut map = IndexMap::with_capacity(inner.entries.len());
        for (key, value) in &inner.entries {
            map.insert(key.clone(), value.plain_with(path, on_cycle)?);
        }
        path.pop();
        Ok(Plain::Map(map))
    }

    /// Shallow copy: a new mapping whose values are the same handles.
    pub fn copy(&self) -> Node {
        let inner = self.0.borrow();
        Node(Rc::new(RefCell::new(Inner {
            entries: inner.entries.clone(),
            frozen: inner.frozen,
            pending: None,
        })))
    }

    /// Deep copy preserving frozen flags and shared references.
    ///
    /// A node reachable along several paths is copied once and shared in
    /// the result. Pending attachments are never copied.
    pub fn deep_copy(&self) -> Node {
        let mut memo = Memo::new();
        self.deep_copy_with(&mut memo)
    }

    pub(crate) fn deep_copy_with(&self, memo: &mut Memo) -> Node {
        if let Some(copy) = memo.get(&self.id()) {
            return copy.clone();
        }
        let copy = Node::new();
        memo.insert(self.id(), copy.clone());

        let (entries, frozen) = {
            let inner = self.0.borrow();
            (inner.entries.clone(), inner.frozen)
        };
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k, v.deep_copy_with(memo)))
            .collect();

        let mut inner = copy.0.borrow_mut();
        inner.entries = entries;
        inner.frozen = frozen;
        drop(inner);
        copy
    }

    /// Merges `other` into this node.
    ///
    /// Keys holding nodes on both sides merge recursively; anything else is
    /// replaced by the incoming value.
    pub fn update(&self, other: &Node) -> Result<(), NodeError> {
        self.update_with(other, &mut HashSet::new())
    }

    /// Alias of [`update`](Self::update).
    pub fn merge_in_place(&self, other: &Node) -> Result<(), NodeError> {
        self.update(other)
    }

    fn update_with(
        &self,
        other: &Node,
        seen: &mut HashSet<(*const (), *const ())>,
    ) -> Result<(), NodeError> {
        if Rc::ptr_eq(&self.0, &other.0) || !seen.insert((self.id(), other.id())) {
            return Ok(());
        }
        for (key, incoming) in other.entries() {
            let existing = self.0.borrow().entries.get(&key).cloned();
            match (existing, incoming) {
                (Some(Value::Node(mine)), Value::Node(theirs)) => mine.update_with(&theirs, seen)?,
                (_, incoming) => self.set(key, incoming)?,
            }
        }
        Ok(())
    }

    /// Non-mutating merge: an unfrozen copy of `self` updated with a copy of `other`.
    pub fn merged_with(&self, other: &Node) -> Result<Node, NodeError> {
        let merged = self.deep_copy();
        merged.unfreeze();
        let incoming = other.deep_copy();
        incoming.unfreeze();
        merged.update(&incoming)?;
        Ok(merged)
    }

    /// Merges in place or into a new node depending on `in_place`.
    pub fn merge(&self, other: &Node, in_place: bool) -> Result<Node, NodeError> {
        if in_place {
            self.update(other)?;
            Ok(self.clone())
        } else {
            self.merged_with(other)
        }
    }

    /// Accumulation onto an empty node yields `other`; anything else fails.
    pub fn combine(&self, other: Value) -> Result<Value, NodeError> {
        if self.is_empty() {
            Ok(other)
        } else {
            Err(NodeError::UnsupportedCombine(other.kind_name()))
        }
    }

    fn id(&self) -> *const () {
        Rc::as_ptr(&self.0).cast()
    }
}

/// Same handle, or equal plain forms. Distinct cyclic nodes are never equal.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        matches!((self.to_plain(), other.to_plain()), (Ok(a), Ok(b)) if a == b)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.try_borrow().is_err() {
            return f.write_str("Node(<borrowed>)");
        }
        match self.plain_with(&mut Vec::new(), OnCycle::Mark) {
            Ok(Plain::Map(map)) => f.debug_map().entries(map.iter()).finish(),
            _ => f.write_str("Node(..)"),
        }
    }
}

impl From<IndexMap<String, Plain>> for Node {
    fn from(map: IndexMap<String, Plain>) -> Self {
        Node::from_map(map)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_plain()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let plain = Plain::deserialize(deserializer)?;
        Node::from_plain(plain).map_err(serde::de::Error::custom)
    }
}
