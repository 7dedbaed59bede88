use std::fmt;

use crate::node::{Node, NodeError, Value};

use super::ConfigError;

/// A value destined for `path` below the root of the merged tree.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub path: Vec<String>,
    pub value: Value,
}

impl ConfigEntry {
    pub fn root(node: Node) -> Self {
        Self {
            path: Vec::new(),
            value: Value::Node(node),
        }
    }

    pub fn at_path(path: Vec<String>, value: Value) -> Self {
        Self { path, value }
    }
}

/// Something the [`Config`](super::Config) builder can pull entries from.
pub trait ConfigSource: fmt::Debug {
    fn entries(&mut self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

/// Merges `value` into `root` at `path`, creating intermediate nodes on demand.
///
/// A non-node value sitting on the way is replaced by a node. Nodes merge
/// recursively; anything else overwrites.
pub fn merge_at_path(root: &Node, path: &[String], value: Value) -> Result<(), NodeError> {
    let Some((last, parents)) = path.split_last() else {
        if let Value::Node(overlay) = value {
            root.update(&overlay)?;
        }
        return Ok(());
    };

    let mut target = root.clone();
    for segment in parents {
        target = match target.get(segment)? {
            Value::Node(node) => node,
            _ => {
                target.remove(segment)?;
                target.child(segment)?
            }
        };
    }

    match (target.get(last)?, value) {
        (Value::Node(existing), Value::Node(overlay)) => existing.update(&overlay),
        (_, value) => target.set(last.clone(), value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(yaml: &str) -> Node {
        Node::load_with(
            format!("{yaml}\n"),
            &crate::node::LoadOptions {
                freeze: false,
                ..Default::default()
            },
            None,
        )
        .unwrap()
    }

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_owned).collect()
    }

    #[test]
    fn test_merge_at_root() {
        let root = node("a: {x: 1}");
        merge_at_path(&root, &[], Value::Node(node("a: {y: 2}"))).unwrap();
        assert_eq!(root, node("a: {x: 1, y: 2}"));
    }

    #[test]
    fn test_merge_creates_missing_parents() {
        let root = node("a: 1");
        merge_at_path(&root, &path("db.pool.size"), Value::Int(4)).unwrap();
        assert_eq!(root, node("a: 1\ndb: {pool: {size: 4}}"));
    }

    #[test]
    fn test_merge_replaces_scalar_parent() {
        let root = node("db: sqlite");
        merge_at_path(&root, &path("db.port"), Value::Int(5432)).unwrap();
        assert_eq!(root, node("db: {port: 5432}"));
    }

    #[test]
    fn test_merge_nested_node() {
        let root = node("db: {host: a, port: 1}");
        merge_at_path(&root, &path("db"), Value::Node(node("port: 2"))).unwrap();
        assert_eq!(root, node("db: {host: a, port: 2}"));
    }
}
