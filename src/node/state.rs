//! Serializable state of a node: its data plus the frozen flag.

use serde::{Deserialize, Serialize};

use super::{Node, NodeError, Plain};

/// A node's mapping together with its frozen flag.
///
/// `Serialize` on [`Node`] writes the mapping alone, which is what YAML and
/// TOML documents want. Serialize a `NodeState` instead when a frozen node
/// must come back frozen. The flag is restored over the whole tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub frozen: bool,
    pub data: Plain,
}

impl Node {
    /// Captures the data and frozen flag of this node.
    pub fn state(&self) -> Result<NodeState, NodeError> {
        Ok(NodeState {
            frozen: self.is_frozen(),
            data: self.to_plain()?,
        })
    }

    /// Rebuilds a node from captured state, freezing it if it was frozen.
    pub fn from_state(state: NodeState) -> Result<Node, NodeError> {
        let node = Node::from_plain(state.data)?;
        if state.frozen {
            node.freeze(true);
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Value;

    #[test]
    fn test_frozen_flag_survives_serde() {
        let root = Node::load("name: demo\nnested: {k: v}\n").unwrap();
        assert!(root.is_frozen());

        let text = serde_yaml::to_string(&root.state().unwrap()).unwrap();
        let back = Node::from_state(serde_yaml::from_str(&text).unwrap()).unwrap();

        assert_eq!(back, root);
        assert!(back.is_frozen());
        assert!(back.child("nested").unwrap().is_frozen());
        assert!(matches!(back.set("extra", 1), Err(NodeError::KeyNotFound(_))));
    }

    #[test]
    fn test_unfrozen_state_stays_writable() {
        let root = Node::new();
        root.set("a", 1).unwrap();

        let text = toml::to_string(&root.state().unwrap()).unwrap();
        let back = Node::from_state(toml::from_str(&text).unwrap()).unwrap();

        assert!(!back.is_frozen());
        back.set("b", 2).unwrap();
        assert_eq!(back.get("a").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_cyclic_node_has_no_state() {
        let root = Node::new();
        root.set("me", &root).unwrap();
        assert!(matches!(root.state(), Err(NodeError::Cyclic)));
    }
}
