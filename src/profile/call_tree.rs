//! Call tree merged from the stack samples of a session.
//!
//! Stacks are merged from the outermost frame inward. Every node counts the
//! samples whose stack passes through it. The tree serializes itself as
//! nested arrays: `[name, addr, count, [children...]]`, with `addr` rendered
//! as a decimal string.

use super::session::ProfileSession;
use log::debug;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::collections::HashMap;

/// Name of the synthetic node every stack hangs off
pub const ROOT_NAME: &str = "<all>";

#[derive(Debug, Clone)]
struct Node {
    name: String,
    addr: u64,
    count: u64,
    /// Child node ids in first-seen order
    children: Vec<usize>,
    by_addr: HashMap<u64, usize>,
}

impl Node {
    fn new(name: String, addr: u64) -> Self {
        Self {
            name,
            addr,
            count: 0,
            children: Vec::new(),
            by_addr: HashMap::new(),
        }
    }
}

/// Aggregated call tree, nodes stored in an arena
#[derive(Debug, Clone)]
pub struct CallTree {
    nodes: Vec<Node>,
}

impl CallTree {
    pub fn from_session(session: &ProfileSession) -> Self {
        let mut tree = CallTree {
            nodes: vec![Node::new(ROOT_NAME.to_string(), 0)],
        };

        for sample in &session.samples {
            tree.nodes[0].count += sample.count;
            let mut current = 0;
            for &addr in &sample.stack {
                current = tree.child_for(current, addr, session);
                tree.nodes[current].count += sample.count;
            }
        }

        debug!(
            "Built call tree with {} nodes from {} samples",
            tree.nodes.len(),
            session.samples.len()
        );

        tree
    }

    fn child_for(&mut self, parent: usize, addr: u64, session: &ProfileSession) -> usize {
        if let Some(&id) = self.nodes[parent].by_addr.get(&addr) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(Node::new(session.frame_name(addr), addr));
        self.nodes[parent].children.push(id);
        self.nodes[parent].by_addr.insert(addr, id);
        id
    }

    /// Total samples below the root
    pub fn total(&self) -> u64 {
        self.nodes[0].count
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, id: usize) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }
}

struct NodeRef<'a> {
    tree: &'a CallTree,
    id: usize,
}

struct ChildrenRef<'a> {
    tree: &'a CallTree,
    ids: &'a [usize],
}

impl Serialize for CallTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.node(0).serialize(serializer)
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = &self.tree.nodes[self.id];
        let mut seq = serializer.serialize_seq(Some(4))?;
        seq.serialize_element(&node.name)?;
        seq.serialize_element(&node.addr.to_string())?;
        seq.serialize_element(&node.count)?;
        seq.serialize_element(&ChildrenRef {
            tree: self.tree,
            ids: &node.children,
        })?;
        seq.end()
    }
}

impl Serialize for ChildrenRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.ids.len()))?;
        for &id in self.ids {
            seq.serialize_element(&self.tree.node(id))?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::session::Sample;
    use serde_json::json;

    #[test]
    fn test_tree_merges_common_frames() {
        let mut session = ProfileSession::new("pypy");
        session.addr_names.insert(1, "main".to_string());
        session.addr_names.insert(2, "work".to_string());
        session.samples = vec![
            Sample::new(vec![1, 2], 0),
            Sample::new(vec![1, 2], 0),
            Sample::new(vec![1, 3], 0),
        ];

        let tree = session.call_tree();
        assert_eq!(tree.total(), 3);
        assert_eq!(tree.node_count(), 4);

        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            value,
            json!([
                "<all>", "0", 3, [
                    ["main", "1", 3, [
                        ["work", "2", 2, []],
                        ["0x3", "3", 1, []]
                    ]]
                ]
            ])
        );
    }

    #[test]
    fn test_tree_weights_by_sample_count() {
        let mut session = ProfileSession::new("pypy");
        let mut sample = Sample::new(vec![7], 0);
        sample.count = 5;
        session.samples = vec![sample];

        let tree = session.call_tree();
        assert_eq!(tree.total(), 5);
    }
}
